//! Raster image shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_id, to_local};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};

/// Encoded format of the stored image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// File extensions offered by the image picker.
    pub const EXTENSIONS: &'static [&'static str] = &["png", "jpg", "jpeg", "webp"];

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Map a format detected by the `image` crate, if we can display it.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::WebP => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

/// An image placed on the board. Holds the encoded bytes; decoding for
/// display is left to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Natural width in pixels.
    pub source_width: u32,
    /// Natural height in pixels.
    pub source_height: u32,
    pub format: ImageFormat,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Image {
    /// Create an image shown at its natural size.
    pub fn new(
        position: Point,
        data: Vec<u8>,
        source_width: u32,
        source_height: u32,
        format: ImageFormat,
    ) -> Self {
        Self {
            id: new_id(),
            position,
            width: source_width as f64,
            height: source_height as f64,
            source_width,
            source_height,
            format,
            data,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Encoded image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Natural pixel size.
    pub fn natural_size(&self) -> Size {
        Size::new(self.source_width as f64, self.source_height as f64)
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, Size::new(self.width, self.height))
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.as_rect();
        let local = to_local(point, rect.center(), self.rotation);
        rect.inflate(tolerance, tolerance).contains(local)
    }

    fn to_path(&self) -> BezPath {
        let rect = self.as_rect();
        let path = rect.to_path(0.1);
        if self.rotation == 0.0 {
            path
        } else {
            Affine::rotate_about(self.rotation, rect.center()) * path
        }
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        let rect = affine.transform_rect_bbox(self.as_rect());
        self.position = Point::new(rect.x0, rect.y0);
        self.width = rect.width();
        self.height = rect.height();
    }
}

/// Image bytes travel as a base64 string in JSON.
mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_size() {
        let img = Image::new(Point::ZERO, vec![0u8; 4], 800, 600, ImageFormat::Png);
        assert!((img.width - 800.0).abs() < f64::EPSILON);
        assert!((img.natural_size().height - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds() {
        let img = Image::new(Point::new(10.0, 20.0), vec![0u8; 4], 100, 50, ImageFormat::Png);
        let bounds = img.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_mapping() {
        assert_eq!(
            ImageFormat::from_image_format(image::ImageFormat::Jpeg),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_image_format(image::ImageFormat::Gif), None);
        assert_eq!(ImageFormat::WebP.mime_type(), "image/webp");
    }

    #[test]
    fn test_bytes_serialize_as_base64() {
        let img = Image::new(Point::ZERO, vec![1, 2, 3], 1, 1, ImageFormat::Png);
        let json = serde_json::to_string(&img).unwrap();
        assert!(json.contains("\"AQID\""));
        let back: Image = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data(), &[1, 2, 3]);
    }
}
