//! Rectangle shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_id, to_local};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, optionally rotated about its center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Rectangle {
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: new_id(),
            position,
            width,
            height,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Get as a kurbo Rect (unrotated).
    pub fn as_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, Size::new(self.width, self.height))
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let rect = self.as_rect();
        let point = to_local(point, rect.center(), self.rotation);
        if self.style.fill_color.is_some() {
            rect.inflate(tolerance, tolerance).contains(point)
        } else {
            let band = tolerance + self.style.stroke_width / 2.0;
            let outer = rect.inflate(band, band);
            let inner = rect.inflate(-band, -band);
            outer.contains(point) && !inner.contains(point)
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SerializableColor;
    use kurbo::Vec2;

    #[test]
    fn test_rectangle_creation() {
        let rect = Rectangle::new(Point::new(20.0, 50.0), 100.0, 50.0);
        assert!((rect.position.x - 20.0).abs() < f64::EPSILON);
        assert!((rect.bounds().x1 - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_filled() {
        let rect = Rectangle::new(Point::ZERO, 100.0, 50.0)
            .with_style(ShapeStyle::default().with_fill(SerializableColor::black()));
        assert!(rect.hit_test(Point::new(50.0, 25.0), 0.0));
        assert!(!rect.hit_test(Point::new(150.0, 25.0), 0.0));
    }

    #[test]
    fn test_hit_test_outline() {
        let rect = Rectangle::new(Point::ZERO, 100.0, 50.0);
        assert!(rect.hit_test(Point::new(0.0, 25.0), 0.0));
        assert!(!rect.hit_test(Point::new(50.0, 25.0), 0.0));
    }

    #[test]
    fn test_rotated_hit_test() {
        let mut rect = Rectangle::new(Point::new(-50.0, -5.0), 100.0, 10.0)
            .with_style(ShapeStyle::default().with_fill(SerializableColor::black()));
        assert!(rect.hit_test(Point::new(40.0, 0.0), 0.0));
        rect.rotation = std::f64::consts::FRAC_PI_2;
        assert!(!rect.hit_test(Point::new(40.0, 0.0), 0.0));
        assert!(rect.hit_test(Point::new(0.0, 40.0), 0.0));
    }

    #[test]
    fn test_translate_and_scale() {
        let mut rect = Rectangle::new(Point::new(10.0, 10.0), 20.0, 10.0);
        rect.transform(Affine::translate(Vec2::new(5.0, -5.0)));
        assert!((rect.position.x - 15.0).abs() < f64::EPSILON);
        assert!((rect.position.y - 5.0).abs() < f64::EPSILON);
        rect.transform(Affine::scale_non_uniform(2.0, 3.0));
        assert!((rect.width - 40.0).abs() < f64::EPSILON);
        assert!((rect.height - 30.0).abs() < f64::EPSILON);
    }
}
