//! Image file import: format sniffing and size probing.

use crate::error::ImportError;
use crate::shapes::ImageFormat;

/// What the board needs to know about an image before placing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Sniff the format of `bytes` and decode them once to validate the data.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, ImportError> {
    if bytes.is_empty() {
        return Err(ImportError::Empty);
    }
    let detected = image::guess_format(bytes).map_err(|_| ImportError::UnknownFormat)?;
    let format =
        ImageFormat::from_image_format(detected).ok_or(ImportError::Unsupported(detected))?;
    let decoded = image::load_from_memory_with_format(bytes, detected)?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(ImportError::ZeroSize);
    }
    Ok(DecodedImage {
        width,
        height,
        format,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// Encode a solid RGBA image as PNG.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let decoded = decode_image(&png_bytes(8, 6)).unwrap();
        assert_eq!(
            decoded,
            DecodedImage {
                width: 8,
                height: 6,
                format: ImageFormat::Png
            }
        );
    }

    #[test]
    fn test_empty_bytes() {
        assert!(matches!(decode_image(&[]), Err(ImportError::Empty)));
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(ImportError::UnknownFormat)
        ));
    }

    #[test]
    fn test_truncated_png() {
        let bytes = png_bytes(8, 8);
        assert!(matches!(
            decode_image(&bytes[..bytes.len() / 2]),
            Err(ImportError::Decode(_))
        ));
    }
}
