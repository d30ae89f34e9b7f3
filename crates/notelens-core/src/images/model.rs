//! Image reference and decoded image models.

use std::io::Cursor;
use std::path::PathBuf;

use base64::Engine;
use image::ImageFormat;

use crate::error::{NotelensError, NotelensResult};

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Remote(String),
    Local(PathBuf),
}

impl ImageRef {
    /// Classify a reference by prefix. Anything that is not `http://` or
    /// `https://` is treated as a filesystem path.
    pub fn parse(reference: &str) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            Self::Remote(reference.to_string())
        } else {
            Self::Local(PathBuf::from(reference))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// A successfully decoded image, ready to be inlined into a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// The reference the image was loaded from.
    pub source: String,
    pub width: u32,
    pub height: u32,
    /// Format detected in the original bytes.
    pub format: ImageFormat,
    /// Media type of `data`.
    pub mime_type: &'static str,
    /// Bytes sent to the model.
    pub data: Vec<u8>,
}

impl DecodedImage {
    /// Decode raw bytes.
    ///
    /// PNG, JPEG and WebP payloads are kept as-is; other formats are
    /// re-encoded to PNG since the model only accepts a few media types.
    pub fn decode(source: &str, bytes: Vec<u8>) -> NotelensResult<Self> {
        let format = image::guess_format(&bytes).map_err(NotelensError::Decode)?;
        let img = image::load_from_memory_with_format(&bytes, format)
            .map_err(NotelensError::Decode)?;
        let (width, height) = (img.width(), img.height());

        let (mime_type, data) = match passthrough_mime(format) {
            Some(mime) => (mime, bytes),
            None => {
                let mut buffer = Cursor::new(Vec::new());
                img.write_to(&mut buffer, ImageFormat::Png)
                    .map_err(NotelensError::Encode)?;
                ("image/png", buffer.into_inner())
            }
        };

        Ok(Self {
            source: source.to_string(),
            width,
            height,
            format,
            mime_type,
            data,
        })
    }

    /// Base64 payload for inline request parts.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

fn passthrough_mime(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_parse_classifies_by_prefix() {
        assert!(ImageRef::parse("https://example.com/a.png").is_remote());
        assert!(ImageRef::parse("http://example.com/a.png").is_remote());
        assert_eq!(
            ImageRef::parse("/tmp/a.png"),
            ImageRef::Local(PathBuf::from("/tmp/a.png"))
        );
        // prefix check is literal
        assert!(!ImageRef::parse("ftp://example.com/a.png").is_remote());
        assert!(!ImageRef::parse("HTTPS://example.com/a.png").is_remote());
    }

    #[test]
    fn test_decode_png_keeps_bytes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([255, 0, 0])));
        let png = encode(&img, ImageFormat::Png);

        let decoded = DecodedImage::decode("red.png", png.clone()).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 3));
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!(decoded.data, png);
    }

    #[test]
    fn test_decode_gif_reencodes_to_png() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::new(4, 2));
        let gif = encode(&img, ImageFormat::Gif);

        let decoded = DecodedImage::decode("anim.gif", gif).unwrap();
        assert_eq!(decoded.format, ImageFormat::Gif);
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(&decoded.data[..4], b"\x89PNG");
        assert_eq!((decoded.width, decoded.height), (4, 2));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = DecodedImage::decode("x", b"not an image".to_vec()).unwrap_err();
        assert!(matches!(err, NotelensError::Decode(_)));
    }

    #[test]
    fn test_to_base64() {
        let img = DynamicImage::new_rgb8(1, 1);
        let decoded = DecodedImage::decode("p", encode(&img, ImageFormat::Png)).unwrap();
        let round = base64::engine::general_purpose::STANDARD
            .decode(decoded.to_base64())
            .unwrap();
        assert_eq!(round, decoded.data);
    }
}
