use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use super::ImageNormalizer;
use crate::config::ImageConfig;
use crate::Result;

/// Fixed-size JPEG output.
///
/// The photo is scaled to cover the target frame and center-cropped, so every
/// stored image has exactly `width` x `height` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegNormalizer {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl Default for JpegNormalizer {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            quality: 70,
        }
    }
}

impl From<&ImageConfig> for JpegNormalizer {
    fn from(config: &ImageConfig) -> Self {
        Self {
            width: config.width.max(1),
            height: config.height.max(1),
            quality: config.quality.clamp(1, 100),
        }
    }
}

impl ImageNormalizer for JpegNormalizer {
    fn normalize(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let decoded = image::load_from_memory(raw)?;
        let resized = decoded
            .resize_to_fill(self.width, self.height, FilterType::Triangle)
            .to_rgb8();

        let mut out = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, self.quality);
            encoder.encode_image(&resized)?;
        }
        Ok(out)
    }

    fn extension(&self) -> &'static str {
        "jpg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 90]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_output_is_jpeg_of_fixed_size() {
        let normalizer = JpegNormalizer {
            width: 64,
            height: 48,
            quality: 60,
        };
        let out = normalizer.normalize(&png(200, 90)).unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_config_dimensions_are_kept_positive() {
        let config = ImageConfig {
            directory: "images".into(),
            width: 0,
            height: 0,
            quality: 0,
        };
        let normalizer = JpegNormalizer::from(&config);
        assert_eq!((normalizer.width, normalizer.height, normalizer.quality), (1, 1, 1));
        assert!(normalizer.normalize(&png(20, 10)).is_ok());
    }

    #[test]
    fn test_garbage_input_is_an_image_error() {
        let err = JpegNormalizer::default().normalize(b"not an image").unwrap_err();
        assert!(matches!(err, crate::FleetError::Image(_)));
    }
}
