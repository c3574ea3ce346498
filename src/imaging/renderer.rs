//! Variant rendering with the `image` crate.
//!
//! | Operation | Function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image::load_from_memory` |
//! | Contain fit | `DynamicImage::resize` (Lanczos3) onto a filled canvas |
//! | Encode (progressive, 4:2:0) | `jpeg_encoder::Encoder` |

use crate::config::RenderConfig;
use crate::imaging::resolution::{SourceResolution, TargetSize};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid target size {0}")]
    InvalidTarget(TargetSize),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Turns raw upload bytes into one encoded variant. Implementations are pure
/// and may be called concurrently on the same input.
pub trait Renderer: Send + Sync + 'static {
    fn render(&self, data: &[u8], target: TargetSize) -> Result<Vec<u8>, RenderError>;

    /// File extension of the encoded output, without the dot
    fn extension(&self) -> &'static str;

    fn content_type(&self) -> &'static str;
}

/// Renders every variant as a progressive, chroma-subsampled JPEG at a fixed quality
#[derive(Debug, Clone)]
pub struct JpegRenderer {
    quality: u8,
    background: Rgba<u8>,
    max_pixels: u64,
}

impl JpegRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        let [r, g, b] = config.background;
        Self {
            quality: config.quality,
            background: Rgba([r, g, b, 255]),
            max_pixels: config.max_pixels,
        }
    }

    /// Reject targets above the pixel budget or past the 16-bit JPEG frame limit
    fn check_target(&self, target: TargetSize) -> Result<(u16, u16), RenderError> {
        let pixels = u64::from(target.width) * u64::from(target.height);
        if pixels == 0 || pixels > self.max_pixels {
            return Err(RenderError::InvalidTarget(target));
        }

        match (u16::try_from(target.width), u16::try_from(target.height)) {
            (Ok(width), Ok(height)) => Ok((width, height)),
            _ => Err(RenderError::InvalidTarget(target)),
        }
    }

    /// Scale `image` to fit inside `target` and centre it on a background canvas
    fn contain(&self, image: &DynamicImage, target: TargetSize) -> DynamicImage {
        let resized = image.resize(target.width, target.height, FilterType::Lanczos3);

        let mut canvas = RgbaImage::from_pixel(target.width, target.height, self.background);
        let x = (target.width - resized.width().min(target.width)) / 2;
        let y = (target.height - resized.height().min(target.height)) / 2;
        imageops::overlay(&mut canvas, &resized.to_rgba8(), i64::from(x), i64::from(y));

        DynamicImage::ImageRgba8(canvas)
    }
}

impl Renderer for JpegRenderer {
    fn render(&self, data: &[u8], target: TargetSize) -> Result<Vec<u8>, RenderError> {
        // Checked before decoding so an oversized target never allocates a canvas
        let (width, height) = self.check_target(target)?;

        let image = image::load_from_memory(data).map_err(|e| RenderError::Decode(e.to_string()))?;
        let rgb = self.contain(&image, target).to_rgb8();

        let mut encoded = Vec::new();
        let mut encoder = Encoder::new(&mut encoded, self.quality);
        encoder.set_progressive(true);
        encoder.set_sampling_factor(SamplingFactor::F_2_2);
        encoder
            .encode(rgb.as_raw(), width, height, ColorType::Rgb)
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        Ok(encoded)
    }

    fn extension(&self) -> &'static str {
        "jpeg"
    }

    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Read the source dimensions from an image header without decoding pixels
pub fn probe_resolution(data: &[u8]) -> Result<SourceResolution, RenderError> {
    let (width, height) = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RenderError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| RenderError::Decode(e.to_string()))?;

    SourceResolution::new(width, height).map_err(|e| RenderError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_image_bytes;

    fn renderer() -> JpegRenderer {
        JpegRenderer::new(&RenderConfig::default())
    }

    fn decode(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory(bytes).unwrap()
    }

    /// Marker and luma sampling byte of the first start-of-frame segment
    fn frame_header(jpeg: &[u8]) -> (u8, u8) {
        let mut offset = 2;
        while offset + 4 <= jpeg.len() {
            assert_eq!(jpeg[offset], 0xFF, "segment marker expected at {}", offset);
            let marker = jpeg[offset + 1];
            let length = usize::from(u16::from_be_bytes([jpeg[offset + 2], jpeg[offset + 3]]));
            if (0xC0..=0xC2).contains(&marker) {
                // marker(2) length(2) precision(1) height(2) width(2) components(1) id(1) sampling(1)
                return (marker, jpeg[offset + 11]);
            }
            offset += 2 + length;
        }
        panic!("no start-of-frame segment");
    }

    #[test]
    fn output_is_a_jpeg_of_exact_target_size() {
        let input = sample_image_bytes(120, 80);
        let output = renderer()
            .render(&input, TargetSize { width: 60, height: 40 })
            .unwrap();

        assert_eq!(
            image::guess_format(&output).unwrap(),
            image::ImageFormat::Jpeg
        );
        let decoded = decode(&output);
        assert_eq!((decoded.width(), decoded.height()), (60, 40));
    }

    #[test]
    fn mismatched_aspect_is_padded_with_background() {
        // Square source into a wide canvas leaves bars left and right
        let input = sample_image_bytes(50, 50);
        let output = renderer()
            .render(&input, TargetSize { width: 100, height: 50 })
            .unwrap();

        let decoded = decode(&output).to_rgb8();
        assert_eq!(decoded.dimensions(), (100, 50));
        let corner = decoded.get_pixel(1, 25);
        assert!(
            corner.0.iter().all(|c| *c > 235),
            "expected white padding, got {:?}",
            corner
        );
    }

    #[test]
    fn small_sources_still_fill_the_canvas_size() {
        let input = sample_image_bytes(10, 10);
        let output = renderer()
            .render(&input, TargetSize { width: 30, height: 20 })
            .unwrap();
        let decoded = decode(&output);
        assert_eq!((decoded.width(), decoded.height()), (30, 20));
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        let result = renderer().render(b"definitely not an image", TargetSize { width: 10, height: 10 });
        assert!(matches!(result, Err(RenderError::Decode(_))));
    }

    #[test]
    fn output_is_progressive_with_subsampled_chroma() {
        let input = sample_image_bytes(64, 48);
        let output = renderer()
            .render(&input, TargetSize { width: 64, height: 48 })
            .unwrap();

        let (marker, luma_sampling) = frame_header(&output);
        assert_eq!(marker, 0xC2, "expected SOF2 (progressive)");
        assert_eq!(luma_sampling, 0x22, "expected 2x2 luma sampling (4:2:0)");
    }

    #[test]
    fn oversized_targets_are_rejected_before_decoding() {
        // Not an image either: the size check must come first
        let data = b"never decoded";
        for target in [
            TargetSize { width: 1, height: u32::MAX },
            TargetSize { width: 70_000, height: 1 },
            TargetSize { width: 20_000, height: 20_000 },
        ] {
            assert!(matches!(
                renderer().render(data, target),
                Err(RenderError::InvalidTarget(_))
            ));
        }
    }

    #[test]
    fn pixel_budget_comes_from_config() {
        let small = JpegRenderer::new(&RenderConfig {
            max_pixels: 100,
            ..RenderConfig::default()
        });
        let input = sample_image_bytes(20, 20);

        assert!(small.render(&input, TargetSize { width: 10, height: 10 }).is_ok());
        assert!(matches!(
            small.render(&input, TargetSize { width: 11, height: 10 }),
            Err(RenderError::InvalidTarget(_))
        ));
    }

    #[test]
    fn zero_target_is_rejected() {
        let input = sample_image_bytes(10, 10);
        let result = renderer().render(&input, TargetSize { width: 0, height: 10 });
        assert!(matches!(result, Err(RenderError::InvalidTarget(_))));
    }

    #[test]
    fn probe_reads_header_dimensions() {
        let input = sample_image_bytes(64, 48);
        let resolution = probe_resolution(&input).unwrap();
        assert_eq!(resolution.to_string(), "64:48");
    }

    #[test]
    fn probe_rejects_garbage() {
        assert!(probe_resolution(b"nope").is_err());
    }
}
