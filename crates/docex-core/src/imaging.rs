//! Document image preparation.
//!
//! Loads a document file (raster image or PDF), converts it to grayscale,
//! boosts contrast and re-encodes it as PNG for the model.

use std::io::Cursor;
use std::path::Path;

use docex_gateway::ImagePayload;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba};
use tracing::debug;

use crate::error::ImageError;
use crate::models::config::ImageConfig;
use crate::pdf;

/// Image pre-processor.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    grayscale: bool,
    contrast: f32,
}

impl ImagePreprocessor {
    /// Grayscale with a contrast factor of 3.0.
    pub fn new() -> Self {
        Self::from_config(&ImageConfig::default())
    }

    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            grayscale: config.grayscale,
            contrast: config.contrast,
        }
    }

    pub fn with_grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }

    /// Set the contrast factor. 1.0 leaves the image unchanged.
    pub fn with_contrast(mut self, contrast: f32) -> Self {
        self.contrast = contrast;
        self
    }

    /// Load, enhance and encode a document file.
    pub fn prepare(&self, path: &Path) -> Result<ImagePayload, ImageError> {
        let image = load_document(path)?;
        let (width, height) = image.dimensions();
        debug!("Preparing {}: {}x{}", path.display(), width, height);

        encode_png(&self.enhance(image))
    }

    /// Apply grayscale conversion and contrast enhancement.
    pub fn enhance(&self, image: DynamicImage) -> DynamicImage {
        let image = if self.grayscale {
            DynamicImage::ImageLuma8(image.to_luma8())
        } else {
            image
        };

        if (self.contrast - 1.0).abs() < f32::EPSILON {
            return image;
        }
        adjust_contrast(&image, self.contrast)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a document file into an image. PDFs yield their first page image.
pub fn load_document(path: &Path) -> Result<DynamicImage, ImageError> {
    if !path.is_file() {
        return Err(ImageError::NotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        Ok(pdf::first_page_image(&bytes)?)
    } else {
        Ok(image::load_from_memory(&bytes)?)
    }
}

/// Encode as PNG.
pub fn encode_png(image: &DynamicImage) -> Result<ImagePayload, ImageError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(ImagePayload::png(bytes))
}

/// Blend every pixel against the mean luminance by `factor`.
///
/// `out = mean + factor * (pixel - mean)`, clamped to 0..=255. Alpha is kept.
fn adjust_contrast(image: &DynamicImage, factor: f32) -> DynamicImage {
    let gray = image.to_luma8();
    let pixel_count = u64::from(gray.width()) * u64::from(gray.height());
    if pixel_count == 0 {
        return image.clone();
    }
    let sum: u64 = gray.pixels().map(|p| u64::from(p.0[0])).sum();
    let mean = (sum as f32 / pixel_count as f32).round();

    let blend = |v: u8| -> u8 { (mean + factor * (f32::from(v) - mean)).round().clamp(0.0, 255.0) as u8 };

    match image {
        DynamicImage::ImageLuma8(luma) => {
            let mut out = luma.clone();
            for p in out.pixels_mut() {
                p.0[0] = blend(p.0[0]);
            }
            DynamicImage::ImageLuma8(out)
        }
        other => {
            let mut out = other.to_rgba8();
            for p in out.pixels_mut() {
                let Rgba([r, g, b, a]) = *p;
                *p = Rgba([blend(r), blend(g), blend(b), a]);
            }
            DynamicImage::ImageRgba8(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    fn gradient() -> DynamicImage {
        // Mean luminance is 100.
        DynamicImage::ImageLuma8(GrayImage::from_fn(4, 1, |x, _| Luma([[70, 90, 110, 130][x as usize]])))
    }

    #[test]
    fn test_contrast_blend() {
        let enhanced = ImagePreprocessor::new().enhance(gradient()).to_luma8();
        let values: Vec<u8> = enhanced.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![10, 70, 130, 190]);
    }

    #[test]
    fn test_contrast_clamps() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(2, 1, |x, _| Luma([[0, 255][x as usize]])));
        let enhanced = ImagePreprocessor::new().enhance(image).to_luma8();
        assert_eq!(enhanced.get_pixel(0, 0).0, [0]);
        assert_eq!(enhanced.get_pixel(1, 0).0, [255]);
    }

    #[test]
    fn test_unit_contrast_is_identity() {
        let enhanced = ImagePreprocessor::new().with_contrast(1.0).enhance(gradient());
        assert_eq!(enhanced.to_luma8(), gradient().to_luma8());
    }

    #[test]
    fn test_grayscale_conversion() {
        let color = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, image::Rgb([200, 10, 10])));
        let enhanced = ImagePreprocessor::new().with_contrast(1.0).enhance(color);
        assert!(matches!(enhanced, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_prepare_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.PNG");
        gradient().save_with_format(&path, ImageFormat::Png).unwrap();

        let payload = ImagePreprocessor::new().prepare(&path).unwrap();

        assert_eq!(payload.mime_type(), "image/png");
        let decoded = image::load_from_memory(payload.bytes()).unwrap();
        assert_eq!(decoded.dimensions(), (4, 1));
    }

    #[test]
    fn test_missing_file() {
        let err = ImagePreprocessor::new()
            .prepare(Path::new("/no/such/scan.png"))
            .unwrap_err();
        assert!(matches!(err, ImageError::NotFound(_)));
    }

    #[test]
    fn test_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let err = ImagePreprocessor::new().prepare(&path).unwrap_err();
        assert!(matches!(err, ImageError::Codec(_)));
    }
}
