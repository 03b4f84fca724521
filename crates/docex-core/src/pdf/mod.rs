//! PDF support.
//!
//! Scanned documents are usually PDFs wrapping one raster image per page.
//! Only that image is needed by the vision model, so no text layer or page
//! rendering is attempted.

mod extractor;

pub use extractor::PdfImageExtractor;

use image::DynamicImage;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Decode the first raster image of the first page.
pub fn first_page_image(data: &[u8]) -> Result<DynamicImage> {
    PdfImageExtractor::load(data)?.page_image(1)
}
