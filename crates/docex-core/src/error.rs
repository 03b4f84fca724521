//! Error types for the docex-core library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::document::DocumentType;

/// Main error type for the docex library.
#[derive(Error, Debug)]
pub enum DocexError {
    /// Configuration error. Fatal for the request, never retried.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A single extraction attempt failed.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Document image could not be prepared for the model.
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    /// Model gateway error.
    #[error("gateway error: {0}")]
    Gateway(#[from] docex_gateway::GatewayError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-level errors. These abort the request or the whole run.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown document type name.
    #[error(
        "Invalid document type '{requested}'. Available types: {available}",
        available = DocumentType::names().join(", ")
    )]
    UnsupportedDocumentType { requested: String },

    /// Document type known but not registered with the processor.
    #[error("Unsupported document type: {0}")]
    Unregistered(DocumentType),

    /// Custom prompt file could not be read.
    #[error("custom prompt file not readable: {path}: {source}")]
    PromptSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Custom prompt file is empty.
    #[error("custom prompt file is empty: {0}")]
    EmptyPrompt(PathBuf),

    /// Dataset directory does not exist.
    #[error("Dataset directory not found: {0}")]
    DatasetNotFound(PathBuf),

    /// Dataset path exists but is not a directory.
    #[error("Dataset path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The document type requires OCR but no engine was supplied.
    #[error("document type {0} requires OCR but no OCR engine is configured")]
    OcrUnavailable(DocumentType),

    /// A configuration value is out of range.
    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Configuration file could not be read or parsed.
    #[error("cannot load configuration from {path}: {reason}")]
    File { path: PathBuf, reason: String },
}

/// Errors from a single prompt -> model -> validate attempt.
///
/// The `Display` output is what lands in a result's `error_message`.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Model reply was not valid JSON after cleanup.
    #[error("Failed to parse JSON response")]
    Parse,

    /// Parsed JSON violated the schema.
    #[error("{0}")]
    Validation(ValidationReport),

    /// The model backend call failed.
    #[error("Error generating response: {0}")]
    Gateway(#[from] docex_gateway::GatewayError),

    /// The OCR step failed.
    #[error("text extraction failed: {0}")]
    Ocr(#[from] OcrError),

    /// The document file could not be turned into an image payload.
    #[error("Error generating response: cannot prepare document image: {0}")]
    Image(String),
}

/// Errors raised while turning a document file into an image payload.
#[derive(Error, Debug)]
pub enum ImageError {
    /// The file does not exist.
    #[error("document file not found: {0}")]
    NotFound(PathBuf),

    /// Decoding or encoding failed.
    #[error("{0}")]
    Codec(#[from] image::ImageError),

    /// The PDF could not be read.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error while reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// No decodable raster image was found.
    #[error("no raster image found in PDF")]
    NoImage,
}

/// Errors reported by an OCR engine.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The engine could not read the image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Recognition failed.
    #[error("recognition failed: {0}")]
    Recognition(String),
}

/// One schema rule broken by one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Field path, e.g. `name` or `LineItems[1].ItemName`.
    pub field: String,
    /// What rule was broken.
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All violations found while validating one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Schema name the record was checked against.
    pub schema: &'static str,
    /// Violations in field declaration order.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Check whether a field path appears among the violations.
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.violations.len();
        let noun = if count == 1 { "error" } else { "errors" };
        write!(f, "{count} validation {noun} for {}", self.schema)?;
        for violation in &self.violations {
            write!(f, "\n{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// Result type for the docex library.
pub type Result<T> = std::result::Result<T, DocexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let report = ValidationReport {
            schema: "DrivingLicense",
            violations: vec![
                Violation::new("name", "field required"),
                Violation::new("expiry_date", "Date '2030-01-01' must be in MM/DD/YYYY format"),
            ],
        };

        assert_eq!(
            report.to_string(),
            "2 validation errors for DrivingLicense\n\
             name: field required\n\
             expiry_date: Date '2030-01-01' must be in MM/DD/YYYY format"
        );
        assert!(report.mentions("name"));
        assert!(!report.mentions("issuing_state"));
    }

    #[test]
    fn test_unsupported_type_lists_available() {
        let err = ConfigError::UnsupportedDocumentType {
            requested: "passport".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Invalid document type 'passport'. Available types: driving_license, shop_receipt, resume"
        );
    }

    #[test]
    fn test_gateway_error_message() {
        let err = ExtractionError::from(docex_gateway::GatewayError::EmptyResponse);
        assert_eq!(err.to_string(), "Error generating response: backend returned no content");
        assert_eq!(ExtractionError::Parse.to_string(), "Failed to parse JSON response");
    }
}
