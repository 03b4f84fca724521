//! Core library for schema-validated document extraction.
//!
//! This crate provides:
//! - Field schemas for driving licenses, shop receipts and resumes
//! - Prompt rendering from schema field descriptions
//! - Model reply cleanup and validation
//! - A retry loop with linear backoff around any [`ModelGateway`]
//! - Image preparation (grayscale, contrast, PDF first-page images)
//! - Dataset traversal and batch output records

pub mod batch;
pub mod error;
pub mod imaging;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod prompt;
pub mod registry;
pub mod retry;
pub mod schema;
pub mod validator;

pub use batch::{OutputRecord, ProcessingSummary, ResultAggregator, discover_documents, process_batch};
pub use error::{
    ConfigError, DocexError, ExtractionError, ImageError, OcrError, PdfError, Result,
    ValidationReport, Violation,
};
pub use imaging::ImagePreprocessor;
pub use models::config::{DocexConfig, ImageConfig, LlmConfig, OutputConfig, RetryConfig};
pub use models::document::DocumentType;
pub use models::records::{DrivingLicense, Education, LineItem, Resume, ShopReceipt, WorkExperience};
pub use models::result::ProcessingResult;
pub use ocr::{OcrEngine, TextSpan};
pub use registry::{DocumentProfile, DocumentRegistry};
pub use retry::{DocumentProcessor, ProcessingState, RetryPolicy};
pub use schema::Schema;
pub use validator::{clean_response, validate_response};

/// Re-export gateway types.
pub use docex_gateway::{ChatCompletionsBackend, GatewayError, ImagePayload, ModelGateway};
