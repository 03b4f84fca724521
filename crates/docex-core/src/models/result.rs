//! Terminal per-document outcome.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::document::DocumentType;

/// Outcome of processing one document.
///
/// `validated_data` is present exactly when `success` is true and
/// `error_message` exactly when it is false. The constructors are the only
/// way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    success: bool,
    document_type: DocumentType,
    raw_response: String,
    validated_data: Option<Map<String, Value>>,
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
}

impl ProcessingResult {
    /// A successful extraction.
    pub fn success(
        document_type: DocumentType,
        raw_response: impl Into<String>,
        validated_data: Map<String, Value>,
    ) -> Self {
        Self {
            success: true,
            document_type,
            raw_response: raw_response.into(),
            validated_data: Some(validated_data),
            error_message: None,
            file_path: None,
            file_name: None,
        }
    }

    /// A failed extraction.
    pub fn failure(
        document_type: DocumentType,
        raw_response: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            document_type,
            raw_response: raw_response.into(),
            validated_data: None,
            error_message: Some(error_message.into()),
            file_path: None,
            file_name: None,
        }
    }

    /// Attach the source file this result was produced from.
    pub fn with_source(mut self, path: &Path) -> Self {
        self.file_path = Some(path.display().to_string());
        self.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    /// Cleaned model reply (empty for terminal retry failures).
    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }

    pub fn validated_data(&self) -> Option<&Map<String, Value>> {
        self.validated_data.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Deserialize the validated record into a typed struct.
    ///
    /// Returns `None` for failed results.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        self.validated_data
            .as_ref()
            .map(|data| serde_json::from_value(Value::Object(data.clone())))
    }
}

impl fmt::Display for ProcessingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "ProcessingResult({status}, {})", self.document_type)
    }
}
