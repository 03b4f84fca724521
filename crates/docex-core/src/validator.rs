//! Model reply cleanup and schema validation.

use serde_json::Value;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::document::DocumentType;
use crate::models::result::ProcessingResult;
use crate::schema::Schema;

/// Strip markdown code fences and surrounding whitespace.
pub fn clean_response(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse and validate a cleaned reply.
///
/// Returns the normalized record, or the error whose message belongs in the
/// result.
pub fn check_response(
    cleaned: &str,
    schema: &Schema,
) -> Result<serde_json::Map<String, Value>, ExtractionError> {
    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        debug!("Reply is not JSON: {}", e);
        ExtractionError::Parse
    })?;

    schema.validate(&value).map_err(ExtractionError::Validation)
}

/// Turn a raw model reply into a [`ProcessingResult`].
///
/// Pure: the same reply always produces the same result. `raw_response` on
/// the result is the cleaned text.
pub fn validate_response(raw: &str, document_type: DocumentType, schema: &Schema) -> ProcessingResult {
    let cleaned = clean_response(raw);

    match check_response(&cleaned, schema) {
        Ok(record) => ProcessingResult::success(document_type, cleaned, record),
        Err(e) => ProcessingResult::failure(document_type, cleaned, e.to_string()),
    }
}
