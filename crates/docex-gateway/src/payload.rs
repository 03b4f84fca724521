//! Encoded images sent alongside a prompt.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// An encoded image ready to be attached to a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime_type: String,
    bytes: Vec<u8>,
}

impl ImagePayload {
    /// Wrap already-encoded image bytes with their MIME type.
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Wrap PNG-encoded bytes.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new("image/png", bytes)
    }

    /// MIME type of the encoded image.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Raw encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Render as a `data:` URL with base64 content.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_data_url() {
        let payload = ImagePayload::png(vec![0x89, b'P', b'N', b'G']);

        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.to_data_url(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_empty_payload() {
        let payload = ImagePayload::new("image/jpeg", Vec::new());
        assert_eq!(payload.to_data_url(), "data:image/jpeg;base64,");
    }
}
