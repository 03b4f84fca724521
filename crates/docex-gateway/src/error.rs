//! Error types for the gateway layer.

use thiserror::Error;

/// Errors that can occur while asking the model for a reply.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Http { status: u16, body: String },

    /// The backend reply could not be decoded.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// The backend reply carried no message content.
    #[error("backend returned no content")]
    EmptyResponse,

    /// No API key was configured for the backend.
    #[error("missing API key: set {0}")]
    MissingApiKey(String),

    /// The backend configuration is unusable.
    #[error("invalid backend configuration: {0}")]
    Config(String),
}
