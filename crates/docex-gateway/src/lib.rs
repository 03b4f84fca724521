//! Language model gateway for docex.
//!
//! This crate provides a single seam between the extraction pipeline and
//! whatever vision-capable model answers the prompts:
//! - [`ModelGateway`], the request/response trait the retry loop calls
//! - [`ChatCompletionsBackend`], an OpenAI-compatible `/chat/completions` client
//! - [`ImagePayload`], an encoded image travelling alongside the prompt

mod backend;
mod error;
mod payload;

pub use backend::ModelGateway;
pub use backend::chat::{
    ChatCompletionsBackend, ChatCompletionsBuilder, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
pub use error::GatewayError;
pub use payload::ImagePayload;

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
