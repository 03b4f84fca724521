//! Model backend implementations.

pub mod chat;

use async_trait::async_trait;

use crate::{ImagePayload, Result};

/// Trait for language model backends.
///
/// A gateway takes a prompt and an optional image and returns the model's
/// raw text reply. It neither retries nor validates; both belong to the
/// caller.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Send the prompt (and image, if any) and return the raw reply text.
    async fn invoke(&self, prompt: &str, image: Option<&ImagePayload>) -> Result<String>;

    /// Model identifier used for logging.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<G: ModelGateway + ?Sized> ModelGateway for Box<G> {
    async fn invoke(&self, prompt: &str, image: Option<&ImagePayload>) -> Result<String> {
        (**self).invoke(prompt, image).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
