//! Per-document retry loop.
//!
//! Each attempt renders the prompt, calls the model and validates the reply.
//! The first valid reply wins. Failed attempts back off linearly
//! (`attempt * base_delay`) before the next one; once every attempt has
//! failed the document gets a terminal failure naming the last error.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use docex_gateway::{ImagePayload, ModelGateway};
use tracing::{debug, info, trace, warn};

use crate::error::{ConfigError, ExtractionError, ImageError};
use crate::imaging::ImagePreprocessor;
use crate::models::config::{DocexConfig, RetryConfig};
use crate::models::document::DocumentType;
use crate::models::result::ProcessingResult;
use crate::ocr::{OcrEngine, reading_order_text};
use crate::prompt::PromptContext;
use crate::registry::{DocumentProfile, DocumentRegistry};
use crate::validator::{check_response, clean_response};

/// Vertical tolerance when grouping OCR spans into lines.
const OCR_ROW_HEIGHT: f32 = 20.0;

/// How many times to try a document and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.base_delay
            .saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Lifecycle of one document in the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Pending,
    Attempting { attempt: usize },
    Succeeded { attempt: usize },
    Exhausted { attempts: usize },
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Attempting { attempt } => write!(f, "attempting ({attempt})"),
            Self::Succeeded { attempt } => write!(f, "succeeded on attempt {attempt}"),
            Self::Exhausted { attempts } => write!(f, "exhausted after {attempts} attempts"),
        }
    }
}

/// Input shared by every attempt on one document.
struct AttemptInput<'a> {
    document_type: DocumentType,
    profile: &'a DocumentProfile,
    path: Option<&'a Path>,
    image: Option<&'a ImagePayload>,
    preparation_error: Option<&'a str>,
}

/// Runs documents through prompt, model and validation with retries.
pub struct DocumentProcessor<G> {
    gateway: G,
    registry: DocumentRegistry,
    policy: RetryPolicy,
    preprocessor: ImagePreprocessor,
    ocr: Option<Box<dyn OcrEngine>>,
    feedback: bool,
}

impl<G: ModelGateway> DocumentProcessor<G> {
    /// Processor with the default policy and image settings.
    pub fn new(gateway: G, registry: DocumentRegistry) -> Self {
        Self {
            gateway,
            registry,
            policy: RetryPolicy::default(),
            preprocessor: ImagePreprocessor::new(),
            ocr: None,
            feedback: false,
        }
    }

    /// Processor configured from the retry and image sections of a config.
    pub fn from_config(gateway: G, registry: DocumentRegistry, config: &DocexConfig) -> Self {
        Self::new(gateway, registry)
            .with_policy(RetryPolicy::from_config(&config.retry))
            .with_preprocessor(ImagePreprocessor::from_config(&config.image))
            .with_feedback(config.retry.feedback)
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_ocr(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Append the previous attempt's error to the next prompt.
    pub fn with_feedback(mut self, feedback: bool) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Check that a document type can be processed at all.
    pub fn ensure_ready(&self, document_type: DocumentType) -> Result<&DocumentProfile, ConfigError> {
        let profile = self.registry.get(document_type)?;
        if profile.uses_ocr && self.ocr.is_none() {
            return Err(ConfigError::OcrUnavailable(document_type));
        }
        Ok(profile)
    }

    /// Process one document.
    ///
    /// Per-document failures are reported inside the returned result.
    /// `Err` means the request itself is misconfigured and was not attempted.
    pub async fn process_document(
        &self,
        document_type: DocumentType,
        image: Option<&Path>,
    ) -> Result<ProcessingResult, ConfigError> {
        let profile = self.ensure_ready(document_type)?;
        let mut state = ProcessingState::Pending;
        trace!("{}: {}", document_type, state);

        let mut preparation_error = None;
        let payload = match image {
            Some(path) if !profile.uses_ocr => match self.preprocessor.prepare(path) {
                Ok(payload) => Some(payload),
                Err(ImageError::NotFound(_)) => {
                    warn!("{} not found, sending the prompt without an image", path.display());
                    None
                }
                Err(e) => {
                    warn!("Cannot prepare {}: {}", path.display(), e);
                    preparation_error = Some(e.to_string());
                    None
                }
            },
            _ => None,
        };

        let input = AttemptInput {
            document_type,
            profile,
            path: image,
            image: payload.as_ref(),
            preparation_error: preparation_error.as_deref(),
        };

        let max_attempts = self.policy.max_attempts();
        let mut ocr_text: Option<String> = None;
        let mut last_error: Option<String> = None;

        for attempt in 1..=max_attempts {
            state = ProcessingState::Attempting { attempt };
            debug!("{}: {}", document_type, state);

            let previous = last_error.take();
            match self.attempt(&input, &mut ocr_text, previous.as_deref()).await {
                Ok(result) => {
                    state = ProcessingState::Succeeded { attempt };
                    info!("{}: {}", document_type, state);
                    return Ok(result);
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                    last_error = Some(e.to_string());
                }
            }

            if attempt < max_attempts {
                let delay = self.policy.delay_for(attempt);
                debug!("Retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }

        state = ProcessingState::Exhausted {
            attempts: max_attempts,
        };
        warn!("{}: {}", document_type, state);

        Ok(ProcessingResult::failure(
            document_type,
            "",
            format!(
                "Failed after {} attempts. Last error: {}",
                max_attempts,
                last_error.unwrap_or_default()
            ),
        ))
    }

    async fn attempt(
        &self,
        input: &AttemptInput<'_>,
        ocr_text: &mut Option<String>,
        previous_error: Option<&str>,
    ) -> Result<ProcessingResult, ExtractionError> {
        if input.profile.uses_ocr && ocr_text.is_none() {
            if let (Some(engine), Some(path)) = (&self.ocr, input.path) {
                let spans = engine.extract(path)?;
                debug!("OCR found {} text spans", spans.len());
                *ocr_text = Some(reading_order_text(&spans, OCR_ROW_HEIGHT));
            }
        }

        if let Some(reason) = input.preparation_error {
            return Err(ExtractionError::Image(reason.to_string()));
        }

        let context = PromptContext {
            ocr_text: ocr_text.as_deref(),
            previous_error: previous_error.filter(|_| self.feedback),
        };
        let prompt = context.apply(&input.profile.prompt);

        let raw = self.gateway.invoke(&prompt, input.image).await?;
        debug!("Model reply: {}", raw);

        let cleaned = clean_response(&raw);
        let record = check_response(&cleaned, input.profile.schema)?;
        Ok(ProcessingResult::success(input.document_type, cleaned, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::ocr::TextSpan;
    use async_trait::async_trait;
    use docex_gateway::GatewayError;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const VALID_LICENSE: &str = r#"{"name": "JOHN SMITH", "license_number": "D123", "issuing_state": "CA", "date_of_birth": "01/01/1990", "expiry_date": "01/01/2030"}"#;

    /// Replays canned replies; falls back to invalid JSON once they run out.
    #[derive(Default)]
    struct ScriptedGateway {
        replies: Mutex<VecDeque<Result<String, GatewayError>>>,
        prompts: Mutex<Vec<String>>,
        images: Mutex<Vec<bool>>,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<Result<String, GatewayError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn invoke(
            &self,
            prompt: &str,
            image: Option<&ImagePayload>,
        ) -> docex_gateway::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.images.lock().unwrap().push(image.is_some());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("{invalid json".to_string()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct FixedOcr(Result<Vec<TextSpan>, String>);

    impl OcrEngine for FixedOcr {
        fn extract(&self, _image: &Path) -> Result<Vec<TextSpan>, OcrError> {
            self.0.clone().map_err(OcrError::Recognition)
        }
    }

    fn processor(replies: Vec<Result<String, GatewayError>>) -> DocumentProcessor<ScriptedGateway> {
        DocumentProcessor::new(ScriptedGateway::new(replies), DocumentRegistry::builtin())
            .with_policy(RetryPolicy::new(3, Duration::from_millis(10)))
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_invalid_exhausts_attempts() {
        let processor = processor(vec![]);

        let result = processor
            .process_document(DocumentType::DrivingLicense, None)
            .await
            .unwrap();

        assert_eq!(processor.gateway().calls(), 3);
        assert!(!result.is_success());
        assert_eq!(result.raw_response(), "");
        assert_eq!(
            result.error_message(),
            Some("Failed after 3 attempts. Last error: Failed to parse JSON response")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_success() {
        let processor = processor(vec![
            Ok("{invalid json".to_string()),
            Ok(format!("```json\n{VALID_LICENSE}\n```")),
            Ok(VALID_LICENSE.to_string()),
        ]);

        let result = processor
            .process_document(DocumentType::DrivingLicense, None)
            .await
            .unwrap();

        assert_eq!(processor.gateway().calls(), 2);
        assert!(result.is_success());
        assert_eq!(result.raw_response(), VALID_LICENSE);
        assert_eq!(result.validated_data().unwrap()["name"], "JOHN SMITH");
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_errors_count_as_attempts() {
        let processor = processor(vec![
            Err(GatewayError::EmptyResponse),
            Err(GatewayError::EmptyResponse),
            Err(GatewayError::Http {
                status: 503,
                body: "overloaded".to_string(),
            }),
        ]);

        let result = processor
            .process_document(DocumentType::Resume, None)
            .await
            .unwrap();

        assert_eq!(processor.gateway().calls(), 3);
        let message = result.error_message().unwrap();
        assert!(message.starts_with("Failed after 3 attempts. Last error: Error generating response:"));
        assert!(message.contains("503"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_error_reported() {
        let processor = processor(vec![]).with_policy(RetryPolicy::new(1, Duration::ZERO));
        processor
            .gateway()
            .replies
            .lock()
            .unwrap()
            .push_back(Ok(r#"{"license_number": "D1", "issuing_state": "CA"}"#.to_string()));

        let result = processor
            .process_document(DocumentType::DrivingLicense, None)
            .await
            .unwrap();

        assert_eq!(
            result.error_message(),
            Some(
                "Failed after 1 attempts. Last error: 1 validation error for DrivingLicense\n\
                 name: field required"
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_between_attempts() {
        let processor = DocumentProcessor::new(ScriptedGateway::default(), DocumentRegistry::builtin());

        let start = tokio::time::Instant::now();
        processor
            .process_document(DocumentType::ShopReceipt, None)
            .await
            .unwrap();
        let elapsed = start.elapsed();

        // 1s after the first failure, 2s after the second, none after the last.
        assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_image_sends_prompt_only() {
        let processor = processor(vec![Ok(VALID_LICENSE.to_string())]);

        let result = processor
            .process_document(DocumentType::DrivingLicense, Some(Path::new("/no/such/license.png")))
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(*processor.gateway().images.lock().unwrap(), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_image_uses_every_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();

        let processor = processor(vec![Ok(VALID_LICENSE.to_string())])
            .with_policy(RetryPolicy::new(3, Duration::from_secs(1)));

        let start = tokio::time::Instant::now();
        let result = processor
            .process_document(DocumentType::DrivingLicense, Some(&path))
            .await
            .unwrap();

        assert_eq!(processor.gateway().calls(), 0);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(result.raw_response(), "");
        assert!(result.error_message().unwrap().starts_with(
            "Failed after 3 attempts. Last error: Error generating response: cannot prepare document image:"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_attached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("license.png");
        image::GrayImage::from_pixel(8, 8, image::Luma([128]))
            .save(&path)
            .unwrap();

        let processor = processor(vec![Ok(VALID_LICENSE.to_string())]);
        let result = processor
            .process_document(DocumentType::DrivingLicense, Some(&path))
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(*processor.gateway().images.lock().unwrap(), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_appends_previous_error() {
        let processor = processor(vec![
            Ok("{invalid json".to_string()),
            Ok(VALID_LICENSE.to_string()),
        ])
        .with_feedback(true);

        processor
            .process_document(DocumentType::DrivingLicense, None)
            .await
            .unwrap();

        let prompts = processor.gateway().prompts();
        assert!(!prompts[0].contains("### PREVIOUS ATTEMPT ###"));
        assert!(prompts[1].contains("### PREVIOUS ATTEMPT ###"));
        assert!(prompts[1].contains("Failed to parse JSON response"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_unchanged_without_feedback() {
        let processor = processor(vec![]);
        processor
            .process_document(DocumentType::DrivingLicense, None)
            .await
            .unwrap();

        let prompts = processor.gateway().prompts();
        let expected = &processor.registry().get(DocumentType::DrivingLicense).unwrap().prompt;
        assert!(prompts.iter().all(|p| p == expected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ocr_required_without_engine() {
        let mut registry = DocumentRegistry::builtin();
        registry.set_uses_ocr(DocumentType::ShopReceipt, true).unwrap();
        let processor = DocumentProcessor::new(ScriptedGateway::default(), registry);

        let err = processor
            .process_document(DocumentType::ShopReceipt, Some(Path::new("receipt.png")))
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::OcrUnavailable(DocumentType::ShopReceipt)));
        assert_eq!(processor.gateway().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ocr_text_sent_instead_of_image() {
        let mut registry = DocumentRegistry::builtin();
        registry.set_uses_ocr(DocumentType::ShopReceipt, true).unwrap();
        let span = TextSpan {
            region: [0.0, 0.0, 10.0, 0.0, 10.0, 5.0, 0.0, 5.0],
            text: "CORNER SHOP".to_string(),
            confidence: 0.98,
        };
        let processor = DocumentProcessor::new(
            ScriptedGateway::new(vec![Ok(r#"{"MerchantName": "CORNER SHOP"}"#.to_string())]),
            registry,
        )
        .with_ocr(Box::new(FixedOcr(Ok(vec![span]))));

        let result = processor
            .process_document(DocumentType::ShopReceipt, Some(Path::new("receipt.png")))
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(processor.gateway().prompts()[0].contains("### OCR TEXT ###\n"));
        assert!(processor.gateway().prompts()[0].ends_with("CORNER SHOP"));
        assert_eq!(*processor.gateway().images.lock().unwrap(), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ocr_failure_is_retried() {
        let mut registry = DocumentRegistry::builtin();
        registry.set_uses_ocr(DocumentType::ShopReceipt, true).unwrap();
        let processor = DocumentProcessor::new(ScriptedGateway::default(), registry)
            .with_ocr(Box::new(FixedOcr(Err("blurry".to_string()))));

        let result = processor
            .process_document(DocumentType::ShopReceipt, Some(Path::new("receipt.png")))
            .await
            .unwrap();

        assert_eq!(processor.gateway().calls(), 0);
        assert_eq!(
            result.error_message(),
            Some("Failed after 3 attempts. Last error: text extraction failed: recognition failed: blurry")
        );
    }
}
