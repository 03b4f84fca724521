//! Document type registry.
//!
//! Maps each [`DocumentType`] to the schema it is validated against and the
//! prompt it is extracted with. A custom prompt file may replace the
//! generated prompt for one type.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::error::ConfigError;
use crate::models::document::DocumentType;
use crate::prompt::{
    DRIVING_LICENSE_PROMPT, PromptProfile, RESUME_PROMPT, SHOP_RECEIPT_PROMPT, render_prompt,
};
use crate::schema::{DRIVING_LICENSE, RESUME, SHOP_RECEIPT, Schema};

/// Everything the processor needs to handle one document type.
#[derive(Debug, Clone)]
pub struct DocumentProfile {
    pub schema: &'static Schema,
    /// Effective prompt: generated from the schema or loaded from a file.
    pub prompt: String,
    /// Name of the custom prompt in use, if any.
    pub custom_prompt: Option<String>,
    /// Send OCR text instead of the image.
    pub uses_ocr: bool,
}

impl DocumentProfile {
    fn generated(schema: &'static Schema, profile: &PromptProfile) -> Self {
        Self {
            schema,
            prompt: render_prompt(schema, profile),
            custom_prompt: None,
            uses_ocr: false,
        }
    }
}

/// Registered document types.
#[derive(Debug, Clone)]
pub struct DocumentRegistry {
    profiles: HashMap<DocumentType, DocumentProfile>,
}

impl DocumentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Registry with every built-in document type.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            DocumentType::DrivingLicense,
            DocumentProfile::generated(&DRIVING_LICENSE, &DRIVING_LICENSE_PROMPT),
        );
        registry.register(
            DocumentType::ShopReceipt,
            DocumentProfile::generated(&SHOP_RECEIPT, &SHOP_RECEIPT_PROMPT),
        );
        registry.register(
            DocumentType::Resume,
            DocumentProfile::generated(&RESUME, &RESUME_PROMPT),
        );
        registry
    }

    /// Add or replace a profile.
    pub fn register(&mut self, document_type: DocumentType, profile: DocumentProfile) {
        self.profiles.insert(document_type, profile);
    }

    /// Look up a document type.
    pub fn get(&self, document_type: DocumentType) -> Result<&DocumentProfile, ConfigError> {
        self.profiles
            .get(&document_type)
            .ok_or(ConfigError::Unregistered(document_type))
    }

    fn get_mut(&mut self, document_type: DocumentType) -> Result<&mut DocumentProfile, ConfigError> {
        self.profiles
            .get_mut(&document_type)
            .ok_or(ConfigError::Unregistered(document_type))
    }

    /// Replace the generated prompt of a type with caller-supplied text.
    pub fn set_custom_prompt(
        &mut self,
        document_type: DocumentType,
        name: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let profile = self.get_mut(document_type)?;
        profile.prompt = prompt.into();
        profile.custom_prompt = Some(name.into());
        Ok(())
    }

    /// Load a custom prompt from a text file.
    ///
    /// The content is trimmed and the file stem becomes the prompt name,
    /// which is returned.
    pub fn load_custom_prompt(
        &mut self,
        document_type: DocumentType,
        path: &Path,
    ) -> Result<String, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::PromptSource {
            path: path.to_path_buf(),
            source,
        })?;

        let prompt = content.trim();
        if prompt.is_empty() {
            return Err(ConfigError::EmptyPrompt(path.to_path_buf()));
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());

        self.set_custom_prompt(document_type, name.clone(), prompt)?;
        info!("Loaded custom prompt '{}' for {}", name, document_type);
        Ok(name)
    }

    /// Mark a type as needing OCR text.
    pub fn set_uses_ocr(&mut self, document_type: DocumentType, uses_ocr: bool) -> Result<(), ConfigError> {
        self.get_mut(document_type)?.uses_ocr = uses_ocr;
        Ok(())
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
