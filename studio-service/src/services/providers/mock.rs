//! Scripted provider implementations for testing.

use super::{
    EditMode, EditRequest, GeminiProvider, GeneratedImage, ProviderError, VertexCredential,
    VertexProvider,
};
use crate::utils::image::{ProductImage, MIME_PNG};
use async_trait::async_trait;
use std::sync::Mutex;

/// Base64 of `mock`.
pub const MOCK_IMAGE_DATA: &str = "bW9jaw==";

fn mock_image() -> GeneratedImage {
    GeneratedImage {
        mime_type: MIME_PNG.to_string(),
        data: MOCK_IMAGE_DATA.to_string(),
    }
}

fn mock_failure(model: &str) -> ProviderError {
    ProviderError::Api {
        status: 400,
        message: format!("mock failure for {}", model),
    }
}

fn record(calls: &Mutex<Vec<String>>, call: String) {
    if let Ok(mut calls) = calls.lock() {
        calls.push(call);
    }
}

/// Mock Gemini provider. Models listed as failing return a permanent error.
pub struct MockGeminiProvider {
    configured: bool,
    text_reply: String,
    failing_models: Vec<String>,
    models: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockGeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGeminiProvider {
    pub fn new() -> Self {
        Self {
            configured: true,
            text_reply: "{}".to_string(),
            failing_models: Vec::new(),
            models: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn with_text(mut self, reply: &str) -> Self {
        self.text_reply = reply.to_string();
        self
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn failing(mut self, model: &str) -> Self {
        self.failing_models.push(model.to_string());
        self
    }

    /// Calls made so far, as `"<method>:<model>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn check(&self, model: &str) -> Result<(), ProviderError> {
        if !self.configured {
            return Err(ProviderError::NotConfigured("mock gemini disabled".to_string()));
        }
        if self.failing_models.iter().any(|m| m == model) {
            return Err(mock_failure(model));
        }
        Ok(())
    }
}

#[async_trait]
impl GeminiProvider for MockGeminiProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate_text(
        &self,
        model: &str,
        _prompt: &str,
        _image: Option<&ProductImage>,
    ) -> Result<String, ProviderError> {
        record(&self.calls, format!("generate_text:{}", model));
        self.check(model)?;
        Ok(self.text_reply.clone())
    }

    async fn generate_image(
        &self,
        model: &str,
        _prompt: &str,
        _image: &ProductImage,
    ) -> Result<GeneratedImage, ProviderError> {
        record(&self.calls, format!("generate_image:{}", model));
        self.check(model)?;
        Ok(mock_image())
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        if !self.configured {
            return Err(ProviderError::NotConfigured("mock gemini disabled".to_string()));
        }
        Ok(self.models.clone())
    }
}

/// Mock Vertex provider with per-model and per-edit-mode failures.
pub struct MockVertexProvider {
    service_account: bool,
    failing_models: Vec<String>,
    failing_modes: Vec<EditMode>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockVertexProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVertexProvider {
    pub fn new() -> Self {
        Self {
            service_account: false,
            failing_models: Vec::new(),
            failing_modes: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_service_account(mut self) -> Self {
        self.service_account = true;
        self
    }

    pub fn failing(mut self, model: &str) -> Self {
        self.failing_models.push(model.to_string());
        self
    }

    pub fn failing_mode(mut self, mode: EditMode) -> Self {
        self.failing_modes.push(mode);
        self
    }

    /// Calls made so far, as `"<method>:<model>[:<detail>]"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn check(&self, model: &str) -> Result<(), ProviderError> {
        if self.failing_models.iter().any(|m| m == model) {
            return Err(mock_failure(model));
        }
        Ok(())
    }
}

#[async_trait]
impl VertexProvider for MockVertexProvider {
    fn has_service_account(&self) -> bool {
        self.service_account
    }

    async fn edit_image(
        &self,
        model: &str,
        request: &EditRequest<'_>,
        credential: &VertexCredential,
    ) -> Result<GeneratedImage, ProviderError> {
        record(
            &self.calls,
            format!("edit_image:{}:{:?}:{}", model, request.edit_mode, credential.label()),
        );
        self.check(model)?;
        if self.failing_modes.contains(&request.edit_mode) {
            return Err(mock_failure(model));
        }
        Ok(mock_image())
    }

    async fn subject_image(
        &self,
        model: &str,
        _prompt: &str,
        _image: &ProductImage,
        credential: &VertexCredential,
    ) -> Result<GeneratedImage, ProviderError> {
        record(
            &self.calls,
            format!("subject_image:{}:{}", model, credential.label()),
        );
        self.check(model)?;
        Ok(mock_image())
    }

    async fn generate_content_image(
        &self,
        model: &str,
        _prompt: &str,
        _image: &ProductImage,
    ) -> Result<GeneratedImage, ProviderError> {
        record(&self.calls, format!("generate_content_image:{}", model));
        if !self.service_account {
            return Err(ProviderError::NotConfigured(
                "No service account configured".to_string(),
            ));
        }
        self.check(model)?;
        Ok(mock_image())
    }
}
