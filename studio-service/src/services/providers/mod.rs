//! Generative model provider abstractions and REST implementations.
//!
//! Handlers and the orchestration layer only see the traits, so tests can
//! point the real clients at a mock server or swap in other backends.

pub mod gemini;
pub mod google_auth;
pub mod mock;
pub mod vertex;

use crate::utils::image::{to_data_url, ProductImage};
use async_trait::async_trait;
use secrecy::Secret;
use serde::Serialize;
use service_core::fallback::Transient;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No image in response")]
    NoImage,

    #[error("Content filtered")]
    ContentFiltered,
}

impl Transient for ProviderError {
    fn is_transient(&self) -> bool {
        match self {
            ProviderError::RateLimited
            | ProviderError::Network(_)
            | ProviderError::InvalidResponse(_)
            | ProviderError::NoImage => true,
            ProviderError::Api { status, .. } => *status >= 500,
            ProviderError::NotConfigured(_) | ProviderError::ContentFiltered => false,
        }
    }
}

/// Header carrying Google API keys, so keys never appear in request URLs.
pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // Error text reaches clients; the URL stays out of it
        ProviderError::Network(err.without_url().to_string())
    }
}

/// Map a non-success HTTP status to a provider error, keeping the body short.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::RateLimited;
    }
    ProviderError::Api {
        status: status.as_u16(),
        message: body.chars().take(300).collect(),
    }
}

/// An image returned by a model, still base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

impl GeneratedImage {
    pub fn data_url(&self) -> String {
        to_data_url(&self.mime_type, &self.data)
    }
}

/// Imagen edit modes, serialised to their Vertex names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditMode {
    #[serde(rename = "EDIT_MODE_DEFAULT")]
    Default,
    #[serde(rename = "EDIT_MODE_BGSWAP")]
    BackgroundSwap,
    #[serde(rename = "EDIT_MODE_INPAINT_INSERTION")]
    InpaintInsertion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaskMode {
    #[serde(rename = "MASK_MODE_BACKGROUND")]
    Background,
}

#[derive(Debug, Clone, Copy)]
pub struct EditRequest<'a> {
    pub prompt: &'a str,
    pub image: &'a ProductImage,
    pub edit_mode: EditMode,
    pub mask_mode: Option<MaskMode>,
}

/// How a Vertex call authenticates.
#[derive(Debug, Clone)]
pub enum VertexCredential {
    /// Express mode: global endpoint with the key in `x-goog-api-key`.
    ApiKey(Secret<String>),
    /// Project endpoint with an OAuth bearer token from the service account.
    ServiceAccount,
}

impl VertexCredential {
    pub fn label(&self) -> &'static str {
        match self {
            VertexCredential::ApiKey(_) => "api_key",
            VertexCredential::ServiceAccount => "service_account",
        }
    }
}

/// Gemini Developer API.
#[async_trait]
pub trait GeminiProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn generate_text(
        &self,
        model: &str,
        prompt: &str,
        image: Option<&ProductImage>,
    ) -> Result<String, ProviderError>;

    /// Request `IMAGE` + `TEXT` output and return the first inline image.
    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        image: &ProductImage,
    ) -> Result<GeneratedImage, ProviderError>;

    /// Model names without the `models/` prefix.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;
}

/// Vertex AI (Imagen `:predict` and Gemini `:generateContent`).
#[async_trait]
pub trait VertexProvider: Send + Sync {
    fn has_service_account(&self) -> bool;

    async fn edit_image(
        &self,
        model: &str,
        request: &EditRequest<'_>,
        credential: &VertexCredential,
    ) -> Result<GeneratedImage, ProviderError>;

    /// Subject-reference generation; `prompt` must already carry the `[1]` marker.
    async fn subject_image(
        &self,
        model: &str,
        prompt: &str,
        image: &ProductImage,
        credential: &VertexCredential,
    ) -> Result<GeneratedImage, ProviderError>;

    /// Image output through the service-account `:generateContent` endpoint.
    async fn generate_content_image(
        &self,
        model: &str,
        prompt: &str,
        image: &ProductImage,
    ) -> Result<GeneratedImage, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ProviderError::RateLimited.is_transient());
        assert!(ProviderError::NoImage.is_transient());
        assert!(ProviderError::Api { status: 503, message: String::new() }.is_transient());
        assert!(!ProviderError::Api { status: 400, message: String::new() }.is_transient());
        assert!(!ProviderError::ContentFiltered.is_transient());
        assert!(!ProviderError::NotConfigured("x".into()).is_transient());
    }

    #[test]
    fn status_error_maps_429_and_truncates_body() {
        assert!(matches!(
            status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, ""),
            ProviderError::RateLimited
        ));
        let long = "x".repeat(1000);
        match status_error(reqwest::StatusCode::BAD_REQUEST, &long) {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.len(), 300);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn edit_modes_use_vertex_names() {
        assert_eq!(
            serde_json::to_value(EditMode::BackgroundSwap).unwrap(),
            "EDIT_MODE_BGSWAP"
        );
        assert_eq!(
            serde_json::to_value(MaskMode::Background).unwrap(),
            "MASK_MODE_BACKGROUND"
        );
    }
}
