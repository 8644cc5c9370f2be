//! Gemini Developer API provider.
//!
//! Implements text and image generation with `models/{model}:generateContent`
//! and model discovery with `models`. The request/response types below are
//! shared with the Vertex `generateContent` endpoint.

use super::{status_error, GeminiProvider, GeneratedImage, ProviderError, API_KEY_HEADER};
use crate::utils::image::ProductImage;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
}

pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("GOOGLE_API_KEY is not set".to_string()))
    }

    /// Build the API URL for the given model and method. The key travels in a header.
    fn api_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let api_key = self.api_key()?;
        let url = self.api_url(model, "generateContent");

        tracing::debug!(model, "Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GeminiProvider for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn generate_text(
        &self,
        model: &str,
        prompt: &str,
        image: Option<&ProductImage>,
    ) -> Result<String, ProviderError> {
        let request = GenerateContentRequest::new(prompt, image, false);
        let response = self.generate_content(model, &request).await?;
        response.text()
    }

    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        image: &ProductImage,
    ) -> Result<GeneratedImage, ProviderError> {
        let request = GenerateContentRequest::new(prompt, Some(image), true);
        let response = self.generate_content(model, &request).await?;
        response.first_image()
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let api_key = self.api_key()?;
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_text));
        }

        let listing: ListModelsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse model list: {}", e)))?;

        Ok(listing
            .models
            .into_iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}

// ============================================================================
// generateContent Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub(crate) fn new(prompt: &str, image: Option<&ProductImage>, want_image: bool) -> Self {
        let mut parts = vec![Part::text(prompt)];
        if let Some(image) = image {
            parts.push(Part::inline(image.mime_type(), image.base64()));
        }

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: want_image.then(|| GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    fn inline(mime_type: &str, data: &str) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: Some(mime_type.to_string()),
                data: data.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn is_filtered(&self) -> bool {
        let blocked = self
            .prompt_feedback
            .as_ref()
            .is_some_and(|f| f.block_reason.is_some());
        let safety_stop = self
            .candidates
            .iter()
            .any(|c| matches!(c.finish_reason.as_deref(), Some("SAFETY") | Some("PROHIBITED_CONTENT")));
        blocked || safety_stop
    }

    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    /// Concatenated text of all returned parts.
    pub(crate) fn text(&self) -> Result<String, ProviderError> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if !text.trim().is_empty() {
            return Ok(text);
        }
        if self.is_filtered() {
            return Err(ProviderError::ContentFiltered);
        }
        Err(ProviderError::InvalidResponse("empty text response".to_string()))
    }

    pub(crate) fn first_image(&self) -> Result<GeneratedImage, ProviderError> {
        let image = self
            .parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| !d.data.is_empty());

        match image {
            Some(data) => Ok(GeneratedImage {
                mime_type: data
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "image/png".to_string()),
                data: data.data.clone(),
            }),
            None if self.is_filtered() => Err(ProviderError::ContentFiltered),
            None => Err(ProviderError::NoImage),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> GeminiClient {
        GeminiClient::new(
            GeminiConfig {
                api_key: key.map(|k| Secret::new(k.to_string())),
                base_url: server.uri(),
            },
            Client::new(),
        )
    }

    fn image() -> ProductImage {
        ProductImage::parse("data:image/png;base64,aGVsbG8=").unwrap()
    }

    #[test]
    fn request_shape_for_image_output() {
        let request = GenerateContentRequest::new("make it pop", Some(&image()), true);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "make it pop");
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["data"], "aGVsbG8=");
        assert_eq!(
            value["generationConfig"]["responseModalities"],
            json!(["IMAGE", "TEXT"])
        );

        let text_only = serde_json::to_value(GenerateContentRequest::new("hi", None, false)).unwrap();
        assert!(text_only.get("generationConfig").is_none());
        assert_eq!(text_only["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn response_text_and_image_extraction() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here you go"},
                    {"inlineData": {"mimeType": "image/jpeg", "data": "Zm9v"}}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(response.text().unwrap(), "Here you go");
        let image = response.first_image().unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data_url(), "data:image/jpeg;base64,Zm9v");
    }

    #[test]
    fn safety_stop_is_content_filtered() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert!(matches!(response.first_image(), Err(ProviderError::ContentFiltered)));

        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"content": {"parts": [{"text": "no"}]}}]}))
                .unwrap();
        assert!(matches!(response.first_image(), Err(ProviderError::NoImage)));
    }

    #[tokio::test]
    async fn generate_text_calls_model_endpoint_with_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "{\"ok\":true}"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let text = client
            .generate_text("gemini-2.0-flash", "describe", Some(&image()))
            .await
            .unwrap();
        assert_eq!(text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn rate_limit_and_server_errors_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/busy:generateContent"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/broken:generateContent"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k"));
        assert!(matches!(
            client.generate_image("busy", "p", &image()).await,
            Err(ProviderError::RateLimited)
        ));
        match client.generate_image("broken", "p", &image()).await {
            Err(ProviderError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let server = MockServer::start().await;
        let client = client_for(&server, None);
        assert!(!client.is_configured());
        assert!(matches!(
            client.generate_text("m", "p", None).await,
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn network_errors_do_not_echo_the_key() {
        let client = GeminiClient::new(
            GeminiConfig {
                api_key: Some(Secret::new("secret-key".to_string())),
                base_url: "http://127.0.0.1:1".to_string(),
            },
            Client::new(),
        );

        let err = client.generate_text("m", "p", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert!(!err.to_string().contains("secret-key"));

        let err = client.list_models().await.unwrap_err();
        assert!(!err.to_string().contains("secret-key"));
    }

    #[tokio::test]
    async fn list_models_strips_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("x-goog-api-key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "models/gemini-2.0-flash"}, {"name": "models/imagen-3.0-generate-002"}]
            })))
            .mount(&server)
            .await;

        let models = client_for(&server, Some("k")).list_models().await.unwrap();
        assert_eq!(models, vec!["gemini-2.0-flash", "imagen-3.0-generate-002"]);
    }
}
