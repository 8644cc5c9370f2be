//! Vertex AI provider: Imagen 3 `:predict` edits and subject references, and
//! Gemini image output through the project-scoped `:generateContent` endpoint.

use super::gemini::{GenerateContentRequest, GenerateContentResponse};
use super::google_auth::ServiceAccountAuth;
use super::{
    status_error, API_KEY_HEADER, EditMode, EditRequest, GeneratedImage, MaskMode, ProviderError, VertexCredential,
    VertexProvider,
};
use crate::utils::image::{ProductImage, MIME_PNG};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct VertexConfig {
    /// Regional base URL; `{location}` is substituted.
    pub base_url: String,
    /// Global base URL for express-mode API keys.
    pub express_base_url: String,
    pub location: String,
}

/// How an outgoing request is authenticated.
enum RequestAuth {
    ApiKey(String),
    Bearer(String),
}

pub struct VertexClient {
    config: VertexConfig,
    client: Client,
    auth: Option<Arc<ServiceAccountAuth>>,
}

impl VertexClient {
    pub fn new(config: VertexConfig, client: Client, auth: Option<Arc<ServiceAccountAuth>>) -> Self {
        Self {
            config,
            client,
            auth,
        }
    }

    fn regional_base(&self) -> String {
        self.config
            .base_url
            .replace("{location}", &self.config.location)
            .trim_end_matches('/')
            .to_string()
    }

    /// Resolve the endpoint URL and request authentication for a model call.
    async fn endpoint(
        &self,
        model: &str,
        method: &str,
        credential: &VertexCredential,
    ) -> Result<(String, RequestAuth), ProviderError> {
        match credential {
            VertexCredential::ApiKey(key) => Ok((
                format!(
                    "{}/publishers/google/models/{}:{}",
                    self.config.express_base_url.trim_end_matches('/'),
                    model,
                    method
                ),
                RequestAuth::ApiKey(key.expose_secret().clone()),
            )),
            VertexCredential::ServiceAccount => {
                let auth = self.auth.as_ref().ok_or_else(|| {
                    ProviderError::NotConfigured("No service account configured".to_string())
                })?;
                let token = auth
                    .access_token()
                    .await
                    .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;
                let url = format!(
                    "{}/projects/{}/locations/{}/publishers/google/models/{}:{}",
                    self.regional_base(),
                    auth.project_id(),
                    self.config.location,
                    model,
                    method
                );
                Ok((url, RequestAuth::Bearer(token)))
            }
        }
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        credential: &VertexCredential,
        body: &B,
    ) -> Result<R, ProviderError> {
        let (url, auth) = self.endpoint(model, method, credential).await?;

        tracing::debug!(
            model,
            method,
            credential = credential.label(),
            "Sending request to Vertex AI"
        );

        let request = self.client.post(&url).json(body);
        let request = match auth {
            RequestAuth::ApiKey(key) => request.header(API_KEY_HEADER, key),
            RequestAuth::Bearer(token) => request.bearer_auth(token),
        };
        let response = request.send().await?;

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
impl VertexProvider for VertexClient {
    fn has_service_account(&self) -> bool {
        self.auth.is_some()
    }

    async fn edit_image(
        &self,
        model: &str,
        request: &EditRequest<'_>,
        credential: &VertexCredential,
    ) -> Result<GeneratedImage, ProviderError> {
        let body = PredictRequest::edit(request);
        let response: PredictResponse = self.post(model, "predict", credential, &body).await?;
        response.first_image()
    }

    async fn subject_image(
        &self,
        model: &str,
        prompt: &str,
        image: &ProductImage,
        credential: &VertexCredential,
    ) -> Result<GeneratedImage, ProviderError> {
        let body = PredictRequest::subject(prompt, image);
        let response: PredictResponse = self.post(model, "predict", credential, &body).await?;
        response.first_image()
    }

    async fn generate_content_image(
        &self,
        model: &str,
        prompt: &str,
        image: &ProductImage,
    ) -> Result<GeneratedImage, ProviderError> {
        let body = GenerateContentRequest::new(prompt, Some(image), true);
        let response: GenerateContentResponse = self
            .post(model, "generateContent", &VertexCredential::ServiceAccount, &body)
            .await?;
        response.first_image()
    }
}

// ============================================================================
// :predict Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PredictInstance<'a> {
    Edit {
        prompt: &'a str,
        #[serde(rename = "referenceImages")]
        reference_images: Vec<ReferenceImage<'a>>,
    },
    Subject {
        prompt: &'a str,
        #[serde(rename = "subjectReferenceImages")]
        subject_reference_images: Vec<SubjectReference<'a>>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceImage<'a> {
    reference_type: &'static str,
    reference_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_image: Option<ImageBytes<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mask_image_config: Option<MaskImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubjectReference<'a> {
    subject_description: &'static str,
    subject_image: ImageBytes<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageBytes<'a> {
    bytes_base64_encoded: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MaskImageConfig {
    mask_mode: MaskMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    edit_mode: Option<EditMode>,
    sample_count: u32,
}

impl<'a> PredictRequest<'a> {
    fn edit(request: &EditRequest<'a>) -> Self {
        let mut reference_images = vec![ReferenceImage {
            reference_type: "REFERENCE_TYPE_RAW",
            reference_id: 1,
            reference_image: Some(ImageBytes {
                bytes_base64_encoded: request.image.base64(),
            }),
            mask_image_config: None,
        }];

        if let Some(mask_mode) = request.mask_mode {
            reference_images.push(ReferenceImage {
                reference_type: "REFERENCE_TYPE_MASK",
                reference_id: 2,
                reference_image: None,
                mask_image_config: Some(MaskImageConfig { mask_mode }),
            });
        }

        Self {
            instances: vec![PredictInstance::Edit {
                prompt: request.prompt,
                reference_images,
            }],
            parameters: PredictParameters {
                edit_mode: Some(request.edit_mode),
                sample_count: 1,
            },
        }
    }

    fn subject(prompt: &'a str, image: &'a ProductImage) -> Self {
        Self {
            instances: vec![PredictInstance::Subject {
                prompt,
                subject_reference_images: vec![SubjectReference {
                    subject_description: "[1]",
                    subject_image: ImageBytes {
                        bytes_base64_encoded: image.base64(),
                    },
                }],
            }],
            parameters: PredictParameters {
                edit_mode: None,
                sample_count: 1,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

impl PredictResponse {
    fn first_image(self) -> Result<GeneratedImage, ProviderError> {
        let mut filtered = false;
        for prediction in self.predictions {
            match prediction.bytes_base64_encoded {
                Some(data) if !data.is_empty() => {
                    return Ok(GeneratedImage {
                        mime_type: prediction.mime_type.unwrap_or_else(|| MIME_PNG.to_string()),
                        data,
                    })
                }
                _ => filtered |= prediction.rai_filtered_reason.is_some(),
            }
        }
        if filtered {
            Err(ProviderError::ContentFiltered)
        } else {
            Err(ProviderError::NoImage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn image() -> ProductImage {
        ProductImage::parse("data:image/jpeg;base64,aGVsbG8=").unwrap()
    }

    fn express_client(server: &MockServer) -> VertexClient {
        VertexClient::new(
            VertexConfig {
                base_url: format!("{}/{{location}}", server.uri()),
                express_base_url: server.uri(),
                location: "us-central1".to_string(),
            },
            Client::new(),
            None,
        )
    }

    #[test]
    fn edit_request_with_background_mask() {
        let image = image();
        let request = EditRequest {
            prompt: "white background",
            image: &image,
            edit_mode: EditMode::InpaintInsertion,
            mask_mode: Some(MaskMode::Background),
        };
        let value = serde_json::to_value(PredictRequest::edit(&request)).unwrap();

        assert_eq!(value["instances"][0]["prompt"], "white background");
        let refs = &value["instances"][0]["referenceImages"];
        assert_eq!(refs[0]["referenceType"], "REFERENCE_TYPE_RAW");
        assert_eq!(refs[0]["referenceId"], 1);
        assert_eq!(refs[0]["referenceImage"]["bytesBase64Encoded"], "aGVsbG8=");
        assert_eq!(refs[1]["referenceType"], "REFERENCE_TYPE_MASK");
        assert_eq!(refs[1]["maskImageConfig"]["maskMode"], "MASK_MODE_BACKGROUND");
        assert_eq!(value["parameters"]["editMode"], "EDIT_MODE_INPAINT_INSERTION");
        assert_eq!(value["parameters"]["sampleCount"], 1);
    }

    #[test]
    fn subject_request_shape() {
        let image = image();
        let value = serde_json::to_value(PredictRequest::subject("[1] on a desk", &image)).unwrap();
        let instance = &value["instances"][0];
        assert_eq!(instance["prompt"], "[1] on a desk");
        assert_eq!(instance["subjectReferenceImages"][0]["subjectDescription"], "[1]");
        assert_eq!(
            instance["subjectReferenceImages"][0]["subjectImage"]["bytesBase64Encoded"],
            "aGVsbG8="
        );
        assert!(value["parameters"].get("editMode").is_none());
    }

    #[tokio::test]
    async fn express_key_uses_global_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publishers/google/models/imagen-3.0-capability-001:predict"))
            .and(header("x-goog-api-key", "vertex-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"bytesBase64Encoded": "b3V0", "mimeType": "image/png"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = image();
        let request = EditRequest {
            prompt: "studio",
            image: &image,
            edit_mode: EditMode::BackgroundSwap,
            mask_mode: None,
        };
        let result = express_client(&server)
            .edit_image(
                "imagen-3.0-capability-001",
                &request,
                &VertexCredential::ApiKey(Secret::new("vertex-key".to_string())),
            )
            .await
            .unwrap();

        assert_eq!(result.data_url(), "data:image/png;base64,b3V0");
    }

    #[tokio::test]
    async fn empty_predictions_are_no_image_or_filtered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publishers/google/models/empty:predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/publishers/google/models/filtered:predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"raiFilteredReason": "blocked"}]
            })))
            .mount(&server)
            .await;

        let client = express_client(&server);
        let image = image();
        let key = VertexCredential::ApiKey(Secret::new("k".to_string()));

        assert!(matches!(
            client.subject_image("empty", "p", &image, &key).await,
            Err(ProviderError::NoImage)
        ));
        assert!(matches!(
            client.subject_image("filtered", "p", &image, &key).await,
            Err(ProviderError::ContentFiltered)
        ));
    }

    #[tokio::test]
    async fn service_account_without_auth_is_not_configured() {
        let server = MockServer::start().await;
        let client = express_client(&server);
        assert!(!client.has_service_account());
        assert!(matches!(
            client.generate_content_image("gemini-3-pro-image-preview", "p", &image()).await,
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn service_account_uses_project_endpoint_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "sa-token",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(
                "/us-central1/projects/studio-test/locations/us-central1/publishers/google/models/gemini-3-pro-image-preview:generateContent",
            ))
            .and(header("authorization", "Bearer sa-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "Z2Vu"}}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = json!({
            "project_id": "studio-test",
            "client_email": "studio@studio-test.iam.gserviceaccount.com",
            "private_key": include_str!("../../../tests/fixtures/test_rsa_key.pem"),
            "token_uri": format!("{}/token", server.uri()),
        })
        .to_string();
        let auth = ServiceAccountAuth::from_json(&credentials, Client::new()).unwrap();

        let client = VertexClient::new(
            VertexConfig {
                base_url: format!("{}/{{location}}", server.uri()),
                express_base_url: server.uri(),
                location: "us-central1".to_string(),
            },
            Client::new(),
            Some(Arc::new(auth)),
        );

        let result = client
            .generate_content_image("gemini-3-pro-image-preview", "p", &image())
            .await
            .unwrap();
        assert_eq!(result.data, "Z2Vu");
    }
}
