#![allow(dead_code)]

use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::{Config, Environment};
use studio_service::config::{
    GenerationConfig, GoogleConfig, HttpConfig, ModelConfig, ObservabilityConfig, StudioConfig,
};
use studio_service::startup::Application;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const IMAGEN_MODEL: &str = "imagen-test";
pub const SUBJECT_MODEL: &str = "imagen-subject-test";
pub const GEMINI_IMAGE_MODEL: &str = "gemini-image-test";
pub const GEMINI_TEXT_MODEL: &str = "gemini-text-test";
pub const CLASSIFIER_MODEL: &str = "gemini-classifier-test";
pub const FLASH_MODEL: &str = "gemini-flash-test";
pub const VERTEX_CONTENT_MODEL: &str = "vertex-image-test";

/// Base64 of `hello`, wrapped as a PNG data URL.
pub const SAMPLE_IMAGE: &str = "data:image/png;base64,aGVsbG8=";
/// What the mocked generators return.
pub const GENERATED_B64: &str = "Z2VuZXJhdGVk";

pub struct Keys {
    pub google_api_key: Option<&'static str>,
    pub vertex_api_key: Option<&'static str>,
}

impl Keys {
    pub fn all() -> Self {
        Self {
            google_api_key: Some("test-google-key"),
            vertex_api_key: Some("test-vertex-key"),
        }
    }

    pub fn none() -> Self {
        Self {
            google_api_key: None,
            vertex_api_key: None,
        }
    }

    pub fn gemini_only() -> Self {
        Self {
            google_api_key: Some("test-google-key"),
            vertex_api_key: None,
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    /// Stands in for both the Gemini and Vertex REST APIs.
    pub google: MockServer,
}

fn secret(value: Option<&str>) -> Option<Secret<String>> {
    value.map(|v| Secret::new(v.to_string()))
}

fn models(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

pub fn test_config(google_uri: &str, keys: &Keys) -> StudioConfig {
    StudioConfig {
        common: Config { port: 0 },
        environment: Environment::Dev,
        observability: ObservabilityConfig {
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
        google: GoogleConfig {
            api_key: secret(keys.google_api_key),
            vertex_api_key: secret(keys.vertex_api_key),
            service_account_json: None,
            gemini_base_url: google_uri.to_string(),
            vertex_base_url: format!("{}/{{location}}", google_uri),
            vertex_express_base_url: google_uri.to_string(),
            vertex_location: "us-central1".to_string(),
        },
        models: ModelConfig {
            analysis: models(GEMINI_TEXT_MODEL),
            classifier: models(CLASSIFIER_MODEL),
            imagen: models(IMAGEN_MODEL),
            subject: models(SUBJECT_MODEL),
            gemini_image: models(GEMINI_IMAGE_MODEL),
            handsfree_vertex: models(VERTEX_CONTENT_MODEL),
            handsfree_fallback: models(FLASH_MODEL),
        },
        generation: GenerationConfig {
            attempts_per_model: 1,
            retry_pause_ms: 0,
            request_timeout_secs: 10,
        },
        http: HttpConfig {
            max_body_bytes: 1024 * 1024,
            allowed_origins: vec!["*".to_string()],
            rate_limit_per_minute: 1000,
        },
    }
}

/// Service-account credentials whose token endpoint is the mock server.
pub fn service_account_json(google_uri: &str) -> String {
    json!({
        "project_id": "studio-test",
        "client_email": "studio@studio-test.iam.gserviceaccount.com",
        "private_key": include_str!("../fixtures/test_rsa_key.pem"),
        "token_uri": format!("{}/token", google_uri),
    })
    .to_string()
}

/// Project-scoped Vertex path used with service-account auth.
pub fn vertex_project_path(model: &str, method: &str) -> String {
    format!(
        "/us-central1/projects/studio-test/locations/us-central1/publishers/google/models/{}:{}",
        model, method
    )
}

impl TestApp {
    /// App with a service account in addition to the given keys.
    pub async fn spawn_with_service_account(keys: Keys) -> Self {
        let google = MockServer::start().await;
        let mut config = test_config(&google.uri(), &keys);
        config.google.service_account_json = Some(Secret::new(service_account_json(&google.uri())));
        let app = Self::spawn_with_config(config, google).await;
        app.mock_service_account_token().await;
        app
    }

    pub async fn mock_service_account_token(&self) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "sa-token",
                "expires_in": 3600
            })))
            .mount(&self.google)
            .await;
    }

    pub async fn spawn() -> Self {
        Self::spawn_with(Keys::all()).await
    }

    pub async fn spawn_with(keys: Keys) -> Self {
        let google = MockServer::start().await;
        Self::spawn_with_config(test_config(&google.uri(), &keys), google).await
    }

    pub async fn spawn_with_config(config: StudioConfig, google: MockServer) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        wait_until_healthy(&client, &address).await;

        Self {
            address,
            port,
            client,
            google,
        }
    }

    pub async fn post_json(&self, route: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, route))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn get(&self, route: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, route))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Imagen `:predict` on the express endpoint returns an image.
    pub async fn mock_imagen_success(&self, model: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/publishers/google/models/{}:predict", model)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"bytesBase64Encoded": GENERATED_B64, "mimeType": "image/png"}]
            })))
            .mount(&self.google)
            .await;
    }

    pub async fn mock_imagen_failure(&self, model: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/publishers/google/models/{}:predict", model)))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&self.google)
            .await;
    }

    /// Gemini `generateContent` returns an inline image.
    pub async fn mock_gemini_image(&self, model: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [
                    {"text": "here you go"},
                    {"inlineData": {"mimeType": "image/png", "data": GENERATED_B64}}
                ]}}]
            })))
            .mount(&self.google)
            .await;
    }

    /// Gemini `generateContent` returns text.
    pub async fn mock_gemini_text(&self, model: &str, text: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": text}]}, "finishReason": "STOP"}]
            })))
            .mount(&self.google)
            .await;
    }

    pub async fn mock_gemini_failure(&self, model: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream error"))
            .mount(&self.google)
            .await;
    }
}

pub fn generated_data_url() -> String {
    format!("data:image/png;base64,{}", GENERATED_B64)
}

async fn wait_until_healthy(client: &reqwest::Client, address: &str) {
    for _ in 0..50 {
        if let Ok(response) = client.get(format!("{}/health", address)).send().await {
            if response.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("studio-service did not become healthy at {}", address);
}
