use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_list_env, get_optional_env, get_parsed_env, Environment};
use service_core::error::AppError;
use service_core::fallback::FallbackPolicy;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct StudioConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub observability: ObservabilityConfig,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub generation: GenerationConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// Gemini Developer API key.
    pub api_key: Option<Secret<String>>,
    /// Vertex AI express-mode key.
    pub vertex_api_key: Option<Secret<String>>,
    /// Full service-account JSON document.
    pub service_account_json: Option<Secret<String>>,
    pub gemini_base_url: String,
    /// May contain a `{location}` placeholder.
    pub vertex_base_url: String,
    pub vertex_express_base_url: String,
    pub vertex_location: String,
}

/// Ordered fallback chains of model identifiers.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub analysis: Vec<String>,
    pub classifier: Vec<String>,
    pub imagen: Vec<String>,
    pub subject: Vec<String>,
    pub gemini_image: Vec<String>,
    pub handsfree_vertex: Vec<String>,
    pub handsfree_fallback: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub attempts_per_model: u32,
    pub retry_pause_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub max_body_bytes: usize,
    pub allowed_origins: Vec<String>,
    pub rate_limit_per_minute: u32,
}

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_VERTEX_BASE_URL: &str = "https://{location}-aiplatform.googleapis.com/v1";
const DEFAULT_VERTEX_EXPRESS_BASE_URL: &str = "https://aiplatform.googleapis.com/v1";
const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

impl StudioConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = Environment::current()?;
        let is_prod = environment.is_prod();

        let api_key = get_optional_env("GOOGLE_API_KEY").map(Secret::new);
        let vertex_api_key = get_optional_env("VERTEX_API_KEY").map(Secret::new);
        let service_account_json =
            get_optional_env("GOOGLE_APPLICATION_CREDENTIALS_JSON").map(Secret::new);

        if is_prod && api_key.is_none() && vertex_api_key.is_none() && service_account_json.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "At least one of GOOGLE_API_KEY, VERTEX_API_KEY or GOOGLE_APPLICATION_CREDENTIALS_JSON is required in production"
            )));
        }

        Ok(StudioConfig {
            common,
            environment,
            observability: ObservabilityConfig {
                log_level: get_env("LOG_LEVEL", Some("info"), false)?,
                otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
            },
            google: GoogleConfig {
                api_key,
                vertex_api_key,
                service_account_json,
                gemini_base_url: get_env("GEMINI_API_BASE_URL", Some(DEFAULT_GEMINI_BASE_URL), false)?,
                vertex_base_url: get_env("VERTEX_API_BASE_URL", Some(DEFAULT_VERTEX_BASE_URL), false)?,
                vertex_express_base_url: get_env(
                    "VERTEX_EXPRESS_BASE_URL",
                    Some(DEFAULT_VERTEX_EXPRESS_BASE_URL),
                    false,
                )?,
                vertex_location: get_env("VERTEX_LOCATION", Some("us-central1"), false)?,
            },
            models: ModelConfig {
                analysis: get_list_env("STUDIO_ANALYSIS_MODELS", &["gemini-2.0-flash"]),
                classifier: get_list_env(
                    "STUDIO_CLASSIFIER_MODELS",
                    &["gemini-2.0-flash-exp", "gemini-2.0-flash"],
                ),
                imagen: get_list_env(
                    "STUDIO_IMAGEN_MODELS",
                    &["imagen-3.0-capability-001", "imagen-3.0-generate-002"],
                ),
                subject: get_list_env("STUDIO_SUBJECT_MODELS", &["imagen-3.0-capability-001"]),
                gemini_image: get_list_env(
                    "STUDIO_GEMINI_IMAGE_MODELS",
                    &[
                        "gemini-2.5-flash-preview-05-20",
                        "gemini-2.0-flash-exp",
                        "gemini-2.0-flash",
                    ],
                ),
                handsfree_vertex: get_list_env(
                    "STUDIO_HANDSFREE_VERTEX_MODELS",
                    &["gemini-3-pro-image-preview", "gemini-2.0-flash-exp"],
                ),
                handsfree_fallback: get_list_env(
                    "STUDIO_HANDSFREE_FALLBACK_MODELS",
                    &["gemini-2.0-flash-exp", "gemini-2.0-flash"],
                ),
            },
            generation: GenerationConfig {
                attempts_per_model: get_parsed_env("STUDIO_ATTEMPTS_PER_MODEL", 2),
                retry_pause_ms: get_parsed_env("STUDIO_RETRY_PAUSE_MS", 1000),
                request_timeout_secs: get_parsed_env("STUDIO_REQUEST_TIMEOUT_SECS", 120),
            },
            http: HttpConfig {
                max_body_bytes: get_parsed_env("STUDIO_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
                allowed_origins: get_list_env("STUDIO_ALLOWED_ORIGINS", &["*"]),
                rate_limit_per_minute: get_parsed_env("STUDIO_RATE_LIMIT_PER_MINUTE", 60),
            },
        })
    }
}

impl GoogleConfig {
    pub fn has_gemini_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.expose_secret().is_empty())
    }

    pub fn has_vertex_key(&self) -> bool {
        self.vertex_api_key.as_ref().is_some_and(|k| !k.expose_secret().is_empty())
    }

    pub fn has_service_account(&self) -> bool {
        self.service_account_json.is_some()
    }
}

impl GenerationConfig {
    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy::new(self.attempts_per_model, Duration::from_millis(self.retry_pause_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
