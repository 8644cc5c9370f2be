use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_list_env, get_optional_env, get_parsed_env, Environment};
use service_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub observability: ObservabilityConfig,
    pub lemonsqueezy: LemonSqueezyConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LemonSqueezyConfig {
    /// Hosted checkout base; the variant id is appended as a path segment.
    pub checkout_base_url: String,
    pub success_url: String,
    /// Webhook signatures are not checked when unset.
    pub webhook_secret: Option<Secret<String>>,
    pub store_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub allowed_origins: Vec<String>,
}

const DEFAULT_CHECKOUT_BASE_URL: &str = "https://volla.lemonsqueezy.com/checkout/buy";
const DEFAULT_SUCCESS_URL: &str = "https://www.volla.app/?payment=success";
const DEFAULT_STORE_ID: u64 = 271817;

impl CheckoutConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = Environment::current()?;

        Ok(CheckoutConfig {
            common,
            environment,
            observability: ObservabilityConfig {
                log_level: get_env("LOG_LEVEL", Some("info"), false)?,
                otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
            },
            lemonsqueezy: LemonSqueezyConfig {
                checkout_base_url: get_env(
                    "LEMONSQUEEZY_CHECKOUT_BASE_URL",
                    Some(DEFAULT_CHECKOUT_BASE_URL),
                    false,
                )?,
                success_url: get_env("LEMONSQUEEZY_SUCCESS_URL", Some(DEFAULT_SUCCESS_URL), false)?,
                webhook_secret: get_optional_env("LEMONSQUEEZY_WEBHOOK_SECRET").map(Secret::new),
                store_id: get_parsed_env("LEMONSQUEEZY_STORE_ID", DEFAULT_STORE_ID),
            },
            http: HttpConfig {
                allowed_origins: get_list_env("CHECKOUT_ALLOWED_ORIGINS", &["*"]),
            },
        })
    }
}

impl LemonSqueezyConfig {
    pub fn verifies_signatures(&self) -> bool {
        self.webhook_secret
            .as_ref()
            .is_some_and(|s| !s.expose_secret().is_empty())
    }
}
