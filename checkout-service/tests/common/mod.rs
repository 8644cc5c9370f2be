#![allow(dead_code)]

use checkout_service::config::{CheckoutConfig, HttpConfig, LemonSqueezyConfig, ObservabilityConfig};
use checkout_service::startup::Application;
use secrecy::Secret;
use service_core::config::{Config, Environment};
use service_core::utils::signature::sign_hex;

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

pub fn test_config(webhook_secret: Option<&str>) -> CheckoutConfig {
    CheckoutConfig {
        common: Config { port: 0 },
        environment: Environment::Dev,
        observability: ObservabilityConfig {
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
        lemonsqueezy: LemonSqueezyConfig {
            checkout_base_url: "https://volla.lemonsqueezy.com/checkout/buy".to_string(),
            success_url: "https://www.volla.app/?payment=success".to_string(),
            webhook_secret: webhook_secret.map(|s| Secret::new(s.to_string())),
            store_id: 271817,
        },
        http: HttpConfig {
            allowed_origins: vec!["*".to_string()],
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(test_config(Some(WEBHOOK_SECRET))).await
    }

    pub async fn spawn_without_secret() -> Self {
        Self::spawn_with_config(test_config(None)).await
    }

    pub async fn spawn_with_config(config: CheckoutConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        for _ in 0..50 {
            if let Ok(response) = client.get(format!("{}/health", address)).send().await {
                if response.status().is_success() {
                    break;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        Self {
            address,
            port,
            client,
        }
    }

    pub async fn create_checkout(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/create-checkout", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn post_webhook(&self, body: &str, signature: Option<&str>) -> reqwest::Response {
        let mut request = self
            .client
            .post(format!("{}/api/webhook-lemonsqueezy", self.address))
            .header("content-type", "application/json")
            .body(body.to_string());
        if let Some(signature) = signature {
            request = request.header("X-Signature", signature);
        }
        request.send().await.expect("Failed to send request")
    }
}

pub fn sign(body: &str) -> String {
    sign_hex(WEBHOOK_SECRET, body.as_bytes()).expect("Failed to sign body")
}
