//! Application startup and lifecycle management.

use crate::config::CheckoutConfig;
use crate::handlers;
use crate::services::{init_metrics, LemonSqueezyClient};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    cors::cors_layer, metrics::metrics_middleware,
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use service_core::shutdown::shutdown_signal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CheckoutConfig>,
    pub lemonsqueezy: Arc<LemonSqueezyClient>,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: CheckoutConfig) -> Result<Self, AppError> {
        init_metrics();

        if !config.lemonsqueezy.verifies_signatures() {
            tracing::warn!(
                "LEMONSQUEEZY_WEBHOOK_SECRET not set - webhook signatures will not be verified"
            );
        }

        let lemonsqueezy = LemonSqueezyClient::new(config.lemonsqueezy.clone());
        let state = AppState {
            config: Arc::new(config.clone()),
            lemonsqueezy: Arc::new(lemonsqueezy),
        };
        let router = router(state, &config);

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            store_id = config.lemonsqueezy.store_id,
            environment = ?config.environment,
            "Checkout service ready"
        );

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

fn router(state: AppState, config: &CheckoutConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/create-checkout", post(handlers::checkout::create_checkout))
        .route(
            "/api/webhook-lemonsqueezy",
            post(handlers::webhook::lemonsqueezy_webhook),
        )
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&config.http.allowed_origins))
}
