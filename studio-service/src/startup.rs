//! Application startup and lifecycle management.

use crate::config::StudioConfig;
use crate::handlers;
use crate::services::providers::gemini::{GeminiClient, GeminiConfig};
use crate::services::providers::google_auth::ServiceAccountAuth;
use crate::services::providers::vertex::{VertexClient, VertexConfig};
use crate::services::providers::{GeminiProvider, VertexProvider};
use crate::services::{init_metrics, StudioEngine};
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    cors::cors_layer,
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use service_core::shutdown::shutdown_signal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StudioConfig>,
    pub engine: Arc<StudioEngine>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: StudioConfig) -> Result<Self, AppError> {
        init_metrics();

        let client = reqwest::Client::builder()
            .timeout(config.generation.request_timeout())
            .build()
            .map_err(|e| AppError::ConfigError(e.into()))?;

        let auth = match &config.google.service_account_json {
            Some(json) => match ServiceAccountAuth::from_json(json.expose_secret(), client.clone()) {
                Ok(auth) => {
                    tracing::info!(project_id = %auth.project_id(), "Loaded Vertex service account");
                    Some(Arc::new(auth))
                }
                Err(e) if config.environment.is_prod() => {
                    return Err(AppError::ConfigError(e.into()));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unusable service account credentials");
                    None
                }
            },
            None => None,
        };

        let gemini: Arc<dyn GeminiProvider> = Arc::new(GeminiClient::new(
            GeminiConfig {
                api_key: config.google.api_key.clone(),
                base_url: config.google.gemini_base_url.clone(),
            },
            client.clone(),
        ));
        let vertex: Arc<dyn VertexProvider> = Arc::new(VertexClient::new(
            VertexConfig {
                base_url: config.google.vertex_base_url.clone(),
                express_base_url: config.google.vertex_express_base_url.clone(),
                location: config.google.vertex_location.clone(),
            },
            client,
            auth,
        ));

        if !gemini.is_configured() {
            tracing::warn!("GOOGLE_API_KEY not configured - Gemini fallbacks are disabled");
        }

        let engine = StudioEngine::new(
            gemini,
            vertex,
            config.models.clone(),
            config.generation.fallback_policy(),
            config.google.vertex_api_key.clone(),
            config.google.api_key.clone(),
        );

        let state = AppState {
            config: Arc::new(config.clone()),
            engine: Arc::new(engine),
        };
        let router = router(state, &config);

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, environment = ?config.environment, "Studio service ready");

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

fn router(state: AppState, config: &StudioConfig) -> Router {
    let limiter = create_ip_rate_limiter(config.http.rate_limit_per_minute, RATE_LIMIT_WINDOW_SECS);

    // Generation routes call paid upstream APIs, so they are rate limited per IP
    let generation = Router::new()
        .route("/api/generate-studio", post(handlers::studio::generate_studio))
        .route("/api/generate-angles", post(handlers::angles::generate_angles))
        .route("/api/generate-reallife", post(handlers::reallife::generate_reallife))
        .route("/api/generate-handsfree", post(handlers::handsfree::generate_handsfree))
        .route("/api/remove-background", post(handlers::background::remove_background))
        .route("/api/analyze-seo", post(handlers::seo::analyze_seo))
        .route("/api/text-analysis", post(handlers::seo::text_analysis))
        .layer(from_fn_with_state(limiter, ip_rate_limit_middleware));

    let diagnostics = Router::new()
        .route("/api/test-env", get(handlers::diagnostics::test_env))
        .route("/api/test-api-key", get(handlers::diagnostics::test_api_key))
        .route("/api/test-imagen", get(handlers::diagnostics::test_imagen))
        .route("/api/debug-api", get(handlers::diagnostics::debug_api));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(generation)
        .merge(diagnostics)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.http.max_body_bytes))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&config.http.allowed_origins))
}
