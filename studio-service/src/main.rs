use service_core::observability::init_tracing;
use studio_service::{config::StudioConfig, Application};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = StudioConfig::load()?;

    init_tracing(
        "studio-service",
        &config.observability.log_level,
        config.observability.otlp_endpoint.as_deref(),
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
