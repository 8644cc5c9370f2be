use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Flattened JSON log lines with source locations.
///
/// Built per stack because the layer type depends on what sits beneath it.
fn fmt_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .json()
        .flatten_event(true)
}

/// Install the global tracing subscriber.
///
/// Logs are emitted as flattened JSON. When `otlp_endpoint` is set, spans are
/// also exported over OTLP/gRPC with a batch exporter on the Tokio runtime.
pub fn init_tracing(service_name: &str, log_level: &str, otlp_endpoint: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let Some(endpoint) = otlp_endpoint else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer())
            .init();
        return;
    };

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ])))
        .install_batch(runtime::Tokio);

    match tracer {
        Ok(tracer) => {
            let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(telemetry)
                .with(fmt_layer())
                .init();
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer())
                .init();
            tracing::warn!(
                service = service_name,
                endpoint,
                error = %e,
                "Failed to initialize OTLP tracer, continuing with local logs only"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::TracerProvider as _;

    #[test]
    fn json_layer_composes_with_and_without_telemetry() {
        let local = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new("info"))
            .with(fmt_layer());
        tracing::subscriber::with_default(local, || {
            tracing::info!(check = "local", "local logging");
        });

        let provider = sdktrace::TracerProvider::builder().build();
        let telemetry = tracing_opentelemetry::layer().with_tracer(provider.tracer("logging-test"));
        let exported = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new("info"))
            .with(telemetry)
            .with(fmt_layer());
        tracing::subscriber::with_default(exported, || {
            let span = tracing::info_span!("request");
            let _guard = span.enter();
            tracing::info!("inside span");
        });
    }
}
