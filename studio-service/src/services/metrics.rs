//! Prometheus metrics for studio-service.
//!
//! HTTP request metrics come from the `metrics` facade (installed recorder);
//! generation and provider metrics live in a separate `prometheus` registry
//! that is appended to the rendered output.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static STUDIO_GENERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static STUDIO_PROVIDER_FAILURES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static STUDIO_PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

/// Install the recorder and register custom metrics. Safe to call more than once.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = METRICS_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
        }
    }

    if PROMETHEUS_REGISTRY.get().is_some() {
        return;
    }

    match build_registry() {
        Ok((registry, generations, failures, latency)) => {
            let _ = PROMETHEUS_REGISTRY.set(registry);
            let _ = STUDIO_GENERATIONS_TOTAL.set(generations);
            let _ = STUDIO_PROVIDER_FAILURES_TOTAL.set(failures);
            let _ = STUDIO_PROVIDER_LATENCY_SECONDS.set(latency);
            tracing::info!("Prometheus metrics initialized");
        }
        Err(e) => tracing::error!(error = %e, "Failed to initialize Prometheus metrics"),
    }
}

fn build_registry(
) -> Result<(Registry, IntCounterVec, IntCounterVec, HistogramVec), prometheus::Error> {
    let registry = Registry::new();

    let generations = IntCounterVec::new(
        Opts::new(
            "studio_generations_total",
            "Completed generation requests by operation and method used",
        ),
        &["operation", "method"],
    )?;

    let failures = IntCounterVec::new(
        Opts::new(
            "studio_provider_failures_total",
            "Failed calls to generative model providers",
        ),
        &["provider"],
    )?;

    // Image generation routinely takes tens of seconds
    let latency = HistogramVec::new(
        HistogramOpts::new(
            "studio_provider_latency_seconds",
            "Generative model provider latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider"],
    )?;

    registry.register(Box::new(generations.clone()))?;
    registry.register(Box::new(failures.clone()))?;
    registry.register(Box::new(latency.clone()))?;

    Ok((registry, generations, failures, latency))
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
            tracing::error!(error = %e, "Failed to encode metrics");
        }
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

pub fn record_generation(operation: &str, method: &str) {
    if let Some(counter) = STUDIO_GENERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation, method]).inc();
    }
}

pub fn record_provider_failure(provider: &str) {
    if let Some(counter) = STUDIO_PROVIDER_FAILURES_TOTAL.get() {
        counter.with_label_values(&[provider]).inc();
    }
}

pub fn record_provider_latency(provider: &str, duration_secs: f64) {
    if let Some(histogram) = STUDIO_PROVIDER_LATENCY_SECONDS.get() {
        histogram.with_label_values(&[provider]).observe(duration_secs);
    }
}
