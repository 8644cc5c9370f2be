//! Prometheus metrics for checkout-service.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static CHECKOUT_LINKS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static WEBHOOK_EVENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

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
        Ok((registry, links, events)) => {
            let _ = PROMETHEUS_REGISTRY.set(registry);
            let _ = CHECKOUT_LINKS_TOTAL.set(links);
            let _ = WEBHOOK_EVENTS_TOTAL.set(events);
            tracing::info!("Prometheus metrics initialized");
        }
        Err(e) => tracing::error!(error = %e, "Failed to initialize Prometheus metrics"),
    }
}

fn build_registry() -> Result<(Registry, IntCounterVec, IntCounterVec), prometheus::Error> {
    let registry = Registry::new();

    let links = IntCounterVec::new(
        Opts::new("checkout_links_total", "Checkout links issued by plan and billing cycle"),
        &["plan", "billing"],
    )?;
    let events = IntCounterVec::new(
        Opts::new(
            "lemonsqueezy_webhook_events_total",
            "Verified LemonSqueezy webhook events by event name",
        ),
        &["event"],
    )?;

    registry.register(Box::new(links.clone()))?;
    registry.register(Box::new(events.clone()))?;

    Ok((registry, links, events))
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

pub fn record_checkout_link(plan: &str, billing: &str) {
    if let Some(counter) = CHECKOUT_LINKS_TOTAL.get() {
        counter.with_label_values(&[plan, billing]).inc();
    }
}

pub fn record_webhook_event(event: &str) {
    if let Some(counter) = WEBHOOK_EVENTS_TOTAL.get() {
        counter.with_label_values(&[event]).inc();
    }
}
