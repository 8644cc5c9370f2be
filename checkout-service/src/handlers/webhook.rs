//! LemonSqueezy webhook intake.

use crate::services::metrics::record_webhook_event;
use crate::services::{EventKind, WebhookEvent};
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use service_core::error::AppError;

pub const SIGNATURE_HEADER: &str = "x-signature";

/// Verify, parse and log a LemonSqueezy webhook.
///
/// Credits are tracked client-side, so events are acknowledged and logged
/// without updating any account state.
pub async fn lemonsqueezy_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let client = state.lemonsqueezy.as_ref();

    if client.verifies_signatures() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!("Missing X-Signature header");
                AppError::Unauthorized(anyhow::anyhow!("Missing webhook signature"))
            })?;

        if !client.verify_webhook_signature(&body, signature) {
            tracing::warn!("Invalid webhook signature");
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Invalid webhook signature"
            )));
        }
    }

    let event = client.parse_webhook_event(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse webhook event");
        AppError::BadRequest(anyhow::anyhow!("Invalid webhook payload"))
    })?;

    let kind = event.kind();
    tracing::info!(event = kind.as_str(), resource_id = %event.resource_id(), "Webhook received");
    record_webhook_event(match &kind {
        // Unknown event names share one label
        EventKind::Other(_) => "other",
        known => known.as_str(),
    });

    log_event(&kind, &event);

    Ok(Json(json!({ "received": true })))
}

fn log_event(kind: &EventKind, event: &WebhookEvent) {
    let attributes = &event.data.attributes;
    let (plan, billing, credits) = match event.plan() {
        Some((plan, billing)) => (plan.as_str(), billing.as_str(), plan.credits()),
        None => ("unknown", "unknown", 0),
    };
    let email = event.user_email().unwrap_or("-");

    match kind {
        EventKind::OrderCreated => tracing::info!(
            order_id = %event.resource_id(),
            user_id = event.user_id().unwrap_or("-"),
            email,
            plan,
            billing,
            credits,
            total = attributes.total_formatted.as_deref().unwrap_or("-"),
            status = attributes.status.as_deref().unwrap_or("-"),
            "Order created"
        ),
        EventKind::SubscriptionCreated => {
            tracing::info!(email, plan, billing, "Subscription created")
        }
        EventKind::SubscriptionUpdated => tracing::info!(
            email,
            plan,
            status = attributes.status.as_deref().unwrap_or("-"),
            "Subscription updated"
        ),
        EventKind::SubscriptionCancelled => tracing::info!(email, "Subscription cancelled"),
        EventKind::Other(name) => tracing::debug!(event = %name, "Ignoring webhook event"),
    }
}
