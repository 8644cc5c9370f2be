//! Hosted checkout links.

use crate::models::plan::resolve_variant;
use crate::models::{CheckoutRequest, CheckoutResponse};
use crate::services::metrics::record_checkout_link;
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, Json};
use service_core::error::AppError;
use validator::Validate;

/// A missing or blank body means "all defaults".
fn parse_request(body: &[u8]) -> Result<CheckoutRequest, AppError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid JSON body: {}", e)))
}

/// Return a LemonSqueezy buy link for the requested plan and billing cycle.
#[tracing::instrument(skip(state, body))]
pub async fn create_checkout(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CheckoutResponse>, AppError> {
    let req = parse_request(&body)?;
    req.validate()?;

    let (plan, billing, variant_id) = resolve_variant(&req.plan_id, &req.billing).map_err(|e| {
        tracing::warn!(plan = %req.plan_id, billing = %req.billing, "Unknown plan requested");
        AppError::BadRequest(e.into())
    })?;

    let checkout_url = state.lemonsqueezy.checkout_url(
        variant_id,
        req.email.as_deref(),
        req.user_id.as_deref(),
    );

    tracing::info!(
        plan = %plan,
        billing = %billing,
        variant_id,
        has_email = req.email.is_some(),
        has_user_id = req.user_id.is_some(),
        "Checkout link created"
    );
    record_checkout_link(plan.as_str(), billing.as_str());

    Ok(Json(CheckoutResponse {
        success: true,
        checkout_url,
        variant_id,
        plan: req.plan_id,
        billing: req.billing,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_uses_defaults() {
        for body in [&b""[..], &b"  \n"[..]] {
            let req = parse_request(body).unwrap();
            assert_eq!(req.plan_id, "pro");
            assert_eq!(req.billing, "monthly");
            assert!(req.email.is_none());
        }
    }

    #[test]
    fn malformed_body_is_bad_request() {
        assert!(matches!(parse_request(b"{not json"), Err(AppError::BadRequest(_))));
    }
}
