//! Marketplace listing copy from a product photo.

use super::present;
use crate::models::{FailureResponse, ListingRequest, ListingResponse};
use crate::prompts::seo::Marketplace;
use crate::services::metrics::record_generation;
use crate::startup::AppState;
use crate::utils::image::{strip_code_fence, ProductImage};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Listing analysis where unknown marketplaces are treated as Shopify.
pub async fn analyze_seo(
    State(state): State<AppState>,
    payload: Result<Json<ListingRequest>, JsonRejection>,
) -> Response {
    listing_analysis(&state, payload, Marketplace::Shopify).await
}

/// Listing analysis where unknown marketplaces are treated as Etsy.
pub async fn text_analysis(
    State(state): State<AppState>,
    payload: Result<Json<ListingRequest>, JsonRejection>,
) -> Response {
    listing_analysis(&state, payload, Marketplace::Etsy).await
}

fn failure(error: impl Into<String>) -> Response {
    let error = error.into();
    tracing::warn!(error = %error, "Listing analysis failed");
    Json(FailureResponse::new(error)).into_response()
}

async fn listing_analysis(
    state: &AppState,
    payload: Result<Json<ListingRequest>, JsonRejection>,
    unknown: Marketplace,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return failure(rejection.body_text()),
    };
    let engine = state.engine.as_ref();

    let Some(raw) = present(req.image.as_deref()) else {
        return failure("No image provided");
    };
    if !engine.gemini_configured() {
        return failure("Gemini API not configured - check GOOGLE_API_KEY");
    }
    let image = match ProductImage::parse(raw) {
        Ok(image) => image,
        Err(e) => return failure(e.to_string()),
    };

    let marketplace = Marketplace::parse_or(&req.marketplace, unknown);
    tracing::info!(marketplace = marketplace.as_str(), "Analyzing listing");

    let text = match engine
        .text_chain(&engine.models().analysis, marketplace.prompt(), Some(&image))
        .await
    {
        Ok(success) => success.value,
        Err(e) => return failure(e.summary()),
    };

    let data = serde_json::from_str(strip_code_fence(&text))
        .unwrap_or_else(|_| json!({ "rawResponse": text }));
    record_generation("listing", marketplace.as_str());

    Json(ListingResponse {
        success: true,
        data,
        marketplace: req.marketplace,
    })
    .into_response()
}
