//! Free-form prompt edits.

use super::present;
use crate::models::{HandsfreeRequest, HandsfreeResponse};
use crate::prompts::handsfree::handsfree_prompt;
use crate::services::metrics::record_generation;
use crate::startup::AppState;
use crate::utils::image::ProductImage;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

pub const METHOD_VERTEX: &str = "Gemini 3 Pro (REST API)";
pub const METHOD_GEMINI: &str = "Gemini 2.0 Flash Exp";

const MAX_ERROR_SUMMARY: usize = 500;

fn failed(error: impl Into<String>, model_errors: Vec<String>) -> Json<HandsfreeResponse> {
    let error = error.into();
    tracing::warn!(error = %error, "Hands-free generation failed");
    Json(HandsfreeResponse::failed(error, model_errors))
}

pub async fn generate_handsfree(
    State(state): State<AppState>,
    payload: Result<Json<HandsfreeRequest>, JsonRejection>,
) -> Json<HandsfreeResponse> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return failed(rejection.body_text(), Vec::new()),
    };
    let engine = state.engine.as_ref();

    let Some(raw) = present(req.image.as_deref()) else {
        return failed("No image provided", Vec::new());
    };
    let Some(custom) = present(req.prompt.as_deref()) else {
        return failed("No prompt provided", Vec::new());
    };
    let image = match ProductImage::parse(raw) {
        Ok(image) => image,
        Err(e) => return failed(e.to_string(), Vec::new()),
    };

    let prompt = handsfree_prompt(custom, &req.aspect_ratio);
    let mut model_errors = Vec::new();

    if engine.has_service_account() {
        match engine.vertex_content_chain(&prompt, &image).await {
            Ok(success) => {
                record_generation("handsfree", METHOD_VERTEX);
                return Json(HandsfreeResponse::generated(
                    success.value.data_url(),
                    METHOD_VERTEX,
                ));
            }
            Err(e) => model_errors.extend(e.messages()),
        }
    }

    if engine.gemini_configured() {
        match engine
            .gemini_image_chain(&engine.models().handsfree_fallback, &prompt, &image)
            .await
        {
            Ok(success) => {
                record_generation("handsfree", METHOD_GEMINI);
                return Json(HandsfreeResponse::generated(
                    success.value.data_url(),
                    METHOD_GEMINI,
                ));
            }
            Err(e) => model_errors.extend(e.messages()),
        }
    }

    let summary = if model_errors.is_empty() {
        "Unknown error".to_string()
    } else {
        model_errors.join(" | ").chars().take(MAX_ERROR_SUMMARY).collect()
    };
    failed(format!("All models failed: {}", summary), model_errors)
}
