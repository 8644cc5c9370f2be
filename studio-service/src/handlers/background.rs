//! Background removal onto pure white.

use super::present;
use crate::models::{RemoveBackgroundRequest, RemoveBackgroundResponse};
use crate::services::metrics::record_generation;
use crate::startup::AppState;
use crate::utils::image::ProductImage;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use service_core::error::AppError;

pub const METHOD_IMAGEN: &str = "imagen-bgremove";
pub const METHOD_FALLBACK: &str = "fallback";

pub async fn remove_background(
    State(state): State<AppState>,
    payload: Result<Json<RemoveBackgroundRequest>, JsonRejection>,
) -> Result<Json<RemoveBackgroundResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;
    let engine = state.engine.as_ref();

    let raw = present(req.image.as_deref())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No image provided")))?;

    let credential = engine
        .api_key_credential(req.vertex_api_key.as_deref())
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!(
                "Vertex API key required. Please add it in Settings."
            ))
        })?;

    let image = ProductImage::parse(raw).map_err(|e| AppError::InternalError(e.into()))?;

    match engine.remove_background_chain(&image, &credential).await {
        Ok(success) => {
            tracing::info!(model = %success.candidate, "Background removed");
            record_generation("remove_background", METHOD_IMAGEN);
            Ok(Json(RemoveBackgroundResponse {
                success: true,
                result_image: success.value.data_url(),
                method: METHOD_IMAGEN.to_string(),
                note: None,
            }))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Background removal failed, returning original");
            record_generation("remove_background", METHOD_FALLBACK);
            Ok(Json(RemoveBackgroundResponse {
                success: true,
                result_image: image.data_url(),
                method: METHOD_FALLBACK.to_string(),
                note: Some("AI processing failed, returned original".to_string()),
            }))
        }
    }
}
