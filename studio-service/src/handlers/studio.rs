//! Studio background swap.

use super::present;
use crate::models::{StudioRequest, StudioResponse};
use crate::prompts::studio::{
    fallback_background_url, studio_prompt, CameraAngle, ProductPlacement, GEMINI_STUDIO_PROMPT,
};
use crate::services::metrics::record_generation;
use crate::services::providers::EditMode;
use crate::startup::AppState;
use crate::utils::image::ProductImage;
use axum::{extract::rejection::JsonRejection, extract::State, Json};

pub const METHOD_IMAGEN: &str = "Imagen 3 BGSWAP";
pub const METHOD_GEMINI: &str = "Gemini Fallback";
pub const METHOD_FALLBACK_URL: &str = "Fallback URL";
pub const METHOD_ERROR: &str = "Error Fallback";

fn generated(category: &str, image: String, method: &str, error_message: Option<String>) -> StudioResponse {
    record_generation("studio", method);
    StudioResponse {
        success: method == METHOD_IMAGEN || method == METHOD_GEMINI,
        generated_image: image.clone(),
        image_url: image,
        background_url: Some(fallback_background_url(category).to_string()),
        category: Some(category.to_string()),
        method_used: method.to_string(),
        error_message,
        error: None,
    }
}

fn error_fallback(category: &str, error: String) -> StudioResponse {
    tracing::error!(error = %error, "Studio generation failed");
    record_generation("studio", METHOD_ERROR);
    let url = fallback_background_url(category).to_string();
    StudioResponse {
        success: false,
        generated_image: url.clone(),
        image_url: url,
        background_url: None,
        category: None,
        method_used: METHOD_ERROR.to_string(),
        error_message: None,
        error: Some(error),
    }
}

/// Swap the product photo's background for a studio scene.
///
/// Imagen 3 BGSWAP is tried first, then Gemini image output with a clean
/// prompt, and finally a static stock background for the category.
pub async fn generate_studio(
    State(state): State<AppState>,
    payload: Result<Json<StudioRequest>, JsonRejection>,
) -> Json<StudioResponse> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return Json(error_fallback("Other", rejection.body_text())),
    };
    let category = req.category.as_str();
    let engine = &state.engine;

    let Some(raw) = present(req.image.as_deref()) else {
        let url = fallback_background_url(category).to_string();
        return Json(generated(
            category,
            url,
            METHOD_FALLBACK_URL,
            Some("No image provided".to_string()),
        ));
    };

    let image = match ProductImage::parse(raw) {
        Ok(image) => image,
        Err(e) => return Json(error_fallback(category, e.to_string())),
    };

    let angle = CameraAngle::parse(&req.camera_angle);
    let placement = ProductPlacement::parse(&req.product_placement);

    tracing::info!(
        category,
        ?angle,
        ?placement,
        is_hanging = req.is_hanging_product,
        product_type = req.product_type.as_deref().unwrap_or("-"),
        image_bytes = image.bytes().len(),
        "Studio generation requested"
    );

    let mut error_message = None;

    match engine.api_key_credential(req.vertex_api_key.as_deref()) {
        Some(credential) => {
            let prompt = studio_prompt(angle, placement, req.is_hanging_product);
            match engine
                .imagen_edit_chain(&prompt, &image, EditMode::BackgroundSwap, None, &credential)
                .await
            {
                Ok(success) => {
                    return Json(generated(
                        category,
                        success.value.data_url(),
                        METHOD_IMAGEN,
                        None,
                    ))
                }
                Err(e) => error_message = Some(format!("Imagen: {}", e.summary())),
            }
        }
        None => error_message = Some("No Vertex API key configured".to_string()),
    }

    if engine.gemini_configured() {
        match engine
            .gemini_image_chain(&engine.models().gemini_image, GEMINI_STUDIO_PROMPT, &image)
            .await
        {
            Ok(success) => {
                return Json(generated(
                    category,
                    success.value.data_url(),
                    METHOD_GEMINI,
                    error_message,
                ))
            }
            Err(e) => error_message = Some(format!("Gemini: {}", e.summary())),
        }
    }

    let url = fallback_background_url(category).to_string();
    Json(generated(category, url, METHOD_FALLBACK_URL, error_message))
}
