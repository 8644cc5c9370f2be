//! Multi-angle product shots staged by the product's physics.

use crate::models::{assign_shots, AnglesRequest, AnglesResponse, FailureResponse};
use crate::prompts::angles::angle_shot_prompt;
use crate::services::metrics::record_generation;
use crate::services::providers::{EditMode, VertexCredential};
use crate::services::StudioEngine;
use crate::startup::AppState;
use crate::utils::image::ProductImage;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;

pub async fn generate_angles(
    State(state): State<AppState>,
    payload: Result<Json<AnglesRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return Json(FailureResponse::new(rejection.body_text())).into_response(),
    };
    let engine = state.engine.as_ref();
    let mut response = AnglesResponse::default();

    let Some(raw) = req.source() else {
        response.error = Some("No source image".to_string());
        return Json(response).into_response();
    };

    let image = match ProductImage::parse(raw) {
        Ok(image) => image,
        Err(e) => return Json(FailureResponse::new(e.to_string())).into_response(),
    };

    let physics = engine.classify_physics(&image).await;
    let category = physics.physics_category();
    let is_hanging = physics.is_hanging_product();
    let staging = category.staging();

    response.shot_names = staging.shot_names().into();
    response.physics_category = Some(category.as_str().to_string());
    response.is_hanging_product = is_hanging;

    tracing::info!(
        physics_category = category.as_str(),
        detected_object = %physics.detected_object,
        is_hanging,
        "Generating angle shots"
    );

    let credential = engine.api_key_credential(req.vertex_api_key.as_deref());
    let shots = join_all(staging.angles.iter().map(|angle| {
        angle_shot(
            engine,
            &image,
            angle,
            staging.staging,
            &req.product_description,
            is_hanging,
            credential.as_ref(),
        )
    }))
    .await;

    response.success = assign_shots(
        [&mut response.shot1, &mut response.shot2, &mut response.shot3],
        shots,
    );
    if response.success {
        record_generation("angles", "multi-angle");
    } else {
        response.error = Some("All shots failed".to_string());
    }

    Json(response).into_response()
}

/// One camera angle: Imagen edit when a key is available, Gemini otherwise or on failure.
async fn angle_shot(
    engine: &StudioEngine,
    image: &ProductImage,
    angle: &str,
    staging: &str,
    product: &str,
    is_hanging: bool,
    credential: Option<&VertexCredential>,
) -> Option<String> {
    let prompt = angle_shot_prompt(angle, staging, product, is_hanging);

    if let Some(credential) = credential {
        match engine
            .imagen_edit_chain(&prompt, image, EditMode::Default, None, credential)
            .await
        {
            Ok(success) => return Some(success.value.data_url()),
            Err(e) => tracing::warn!(angle, error = %e, "Imagen angle shot failed"),
        }
    }

    if !engine.gemini_configured() {
        return None;
    }

    match engine
        .gemini_image_chain(&engine.models().gemini_image, &prompt, image)
        .await
    {
        Ok(success) => Some(success.value.data_url()),
        Err(e) => {
            tracing::warn!(angle, error = %e, "Gemini angle shot failed");
            None
        }
    }
}
