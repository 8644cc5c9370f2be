//! Lifestyle scenes built around the product.

use super::present;
use crate::models::{assign_shots, FailureResponse, RealLifeRequest, RealLifeResponse};
use crate::prompts::reallife::{reallife_prompt, subject_prompt};
use crate::services::metrics::record_generation;
use crate::services::providers::VertexCredential;
use crate::services::StudioEngine;
use crate::startup::AppState;
use crate::utils::image::ProductImage;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;

const MAX_SCENES: usize = 3;

pub async fn generate_reallife(
    State(state): State<AppState>,
    payload: Result<Json<RealLifeRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return Json(FailureResponse::new(rejection.body_text())).into_response(),
    };
    let engine = state.engine.as_ref();
    let mut response = RealLifeResponse::default();

    let Some(raw) = present(req.source_image.as_deref()) else {
        response.error = Some("No source image".to_string());
        return Json(response).into_response();
    };

    let image = match ProductImage::parse(raw) {
        Ok(image) => image,
        Err(e) => {
            response.error = Some(e.to_string());
            return Json(response).into_response();
        }
    };

    let analysis = engine
        .analyze_for_lifestyle(
            &image,
            req.product_info.product_type.as_deref(),
            req.product_info.category.as_deref(),
        )
        .await;

    let prompts: Vec<String> = (0..MAX_SCENES)
        .filter_map(|i| reallife_prompt(&analysis, i))
        .collect();

    tracing::info!(
        product_type = %analysis.product_type,
        scenes = prompts.len(),
        "Generating lifestyle scenes"
    );

    let credential = engine.subject_credential(req.vertex_api_key.as_deref());
    let shots = join_all(
        prompts
            .iter()
            .map(|prompt| lifestyle_shot(engine, &image, prompt, credential.as_ref())),
    )
    .await;

    response.success = assign_shots(
        [&mut response.shot1, &mut response.shot2, &mut response.shot3],
        shots,
    );
    response.analysis = Some(analysis);
    if response.success {
        record_generation("reallife", "lifestyle");
    } else {
        response.error = Some("All shots failed".to_string());
    }

    Json(response).into_response()
}

async fn lifestyle_shot(
    engine: &StudioEngine,
    image: &ProductImage,
    prompt: &str,
    credential: Option<&VertexCredential>,
) -> Option<String> {
    if let Some(credential) = credential {
        match engine
            .subject_chain(&subject_prompt(prompt), image, credential)
            .await
        {
            Ok(success) => return Some(success.value.data_url()),
            Err(e) => tracing::warn!(error = %e, "Subject reference shot failed"),
        }
    }

    if !engine.gemini_configured() {
        return None;
    }

    match engine
        .gemini_image_chain(&engine.models().handsfree_fallback, prompt, image)
        .await
    {
        Ok(success) => Some(success.value.data_url()),
        Err(e) => {
            tracing::warn!(error = %e, "Gemini lifestyle shot failed");
            None
        }
    }
}
