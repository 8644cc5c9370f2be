//! Configuration and connectivity checks.
//!
//! None of these reveal secret values; they only report whether a credential
//! is set and whether a trivial model call works.

use crate::startup::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

const CHECK_PROMPT: &str = "Say 'API is working!' in 3 words or less";
const DEFAULT_CHECK_MODEL: &str = "gemini-2.0-flash";
const MAX_IMAGEN_MODELS: usize = 5;

fn env_flags(state: &AppState) -> Value {
    let google = &state.config.google;
    json!({
        "google_api_key_set": google.has_gemini_key(),
        "vertex_api_key_set": google.has_vertex_key(),
        "credentials_json_set": google.has_service_account(),
    })
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Run the one-line check against the first analysis model.
async fn check_text(state: &AppState) -> Result<String, String> {
    let engine = state.engine.as_ref();
    let model = engine
        .models()
        .analysis
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_CHECK_MODEL);
    engine
        .gemini()
        .generate_text(model, CHECK_PROMPT, None)
        .await
        .map_err(|e| e.to_string())
}

pub async fn test_env(State(state): State<AppState>) -> Json<Value> {
    let mut body = env_flags(&state);
    body["status"] = json!("ok");
    Json(body)
}

pub async fn test_api_key(State(state): State<AppState>) -> Json<Value> {
    let has_key = state.engine.gemini_configured();
    let message = if has_key {
        "API key is set!"
    } else {
        "GOOGLE_API_KEY not found in environment"
    };
    let mut body = json!({
        "status": "ok",
        "google_api_key_exists": has_key,
        "message": message,
    });

    if has_key {
        match check_text(&state).await {
            Ok(text) => {
                body["api_test"] = json!("SUCCESS");
                body["api_response"] = json!(truncate(&text, 100));
            }
            Err(e) => {
                body["api_test"] = json!("FAILED");
                body["api_error"] = json!(truncate(&e, 200));
            }
        }
    }

    Json(body)
}

pub async fn test_imagen(State(state): State<AppState>) -> Json<Value> {
    let imagen_models = match state.engine.gemini().list_models().await {
        Ok(models) => {
            let imagen: Vec<String> = models
                .into_iter()
                .filter(|m| m.to_ascii_lowercase().contains("imagen"))
                .take(MAX_IMAGEN_MODELS)
                .collect();
            if imagen.is_empty() {
                json!("No Imagen models found")
            } else {
                json!(imagen)
            }
        }
        Err(e) => json!(format!("ERROR: {}", truncate(&e.to_string(), 100))),
    };

    Json(json!({
        "status": "complete",
        "tests": {
            "env_vars": env_flags(&state),
            "imagen_models": imagen_models,
        }
    }))
}

pub async fn debug_api(State(state): State<AppState>) -> Json<Value> {
    let text_gen = if state.engine.gemini_configured() {
        match check_text(&state).await {
            Ok(text) => format!("SUCCESS: {}", truncate(&text, 50)),
            Err(e) => format!("FAILED: {}", truncate(&e, 100)),
        }
    } else {
        "SKIPPED: GOOGLE_API_KEY not set".to_string()
    };

    let imagen_note = if state.engine.has_service_account() {
        "Imagen subject references use the configured service account"
    } else {
        "Imagen requests use a Vertex API key in express mode"
    };

    Json(json!({
        "env": env_flags(&state),
        "text_gen": text_gen,
        "imagen_note": imagen_note,
        "status": "complete",
    }))
}
