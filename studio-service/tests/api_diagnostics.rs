mod common;

use common::{Keys, TestApp, GEMINI_TEXT_MODEL};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_env_reports_only_booleans() {
    let app = TestApp::spawn_with(Keys::gemini_only()).await;

    let body: Value = app.get("/api/test-env").await.json().await.unwrap();

    assert_eq!(body["google_api_key_set"], true);
    assert_eq!(body["vertex_api_key_set"], false);
    assert_eq!(body["credentials_json_set"], false);
    assert!(!body.to_string().contains("test-google-key"));
}

#[tokio::test]
async fn test_api_key_runs_a_live_call() {
    let app = TestApp::spawn().await;
    app.mock_gemini_text(GEMINI_TEXT_MODEL, "API is working!").await;

    let body: Value = app.get("/api/test-api-key").await.json().await.unwrap();

    assert_eq!(body["google_api_key_exists"], true);
    assert_eq!(body["api_test"], "SUCCESS");
    assert_eq!(body["api_response"], "API is working!");
}

#[tokio::test]
async fn test_api_key_without_key_skips_the_live_call() {
    let app = TestApp::spawn_with(Keys::none()).await;

    let body: Value = app.get("/api/test-api-key").await.json().await.unwrap();

    assert_eq!(body["google_api_key_exists"], false);
    assert!(body.get("api_test").is_none());
}

#[tokio::test]
async fn test_imagen_filters_the_model_list() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [
                {"name": "models/gemini-2.0-flash"},
                {"name": "models/imagen-3.0-generate-002"}
            ]
        })))
        .mount(&app.google)
        .await;

    let body: Value = app.get("/api/test-imagen").await.json().await.unwrap();

    assert_eq!(body["status"], "complete");
    let models = body["tests"]["imagen_models"].as_array().unwrap();
    assert_eq!(models.len(), 1);
    assert!(models[0].as_str().unwrap().contains("imagen-3.0-generate-002"));
}

#[tokio::test]
async fn debug_api_skips_text_generation_without_key() {
    let app = TestApp::spawn_with(Keys::none()).await;

    let body: Value = app.get("/api/debug-api").await.json().await.unwrap();

    assert_eq!(body["status"], "complete");
    assert_eq!(body["text_gen"], "SKIPPED: GOOGLE_API_KEY not set");
}

#[tokio::test]
async fn unreachable_provider_errors_never_contain_keys() {
    let google = wiremock::MockServer::start().await;
    let config = common::test_config("http://127.0.0.1:1", &Keys::all());
    let app = TestApp::spawn_with_config(config, google).await;

    let diagnostics = app.get("/api/test-api-key").await.text().await.unwrap();
    assert!(diagnostics.contains("FAILED"));

    let debug = app.get("/api/debug-api").await.text().await.unwrap();

    let studio = app
        .post_json(
            "/api/generate-studio",
            &serde_json::json!({"image": common::SAMPLE_IMAGE}),
        )
        .await
        .text()
        .await
        .unwrap();

    let handsfree = app
        .post_json(
            "/api/generate-handsfree",
            &serde_json::json!({"image": common::SAMPLE_IMAGE, "prompt": "Put it on a beach"}),
        )
        .await
        .text()
        .await
        .unwrap();

    let listing = app
        .post_json(
            "/api/analyze-seo",
            &serde_json::json!({"image": common::SAMPLE_IMAGE}),
        )
        .await
        .text()
        .await
        .unwrap();

    for body in [&diagnostics, &debug, &studio, &handsfree, &listing] {
        assert!(!body.contains("test-google-key"), "leaked: {body}");
        assert!(!body.contains("test-vertex-key"), "leaked: {body}");
    }
}
