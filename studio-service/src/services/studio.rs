//! Orchestration of provider calls over the configured model chains.

use crate::config::ModelConfig;
use crate::prompts::angles::{PhysicsClassification, PHYSICS_CLASSIFICATION_PROMPT};
use crate::prompts::background::WHITE_BACKGROUND_PROMPT;
use crate::prompts::reallife::{ProductAnalysis, PRODUCT_ANALYSIS_PROMPT};
use crate::services::metrics;
use crate::services::providers::{
    EditMode, EditRequest, GeminiProvider, GeneratedImage, MaskMode, ProviderError,
    VertexCredential, VertexProvider,
};
use crate::utils::image::{extract_json_object, ProductImage};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use service_core::fallback::{run_fallback, FallbackExhausted, FallbackPolicy, FallbackSuccess};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

const GEMINI: &str = "gemini";
const VERTEX: &str = "vertex";

pub type ChainResult<T> = Result<FallbackSuccess<T>, FallbackExhausted>;

pub struct StudioEngine {
    gemini: Arc<dyn GeminiProvider>,
    vertex: Arc<dyn VertexProvider>,
    models: ModelConfig,
    policy: FallbackPolicy,
    vertex_api_key: Option<Secret<String>>,
    google_api_key: Option<Secret<String>>,
}

impl StudioEngine {
    pub fn new(
        gemini: Arc<dyn GeminiProvider>,
        vertex: Arc<dyn VertexProvider>,
        models: ModelConfig,
        policy: FallbackPolicy,
        vertex_api_key: Option<Secret<String>>,
        google_api_key: Option<Secret<String>>,
    ) -> Self {
        Self {
            gemini,
            vertex,
            models,
            policy,
            vertex_api_key,
            google_api_key,
        }
    }

    pub fn gemini(&self) -> &dyn GeminiProvider {
        self.gemini.as_ref()
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    pub fn gemini_configured(&self) -> bool {
        self.gemini.is_configured()
    }

    pub fn has_service_account(&self) -> bool {
        self.vertex.has_service_account()
    }

    /// The key sent with the request, else `VERTEX_API_KEY`, else `GOOGLE_API_KEY`.
    pub fn resolve_vertex_key(&self, request_key: Option<&str>) -> Option<Secret<String>> {
        request_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| Secret::new(k.to_string()))
            .or_else(|| non_empty(&self.vertex_api_key))
            .or_else(|| non_empty(&self.google_api_key))
    }

    /// Express-mode credential for Imagen edits.
    pub fn api_key_credential(&self, request_key: Option<&str>) -> Option<VertexCredential> {
        self.resolve_vertex_key(request_key)
            .map(VertexCredential::ApiKey)
    }

    /// Subject references prefer the service account over an API key.
    pub fn subject_credential(&self, request_key: Option<&str>) -> Option<VertexCredential> {
        if self.has_service_account() {
            Some(VertexCredential::ServiceAccount)
        } else {
            self.api_key_credential(request_key)
        }
    }

    pub async fn gemini_image_chain(
        &self,
        models: &[String],
        prompt: &str,
        image: &ProductImage,
    ) -> ChainResult<GeneratedImage> {
        let gemini = self.gemini.as_ref();
        run_fallback(&self.policy, "gemini_image", models, |model| {
            let model = model.to_string();
            async move { observe(GEMINI, gemini.generate_image(&model, prompt, image)).await }
        })
        .await
    }

    /// Imagen edit over the Imagen chain, one attempt per model.
    pub async fn imagen_edit_chain(
        &self,
        prompt: &str,
        image: &ProductImage,
        edit_mode: EditMode,
        mask_mode: Option<MaskMode>,
        credential: &VertexCredential,
    ) -> ChainResult<GeneratedImage> {
        let vertex = self.vertex.as_ref();
        let request = EditRequest {
            prompt,
            image,
            edit_mode,
            mask_mode,
        };
        run_fallback(
            &FallbackPolicy::single_attempt(),
            "imagen_edit",
            &self.models.imagen,
            |model| {
                let model = model.to_string();
                async move { observe(VERTEX, vertex.edit_image(&model, &request, credential)).await }
            },
        )
        .await
    }

    pub async fn subject_chain(
        &self,
        prompt: &str,
        image: &ProductImage,
        credential: &VertexCredential,
    ) -> ChainResult<GeneratedImage> {
        let vertex = self.vertex.as_ref();
        run_fallback(
            &FallbackPolicy::single_attempt(),
            "imagen_subject",
            &self.models.subject,
            |model| {
                let model = model.to_string();
                async move {
                    observe(VERTEX, vertex.subject_image(&model, prompt, image, credential)).await
                }
            },
        )
        .await
    }

    /// Gemini image output through Vertex `generateContent` (service account only).
    pub async fn vertex_content_chain(
        &self,
        prompt: &str,
        image: &ProductImage,
    ) -> ChainResult<GeneratedImage> {
        let vertex = self.vertex.as_ref();
        run_fallback(
            &FallbackPolicy::single_attempt(),
            "vertex_generate_content",
            &self.models.handsfree_vertex,
            |model| {
                let model = model.to_string();
                async move {
                    observe(VERTEX, vertex.generate_content_image(&model, prompt, image)).await
                }
            },
        )
        .await
    }

    /// Mask-based inpainting with a background mask, then a plain background
    /// swap, on each Imagen model in turn.
    pub async fn remove_background_chain(
        &self,
        image: &ProductImage,
        credential: &VertexCredential,
    ) -> ChainResult<GeneratedImage> {
        let vertex = self.vertex.as_ref();
        let inpaint = EditRequest {
            prompt: WHITE_BACKGROUND_PROMPT,
            image,
            edit_mode: EditMode::InpaintInsertion,
            mask_mode: Some(MaskMode::Background),
        };
        let swap = EditRequest {
            edit_mode: EditMode::BackgroundSwap,
            mask_mode: None,
            ..inpaint
        };

        run_fallback(
            &FallbackPolicy::single_attempt(),
            "remove_background",
            &self.models.imagen,
            |model| {
                let model = model.to_string();
                async move {
                    match observe(VERTEX, vertex.edit_image(&model, &inpaint, credential)).await {
                        Ok(image) => Ok(image),
                        Err(e) => {
                            tracing::warn!(
                                model = %model,
                                error = %e,
                                "Background inpainting failed, trying background swap"
                            );
                            observe(VERTEX, vertex.edit_image(&model, &swap, credential)).await
                        }
                    }
                }
            },
        )
        .await
    }

    pub async fn text_chain(
        &self,
        models: &[String],
        prompt: &str,
        image: Option<&ProductImage>,
    ) -> ChainResult<String> {
        let gemini = self.gemini.as_ref();
        run_fallback(&self.policy, "gemini_text", models, |model| {
            let model = model.to_string();
            async move { observe(GEMINI, gemini.generate_text(&model, prompt, image)).await }
        })
        .await
    }

    /// Classify how the product rests. Any failure yields a standing product.
    pub async fn classify_physics(&self, image: &ProductImage) -> PhysicsClassification {
        if !self.gemini_configured() {
            return PhysicsClassification::default();
        }

        let gemini = self.gemini.as_ref();
        let outcome = run_fallback(
            &self.policy,
            "classify_physics",
            &self.models.classifier,
            |model| {
                let model = model.to_string();
                async move {
                    let text = observe(
                        GEMINI,
                        gemini.generate_text(&model, PHYSICS_CLASSIFICATION_PROMPT, Some(image)),
                    )
                    .await?;
                    parse_json::<PhysicsClassification>(&text)
                }
            },
        )
        .await;

        match outcome {
            Ok(success) => {
                tracing::info!(
                    category = %success.value.category,
                    detected_object = %success.value.detected_object,
                    model = %success.candidate,
                    "Product physics classified"
                );
                success.value
            }
            Err(e) => {
                tracing::warn!(error = %e, "Physics classification failed, assuming standing product");
                PhysicsClassification::default()
            }
        }
    }

    /// Analyse the product for lifestyle scenes, falling back to generic contexts.
    pub async fn analyze_for_lifestyle(
        &self,
        image: &ProductImage,
        product_type: Option<&str>,
        category: Option<&str>,
    ) -> ProductAnalysis {
        let fallback = || ProductAnalysis::fallback(product_type, category);
        if !self.gemini_configured() {
            return fallback();
        }

        let gemini = self.gemini.as_ref();
        let outcome = run_fallback(
            &self.policy,
            "analyze_lifestyle",
            &self.models.analysis,
            |model| {
                let model = model.to_string();
                async move {
                    let text = observe(
                        GEMINI,
                        gemini.generate_text(&model, PRODUCT_ANALYSIS_PROMPT, Some(image)),
                    )
                    .await?;
                    parse_json::<ProductAnalysis>(&text)
                }
            },
        )
        .await;

        match outcome {
            Ok(success) => {
                let mut analysis = success.value;
                if analysis.lifestyle_contexts.is_empty() {
                    analysis.lifestyle_contexts = fallback().lifestyle_contexts;
                }
                analysis
            }
            Err(e) => {
                tracing::warn!(error = %e, "Product analysis failed, using generic contexts");
                fallback()
            }
        }
    }
}

fn non_empty(key: &Option<Secret<String>>) -> Option<Secret<String>> {
    key.as_ref()
        .filter(|k| !k.expose_secret().trim().is_empty())
        .cloned()
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ProviderError> {
    let value = extract_json_object(text)
        .ok_or_else(|| ProviderError::InvalidResponse("no JSON object in model output".to_string()))?;
    serde_json::from_value(value).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

/// Record latency and failures for one provider call.
async fn observe<T, F>(provider: &'static str, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let start = Instant::now();
    let result = call.await;
    metrics::record_provider_latency(provider, start.elapsed().as_secs_f64());
    if result.is_err() {
        metrics::record_provider_failure(provider);
    }
    result
}
