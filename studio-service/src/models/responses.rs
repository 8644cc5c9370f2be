//! Response bodies.

use crate::prompts::reallife::ProductAnalysis;
use serde::Serialize;

/// `{"success": false, "error": ...}` returned with 200 by the generation routes.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

impl FailureResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudioResponse {
    pub success: bool,
    pub generated_image: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub method_used: String,
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShotNames {
    pub shot1: String,
    pub shot2: String,
    pub shot3: String,
}

impl Default for ShotNames {
    fn default() -> Self {
        Self {
            shot1: "Front View".to_string(),
            shot2: "Side View".to_string(),
            shot3: "Back View".to_string(),
        }
    }
}

impl From<[String; 3]> for ShotNames {
    fn from([shot1, shot2, shot3]: [String; 3]) -> Self {
        Self { shot1, shot2, shot3 }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct AnglesResponse {
    pub success: bool,
    pub shot1: Option<String>,
    pub shot2: Option<String>,
    pub shot3: Option<String>,
    pub shot_names: ShotNames,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physics_category: Option<String>,
    pub is_hanging_product: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct RealLifeResponse {
    pub success: bool,
    pub shot1: Option<String>,
    pub shot2: Option<String>,
    pub shot3: Option<String>,
    pub analysis: Option<ProductAnalysis>,
    pub error: Option<String>,
}

/// Store up to three shots in `shot1..shot3`, returning whether any is set.
pub(crate) fn assign_shots(
    slots: [&mut Option<String>; 3],
    shots: impl IntoIterator<Item = Option<String>>,
) -> bool {
    let mut any = false;
    for (slot, shot) in slots.into_iter().zip(shots) {
        any |= shot.is_some();
        *slot = shot;
    }
    any
}

#[derive(Debug, Serialize)]
pub struct HandsfreeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub method_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_errors: Option<Vec<String>>,
}

impl HandsfreeResponse {
    pub fn generated(image: String, method: &str) -> Self {
        Self {
            success: true,
            generated_image: Some(image.clone()),
            image_url: Some(image),
            method_used: method.to_string(),
            error: None,
            error_message: None,
            model_errors: None,
        }
    }

    pub fn failed(error: String, model_errors: Vec<String>) -> Self {
        Self {
            success: false,
            generated_image: None,
            image_url: None,
            method_used: "Error".to_string(),
            error: Some(error.clone()),
            error_message: Some(error),
            model_errors: Some(model_errors),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RemoveBackgroundResponse {
    pub success: bool,
    pub result_image: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub success: bool,
    pub data: serde_json::Value,
    pub marketplace: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_shots_reports_any_success() {
        let mut response = AnglesResponse::default();
        let any = assign_shots(
            [&mut response.shot1, &mut response.shot2, &mut response.shot3],
            [None, Some("data:image/png;base64,AA==".to_string()), None],
        );
        assert!(any);
        assert!(response.shot1.is_none());
        assert!(response.shot2.is_some());

        let mut empty = RealLifeResponse::default();
        assert!(!assign_shots(
            [&mut empty.shot1, &mut empty.shot2, &mut empty.shot3],
            [None, None, None],
        ));
    }

    #[test]
    fn handsfree_failure_shape() {
        let value = serde_json::to_value(HandsfreeResponse::failed(
            "All models failed: x".to_string(),
            vec!["x".to_string()],
        ))
        .unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["method_used"], "Error");
        assert_eq!(value["error_message"], "All models failed: x");
        assert!(value.get("generated_image").is_none());
    }
}
