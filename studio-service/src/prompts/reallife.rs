//! Lifestyle ("real life") scene analysis and prompts.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

pub const PRODUCT_ANALYSIS_PROMPT: &str = "You are a product photographer planning a lifestyle shoot. Study the product in this image and reply with JSON only:
{
  \"product_type\": \"specific product name, e.g. gold ring with diamond\",
  \"product_category\": \"jewelry, furniture, kitchenware, clothing, electronics, decor, accessory...\",
  \"material\": \"primary materials\",
  \"colors\": [\"main colors\"],
  \"key_details_to_preserve\": [\"text, logos, patterns, engravings that must not change\"],
  \"usage_type\": \"worn, held, placed, mounted or hung\",
  \"typical_users\": [\"who uses it\"],
  \"body_part_if_worn\": \"finger, wrist, neck, hand... or null\",
  \"lifestyle_contexts\": [
    {\"scene\": \"realistic scene\", \"environment\": \"location\", \"lighting\": \"light and time of day\", \"human_element\": \"how a person interacts with it\"}
  ],
  \"photography_style\": \"macro, portrait, environmental, flat lay...\",
  \"risk_areas\": [\"where image generation tends to fail: hands, text, reflections...\"]
}

Give exactly three lifestyle_contexts that differ in scene, environment, lighting and interaction. Every scene must be photographable in real life and match how the product is actually used.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifestyleContext {
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub lighting: String,
    #[serde(default)]
    pub human_element: String,
}

impl LifestyleContext {
    fn new(scene: &str, environment: &str, lighting: &str, human_element: &str) -> Self {
        Self {
            scene: scene.to_string(),
            environment: environment.to_string(),
            lighting: lighting.to_string(),
            human_element: human_element.to_string(),
        }
    }
}

/// Structured product analysis. Every field defaults so partial model output still parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductAnalysis {
    pub product_type: String,
    pub product_category: String,
    pub material: String,
    pub colors: Vec<String>,
    pub key_details_to_preserve: Vec<String>,
    pub usage_type: String,
    pub typical_users: Vec<String>,
    pub body_part_if_worn: Option<String>,
    pub lifestyle_contexts: Vec<LifestyleContext>,
    pub photography_style: String,
    pub risk_areas: Vec<String>,
}

impl ProductAnalysis {
    /// Generic analysis used when the model cannot be reached or returns garbage.
    pub fn fallback(product_type: Option<&str>, category: Option<&str>) -> Self {
        Self {
            product_type: product_type.unwrap_or("product").to_string(),
            product_category: category.unwrap_or("Other").to_string(),
            material: "mixed".to_string(),
            colors: Vec::new(),
            key_details_to_preserve: vec![
                "all visible details".to_string(),
                "colors".to_string(),
                "textures".to_string(),
            ],
            usage_type: "placed".to_string(),
            typical_users: vec!["general".to_string()],
            body_part_if_worn: None,
            lifestyle_contexts: vec![
                LifestyleContext::new(
                    "Modern home interior setting",
                    "Indoor living room",
                    "Natural daylight",
                    "Product in natural use",
                ),
                LifestyleContext::new(
                    "Cozy lifestyle environment",
                    "Indoor bedroom or study",
                    "Warm ambient light",
                    "Product displayed naturally",
                ),
                LifestyleContext::new(
                    "Contemporary setting",
                    "Modern space",
                    "Soft natural light",
                    "Product in context",
                ),
            ],
            photography_style: "lifestyle".to_string(),
            risk_areas: vec![
                "product preservation".to_string(),
                "realistic environment".to_string(),
            ],
        }
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Prompt for the lifestyle context at `index`, or `None` past the last context.
pub fn reallife_prompt(analysis: &ProductAnalysis, index: usize) -> Option<String> {
    let context = analysis.lifestyle_contexts.get(index)?;
    let product_type = or_default(&analysis.product_type, "product");

    let mut prompt = String::with_capacity(2048);
    prompt.push_str("Realistic lifestyle product photograph.\n\nREFERENCE PRODUCT:\n");
    let _ = writeln!(
        prompt,
        "The reference image shows the exact {product_type}. It must appear identical: same colors, materials, shape, proportions, finish, text and logos."
    );
    prompt.push_str("Preserve:\n");
    if analysis.key_details_to_preserve.is_empty() {
        prompt.push_str("- All visible details, colors and patterns\n");
    } else {
        for detail in &analysis.key_details_to_preserve {
            let _ = writeln!(prompt, "- {detail}");
        }
    }

    let _ = write!(
        prompt,
        "\nSCENE:\n{}\nEnvironment: {}\nLighting: {}\nHuman interaction: {}\n",
        or_default(&context.scene, "Professional lifestyle setting"),
        or_default(&context.environment, "Indoor"),
        or_default(&context.lighting, "Natural soft light"),
        or_default(&context.human_element, "Product in use"),
    );

    prompt.push_str(
        "\nPHOTOGRAPHY: full-frame camera look, 85mm or 35mm lens, shallow depth of field, \
         product in sharp focus, soft natural light, editorial quality, true-to-life color.\n",
    );

    if let Some(body_part) = analysis.body_part_if_worn.as_deref().filter(|b| !b.is_empty()) {
        let usage = or_default(&analysis.usage_type, "worn");
        let _ = write!(
            prompt,
            "\nHUMAN ANATOMY:\n- Product is {usage} on the {body_part}\n\
             - Natural skin texture and a relaxed pose\n\
             - Five fingers per hand, no merged or extra limbs\n"
        );
    }

    prompt.push_str(
        "\nENVIRONMENT: a real, lived-in space with consistent shadows and real objects.\n\
         \nAVOID: distorted hands, blurred product text, color shifts, floating products, \
         waxy skin, inconsistent lighting.\n",
    );

    if !analysis.risk_areas.is_empty() {
        prompt.push_str("\nCHECK CAREFULLY:\n");
        for risk in &analysis.risk_areas {
            let _ = writeln!(prompt, "- {risk}");
        }
    }

    prompt.push_str("\nThe result should pass as a real photo from a lifestyle magazine.");
    Some(prompt)
}

/// Wrap a scene prompt for subject-reference generation, where `[1]` names the reference image.
pub fn subject_prompt(prompt: &str) -> String {
    format!("Generate a photo of the product [1] in the following scene: {prompt}")
}
