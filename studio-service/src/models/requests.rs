//! Request bodies. Every field is optional on the wire; defaults match what
//! the web client omits.

use serde::Deserialize;

fn default_category() -> String {
    "Other".to_string()
}

fn default_camera_angle() -> String {
    "FRONT".to_string()
}

fn default_placement() -> String {
    "ON_SURFACE".to_string()
}

fn default_product_description() -> String {
    "Product item".to_string()
}

fn default_aspect_ratio() -> String {
    "original".to_string()
}

fn default_marketplace() -> String {
    "etsy".to_string()
}

#[derive(Debug, Deserialize)]
pub struct StudioRequest {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub vertex_api_key: Option<String>,
    #[serde(default = "default_camera_angle")]
    pub camera_angle: String,
    #[serde(default = "default_placement")]
    pub product_placement: String,
    #[serde(default)]
    pub is_hanging_product: bool,
    #[serde(default)]
    pub product_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnglesRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub source_image: Option<String>,
    #[serde(default = "default_product_description", rename = "productDescription")]
    pub product_description: String,
    #[serde(default)]
    pub vertex_api_key: Option<String>,
}

impl AnglesRequest {
    /// `image` wins over `source_image`; blank strings count as missing.
    pub fn source(&self) -> Option<&str> {
        [self.image.as_deref(), self.source_image.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RealLifeRequest {
    #[serde(default)]
    pub source_image: Option<String>,
    #[serde(default)]
    pub vertex_api_key: Option<String>,
    #[serde(default)]
    pub product_info: ProductInfo,
}

#[derive(Debug, Deserialize)]
pub struct HandsfreeRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default = "default_aspect_ratio", rename = "aspectRatio")]
    pub aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveBackgroundRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub vertex_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_marketplace")]
    pub marketplace: String,
}
