use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

fn default_plan() -> String {
    "pro".to_string()
}

fn default_billing() -> String {
    "monthly".to_string()
}

/// Blank strings are treated as absent so that `""` skips validation.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default = "default_plan")]
    pub plan_id: String,
    #[serde(default = "default_billing")]
    pub billing: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub checkout_url: String,
    pub variant_id: u64,
    pub plan: String,
    pub billing: String,
}
