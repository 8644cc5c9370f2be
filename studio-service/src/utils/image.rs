//! Helpers for base64 product images and model text output.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("No image provided")]
    Missing,

    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(String),
}

/// A product photo as received from a client, cleaned and validated.
#[derive(Debug, Clone)]
pub struct ProductImage {
    mime_type: &'static str,
    base64: String,
    bytes: Vec<u8>,
}

impl ProductImage {
    /// Accepts either a bare base64 string or a `data:<mime>;base64,<data>` URL.
    pub fn parse(input: &str) -> Result<Self, ImageError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ImageError::Missing);
        }

        let (mime_type, payload) = match input.split_once("base64,") {
            Some((header, payload)) => (mime_from_header(header), payload),
            None => (MIME_JPEG, input),
        };

        let base64 = repair_padding(payload);
        if base64.is_empty() {
            return Err(ImageError::Missing);
        }

        let bytes = STANDARD
            .decode(&base64)
            .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;

        Ok(Self {
            mime_type,
            base64,
            bytes,
        })
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
    }

    /// Cleaned base64 text, without any data-URL header.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn data_url(&self) -> String {
        to_data_url(self.mime_type, &self.base64)
    }
}

fn mime_from_header(header: &str) -> &'static str {
    if header.to_ascii_lowercase().contains("png") {
        MIME_PNG
    } else {
        MIME_JPEG
    }
}

/// Drop whitespace and pad to a multiple of four with `=`.
fn repair_padding(payload: &str) -> String {
    let mut cleaned: String = payload
        .chars()
        .filter(|c| !matches!(c, ' ' | '\n' | '\r' | '\t'))
        .collect();
    let missing = cleaned.len() % 4;
    if missing != 0 {
        cleaned.push_str(&"=".repeat(4 - missing));
    }
    cleaned
}

pub fn to_data_url(mime_type: &str, base64: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64)
}

/// Parse the outermost `{...}` found in free-form model output.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Body of the first fenced code block, or the trimmed text when unfenced.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let after_fence = &trimmed[open + 3..];
    // Skip an info string such as `json` up to the end of the line
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];

    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}
