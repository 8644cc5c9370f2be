//! Marketplace listing prompts.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Etsy,
    Amazon,
    Shopify,
}

impl Marketplace {
    /// Case-insensitive lookup; anything unrecognised becomes `default`.
    pub fn parse_or(value: &str, default: Marketplace) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "etsy" => Self::Etsy,
            "amazon" => Self::Amazon,
            "shopify" => Self::Shopify,
            _ => default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Etsy => "etsy",
            Self::Amazon => "amazon",
            Self::Shopify => "shopify",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Etsy => ETSY_PROMPT,
            Self::Amazon => AMAZON_PROMPT,
            Self::Shopify => SHOPIFY_PROMPT,
        }
    }
}

const ETSY_PROMPT: &str = r#"You are an Etsy SEO specialist. Study the product image and write listing content.

Reply with a single JSON object, no markdown:
{
  "title": "keyword-rich title, at most 140 characters",
  "description": "two or three persuasive paragraphs",
  "tags": ["up to 13 search tags"],
  "category": "best Etsy category",
  "productType": "product type",
  "materials": ["materials"],
  "colors": ["main colors"],
  "occasion": "gift occasion if any",
  "style": "design style"
}"#;

const AMAZON_PROMPT: &str = r#"You are an Amazon search ranking specialist. Study the product image and write listing content.

Reply with a single JSON object, no markdown:
{
  "title": "title with the main keywords, at most 200 characters",
  "bulletPoints": ["five feature and benefit bullets"],
  "description": "detailed description",
  "searchTerms": "backend search terms, at most 249 bytes",
  "category": "Amazon category",
  "productType": "product type"
}"#;

const SHOPIFY_PROMPT: &str = r#"You are a Shopify and Google SEO specialist. Study the product image and write store content.

Reply with a single JSON object, no markdown:
{
  "title": "title, at most 70 characters",
  "metaTitle": "meta title, at most 60 characters",
  "metaDescription": "meta description, at most 160 characters",
  "description": "HTML product description with paragraphs",
  "tags": ["tags"],
  "productType": "product type",
  "vendor": "suggested brand name"
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_falls_back_to_given_default() {
        assert_eq!(Marketplace::parse_or("AMAZON", Marketplace::Etsy), Marketplace::Amazon);
        assert_eq!(Marketplace::parse_or("ebay", Marketplace::Shopify), Marketplace::Shopify);
        assert_eq!(Marketplace::parse_or("ebay", Marketplace::Etsy), Marketplace::Etsy);
    }

    #[test]
    fn each_marketplace_has_its_own_schema() {
        assert!(Marketplace::Etsy.prompt().contains("\"tags\""));
        assert!(Marketplace::Amazon.prompt().contains("bulletPoints"));
        assert!(Marketplace::Shopify.prompt().contains("metaDescription"));
    }
}
