//! LemonSqueezy hosted checkout links and webhook payloads.
//!
//! Checkout needs no API call: a buy link for the variant carries the buyer's
//! email and our user id as custom data, which LemonSqueezy echoes back in
//! `meta.custom_data` on every webhook.

use crate::config::LemonSqueezyConfig;
use crate::models::plan::{plan_for_variant, BillingCycle, Plan};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use service_core::utils::signature::verify_hex;

#[derive(Clone)]
pub struct LemonSqueezyClient {
    config: LemonSqueezyConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookEvent {
    pub meta: WebhookMeta,
    pub data: WebhookData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookMeta {
    pub event_name: String,
    pub custom_data: CustomData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CustomData {
    pub user_id: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookData {
    pub id: Value,
    pub attributes: WebhookAttributes,
}

/// The subset of order and subscription attributes that is logged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookAttributes {
    pub user_email: Option<String>,
    pub status: Option<String>,
    pub total_formatted: Option<String>,
    /// Set on subscriptions.
    pub variant_id: Value,
    /// Set on orders.
    pub first_order_item: Option<OrderItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrderItem {
    pub variant_id: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    OrderCreated,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionCancelled,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::OrderCreated => "order_created",
            EventKind::SubscriptionCreated => "subscription_created",
            EventKind::SubscriptionUpdated => "subscription_updated",
            EventKind::SubscriptionCancelled => "subscription_cancelled",
            EventKind::Other(name) => name,
        }
    }
}

/// Variant ids arrive as numbers or numeric strings.
fn as_variant_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        match self.meta.event_name.as_str() {
            "order_created" => EventKind::OrderCreated,
            "subscription_created" => EventKind::SubscriptionCreated,
            "subscription_updated" => EventKind::SubscriptionUpdated,
            "subscription_cancelled" => EventKind::SubscriptionCancelled,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn variant_id(&self) -> Option<u64> {
        let attributes = &self.data.attributes;
        match self.kind() {
            EventKind::OrderCreated => attributes
                .first_order_item
                .as_ref()
                .and_then(|item| as_variant_id(&item.variant_id)),
            _ => as_variant_id(&attributes.variant_id),
        }
    }

    pub fn plan(&self) -> Option<(Plan, BillingCycle)> {
        self.variant_id().and_then(plan_for_variant)
    }

    /// Custom checkout email first, then the email on the order itself.
    pub fn user_email(&self) -> Option<&str> {
        self.meta
            .custom_data
            .user_email
            .as_deref()
            .or(self.data.attributes.user_email.as_deref())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.meta.custom_data.user_id.as_deref()
    }

    pub fn resource_id(&self) -> String {
        match &self.data.id {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl LemonSqueezyClient {
    pub fn new(config: LemonSqueezyConfig) -> Self {
        Self { config }
    }

    pub fn store_id(&self) -> u64 {
        self.config.store_id
    }

    pub fn verifies_signatures(&self) -> bool {
        self.config.verifies_signatures()
    }

    /// Build a hosted checkout link for a variant.
    ///
    /// Query parameters are appended in a fixed order: prefilled email and
    /// custom email, custom user id, then the success redirect.
    pub fn checkout_url(&self, variant_id: u64, email: Option<&str>, user_id: Option<&str>) -> String {
        let mut params = Vec::with_capacity(4);
        if let Some(email) = email {
            let email = urlencoding::encode(email);
            params.push(format!("checkout[email]={}", email));
            params.push(format!("checkout[custom][user_email]={}", email));
        }
        if let Some(user_id) = user_id {
            params.push(format!("checkout[custom][user_id]={}", urlencoding::encode(user_id)));
        }
        params.push(format!(
            "checkout[success_url]={}",
            urlencoding::encode(&self.config.success_url)
        ));

        format!(
            "{}/{}?{}",
            self.config.checkout_base_url.trim_end_matches('/'),
            variant_id,
            params.join("&")
        )
    }

    /// Check `X-Signature`, the hex HMAC-SHA256 of the raw body.
    ///
    /// Always true when no webhook secret is configured.
    pub fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool {
        match &self.config.webhook_secret {
            Some(secret) if !secret.expose_secret().is_empty() => {
                verify_hex(secret.expose_secret(), body, signature)
            }
            _ => true,
        }
    }

    pub fn parse_webhook_event(&self, body: &[u8]) -> Result<WebhookEvent, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;
    use service_core::utils::signature::sign_hex;

    fn client(secret: Option<&str>) -> LemonSqueezyClient {
        LemonSqueezyClient::new(LemonSqueezyConfig {
            checkout_base_url: "https://volla.lemonsqueezy.com/checkout/buy".to_string(),
            success_url: "https://www.volla.app/?payment=success".to_string(),
            webhook_secret: secret.map(|s| Secret::new(s.to_string())),
            store_id: 271817,
        })
    }

    #[test]
    fn checkout_url_with_email_and_user() {
        let url = client(None).checkout_url(1210603, Some("a+b@example.com"), Some("user 1"));
        assert_eq!(
            url,
            "https://volla.lemonsqueezy.com/checkout/buy/1210603?\
             checkout[email]=a%2Bb%40example.com&\
             checkout[custom][user_email]=a%2Bb%40example.com&\
             checkout[custom][user_id]=user%201&\
             checkout[success_url]=https%3A%2F%2Fwww.volla.app%2F%3Fpayment%3Dsuccess"
        );
    }

    #[test]
    fn checkout_url_always_has_success_redirect() {
        let url = client(None).checkout_url(1210536, None, None);
        assert_eq!(
            url,
            "https://volla.lemonsqueezy.com/checkout/buy/1210536?\
             checkout[success_url]=https%3A%2F%2Fwww.volla.app%2F%3Fpayment%3Dsuccess"
        );
    }

    #[test]
    fn signature_verification() {
        let body = br#"{"meta":{"event_name":"order_created"}}"#;
        let signature = sign_hex("whsec", body).unwrap();

        let secured = client(Some("whsec"));
        assert!(secured.verify_webhook_signature(body, &signature));
        assert!(!secured.verify_webhook_signature(body, "deadbeef"));
        assert!(!secured.verify_webhook_signature(b"{}", &signature));

        assert!(client(None).verify_webhook_signature(body, ""));
        assert!(client(Some("")).verify_webhook_signature(body, ""));
    }

    #[test]
    fn order_event_resolves_plan_from_first_item() {
        let body = br#"{
            "meta": {"event_name": "order_created", "custom_data": {"user_id": "u_42"}},
            "data": {"id": "9001", "attributes": {
                "user_email": "buyer@example.com",
                "total_formatted": "$19.00",
                "first_order_item": {"variant_id": 1210603}
            }}
        }"#;
        let event = client(None).parse_webhook_event(body).unwrap();

        assert_eq!(event.kind(), EventKind::OrderCreated);
        assert_eq!(event.plan(), Some((Plan::Pro, BillingCycle::Monthly)));
        assert_eq!(event.user_id(), Some("u_42"));
        assert_eq!(event.user_email(), Some("buyer@example.com"));
        assert_eq!(event.resource_id(), "9001");
    }

    #[test]
    fn subscription_event_reads_variant_from_attributes() {
        let body = br#"{
            "meta": {"event_name": "subscription_updated",
                     "custom_data": {"user_email": "custom@example.com"}},
            "data": {"id": 7, "attributes": {"variant_id": "1210610", "status": "active",
                                             "user_email": "order@example.com"}}
        }"#;
        let event = client(None).parse_webhook_event(body).unwrap();

        assert_eq!(event.kind(), EventKind::SubscriptionUpdated);
        assert_eq!(event.plan(), Some((Plan::Business, BillingCycle::Yearly)));
        assert_eq!(event.user_email(), Some("custom@example.com"));
        assert_eq!(event.resource_id(), "7");
    }

    #[test]
    fn sparse_and_unknown_events_parse() {
        let event = client(None).parse_webhook_event(b"{}").unwrap();
        assert_eq!(event.kind(), EventKind::Other(String::new()));
        assert_eq!(event.plan(), None);

        let event = client(None)
            .parse_webhook_event(br#"{"meta": {"event_name": "license_key_created"}}"#)
            .unwrap();
        assert_eq!(event.kind().as_str(), "license_key_created");

        assert!(client(None).parse_webhook_event(b"not json").is_err());
    }
}
