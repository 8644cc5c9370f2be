//! OAuth2 access tokens for a Google service account (JWT bearer grant).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;
/// Upper bound on a reported token lifetime.
const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 3600;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid service account credentials: {0}")]
    InvalidCredentials(String),

    #[error("Failed to sign token assertion: {0}")]
    Signing(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: chrono::DateTime<Utc>,
}

pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: Client,
    cached: RwLock<Option<CachedToken>>,
}

impl std::fmt::Debug for ServiceAccountAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountAuth")
            .field("project_id", &self.key.project_id)
            .field("client_email", &self.key.client_email)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountAuth {
    /// Parse a service-account JSON document and validate its private key.
    pub fn from_json(json: &str, client: Client) -> Result<Self, AuthError> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

        if key.project_id.is_empty() || key.client_email.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "project_id and client_email are required".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AuthError::InvalidCredentials(format!("private_key: {}", e)))?;

        Ok(Self {
            key,
            encoding_key,
            client,
            cached: RwLock::new(None),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    /// Return a cached token, or exchange a freshly signed assertion for a new one.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.valid_cached().await {
            return Ok(token);
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(existing) = cached.as_ref().filter(|t| is_fresh(t)) {
            return Ok(existing.token.clone());
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn valid_cached(&self) -> Option<String> {
        self.cached
            .read()
            .await
            .as_ref()
            .filter(|t| is_fresh(t))
            .map(|t| t.token.clone())
    }

    fn signed_assertion(&self) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    async fn fetch_token(&self) -> Result<CachedToken, AuthError> {
        let assertion = self.signed_assertion()?;

        tracing::debug!(
            project_id = %self.key.project_id,
            token_uri = %self.key.token_uri,
            "Exchanging service account assertion for access token"
        );

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange(format!(
                "{}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        Ok(CachedToken {
            token: token.access_token,
            expires_at: expiry_after(token.expires_in),
        })
    }
}

/// Expiry for a token valid for `expires_in` seconds, clamped to a sane range.
fn expiry_after(expires_in: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS))
}

fn is_fresh(token: &CachedToken) -> bool {
    token.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_KEY: &str = include_str!("../../../tests/fixtures/test_rsa_key.pem");

    fn credentials(token_uri: &str) -> String {
        json!({
            "type": "service_account",
            "project_id": "studio-test",
            "client_email": "studio@studio-test.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
            "token_uri": token_uri,
        })
        .to_string()
    }

    #[test]
    fn rejects_malformed_credentials() {
        assert!(matches!(
            ServiceAccountAuth::from_json("{}", Client::new()),
            Err(AuthError::InvalidCredentials(_))
        ));

        let bad_key = json!({
            "project_id": "p",
            "client_email": "e@p.iam.gserviceaccount.com",
            "private_key": "not a pem"
        })
        .to_string();
        assert!(matches!(
            ServiceAccountAuth::from_json(&bad_key, Client::new()),
            Err(AuthError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn token_uri_defaults_to_google() {
        let json = json!({
            "project_id": "p",
            "client_email": "e@p.iam.gserviceaccount.com",
            "private_key": TEST_KEY
        })
        .to_string();
        let auth = ServiceAccountAuth::from_json(&json, Client::new()).unwrap();
        assert_eq!(auth.key.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(auth.project_id(), "p");
    }

    #[test]
    fn assertion_is_an_rs256_jwt() {
        let auth = ServiceAccountAuth::from_json(&credentials("http://localhost/token"), Client::new())
            .unwrap();
        let jwt = auth.signed_assertion().unwrap();
        let header = jsonwebtoken::decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(jwt.split('.').count(), 3);
    }

    #[tokio::test]
    async fn token_is_exchanged_once_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.test-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::from_json(
            &credentials(&format!("{}/token", server.uri())),
            Client::new(),
        )
        .unwrap();

        assert_eq!(auth.access_token().await.unwrap(), "ya29.test-token");
        assert_eq!(auth.access_token().await.unwrap(), "ya29.test-token");
    }

    #[tokio::test]
    async fn nearly_expired_token_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "short-lived",
                "expires_in": 30
            })))
            .expect(2)
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::from_json(
            &credentials(&format!("{}/token", server.uri())),
            Client::new(),
        )
        .unwrap();

        auth.access_token().await.unwrap();
        auth.access_token().await.unwrap();
    }

    #[test]
    fn token_lifetime_is_clamped() {
        let now = Utc::now();
        assert!(expiry_after(i64::MAX) <= now + Duration::seconds(MAX_TOKEN_LIFETIME_SECS + 5));
        assert!(expiry_after(i64::MIN) <= Utc::now());
        assert!(expiry_after(-30) >= now);
    }

    #[tokio::test]
    async fn absurd_expires_in_still_yields_a_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "long-lived",
                "expires_in": i64::MAX
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::from_json(
            &credentials(&format!("{}/token", server.uri())),
            Client::new(),
        )
        .unwrap();

        assert_eq!(auth.access_token().await.unwrap(), "long-lived");
        assert_eq!(auth.access_token().await.unwrap(), "long-lived");
    }

    #[tokio::test]
    async fn exchange_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::from_json(
            &credentials(&format!("{}/token", server.uri())),
            Client::new(),
        )
        .unwrap();

        let err = auth.access_token().await.unwrap_err();
        assert!(err.to_string().contains("invalid_grant"));
    }
}
