//! Token lifecycle: build records at sign-in and refresh them on session checks.
//!
//! Every session read calls [`TokenLifecycleManager::advance`]. Fresh tokens take
//! the fast path with no network call. Stale tokens from a refreshable provider are
//! exchanged at the provider's token endpoint; failures are captured on the record
//! and the next session check tries again.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, info};

use super::record::{TokenError, TokenRecord};
use crate::error::AuthError;
use crate::providers::{ProviderKind, ProviderRegistry, RefreshCapability, TokenSet};

/// Refresh once the access token is within five minutes of expiry.
pub const REFRESH_MARGIN_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

pub struct TokenLifecycleManager {
    capabilities: HashMap<ProviderKind, RefreshCapability>,
    http: reqwest::Client,
}

impl TokenLifecycleManager {
    pub fn new(capabilities: HashMap<ProviderKind, RefreshCapability>) -> Self {
        Self {
            capabilities,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_registry(registry: &ProviderRegistry) -> Self {
        Self::new(registry.capabilities())
    }

    /// Build the first record for an identity straight from the provider's callback tokens.
    pub fn sign_in(provider: ProviderKind, tokens: &TokenSet, now_ms: i64) -> TokenRecord {
        let expires_at = tokens
            .expires_in
            .map(|secs| now_ms.saturating_add(secs_to_ms(secs)))
            .unwrap_or(0);

        TokenRecord {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: tokens.refresh_token.clone(),
            expires_at,
            provider,
            error: None,
        }
    }

    /// Return `record` unchanged, refreshed, or marked with a refresh error.
    ///
    /// Never fails: transport and provider errors end up in `TokenRecord::error`.
    pub async fn advance(&self, record: TokenRecord, now_ms: i64) -> TokenRecord {
        if record.is_fresh(now_ms, REFRESH_MARGIN_MS) {
            return record;
        }

        let Some(RefreshCapability::Refreshable {
            token_endpoint,
            client_id,
            client_secret,
        }) = self.capabilities.get(&record.provider)
        else {
            return record;
        };

        let Some(refresh_token) = record.refresh_token.as_deref() else {
            debug!("{} token is stale but has no refresh token", record.provider);
            return record;
        };

        let outcome = self
            .request_refresh(token_endpoint, client_id, client_secret, refresh_token)
            .await;

        match outcome {
            Ok(refreshed) => {
                let expires_at = now_ms.saturating_add(refreshed.expires_in.saturating_mul(1000));
                info!("Refreshed {} access token", record.provider);
                TokenRecord {
                    access_token: Some(refreshed.access_token),
                    refresh_token: refreshed.refresh_token.or(record.refresh_token),
                    expires_at: expires_at.max(record.expires_at),
                    provider: record.provider,
                    error: None,
                }
            }
            Err(e) => {
                error!("Error refreshing {} access token: {e}", record.provider);
                record.with_error(TokenError::RefreshAccessTokenError)
            }
        }
    }

    async fn request_refresh(
        &self,
        token_endpoint: &str,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<RefreshResponse, AuthError> {
        let resp = self
            .http
            .post(token_endpoint)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("Refresh request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("Failed to parse refresh response: {e}")))
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX).saturating_mul(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NOW: i64 = 1_700_000_000_000;

    fn manager(endpoint: &str) -> TokenLifecycleManager {
        let mut caps = HashMap::new();
        caps.insert(
            ProviderKind::Google,
            RefreshCapability::Refreshable {
                token_endpoint: endpoint.to_string(),
                client_id: "cid".into(),
                client_secret: "csecret".into(),
            },
        );
        caps.insert(ProviderKind::Github, RefreshCapability::NonRefreshable);
        TokenLifecycleManager::new(caps)
    }

    fn google_record(expires_at: i64) -> TokenRecord {
        TokenRecord {
            access_token: Some("A1".into()),
            refresh_token: Some("R1".into()),
            expires_at,
            provider: ProviderKind::Google,
            error: None,
        }
    }

    async fn token_server(response: ResponseTemplate, expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(response)
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_sign_in_converts_expiry_to_ms() {
        let tokens = TokenSet {
            access_token: "A1".into(),
            refresh_token: Some("R1".into()),
            expires_in: Some(3600),
        };
        let record = TokenLifecycleManager::sign_in(ProviderKind::Google, &tokens, NOW);
        assert_eq!(record.access_token.as_deref(), Some("A1"));
        assert_eq!(record.refresh_token.as_deref(), Some("R1"));
        assert_eq!(record.expires_at, NOW + 3_600_000);
        assert_eq!(record.provider, ProviderKind::Google);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_sign_in_without_expiry() {
        let tokens = TokenSet {
            access_token: "gho_abc".into(),
            refresh_token: None,
            expires_in: None,
        };
        let record = TokenLifecycleManager::sign_in(ProviderKind::Github, &tokens, NOW);
        assert_eq!(record.expires_at, 0);
        assert!(record.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_fresh_token_returned_unchanged_without_call() {
        let server = token_server(ResponseTemplate::new(200), 0).await;
        let record = google_record(NOW + REFRESH_MARGIN_MS + 1);

        let result = manager(&format!("{}/token", server.uri()))
            .advance(record.clone(), NOW)
            .await;
        assert_eq!(result, record);
    }

    #[tokio::test]
    async fn test_stale_token_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=R1"))
            .and(body_string_contains("client_id=cid"))
            .and(body_string_contains("client_secret=csecret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A2",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = manager(&format!("{}/token", server.uri()))
            .advance(google_record(NOW + 60_000), NOW)
            .await;

        assert_eq!(result.access_token.as_deref(), Some("A2"));
        assert_eq!(result.expires_at, NOW + 3_600_000);
        assert_eq!(result.refresh_token.as_deref(), Some("R1"));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_refresh_replaces_rotated_refresh_token() {
        let server = token_server(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A2",
                "expires_in": 3600,
                "refresh_token": "R2",
            })),
            1,
        )
        .await;

        let result = manager(&format!("{}/token", server.uri()))
            .advance(google_record(NOW - 1), NOW)
            .await;
        assert_eq!(result.refresh_token.as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_refresh_http_error_marks_record() {
        let server = token_server(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
            })),
            1,
        )
        .await;
        let record = google_record(NOW - 1);

        let result = manager(&format!("{}/token", server.uri()))
            .advance(record.clone(), NOW)
            .await;

        assert_eq!(result.error, Some(TokenError::RefreshAccessTokenError));
        assert_eq!(result.access_token, record.access_token);
        assert_eq!(result.refresh_token, record.refresh_token);
        assert_eq!(result.expires_at, record.expires_at);
    }

    #[tokio::test]
    async fn test_refresh_malformed_payload_marks_record() {
        let server = token_server(
            ResponseTemplate::new(200).set_body_string("not json"),
            1,
        )
        .await;

        let result = manager(&format!("{}/token", server.uri()))
            .advance(google_record(NOW - 1), NOW)
            .await;
        assert_eq!(result.error, Some(TokenError::RefreshAccessTokenError));
        assert_eq!(result.access_token.as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn test_refresh_unreachable_endpoint_marks_record() {
        let result = manager("http://127.0.0.1:1/token")
            .advance(google_record(NOW - 1), NOW)
            .await;
        assert_eq!(result.error, Some(TokenError::RefreshAccessTokenError));
    }

    #[tokio::test]
    async fn test_successful_refresh_clears_previous_error() {
        let server = token_server(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A3",
                "expires_in": 3600,
            })),
            1,
        )
        .await;
        let degraded = google_record(NOW - 1).with_error(TokenError::RefreshAccessTokenError);

        let result = manager(&format!("{}/token", server.uri()))
            .advance(degraded, NOW)
            .await;
        assert!(result.error.is_none());
        assert_eq!(result.access_token.as_deref(), Some("A3"));
    }

    #[tokio::test]
    async fn test_refresh_never_moves_expiry_backwards() {
        let server = token_server(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A2",
                "expires_in": 60,
            })),
            1,
        )
        .await;
        let old_expiry = NOW + 4 * 60 * 1000;

        let result = manager(&format!("{}/token", server.uri()))
            .advance(google_record(old_expiry), NOW)
            .await;
        assert_eq!(result.access_token.as_deref(), Some("A2"));
        assert_eq!(result.expires_at, old_expiry);
    }

    #[tokio::test]
    async fn test_non_refreshable_provider_unchanged() {
        let server = token_server(ResponseTemplate::new(200), 0).await;
        let record = TokenRecord {
            provider: ProviderKind::Github,
            ..google_record(NOW - 1)
        };

        let result = manager(&format!("{}/token", server.uri()))
            .advance(record.clone(), NOW)
            .await;
        assert_eq!(result, record);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_unchanged() {
        let server = token_server(ResponseTemplate::new(200), 0).await;
        let record = TokenRecord {
            refresh_token: None,
            ..google_record(NOW - 1)
        };

        let result = manager(&format!("{}/token", server.uri()))
            .advance(record.clone(), NOW)
            .await;
        assert_eq!(result, record);
    }

    #[tokio::test]
    async fn test_unregistered_provider_unchanged() {
        let lifecycle = TokenLifecycleManager::new(HashMap::new());
        let record = google_record(NOW - 1);
        assert_eq!(lifecycle.advance(record.clone(), NOW).await, record);
    }
}
