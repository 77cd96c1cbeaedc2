use serde::{Deserialize, Serialize};

use crate::providers::ProviderKind;

/// Failure marker recorded on a degraded [`TokenRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenError {
    RefreshAccessTokenError,
}

/// Credential state for one authenticated identity.
///
/// Records are never mutated in place: every lifecycle step returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Epoch milliseconds after which `access_token` is stale. `0` means unknown.
    pub expires_at: i64,
    pub provider: ProviderKind,
    pub error: Option<TokenError>,
}

impl TokenRecord {
    /// Whether the access token is still good for more than `margin_ms`.
    pub fn is_fresh(&self, now_ms: i64, margin_ms: i64) -> bool {
        self.expires_at > 0 && now_ms < self.expires_at - margin_ms
    }

    /// Same record with the failure marker set; token fields are untouched.
    pub fn with_error(&self, error: TokenError) -> Self {
        Self {
            error: Some(error),
            ..self.clone()
        }
    }
}
