use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// Identity providers a session can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Github,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Github => "github",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(ProviderKind::Google),
            "github" => Ok(ProviderKind::Github),
            other => Err(AuthError::ProviderNotFound(other.to_string())),
        }
    }
}

/// A set of tokens returned from an OAuth provider after code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime of `access_token` in seconds, when the provider states one.
    pub expires_in: Option<u64>,
}

/// User display fields carried into the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Whether tokens from a provider can be renewed, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshCapability {
    Refreshable {
        token_endpoint: String,
        client_id: String,
        client_secret: String,
    },
    NonRefreshable,
}

/// Trait that every OAuth provider must implement.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Human-readable display name (e.g., "Google").
    fn display_name(&self) -> &str;

    /// Scopes requested at sign-in.
    fn scopes(&self) -> Vec<String>;

    /// Build the authorization URL that the user should be redirected to.
    ///
    /// - `state`: An opaque, HMAC-signed state string for CSRF protection.
    /// - `redirect_uri`: The callback URL registered with the provider.
    fn auth_url(&self, state: &str, redirect_uri: &str) -> String;

    /// Exchange an authorization code for an access token (and optionally refresh token).
    async fn exchange_code(&self, code: &str, redirect_uri: &str)
        -> Result<TokenSet, AuthError>;

    /// Look up the signed-in user's display fields.
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, AuthError>;

    fn refresh_capability(&self) -> RefreshCapability {
        RefreshCapability::NonRefreshable
    }
}

/// Simple percent-encoding for URL parameters.
pub(crate) fn urlencoding(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
