use async_trait::async_trait;
use serde::Deserialize;

use super::traits::{urlencoding, OAuthProvider, ProviderKind, RefreshCapability, TokenSet, UserProfile};
use crate::config::DEFAULT_GOOGLE_TOKEN_URL;
use crate::error::AuthError;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Google OAuth 2.0 provider.
///
/// Requests profile and Calendar scopes so the calendar integration can create
/// Meet events with the session's access token.
/// Token lifetime: 1 hour.
/// Refresh: Supported (requires `access_type=offline` and `prompt=consent`).
pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    token_url: String,
    userinfo_url: String,
    http: reqwest::Client,
}

// Raw token response from Google's token endpoint
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            token_url: DEFAULT_GOOGLE_TOKEN_URL.into(),
            userinfo_url: USERINFO_URL.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn display_name(&self) -> &str {
        "Google"
    }

    fn scopes(&self) -> Vec<String> {
        vec![
            "https://www.googleapis.com/auth/userinfo.email".into(),
            "https://www.googleapis.com/auth/userinfo.profile".into(),
            "https://www.googleapis.com/auth/calendar".into(),
            "https://www.googleapis.com/auth/calendar.events".into(),
        ]
    }

    fn auth_url(&self, state: &str, redirect_uri: &str) -> String {
        let scope_str = self.scopes().join(" ");
        format!(
            "{AUTHORIZE_URL}?\
             client_id={client_id}\
             &redirect_uri={redirect_uri}\
             &response_type=code\
             &scope={scope}\
             &state={state}\
             &access_type=offline\
             &prompt=consent",
            client_id = urlencoding(&self.client_id),
            redirect_uri = urlencoding(redirect_uri),
            scope = urlencoding(&scope_str),
            state = urlencoding(state),
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenSet, AuthError> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::FlowError(format!("Token exchange request failed: {e}")))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::FlowError(format!(
                "Google token exchange failed: {body}"
            )));
        }

        let token_resp: GoogleTokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::FlowError(format!("Failed to parse token response: {e}")))?;

        Ok(TokenSet {
            access_token: token_resp.access_token,
            refresh_token: token_resp.refresh_token,
            expires_in: token_resp.expires_in,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        let resp = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::FlowError(format!("Userinfo request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AuthError::FlowError(format!(
                "Google userinfo failed with status {}",
                resp.status()
            )));
        }

        let info: GoogleUserInfo = resp
            .json()
            .await
            .map_err(|e| AuthError::FlowError(format!("Failed to parse userinfo: {e}")))?;

        Ok(UserProfile {
            name: info.name,
            email: info.email,
            image: info.picture,
        })
    }

    fn refresh_capability(&self) -> RefreshCapability {
        RefreshCapability::Refreshable {
            token_endpoint: self.token_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}
