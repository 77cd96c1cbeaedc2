use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Absolute session retention: 30 days from sign-in.
const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// Application configuration, loaded once from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // ── Server ──────────────────────────────────────────────────────────
    pub host: String,
    pub port: u16,
    /// Canonical application URL. Post-auth redirects never leave this origin.
    pub base_url: String,

    // ── Crypto ──────────────────────────────────────────────────────────
    /// 32-byte base64-encoded master key for AES-256-GCM session sealing.
    pub master_key: String,
    /// 32-byte base64-encoded HMAC key for state parameter signing.
    pub hmac_secret: String,

    // ── Session ─────────────────────────────────────────────────────────
    pub session_max_age: Duration,

    // ── OAuth Provider Credentials ──────────────────────────────────────
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_token_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let session_max_age = match var("SESSION_MAX_AGE_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse().context("Invalid SESSION_MAX_AGE_SECS")?,
            ),
            None => Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECS),
        };

        Ok(Config {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: var("PORT")
                .unwrap_or_else(|| "3000".into())
                .parse()
                .context("Invalid PORT")?,
            base_url: var("BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".into())
                .trim_end_matches('/')
                .to_string(),

            master_key: var("MASTER_KEY").context("MASTER_KEY is required (32 bytes, base64)")?,
            hmac_secret: var("HMAC_SECRET")
                .context("HMAC_SECRET is required (32 bytes, base64)")?,

            session_max_age,

            google_client_id: var("GOOGLE_CLIENT_ID"),
            google_client_secret: var("GOOGLE_CLIENT_SECRET"),
            google_token_url: var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_GOOGLE_TOKEN_URL.into()),
        })
    }

    /// Get the OAuth callback URL for a specific provider.
    pub fn callback_url(&self, provider: &str) -> String {
        format!("{}/v1/auth/callback/{}", self.base_url, provider)
    }

    /// Whether session cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}
