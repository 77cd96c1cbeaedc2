use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::crypto::CryptoEngine;
use crate::error::AuthError;
use crate::providers::UserProfile;
use crate::token::TokenRecord;

pub const SESSION_COOKIE: &str = "schedulo.session-token";

/// Everything persisted for one signed-in browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEnvelope {
    pub record: TokenRecord,
    pub user: UserProfile,
    /// Epoch ms of the original sign-in; retention is measured from here.
    pub issued_at: i64,
}

impl SessionEnvelope {
    /// Same session carrying a newer token record.
    pub fn with_record(&self, record: TokenRecord) -> Self {
        Self {
            record,
            user: self.user.clone(),
            issued_at: self.issued_at,
        }
    }
}

pub struct SessionStore {
    max_age_ms: i64,
    secure: bool,
}

impl SessionStore {
    pub fn new(max_age: Duration, secure: bool) -> Self {
        Self {
            max_age_ms: i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX),
            secure,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.session_max_age, config.secure_cookies())
    }

    /// Encrypt an envelope into a cookie value.
    pub fn seal(&self, crypto: &CryptoEngine, envelope: &SessionEnvelope) -> Result<String, AuthError> {
        crypto.seal(envelope)
    }

    /// Decrypt a cookie value. Tampered, undecodable or expired sessions yield `None`.
    pub fn open(&self, crypto: &CryptoEngine, value: &str, now_ms: i64) -> Option<SessionEnvelope> {
        let envelope: SessionEnvelope = match crypto.open(value) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Discarding unreadable session cookie: {e}");
                return None;
            }
        };

        if now_ms >= self.expires_at(&envelope) {
            debug!("Discarding session past its retention window");
            return None;
        }

        Some(envelope)
    }

    pub fn expires_at(&self, envelope: &SessionEnvelope) -> i64 {
        envelope.issued_at.saturating_add(self.max_age_ms)
    }

    /// `Set-Cookie` value storing `sealed` until the envelope's retention ends.
    pub fn set_cookie(&self, sealed: &str, envelope: &SessionEnvelope, now_ms: i64) -> String {
        let remaining_secs = (self.expires_at(envelope) - now_ms).max(0) / 1000;
        self.cookie_header(sealed, remaining_secs)
    }

    /// `Set-Cookie` value deleting the session.
    pub fn clear_cookie(&self) -> String {
        self.cookie_header("", 0)
    }

    fn cookie_header(&self, value: &str, max_age_secs: i64) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Extract the raw session cookie value from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
            .map(|(_, value)| value.to_string())
    }
}
