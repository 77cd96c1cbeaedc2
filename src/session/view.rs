use serde::{Deserialize, Serialize};

use crate::providers::{ProviderKind, UserProfile};
use crate::token::{TokenError, TokenRecord};

/// Session as seen by the mail and calendar integrations.
///
/// Derived from a [`TokenRecord`] on every read. Absent credentials are omitted
/// from the serialized form rather than written as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TokenError>,
}

impl SessionView {
    pub fn project(record: &TokenRecord, user: &UserProfile) -> Self {
        Self {
            user: user.clone(),
            access_token: record.access_token.clone(),
            refresh_token: record.refresh_token.clone(),
            provider: record.provider,
            error: record.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TokenRecord {
        TokenRecord {
            access_token: Some("A1".into()),
            refresh_token: Some("R1".into()),
            expires_at: 1_700_000_000_000,
            provider: ProviderKind::Google,
            error: None,
        }
    }

    fn user() -> UserProfile {
        UserProfile {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            image: None,
        }
    }

    #[test]
    fn test_projection_copies_credentials() {
        let view = SessionView::project(&record(), &user());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["accessToken"], "A1");
        assert_eq!(json["refreshToken"], "R1");
        assert_eq!(json["provider"], "google");
        assert_eq!(json["user"]["email"], "ada@example.com");
        assert!(json.get("error").is_none());
        assert!(json.get("expiresAt").is_none());
    }

    #[test]
    fn test_absent_access_token_is_omitted() {
        let record = TokenRecord {
            access_token: None,
            refresh_token: None,
            ..record()
        };
        let json = serde_json::to_value(SessionView::project(&record, &user())).unwrap();
        assert!(json.get("accessToken").is_none());
        assert!(json.get("refreshToken").is_none());
        assert_eq!(json["provider"], "google");
    }

    #[test]
    fn test_error_is_surfaced() {
        let record = record().with_error(TokenError::RefreshAccessTokenError);
        let json = serde_json::to_value(SessionView::project(&record, &user())).unwrap();
        assert_eq!(json["error"], "RefreshAccessTokenError");
        assert_eq!(json["accessToken"], "A1");
    }

    #[test]
    fn test_projection_is_idempotent() {
        let record = record();
        let first = SessionView::project(&record, &user());
        let second = SessionView::project(&record, &user());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
