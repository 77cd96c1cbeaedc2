//! Admission rules the mail and calendar integrations apply to a session.

use serde::Serialize;

use crate::error::AuthError;
use crate::providers::ProviderKind;
use crate::session::SessionView;

const REAUTH_MESSAGE: &str = "Your session has expired. Please sign in again with Google.";
const MISSING_TOKEN_MESSAGE: &str = "Missing access token. Please re-authenticate with Google.";

/// Credentials for token-based SMTP authentication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailCredentials {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Credentials for Calendar API calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarCredentials {
    pub access_token: String,
}

fn usable_access_token(view: &SessionView) -> Result<String, AuthError> {
    if view.error.is_some() {
        return Err(AuthError::Reauthenticate(REAUTH_MESSAGE.into()));
    }
    view.access_token
        .clone()
        .ok_or_else(|| AuthError::Reauthenticate(MISSING_TOKEN_MESSAGE.into()))
}

pub fn mail_credentials(view: &SessionView) -> Result<MailCredentials, AuthError> {
    Ok(MailCredentials {
        access_token: usable_access_token(view)?,
        refresh_token: view.refresh_token.clone(),
    })
}

pub fn calendar_credentials(view: &SessionView) -> Result<CalendarCredentials, AuthError> {
    if view.provider != ProviderKind::Google {
        return Err(AuthError::Forbidden(
            "Google Calendar access requires Google authentication".into(),
        ));
    }
    Ok(CalendarCredentials {
        access_token: usable_access_token(view)?,
    })
}
