//! API route handlers for schedulo-auth.
//!
//! All handlers receive `SharedState` via Axum state extraction. Sessions travel
//! in an encrypted cookie; every read runs the token lifecycle and re-seals the
//! cookie when the record changed.

use axum::{
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{self, normalize_redirect};
use crate::error::AuthError;
use crate::providers::ProviderKind;
use crate::session::SessionView;
use crate::store::{SessionEnvelope, SessionStore};
use crate::token::TokenLifecycleManager;
use crate::{AppState, SharedState};

/// OAuth state older than this is rejected at the callback.
const STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;

const DEFAULT_DESTINATION: &str = "/dashboard";

// =============================================================================
// V1 Router
// =============================================================================

pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        // ── Health ───────────────────────────────────────────────────────
        .route("/status", get(status))
        // ── Sign-in flow ─────────────────────────────────────────────────
        .route("/auth/providers", get(auth_providers))
        .route("/auth/signin/{provider}", get(auth_signin))
        .route("/auth/callback/{provider}", get(auth_callback))
        .route("/auth/signout", post(auth_signout))
        // ── Session ──────────────────────────────────────────────────────
        .route("/auth/session", get(auth_session))
        .route("/auth/credentials/mail", get(credentials_mail))
        .route("/auth/credentials/calendar", get(credentials_calendar))
        .with_state(state)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Signed payload carried through the provider round-trip.
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthState {
    pub provider: ProviderKind,
    pub callback_url: String,
    pub issued_at: i64,
}

fn with_cookie(mut resp: Response, cookie: Option<String>) -> Result<Response, AuthError> {
    if let Some(cookie) = cookie {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| AuthError::Internal(format!("invalid cookie header: {e}")))?;
        resp.headers_mut().append(SET_COOKIE, value);
    }
    Ok(resp)
}

/// Redirect to the frontend error page with a sign-in error code.
fn error_page(state: &AppState, code: &str) -> Response {
    let url = format!("{}/auth/error?error={}", state.config.base_url, code);
    Redirect::temporary(&url).into_response()
}

// =============================================================================
// Health
// =============================================================================

async fn status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "schedulo-auth",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// Sign-in Flow
// =============================================================================

/// GET /v1/auth/providers — List configured providers the gate admits.
async fn auth_providers(State(state): State<SharedState>) -> impl IntoResponse {
    let providers: Vec<_> = state
        .registry
        .list()
        .into_iter()
        .filter(|p| state.gate.admits(p.kind().as_str()))
        .map(|p| json!({ "id": p.kind(), "name": p.display_name() }))
        .collect();
    Json(json!({ "data": providers }))
}

#[derive(Deserialize)]
struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    callback_url: Option<String>,
}

/// GET /v1/auth/signin/:provider — Redirect the browser to the provider's consent page.
async fn auth_signin(
    State(state): State<SharedState>,
    Path(provider_id): Path<String>,
    Query(q): Query<SignInQuery>,
) -> Result<Response, AuthError> {
    let kind: ProviderKind = provider_id.parse()?;
    if !state.gate.admits(kind.as_str()) {
        info!("Sign-in refused for provider {kind}");
        return Ok(error_page(&state, "AccessDenied"));
    }

    let provider = state
        .registry
        .get(kind)
        .ok_or_else(|| AuthError::ProviderNotFound(provider_id.clone()))?;

    let requested = q.callback_url.as_deref().unwrap_or(DEFAULT_DESTINATION);
    let oauth_state = OAuthState {
        provider: provider.kind(),
        callback_url: normalize_redirect(requested, &state.config.base_url),
        issued_at: now_ms(),
    };
    let signed_state = state.crypto.sign_state(&oauth_state)?;

    let redirect_uri = state.config.callback_url(provider.kind().as_str());
    let auth_url = provider.auth_url(&signed_state, &redirect_uri);

    Ok(Redirect::temporary(&auth_url).into_response())
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// GET /v1/auth/callback/:provider — Complete sign-in and start the session.
///
/// Failures never surface as JSON: the browser lands on the error page with
/// `OAuthCallback` for provider-side failures and `Callback` for everything else.
async fn auth_callback(
    State(state): State<SharedState>,
    Path(provider_id): Path<String>,
    Query(q): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = q.error {
        warn!("Provider {provider_id} returned error: {error}");
        return error_page(&state, "OAuthCallback");
    }

    match complete_sign_in(&state, &provider_id, q.state, q.code).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!("Sign-in with {provider_id} failed: {e}");
            error_page(&state, callback_error_code(&e))
        }
    }
}

fn callback_error_code(err: &AuthError) -> &'static str {
    match err {
        AuthError::FlowError(_) => "OAuthCallback",
        _ => "Callback",
    }
}

async fn complete_sign_in(
    state: &AppState,
    provider_id: &str,
    signed: Option<String>,
    code: Option<String>,
) -> Result<Response, AuthError> {
    let signed = signed.ok_or_else(|| AuthError::BadRequest("missing state parameter".into()))?;
    let code = code.ok_or_else(|| AuthError::BadRequest("missing code parameter".into()))?;

    let oauth_state: OAuthState = state.crypto.verify_state(&signed)?;
    if oauth_state.provider.as_str() != provider_id {
        return Err(AuthError::InvalidState);
    }

    let now = now_ms();
    if now - oauth_state.issued_at > STATE_MAX_AGE_MS {
        return Err(AuthError::BadRequest("OAuth session expired".into()));
    }

    if !state.gate.admits(provider_id) {
        info!("Sign-in rejected for provider {provider_id}");
        return Ok(error_page(state, "AccessDenied"));
    }

    let provider = state
        .registry
        .get(oauth_state.provider)
        .ok_or_else(|| AuthError::ProviderNotFound(provider_id.to_string()))?;

    let redirect_uri = state.config.callback_url(provider_id);
    let tokens = provider.exchange_code(&code, &redirect_uri).await?;

    let user = match provider.fetch_profile(&tokens.access_token).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Continuing sign-in without {provider_id} profile: {e}");
            Default::default()
        }
    };

    let envelope = SessionEnvelope {
        record: TokenLifecycleManager::sign_in(oauth_state.provider, &tokens, now),
        user,
        issued_at: now,
    };
    let sealed = state.sessions.seal(&state.crypto, &envelope)?;
    let cookie = state.sessions.set_cookie(&sealed, &envelope, now);

    info!("Signed in with {provider_id}");

    let destination = normalize_redirect(&oauth_state.callback_url, &state.config.base_url);
    with_cookie(Redirect::temporary(&destination).into_response(), Some(cookie))
}

/// POST /v1/auth/signout — Drop the session cookie.
async fn auth_signout(State(state): State<SharedState>) -> Result<Response, AuthError> {
    let url = format!("{}/auth/signin", state.config.base_url);
    let resp = Json(json!({ "data": { "url": url } })).into_response();
    with_cookie(resp, Some(state.sessions.clear_cookie()))
}

// =============================================================================
// Session
// =============================================================================

struct LoadedSession {
    view: SessionView,
    /// `Set-Cookie` value when the token record changed during this read.
    cookie: Option<String>,
}

async fn load_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<LoadedSession>, AuthError> {
    let Some(raw) = SessionStore::from_headers(headers) else {
        return Ok(None);
    };

    let now = now_ms();
    let Some(envelope) = state.sessions.open(&state.crypto, &raw, now) else {
        return Ok(None);
    };

    let record = state.lifecycle.advance(envelope.record.clone(), now).await;
    if record == envelope.record {
        return Ok(Some(LoadedSession {
            view: SessionView::project(&envelope.record, &envelope.user),
            cookie: None,
        }));
    }

    let updated = envelope.with_record(record);
    let sealed = state.sessions.seal(&state.crypto, &updated)?;
    Ok(Some(LoadedSession {
        view: SessionView::project(&updated.record, &updated.user),
        cookie: Some(state.sessions.set_cookie(&sealed, &updated, now)),
    }))
}

/// GET /v1/auth/session — Current session view, refreshing tokens when stale.
async fn auth_session(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    match load_session(&state, &headers).await? {
        Some(session) => {
            let resp = Json(json!({ "data": session.view })).into_response();
            with_cookie(resp, session.cookie)
        }
        None => Ok(Json(json!({ "data": null })).into_response()),
    }
}

/// GET /v1/auth/credentials/mail — Tokens for token-based SMTP authentication.
async fn credentials_mail(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let session = load_session(&state, &headers)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    // The refreshed cookie is kept even when the guard rejects the session.
    let resp = match auth::mail_credentials(&session.view) {
        Ok(creds) => Json(json!({ "data": creds })).into_response(),
        Err(e) => e.into_response(),
    };
    with_cookie(resp, session.cookie)
}

/// GET /v1/auth/credentials/calendar — Access token for Calendar API calls.
async fn credentials_calendar(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let session = load_session(&state, &headers)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    let resp = match auth::calendar_credentials(&session.view) {
        Ok(creds) => Json(json!({ "data": creds })).into_response(),
        Err(e) => e.into_response(),
    };
    with_cookie(resp, session.cookie)
}
