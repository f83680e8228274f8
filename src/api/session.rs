use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;

use crate::consts::{ACCESS_TOKEN_COOKIE_NAME, REFRESH_TOKEN_COOKIE_NAME};
use crate::cookies::{read_cookie, removal_cookie};
use crate::csrf::{self, CsrfToken};
use crate::pipeline::SessionUser;
use crate::token::{self, User};
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    /// Seconds until the access token expires
    pub expires_in: u64,
    pub expiring_soon: bool,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Extract the bearer token: `access_token` cookie first, then `Authorization: Bearer`
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = read_cookie(headers, ACCESS_TOKEN_COOKIE_NAME) {
        return Some(token);
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

/// Mirror the current CSRF token to the client so it can echo it back
pub async fn csrf_token(
    token: Option<Extension<CsrfToken>>,
    headers: HeaderMap,
) -> Result<Json<CsrfTokenResponse>, ApiError> {
    let csrf_token = token
        .map(|Extension(CsrfToken(t))| t)
        .or_else(|| csrf::token_from_cookie(&headers))
        .ok_or_else(|| ApiError::internal("CSRF token unavailable"))?;

    Ok(Json(CsrfTokenResponse { csrf_token }))
}

/// Describe the current session from the bearer token's own claims
pub async fn current_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let bearer = bearer_token(&headers).ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let user = token::get_validated_user(&bearer).ok_or_else(|| {
        tracing::debug!(
            token = %token::sanitize_for_logging(Some(&bearer)),
            "Rejected session token"
        );
        ApiError::unauthorized("Session expired or invalid")
    })?;

    Ok(Json(SessionResponse {
        user,
        expires_in: token::time_to_expiry(&bearer),
        expiring_soon: token::is_expiring_soon(&bearer, state.config.session.expiry_buffer_secs),
    }))
}

/// Drop the access, refresh and CSRF cookies
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    let secure = state.config.secure_cookies();
    let jar = jar
        .add(removal_cookie(ACCESS_TOKEN_COOKIE_NAME, "/", secure))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE_NAME, "/", secure));
    let jar = csrf::clear_token_cookie(jar, &csrf::cookie_options(&state.config));

    tracing::info!("Session cookies cleared");

    (jar, Json(LogoutResponse { success: true }))
}

/// Extractor for the authenticated user.
///
/// Uses the user the auth gate attached when present, otherwise decodes the
/// bearer token itself (expiry included).
#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<SessionUser>() {
            return Ok(user.clone());
        }

        let bearer =
            bearer_token(&parts.headers).ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
        token::get_validated_user(&bearer)
            .map(SessionUser)
            .ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))
    }
}
