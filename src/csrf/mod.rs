//! CSRF protection using the double-submit cookie pattern.
//!
//! The server keeps the token in an HTTP-only `csrf_token` cookie and hands the
//! same value to the page once (JSON body or hidden form field). State-changing
//! requests must echo it back in the `x-csrf-token` header, a JSON `csrf_token`
//! field, or a form field of the same name. A cross-site page can trigger the
//! request but cannot read the cookie, so it cannot supply the echo.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method, Request},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use rand::RngCore;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::Config;
use crate::consts::{CSRF_COOKIE_NAME, CSRF_FIELD_NAME, CSRF_HEADER_NAME, CSRF_TOKEN_BYTES};
use crate::cookies::{http_only_cookie, read_cookie, removal_cookie, CookieOptions};
use crate::token::bytes_equal;

/// Why a state-changing request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CsrfError {
    #[error("CSRF token not found in cookie. Please refresh the page and try again.")]
    MissingCookie,
    #[error("CSRF token not found in request. Send it in the x-csrf-token header or the csrf_token field.")]
    MissingRequestToken,
    #[error("CSRF token mismatch. Please refresh the page and try again.")]
    Mismatch,
}

impl CsrfError {
    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            CsrfError::MissingCookie => "missing_cookie",
            CsrfError::MissingRequestToken => "missing_request_token",
            CsrfError::Mismatch => "mismatch",
        }
    }
}

/// The CSRF token in force for the current request, for handlers that mirror it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

/// Cookie options for the CSRF cookie derived from configuration
pub fn cookie_options(config: &Config) -> CookieOptions {
    CookieOptions {
        max_age_secs: config.csrf.max_age_secs,
        path: config.csrf.path.clone(),
        same_site: config.csrf.same_site.into(),
        secure: config.secure_cookies(),
    }
}

/// 256 bits from the thread-local CSPRNG, hex-encoded (64 characters)
pub fn generate_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn set_token_cookie(jar: CookieJar, token: &str, options: &CookieOptions) -> CookieJar {
    jar.add(http_only_cookie(CSRF_COOKIE_NAME, token.to_owned(), options))
}

pub fn clear_token_cookie(jar: CookieJar, options: &CookieOptions) -> CookieJar {
    jar.add(removal_cookie(CSRF_COOKIE_NAME, &options.path, options.secure))
}

/// The server-side half of the pair, as sent back by the browser
pub fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    read_cookie(headers, CSRF_COOKIE_NAME)
}

/// True for methods that change state: POST, PUT, PATCH, DELETE
pub fn requires_protection(method: &str) -> bool {
    matches!(
        method.to_ascii_uppercase().as_str(),
        "POST" | "PUT" | "PATCH" | "DELETE"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
    Multipart,
}

impl BodyKind {
    fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
        if mime == "application/json" || mime.ends_with("+json") {
            Some(BodyKind::Json)
        } else if mime == "application/x-www-form-urlencoded" {
            Some(BodyKind::UrlEncoded)
        } else if mime == "multipart/form-data" {
            Some(BodyKind::Multipart)
        } else {
            None
        }
    }
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CSRF_HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn json_token(bytes: &Bytes) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    value
        .get(CSRF_FIELD_NAME)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Re-wrap the buffered body so axum's own form/multipart parsers can read it
fn probe_request(content_type: &HeaderValue, bytes: Bytes) -> Option<Request<Body>> {
    Request::builder()
        .method(Method::POST)
        .header(CONTENT_TYPE, content_type.clone())
        .body(Body::from(bytes))
        .ok()
}

async fn urlencoded_token(content_type: &HeaderValue, bytes: Bytes) -> Option<String> {
    let request = probe_request(content_type, bytes)?;
    let Form(mut fields) = Form::<HashMap<String, String>>::from_request(request, &())
        .await
        .ok()?;
    fields.remove(CSRF_FIELD_NAME).filter(|v| !v.is_empty())
}

async fn multipart_token(content_type: &HeaderValue, bytes: Bytes) -> Option<String> {
    let request = probe_request(content_type, bytes)?;
    let mut multipart = Multipart::from_request(request, &()).await.ok()?;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(CSRF_FIELD_NAME) {
            return field.text().await.ok().filter(|v| !v.is_empty());
        }
    }
    None
}

/// Find the client-supplied token: header first, then JSON body, then form body.
///
/// When the body has to be inspected it is buffered (up to `limit` bytes) and
/// put back, so the returned request is still readable by the handler.
/// Unparseable or oversized bodies count as "no token".
pub async fn extract_from_request(
    request: Request<Body>,
    limit: usize,
) -> (Request<Body>, Option<String>) {
    if let Some(token) = header_token(request.headers()) {
        return (request, Some(token));
    }

    let Some(content_type) = request.headers().get(CONTENT_TYPE).cloned() else {
        return (request, None);
    };
    let Some(kind) = content_type
        .to_str()
        .ok()
        .and_then(BodyKind::from_content_type)
    else {
        return (request, None);
    };

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Could not buffer request body for CSRF lookup");
            return (Request::from_parts(parts, Body::empty()), None);
        }
    };

    let token = match kind {
        BodyKind::Json => json_token(&bytes),
        BodyKind::UrlEncoded => urlencoded_token(&content_type, bytes.clone()).await,
        BodyKind::Multipart => multipart_token(&content_type, bytes.clone()).await,
    };

    (Request::from_parts(parts, Body::from(bytes)), token)
}

/// Check the double-submit pair on a request.
///
/// Returns the request (body intact) together with the validated token or the
/// reason for refusal. Lengths are compared before any byte comparison; the
/// byte comparison itself is constant-time.
pub async fn validate(
    request: Request<Body>,
    limit: usize,
) -> (Request<Body>, Result<String, CsrfError>) {
    let Some(cookie_token) = token_from_cookie(request.headers()) else {
        return (request, Err(CsrfError::MissingCookie));
    };

    let (request, supplied) = extract_from_request(request, limit).await;
    let Some(supplied) = supplied else {
        return (request, Err(CsrfError::MissingRequestToken));
    };

    if supplied.len() != cookie_token.len() {
        return (request, Err(CsrfError::Mismatch));
    }

    if bytes_equal(supplied.as_bytes(), cookie_token.as_bytes()) {
        (request, Ok(cookie_token))
    } else {
        (request, Err(CsrfError::Mismatch))
    }
}
