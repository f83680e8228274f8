//! Server-rendered entry points for the portal's page routes.
//!
//! The portal UI itself lives elsewhere; these handlers only give the gate
//! something to protect: the login form (which carries the CSRF token in a
//! hidden field) and a JSON page context for protected sections.

use axum::{
    extract::{Query, State},
    http::{Method, Uri},
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::consts::CSRF_FIELD_NAME;
use crate::csrf::CsrfToken;
use crate::pipeline::{Locale, SessionUser};
use crate::routes::strip_locale_prefix;
use crate::token::User;
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub page: String,
    pub locale: String,
    pub user: User,
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Only same-site relative paths are accepted as post-login targets
fn safe_redirect(target: Option<&str>) -> Option<&str> {
    target.filter(|t| t.starts_with('/') && !t.starts_with("//") && !t.contains('\\'))
}

pub fn render_login_form(csrf_token: &str, locale: &str, redirect: Option<&str>) -> String {
    let redirect_field = match safe_redirect(redirect) {
        Some(target) => format!(
            r#"<input type="hidden" name="redirect" value="{}">"#,
            escape_html(target)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{locale}">
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
<form method="post" action="/api/auth/login">
<input type="hidden" name="{field}" value="{token}">
{redirect_field}
<label>Email <input type="email" name="email" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="current-password" required></label>
<button type="submit">Sign in</button>
</form>
</body>
</html>
"#,
        locale = escape_html(locale),
        field = CSRF_FIELD_NAME,
        token = escape_html(csrf_token),
    )
}

/// Fallback for every path without an API route: login form, protected
/// sections, or 404.
pub async fn render(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    locale: Option<Extension<Locale>>,
    csrf_token: Option<Extension<CsrfToken>>,
    session: Option<SessionUser>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, ApiError> {
    let (_, path) = strip_locale_prefix(uri.path(), &state.config.i18n.locales);
    let locale = locale
        .map(|Extension(Locale(l))| l)
        .unwrap_or_else(|| state.config.i18n.default_locale.clone());

    let is_login = state.routes.is_login(path);
    let is_protected = state.routes.is_protected(path);
    if !is_login && !is_protected {
        return Err(ApiError::not_found("Page not found"));
    }
    if method != Method::GET && method != Method::HEAD {
        return Err(ApiError::method_not_allowed("Pages only answer GET"));
    }

    if is_login {
        let Some(Extension(CsrfToken(token))) = csrf_token else {
            return Err(ApiError::internal("CSRF token unavailable"));
        };
        let html = render_login_form(&token, &locale, query.redirect.as_deref());
        return Ok(Html(html).into_response());
    }

    let Some(SessionUser(user)) = session else {
        return Err(ApiError::unauthorized("Not authenticated"));
    };

    Ok(Json(PageResponse {
        page: path.to_string(),
        locale,
        user,
    })
    .into_response())
}
