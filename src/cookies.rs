use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::config::SameSitePolicy;

/// Attributes shared by every cookie this crate writes
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub max_age_secs: i64,
    pub path: String,
    pub same_site: SameSite,
    pub secure: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age_secs: crate::consts::CSRF_DEFAULT_MAX_AGE_SECS,
            path: "/".to_string(),
            same_site: SameSite::Lax,
            secure: false,
        }
    }
}

impl From<SameSitePolicy> for SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

pub fn http_only_cookie(name: &'static str, value: String, options: &CookieOptions) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(options.path.clone())
        .http_only(true)
        .same_site(options.same_site)
        .secure(options.secure)
        .max_age(Duration::seconds(options.max_age_secs))
        .build()
}

/// An empty, already-expired cookie that makes the browser drop `name`
pub fn removal_cookie(name: &'static str, path: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, String::new()))
        .path(path.to_owned())
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(0))
        .build()
}

/// Read a non-empty cookie value from request headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}
