use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::ACCEPT_LANGUAGE, Request},
};
use std::cmp::Ordering;

use super::{Flow, Interceptor, RequestContext};
use crate::config::Config;
use crate::consts::{LOCALE_COOKIE_NAME, LOCALE_COOKIE_MAX_AGE_SECS};
use crate::cookies::{http_only_cookie, read_cookie, CookieOptions};
use crate::routes::strip_locale_prefix;

/// Locale resolved for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

/// Pick the first supported primary language tag, highest q-value first.
///
/// Ties keep header order. Entries with `q=0` and the `*` wildcard never match.
pub fn negotiate_accept_language(header: &str, supported: &[String]) -> Option<String> {
    let mut candidates: Vec<(f32, usize, String)> = header
        .split(',')
        .enumerate()
        .filter_map(|(position, entry)| {
            let mut pieces = entry.trim().split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            let primary = tag.split('-').next()?.to_ascii_lowercase();
            Some((quality, position, primary))
        })
        .filter(|(quality, _, _)| *quality > 0.0)
        .collect();

    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });

    candidates.into_iter().find_map(|(_, _, primary)| {
        supported
            .iter()
            .find(|s| s.eq_ignore_ascii_case(&primary))
            .cloned()
    })
}

pub struct LocaleInterceptor {
    locales: Vec<String>,
    default_locale: String,
    cookie: CookieOptions,
}

impl LocaleInterceptor {
    pub fn new(config: &Config) -> Self {
        Self {
            locales: config.i18n.locales.clone(),
            default_locale: config.i18n.default_locale.clone(),
            cookie: CookieOptions {
                max_age_secs: LOCALE_COOKIE_MAX_AGE_SECS,
                secure: config.secure_cookies(),
                ..CookieOptions::default()
            },
        }
    }

    /// Path prefix, then cookie, then Accept-Language, then the default
    fn resolve(&self, request: &Request<Body>, cookie: Option<&str>) -> String {
        if let (Some(locale), _) = strip_locale_prefix(request.uri().path(), &self.locales) {
            return locale.to_string();
        }

        if let Some(locale) = cookie.filter(|c| self.locales.iter().any(|l| l == c)) {
            return locale.to_string();
        }

        request
            .headers()
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|header| negotiate_accept_language(header, &self.locales))
            .unwrap_or_else(|| self.default_locale.clone())
    }
}

#[async_trait]
impl Interceptor for LocaleInterceptor {
    fn name(&self) -> &'static str {
        "locale"
    }

    async fn intercept(&self, mut request: Request<Body>, ctx: &mut RequestContext) -> Flow {
        let stored = read_cookie(request.headers(), LOCALE_COOKIE_NAME);
        let locale = self.resolve(&request, stored.as_deref());

        if stored.as_deref() != Some(locale.as_str()) {
            ctx.add_cookie(http_only_cookie(LOCALE_COOKIE_NAME, locale.clone(), &self.cookie));
        }

        request.extensions_mut().insert(Locale(locale));
        Flow::Continue(request)
    }
}
