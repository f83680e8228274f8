//! Route classification for the request pipeline.
//!
//! Paths are matched by segment prefix: `/dashboard` covers `/dashboard` and
//! `/dashboard/photos` but not `/dashboards`.

use crate::config::{RoleRule, RoutesConfig};

/// True when `path` is `prefix` or lies underneath it
pub fn path_matches(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Split a leading locale segment off a path.
///
/// `/fr/dashboard` becomes `(Some("fr"), "/dashboard")` and `/fr` becomes
/// `(Some("fr"), "/")`. Paths without a configured locale come back unchanged.
pub fn strip_locale_prefix<'a>(path: &'a str, locales: &[String]) -> (Option<&'a str>, &'a str) {
    let Some(rest) = path.strip_prefix('/') else {
        return (None, path);
    };
    let segment = rest.split('/').next().unwrap_or("");
    if segment.is_empty() || !locales.iter().any(|l| l == segment) {
        return (None, path);
    }

    let remainder = &rest[segment.len()..];
    if remainder.is_empty() {
        (Some(segment), "/")
    } else {
        (Some(segment), remainder)
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    public_api_paths: Vec<String>,
    protected_paths: Vec<String>,
    login_path: String,
    landing_path: String,
    redirect_param: String,
    role_rules: Vec<RoleRule>,
}

impl RouteTable {
    pub fn from_config(config: &RoutesConfig) -> Self {
        Self {
            public_api_paths: config.public_api_paths.clone(),
            protected_paths: config.protected_paths.clone(),
            login_path: config.login_path.clone(),
            landing_path: config.landing_path.clone(),
            redirect_param: config.redirect_param.clone(),
            role_rules: config.role_rules.clone(),
        }
    }

    /// API routes that skip CSRF validation (sign-in and friends)
    pub fn is_public_api(&self, path: &str) -> bool {
        self.public_api_paths.iter().any(|p| path_matches(path, p))
    }

    /// UI routes that need a live session
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_paths.iter().any(|p| path_matches(path, p))
    }

    pub fn is_login(&self, path: &str) -> bool {
        path_matches(path, &self.login_path)
    }

    /// Roles allowed on `path`, from the first matching rule
    pub fn required_roles(&self, path: &str) -> Option<&[String]> {
        self.role_rules
            .iter()
            .find(|rule| path_matches(path, &rule.prefix))
            .map(|rule| rule.roles.as_slice())
    }

    /// Login URL that sends the visitor back to `path_and_query` afterwards
    pub fn login_redirect(&self, locale: Option<&str>, path_and_query: &str) -> String {
        let login = localized(locale, &self.login_path);
        match serde_urlencoded::to_string([(self.redirect_param.as_str(), path_and_query)]) {
            Ok(query) => format!("{}?{}", login, query),
            Err(_) => login,
        }
    }

    pub fn landing(&self, locale: Option<&str>) -> String {
        localized(locale, &self.landing_path)
    }
}

fn localized(locale: Option<&str>, path: &str) -> String {
    match locale {
        Some(locale) => format!("/{}{}", locale, path),
        None => path.to_string(),
    }
}
