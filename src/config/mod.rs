use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::consts::{ACCESS_TOKEN_MAX_AGE_SECS, CSRF_DEFAULT_MAX_AGE_SECS, REFRESH_TOKEN_MAX_AGE_SECS};
use crate::token::DEFAULT_EXPIRY_BUFFER_SECS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub csrf: CsrfConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub i18n: I18nConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment '{}'", s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsrfConfig {
    /// Lifetime of the CSRF cookie in seconds (default: 7200)
    #[serde(default = "default_csrf_max_age")]
    pub max_age_secs: i64,
    /// Cookie path (default: "/")
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// SameSite attribute for the CSRF cookie (default: lax)
    #[serde(default)]
    pub same_site: SameSitePolicy,
    /// Largest request body buffered while looking for a form/JSON token
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_csrf_max_age(),
            path: default_cookie_path(),
            same_site: SameSitePolicy::default(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_csrf_max_age() -> i64 {
    CSRF_DEFAULT_MAX_AGE_SECS
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Seconds before expiry at which a session is reported as expiring soon
    #[serde(default = "default_expiry_buffer")]
    pub expiry_buffer_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry_buffer_secs: default_expiry_buffer(),
        }
    }
}

fn default_expiry_buffer() -> i64 {
    DEFAULT_EXPIRY_BUFFER_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRule {
    /// Path prefix the rule applies to
    pub prefix: String,
    /// Any of these roles grants access
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    /// API paths that bypass CSRF validation
    #[serde(default = "default_public_api_paths")]
    pub public_api_paths: Vec<String>,
    /// UI paths that require a valid, non-expired session
    #[serde(default = "default_protected_paths")]
    pub protected_paths: Vec<String>,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Where authenticated visitors land when they hit the login page or lack a role
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
    /// Query parameter carrying the post-login redirect target
    #[serde(default = "default_redirect_param")]
    pub redirect_param: String,
    #[serde(default = "default_role_rules")]
    pub role_rules: Vec<RoleRule>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            public_api_paths: default_public_api_paths(),
            protected_paths: default_protected_paths(),
            login_path: default_login_path(),
            landing_path: default_landing_path(),
            redirect_param: default_redirect_param(),
            role_rules: default_role_rules(),
        }
    }
}

fn default_public_api_paths() -> Vec<String> {
    [
        "/api/auth/login",
        "/api/auth/register",
        "/api/auth/refresh",
        "/api/auth/forgot-password",
        "/api/auth/reset-password",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_protected_paths() -> Vec<String> {
    [
        "/dashboard",
        "/messages",
        "/documents",
        "/enrollment",
        "/daily-reports",
        "/profile",
        "/admin",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_landing_path() -> String {
    "/dashboard".to_string()
}

fn default_redirect_param() -> String {
    "redirect".to_string()
}

fn default_role_rules() -> Vec<RoleRule> {
    vec![RoleRule {
        prefix: "/admin".to_string(),
        roles: vec!["admin".to_string(), "director".to_string()],
    }]
}

#[derive(Debug, Clone, Deserialize)]
pub struct I18nConfig {
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            locales: default_locales(),
            default_locale: default_locale(),
        }
    }
}

fn default_locales() -> Vec<String> {
    vec!["en".to_string(), "fr".to_string()]
}

fn default_locale() -> String {
    "en".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            csrf: CsrfConfig::default(),
            session: SessionConfig::default(),
            routes: RoutesConfig::default(),
            i18n: I18nConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse configuration file")?;
        Ok(config)
    }

    /// Cookies carry the Secure flag everywhere except development
    pub fn secure_cookies(&self) -> bool {
        !self.environment.is_development()
    }

    /// Reject combinations that would leave the gate misconfigured
    pub fn validate(&self) -> Result<()> {
        if self.i18n.locales.is_empty() {
            bail!("i18n.locales must list at least one locale");
        }
        if !self.i18n.locales.contains(&self.i18n.default_locale) {
            bail!(
                "i18n.default_locale '{}' is not one of the configured locales",
                self.i18n.default_locale
            );
        }
        if self.csrf.same_site == SameSitePolicy::None && !self.secure_cookies() {
            bail!("csrf.same_site = \"none\" requires secure cookies (production environment)");
        }
        if self.csrf.max_age_secs <= 0 {
            bail!("csrf.max_age_secs must be positive");
        }
        if self.csrf.max_age_secs > REFRESH_TOKEN_MAX_AGE_SECS {
            bail!(
                "csrf.max_age_secs must not exceed the refresh token lifetime ({}s)",
                REFRESH_TOKEN_MAX_AGE_SECS
            );
        }
        let buffer = self.session.expiry_buffer_secs;
        if !(0..ACCESS_TOKEN_MAX_AGE_SECS).contains(&buffer) {
            bail!(
                "session.expiry_buffer_secs must be between 0 and the access token lifetime ({}s)",
                ACCESS_TOKEN_MAX_AGE_SECS
            );
        }
        let login = self.routes.login_path.as_str();
        if self
            .routes
            .protected_paths
            .iter()
            .any(|p| crate::routes::path_matches(login, p))
        {
            bail!("routes.login_path '{}' must not be a protected path", login);
        }
        Ok(())
    }
}
