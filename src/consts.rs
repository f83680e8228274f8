//! Cookie names, header names and lifetimes shared across the crate.

/// Cookie holding the server-side half of the double-submit pair
pub const CSRF_COOKIE_NAME: &str = "csrf_token";

/// Header the client echoes the CSRF token in
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// JSON or form field the client may echo the CSRF token in instead of the header
pub const CSRF_FIELD_NAME: &str = "csrf_token";

/// Number of random bytes in a CSRF token (hex-encoded to twice this length)
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Default CSRF cookie lifetime: 2 hours
pub const CSRF_DEFAULT_MAX_AGE_SECS: i64 = 2 * 60 * 60;

/// Short-lived bearer token cookie
pub const ACCESS_TOKEN_COOKIE_NAME: &str = "access_token";

/// Long-lived refresh token cookie
pub const REFRESH_TOKEN_COOKIE_NAME: &str = "refresh_token";

/// 7 days
pub const ACCESS_TOKEN_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// 30 days
pub const REFRESH_TOKEN_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Cookie remembering the visitor's resolved locale
pub const LOCALE_COOKIE_NAME: &str = "locale";

/// 1 year
pub const LOCALE_COOKIE_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;
