//! Bearer token inspection.
//!
//! These helpers decode the payload of a JWT-shaped token WITHOUT verifying
//! its signature. Verification belongs to the backend that issued the token;
//! everything here is a hint for gating pages and prompting re-login, never an
//! authentication guarantee.
//!
//! Every function is total: malformed input yields `None`, `false` or `0`.

mod claims;

pub use claims::{Claims, User};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;

/// Default window used by [`is_expiring_soon`]
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 60;

/// Tokens this short are never partially echoed into logs
const MIN_LOGGABLE_LEN: usize = 12;
const LOG_EDGE_CHARS: usize = 6;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Debug builds only; release builds must stay silent about token shape
fn log_decode_failure(reason: &str) {
    if cfg!(debug_assertions) {
        tracing::debug!(reason, "Bearer token decode failed");
    }
}

/// Base64 decode a JWT segment, accepting either alphabet and missing padding
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let mut normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let remainder = normalized.len() % 4;
    if remainder != 0 {
        normalized.extend(std::iter::repeat('=').take(4 - remainder));
    }

    BASE64.decode(normalized.as_bytes()).ok()
}

/// Decode the claims together with the raw payload object
fn decode_parts(token: &str) -> Option<(Claims, Map<String, Value>)> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        log_decode_failure("expected three non-empty segments");
        return None;
    }

    let Some(bytes) = decode_segment(segments[1]) else {
        log_decode_failure("payload is not valid base64");
        return None;
    };

    let payload = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            log_decode_failure("payload is not a JSON object");
            return None;
        }
        Err(e) => {
            if cfg!(debug_assertions) {
                tracing::debug!(error = %e, "Bearer token payload is not valid JSON");
            }
            return None;
        }
    };

    let mut claims = match serde_json::from_value::<Claims>(Value::Object(payload.clone())) {
        Ok(claims) if claims.has_identity() => claims,
        _ => {
            log_decode_failure("payload is missing sub, email or role");
            return None;
        }
    };

    claims.fill_camel_case_names(&payload);
    Some((claims, payload))
}

/// Decode a token's claims. Signature is not checked.
pub fn decode(token: &str) -> Option<Claims> {
    decode_parts(token).map(|(claims, _)| claims)
}

/// True if the token is unreadable, carries no expiry, or `exp <= now`
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, now())
}

pub fn is_expired_at(token: &str, now: i64) -> bool {
    match decode(token).and_then(|c| c.exp) {
        Some(exp) => exp <= now,
        None => true,
    }
}

/// True if the token is unreadable or expires within `buffer_secs`
pub fn is_expiring_soon(token: &str, buffer_secs: i64) -> bool {
    is_expiring_soon_at(token, buffer_secs, now())
}

pub fn is_expiring_soon_at(token: &str, buffer_secs: i64, now: i64) -> bool {
    match decode(token).and_then(|c| c.exp) {
        Some(exp) => exp < now.saturating_add(buffer_secs),
        None => true,
    }
}

/// Seconds until expiry, or 0 for unreadable and expired tokens
pub fn time_to_expiry(token: &str) -> u64 {
    time_to_expiry_at(token, now())
}

pub fn time_to_expiry_at(token: &str, now: i64) -> u64 {
    decode(token)
        .and_then(|c| c.exp)
        .map(|exp| exp.saturating_sub(now).max(0) as u64)
        .unwrap_or(0)
}

/// Map claims to a user. Does NOT check expiry; see [`get_validated_user`].
pub fn extract_user(token: &str) -> Option<User> {
    decode(token).map(User::from)
}

/// The user for a readable, unexpired token. Use this wherever expiry matters.
pub fn get_validated_user(token: &str) -> Option<User> {
    get_validated_user_at(token, now())
}

pub fn get_validated_user_at(token: &str, now: i64) -> Option<User> {
    if is_expired_at(token, now) {
        return None;
    }
    extract_user(token)
}

/// True when every named claim is present and not null
pub fn has_required_claims(token: &str, names: &[&str]) -> bool {
    match decode_parts(token) {
        Some((_, payload)) => names
            .iter()
            .all(|name| payload.get(*name).is_some_and(|v| !v.is_null())),
        None => false,
    }
}

pub fn get_role(token: &str) -> Option<String> {
    decode(token).map(|c| c.role)
}

pub fn has_role(token: &str, role: &str) -> bool {
    get_role(token).is_some_and(|r| r == role)
}

pub fn has_any_role(token: &str, roles: &[&str]) -> bool {
    get_role(token).is_some_and(|r| roles.iter().any(|candidate| *candidate == r))
}

/// Render a token for log lines without ever emitting the whole value
pub fn sanitize_for_logging(token: Option<&str>) -> String {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return "[no token]".to_string(),
    };

    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= MIN_LOGGABLE_LEN {
        return "[token too short]".to_string();
    }

    let head: String = chars[..LOG_EDGE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - LOG_EDGE_CHARS..].iter().collect();
    format!("{}...{}", head, tail)
}

/// String equality that does not leak where two equal-length inputs differ.
///
/// Two absent values compare equal; a length mismatch returns false at once.
pub fn constant_time_equals(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => bytes_equal(a.as_bytes(), b.as_bytes()),
        _ => false,
    }
}

pub(crate) fn bytes_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
