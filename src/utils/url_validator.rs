use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::oauth::AuthError;

// OAuth client identifiers are opaque but must survive a query string untouched
static CLIENT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._~:-]{1,255}$").expect("valid client id pattern"));

// Path traversal and control characters never belong in an endpoint path
static SUSPICIOUS_PATH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\.|[\x00-\x1F\x7F]|\\").expect("valid path pattern"));

// Allowed schemes for provider and application URLs
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Validate a base URL taken from configuration (`auth_url`, `app_base_url`)
///
/// The URL must parse, use http(s), carry a host, and have no query or
/// fragment. A trailing slash is dropped so paths can be appended.
///
/// # Errors
///
/// Returns `AuthError::Configuration` naming `field` when any check fails.
pub fn validate_base_url(raw: &str, field: &str) -> Result<Url, AuthError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AuthError::Configuration(format!("{field} is not set")));
    }

    let parsed = Url::parse(trimmed).map_err(|e| {
        warn!("Failed to parse {field} '{trimmed}': {e}");
        AuthError::Configuration(format!("{field} is not a valid URL: {e}"))
    })?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        warn!("Invalid scheme '{}' in {field}", parsed.scheme());
        return Err(AuthError::Configuration(format!(
            "{field} must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AuthError::Configuration(format!("{field} has no host")));
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(AuthError::Configuration(format!(
            "{field} must not carry a query or fragment"
        )));
    }

    let normalized = trimmed.trim_end_matches('/');
    let url = Url::parse(normalized)
        .map_err(|e| AuthError::Configuration(format!("{field} is not a valid URL: {e}")))?;
    debug!("Validated {field}: {url}");
    Ok(url)
}

/// Validate an OAuth client identifier
///
/// # Errors
///
/// Returns `AuthError::Configuration` if the id is empty or contains
/// characters outside the unreserved URL set.
pub fn validate_client_id(client_id: &str) -> Result<String, AuthError> {
    let trimmed = client_id.trim();
    if trimmed.is_empty() {
        return Err(AuthError::Configuration("client_id is not set".to_string()));
    }
    if !CLIENT_ID_PATTERN.is_match(trimmed) {
        warn!("Rejected malformed client_id ({} chars)", trimmed.len());
        return Err(AuthError::Configuration(
            "client_id contains invalid characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a provider endpoint path such as `/authorize`
///
/// # Errors
///
/// Returns `AuthError::Configuration` unless the path is absolute and free of
/// traversal sequences, control characters, queries and fragments.
pub fn validate_endpoint_path(path: &str, field: &str) -> Result<String, AuthError> {
    if !path.starts_with('/') || path.starts_with("//") {
        return Err(AuthError::Configuration(format!(
            "{field} must start with a single '/'"
        )));
    }
    if SUSPICIOUS_PATH_PATTERN.is_match(path) || path.contains(['?', '#']) {
        warn!("Suspicious {field} rejected: {path}");
        return Err(AuthError::Configuration(format!("{field} is not a plain path")));
    }
    Ok(path.to_string())
}

/// Join a validated base URL and endpoint path
///
/// # Errors
///
/// Returns `AuthError::Configuration` if the result does not parse.
pub fn join_endpoint(base: &Url, path: &str) -> Result<Url, AuthError> {
    let joined = format!("{}{path}", base.as_str().trim_end_matches('/'));
    Url::parse(&joined)
        .map_err(|e| AuthError::Configuration(format!("invalid endpoint '{joined}': {e}")))
}
