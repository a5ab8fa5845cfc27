//! Token exchange wire types
//!
//! The verifier leaves the client only here, in the form body sent to the
//! token endpoint. No client secret is ever sent.

use serde::Deserialize;
use std::fmt;

use crate::oauth::{OAuthClientConfig, ValidatedCallback};

pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// Form body for `POST {token_endpoint}`
#[derive(Clone, PartialEq, Eq)]
pub struct TokenExchangeRequest {
    pub code: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub code_verifier: String,
}

impl TokenExchangeRequest {
    /// Pair the returned code with the verifier stored for its `state`
    #[must_use]
    pub fn from_validated(config: &OAuthClientConfig, validated: &ValidatedCallback) -> Self {
        Self {
            code: validated.code.clone(),
            redirect_uri: validated.pending.redirect_uri.clone(),
            client_id: config.client_id().to_string(),
            code_verifier: validated.pending.code_verifier.clone(),
        }
    }

    /// `application/x-www-form-urlencoded` fields in wire order
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("grant_type", GRANT_TYPE_AUTHORIZATION_CODE),
            ("code", &self.code),
            ("redirect_uri", &self.redirect_uri),
            ("client_id", &self.client_id),
            ("code_verifier", &self.code_verifier),
        ]
    }

    /// Encoded form body
    #[must_use]
    pub fn to_form_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form_fields())
            .finish()
    }
}

impl fmt::Debug for TokenExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchangeRequest")
            .field("code", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("client_id", &self.client_id)
            .field("code_verifier", &"<redacted>")
            .finish()
    }
}

/// Successful token endpoint response
#[derive(Clone, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// Error body from the token endpoint (RFC 6749 section 5.2)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for TokenErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {description}", self.error),
            None => f.write_str(&self.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::AuthIntent;
    use crate::store::PendingAuthorization;
    use chrono::{Duration, Utc};

    fn validated() -> ValidatedCallback {
        ValidatedCallback {
            code: "auth-code".to_string(),
            pending: PendingAuthorization::new(
                "state-1".to_string(),
                "verifier-value".to_string(),
                AuthIntent::SignIn,
                "http://localhost:3000/auth/callback".to_string(),
                Utc::now(),
                Duration::seconds(600),
            ),
        }
    }

    fn config() -> OAuthClientConfig {
        OAuthClientConfig::new(
            "https://auth.example.com",
            "app-1",
            "http://localhost:3000/auth/callback",
        )
        .unwrap()
    }

    #[test]
    fn test_form_contains_verifier_and_no_secret() {
        let request = TokenExchangeRequest::from_validated(&config(), &validated());
        let fields = request.form_fields();
        assert!(fields.contains(&("grant_type", "authorization_code")));
        assert!(fields.contains(&("code", "auth-code")));
        assert!(fields.contains(&("client_id", "app-1")));
        assert!(fields.contains(&("code_verifier", "verifier-value")));
        assert!(fields.iter().all(|(k, _)| *k != "client_secret"));
    }

    #[test]
    fn test_form_body_encoding() {
        let request = TokenExchangeRequest::from_validated(&config(), &validated());
        let body = request.to_form_body();
        assert!(body.starts_with("grant_type=authorization_code&code=auth-code"));
        assert!(body.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let request = TokenExchangeRequest::from_validated(&config(), &validated());
        let debug = format!("{request:?}");
        assert!(!debug.contains("verifier-value"));
        assert!(!debug.contains("auth-code"));
    }

    #[test]
    fn test_token_set_parsing() {
        let tokens: TokenSet = serde_json::from_str(
            r#"{"access_token":"at","expires_in":3600,"id_token":"it","scope":"openid"}"#,
        )
        .unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, Some(3600));
        assert!(tokens.refresh_token.is_none());
        assert!(!format!("{tokens:?}").contains("\"at\""));
    }

    #[test]
    fn test_error_response_display() {
        let err: TokenErrorResponse = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"code_verifier mismatch"}"#,
        )
        .unwrap();
        assert_eq!(err.to_string(), "invalid_grant: code_verifier mismatch");
    }
}
