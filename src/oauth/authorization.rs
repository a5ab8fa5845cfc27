//! Authorization URL construction
//!
//! Builds the authorization-code request with a fresh PKCE challenge and
//! `state`, and records the verifier so the callback can complete the
//! exchange. Navigation is left to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::oauth::pkce::{PkcePair, CHALLENGE_METHOD};
use crate::oauth::{AuthError, OAuthClientConfig};
use crate::store::{PendingAuthorization, VerifierStore};
use crate::utils::crypto::generate_state_token;
use crate::utils::logging::LoggingHelper;

/// What the user asked for when leaving the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthIntent {
    #[serde(rename = "signin")]
    SignIn,
    #[serde(rename = "signup")]
    SignUp,
}

impl AuthIntent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthIntent::SignIn => "signin",
            AuthIntent::SignUp => "signup",
        }
    }
}

impl fmt::Display for AuthIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signin" | "sign-in" | "sign_in" => Ok(AuthIntent::SignIn),
            "signup" | "sign-up" | "sign_up" => Ok(AuthIntent::SignUp),
            other => Err(format!("unknown intent '{other}' (expected signin or signup)")),
        }
    }
}

/// A ready-to-navigate authorization request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
    pub code_challenge: String,
    pub intent: AuthIntent,
}

impl AuthorizationRequest {
    /// Where the browser should actually go
    ///
    /// Sign-in goes straight to the authorization endpoint. Sign-up goes to
    /// the provider's registration page, which continues to the authorization
    /// URL carried in `redirect` once the account exists.
    #[must_use]
    pub fn navigation_url(&self, config: &OAuthClientConfig) -> Url {
        match self.intent {
            AuthIntent::SignIn => self.url.clone(),
            AuthIntent::SignUp => {
                let mut signup = config.signup_endpoint().clone();
                signup
                    .query_pairs_mut()
                    .append_pair("redirect", self.url.as_str());
                signup
            }
        }
    }

    /// Value of a query parameter on the authorization URL
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Build an authorization request and persist its verifier
///
/// # Errors
///
/// Returns `AuthError::Storage` if the verifier cannot be recorded; nothing
/// is returned for navigation in that case.
pub fn build_authorization_request(
    config: &OAuthClientConfig,
    store: &dyn VerifierStore,
    intent: AuthIntent,
    now: DateTime<Utc>,
) -> Result<AuthorizationRequest, AuthError> {
    let (code_verifier, code_challenge) = PkcePair::generate().into_parts();
    let state = generate_state_token();
    let scope = config.scope_param();

    let mut url = config.authorization_endpoint().clone();
    url.query_pairs_mut()
        .append_pair("client_id", config.client_id())
        .append_pair("redirect_uri", config.redirect_uri().as_str())
        .append_pair("response_type", "code")
        .append_pair("scope", &scope)
        .append_pair("state", &state)
        .append_pair("code_challenge", &code_challenge)
        .append_pair("code_challenge_method", CHALLENGE_METHOD);

    let policy = store.policy();
    store.save(PendingAuthorization::new(
        state.clone(),
        code_verifier,
        intent,
        config.redirect_uri().to_string(),
        now,
        policy.ttl,
    ))?;

    LoggingHelper::log_authorization_url_built(intent, &scope, &state);

    Ok(AuthorizationRequest {
        url,
        state,
        code_challenge,
        intent,
    })
}
