//! OAuth callback validation
//!
//! The provider sends the browser back to the callback route with either
//! `code` + `state` or `error`. Validation runs in fixed steps and consumes
//! the pending authorization for the returned `state`, so a callback can be
//! completed at most once.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use crate::oauth::AuthError;
use crate::store::{PendingAuthorization, VerifierStore};
use crate::utils::logging::LoggingHelper;

/// Query parameters the provider sends to the callback route
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl OAuthCallback {
    /// Parse from a raw query string, with or without the leading `?`
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut callback = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => callback.code = value,
                "state" => callback.state = value,
                "error" => callback.error = value,
                "error_description" => callback.error_description = value,
                _ => {}
            }
        }
        callback
    }

    /// Parse from the full callback URL the browser landed on
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCallback` if the URL does not parse.
    pub fn from_url(callback_url: &str) -> Result<Self, AuthError> {
        let url = Url::parse(callback_url.trim())
            .map_err(|e| AuthError::InvalidCallback(format!("callback URL does not parse: {e}")))?;
        Ok(Self::from_query(url.query().unwrap_or_default()))
    }
}

/// A callback that matched a pending authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCallback {
    pub code: String,
    pub pending: PendingAuthorization,
}

/// OAuth callback validator with structured validation steps
pub struct CallbackValidator;

impl CallbackValidator {
    /// Validate a callback and claim its pending authorization
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The provider returned an `error` (`AuthError::Provider`)
    /// - `code` or `state` is missing or empty (`AuthError::InvalidCallback`)
    /// - No unexpired pending authorization matches `state` (`AuthError::StateMismatch`)
    /// - The store cannot be read (`AuthError::Storage`)
    pub fn validate(
        callback: &OAuthCallback,
        store: &dyn VerifierStore,
        now: DateTime<Utc>,
    ) -> Result<ValidatedCallback, AuthError> {
        let result = Self::validate_steps(callback, store, now);
        if let Err(e) = &result {
            LoggingHelper::log_callback_rejected(&e.to_string());
        }
        result
    }

    fn validate_steps(
        callback: &OAuthCallback,
        store: &dyn VerifierStore,
        now: DateTime<Utc>,
    ) -> Result<ValidatedCallback, AuthError> {
        // Step 1: provider-side rejection; the attempt is over, drop its verifier
        Self::check_provider_error(callback, store, now)?;

        // Step 2: required parameters
        let code = Self::required_param(callback.code.as_deref(), "code")?;
        let state = Self::required_param(callback.state.as_deref(), "state")?;

        // Step 3: claim the pending authorization
        let pending = store.take(&state, now)?.ok_or(AuthError::StateMismatch)?;

        LoggingHelper::log_callback_validated(pending.intent, &state);
        Ok(ValidatedCallback { code, pending })
    }

    fn check_provider_error(
        callback: &OAuthCallback,
        store: &dyn VerifierStore,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let Some(error) = &callback.error else {
            return Ok(());
        };

        if let Some(state) = callback.state.as_deref().filter(|s| !s.trim().is_empty()) {
            if store.take(state, now)?.is_some() {
                log::debug!(
                    "Discarded pending authorization {} after provider error",
                    LoggingHelper::state_hint(state)
                );
            }
        }

        Err(AuthError::Provider {
            error: error.clone(),
            description: callback.error_description.clone(),
        })
    }

    fn required_param(value: Option<&str>, name: &str) -> Result<String, AuthError> {
        match value.map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            Some(_) => Err(AuthError::InvalidCallback(format!("empty {name} parameter"))),
            None => Err(AuthError::InvalidCallback(format!("missing {name} parameter"))),
        }
    }
}
