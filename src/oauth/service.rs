//! Authorization service
//!
//! `AuthProvider` is constructed once at application start and passed to
//! whatever needs it (the gate, the callback route, the CLI). It holds the
//! client configuration, the verifier store and an HTTP client; there is no
//! global state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use url::Url;

use crate::oauth::authorization::{build_authorization_request, AuthIntent, AuthorizationRequest};
use crate::oauth::callback::{CallbackValidator, OAuthCallback, ValidatedCallback};
use crate::oauth::token::{TokenErrorResponse, TokenExchangeRequest, TokenSet};
use crate::oauth::{AuthError, OAuthClientConfig};
use crate::session::Identity;
use crate::settings::GateSettings;
use crate::store::{build_store, VerifierStore};
use crate::utils::logging::LoggingHelper;

/// Source of navigation targets for the gate's sign-in/sign-up actions
pub trait AuthorizationUrlSource {
    /// Start an authorization attempt and return where the browser should go
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or its verifier
    /// cannot be stored.
    fn navigation_url(&self, intent: AuthIntent) -> Result<Url, AuthError>;
}

/// Completion half of the flow: code for tokens, tokens for identity
#[async_trait]
pub trait TokenExchangeService {
    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The token endpoint cannot be reached
    /// - The provider rejects the code or verifier
    /// - The response is not a token set
    async fn exchange_code(&self, validated: &ValidatedCallback) -> Result<TokenSet, AuthError>;

    /// Fetch the identity behind an access token
    ///
    /// # Errors
    ///
    /// Returns an error if the userinfo endpoint fails or answers with
    /// something other than an identity.
    async fn fetch_userinfo(&self, tokens: &TokenSet) -> Result<Identity, AuthError>;
}

/// Constructed authorization provider
#[derive(Clone)]
pub struct AuthProvider {
    config: OAuthClientConfig,
    store: Arc<dyn VerifierStore>,
    http_client: reqwest::Client,
}

impl AuthProvider {
    #[must_use]
    pub fn new(config: OAuthClientConfig, store: Arc<dyn VerifierStore>) -> Self {
        Self {
            config,
            store,
            http_client: reqwest::Client::new(),
        }
    }

    /// Build the provider from loaded settings
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the client configuration or the
    /// storage backend is invalid.
    pub fn from_settings(settings: &GateSettings) -> Result<Self, AuthError> {
        let config = OAuthClientConfig::from_settings(settings)?;
        let store = build_store(settings)?;
        LoggingHelper::log_provider_initialized(&config);
        Ok(Self::new(config, store))
    }

    #[must_use]
    pub fn config(&self) -> &OAuthClientConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn VerifierStore> {
        &self.store
    }

    /// Build an authorization request for `intent`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the verifier cannot be stored.
    pub fn authorization_url(&self, intent: AuthIntent) -> Result<AuthorizationRequest, AuthError> {
        self.authorization_url_at(intent, Utc::now())
    }

    /// Same as [`Self::authorization_url`] with an explicit clock
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the verifier cannot be stored.
    pub fn authorization_url_at(
        &self,
        intent: AuthIntent,
        now: DateTime<Utc>,
    ) -> Result<AuthorizationRequest, AuthError> {
        build_authorization_request(&self.config, self.store.as_ref(), intent, now)
    }

    /// Validate a callback against the pending authorizations
    ///
    /// # Errors
    ///
    /// See [`CallbackValidator::validate`].
    pub fn validate_callback(
        &self,
        callback: &OAuthCallback,
    ) -> Result<ValidatedCallback, AuthError> {
        CallbackValidator::validate(callback, self.store.as_ref(), Utc::now())
    }

    /// Run the whole callback: validate, exchange the code, fetch the identity
    ///
    /// # Errors
    ///
    /// Returns the first failure of validation, exchange or userinfo.
    pub async fn complete_callback(
        &self,
        callback: &OAuthCallback,
    ) -> Result<(TokenSet, Identity), AuthError> {
        let validated = self.validate_callback(callback)?;
        let tokens = self.exchange_code(&validated).await?;
        let identity = self.fetch_userinfo(&tokens).await?;
        Ok((tokens, identity))
    }
}

impl AuthorizationUrlSource for AuthProvider {
    fn navigation_url(&self, intent: AuthIntent) -> Result<Url, AuthError> {
        let request = self.authorization_url(intent)?;
        Ok(request.navigation_url(&self.config))
    }
}

#[async_trait]
impl TokenExchangeService for AuthProvider {
    async fn exchange_code(&self, validated: &ValidatedCallback) -> Result<TokenSet, AuthError> {
        let endpoint = self.config.token_endpoint();
        LoggingHelper::log_token_exchange_start(endpoint.as_str());

        let request = TokenExchangeRequest::from_validated(&self.config, validated);
        let response = self
            .http_client
            .post(endpoint.clone())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .header(reqwest::header::ACCEPT, "application/json")
            .body(request.to_form_body())
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Network(format!("token response unreadable: {e}")))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map_or_else(|_| format!("status {status}"), |err| err.to_string());
            return Err(AuthError::TokenExchange(reason));
        }

        let tokens: TokenSet = serde_json::from_str(&body)
            .map_err(|e| AuthError::TokenExchange(format!("invalid token response: {e}")))?;
        LoggingHelper::log_token_exchange_summary(&tokens);
        Ok(tokens)
    }

    async fn fetch_userinfo(&self, tokens: &TokenSet) -> Result<Identity, AuthError> {
        let response = self
            .http_client
            .get(self.config.userinfo_endpoint().clone())
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider {
                error: "userinfo_failed".to_string(),
                description: Some(format!("status {}", response.status())),
            });
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| AuthError::Provider {
                error: "invalid_userinfo".to_string(),
                description: Some(e.to_string()),
            })
    }
}
