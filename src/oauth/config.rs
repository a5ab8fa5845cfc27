//! OAuth client configuration
//!
//! Identifies this application to the identity provider. Built once at
//! startup from [`GateSettings`] and immutable afterwards. There is no client
//! secret: this is a public client and PKCE stands in for it.

use url::Url;

use crate::oauth::AuthError;
use crate::settings::{AuthSettings, GateSettings};
use crate::utils::url_validator::{
    join_endpoint, validate_base_url, validate_client_id, validate_endpoint_path,
};

/// Validated client configuration with resolved endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    auth_url: Url,
    client_id: String,
    redirect_uri: Url,
    scopes: Vec<String>,
    authorization_endpoint: Url,
    token_endpoint: Url,
    userinfo_endpoint: Url,
    signup_endpoint: Url,
}

impl OAuthClientConfig {
    /// Build a configuration with the default endpoint layout
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if `auth_url`, `client_id` or
    /// `redirect_uri` is absent or malformed.
    pub fn new(auth_url: &str, client_id: &str, redirect_uri: &str) -> Result<Self, AuthError> {
        let auth = AuthSettings {
            auth_url: auth_url.to_string(),
            client_id: client_id.to_string(),
            ..AuthSettings::default()
        };
        Self::build(&auth, redirect_uri)
    }

    /// Build a configuration from loaded settings
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` naming the first invalid field.
    pub fn from_settings(settings: &GateSettings) -> Result<Self, AuthError> {
        Self::build(&settings.auth, &settings.callback_url())
    }

    fn build(auth: &AuthSettings, redirect_uri: &str) -> Result<Self, AuthError> {
        let auth_url = validate_base_url(&auth.auth_url, "auth_url")?;
        let client_id = validate_client_id(&auth.client_id)?;

        let redirect_uri = Url::parse(redirect_uri.trim()).map_err(|e| {
            AuthError::Configuration(format!(
                "redirect_uri '{redirect_uri}' is not a valid URL: {e}"
            ))
        })?;
        if !matches!(redirect_uri.scheme(), "http" | "https") {
            return Err(AuthError::Configuration(
                "redirect_uri must use http or https".to_string(),
            ));
        }

        let scopes: Vec<String> = auth
            .scopes
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !scopes.iter().any(|s| s == "openid") {
            log::warn!("Scopes do not include 'openid'; the provider will not return identity");
        }

        let endpoint = |path: &str, field: &str| -> Result<Url, AuthError> {
            join_endpoint(&auth_url, &validate_endpoint_path(path, field)?)
        };
        let authorization_endpoint = endpoint(&auth.authorize_path, "authorize_path")?;
        let token_endpoint = endpoint(&auth.token_path, "token_path")?;
        let userinfo_endpoint = endpoint(&auth.userinfo_path, "userinfo_path")?;
        let signup_endpoint = endpoint(&auth.signup_path, "signup_path")?;

        Ok(Self {
            auth_url,
            client_id,
            redirect_uri,
            scopes,
            authorization_endpoint,
            token_endpoint,
            userinfo_endpoint,
            signup_endpoint,
        })
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Space separated scope list as sent in the `scope` parameter
    #[must_use]
    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }

    #[must_use]
    pub fn authorization_endpoint(&self) -> &Url {
        &self.authorization_endpoint
    }

    #[must_use]
    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    #[must_use]
    pub fn userinfo_endpoint(&self) -> &Url {
        &self.userinfo_endpoint
    }

    #[must_use]
    pub fn signup_endpoint(&self) -> &Url {
        &self.signup_endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_defaults() {
        let config = OAuthClientConfig::from_settings(&GateSettings::default()).unwrap();
        assert_eq!(config.client_id(), "ai-native-public-client");
        assert_eq!(
            config.authorization_endpoint().as_str(),
            "http://localhost:3001/authorize"
        );
        assert_eq!(config.token_endpoint().as_str(), "http://localhost:3001/token");
        assert_eq!(
            config.redirect_uri().as_str(),
            "http://localhost:3000/auth/callback"
        );
        assert_eq!(config.scope_param(), "openid profile email");
    }

    #[test]
    fn test_new_with_explicit_redirect() {
        let config = OAuthClientConfig::new(
            "https://auth.example.com",
            "app-1",
            "https://book.example.com/auth/callback",
        )
        .unwrap();
        assert_eq!(
            config.redirect_uri().as_str(),
            "https://book.example.com/auth/callback"
        );
        assert_eq!(
            config.signup_endpoint().as_str(),
            "https://auth.example.com/auth/sign-up"
        );
    }

    #[test]
    fn test_new_keeps_redirect_verbatim() {
        let config = OAuthClientConfig::new(
            "https://auth.example.com",
            "app-1",
            "https://book.example.com/docs/auth/callback?tab=1",
        )
        .unwrap();
        assert_eq!(
            config.redirect_uri().as_str(),
            "https://book.example.com/docs/auth/callback?tab=1"
        );
        assert_eq!(config.scope_param(), "openid profile email");
        assert_eq!(
            config.authorization_endpoint().as_str(),
            "https://auth.example.com/authorize"
        );
    }

    #[test]
    fn test_missing_fields_are_configuration_errors() {
        let cb = "https://book.example.com/auth/callback";
        assert!(matches!(
            OAuthClientConfig::new("", "app-1", cb),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            OAuthClientConfig::new("https://auth.example.com", "", cb),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            OAuthClientConfig::new("not a url", "app-1", cb),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            OAuthClientConfig::new("https://auth.example.com", "app-1", "nowhere"),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_custom_endpoint_paths() {
        let mut settings = GateSettings::default();
        settings.auth.auth_url = "https://auth.example.com".to_string();
        settings.auth.authorize_path = "/api/auth/oauth2/authorize".to_string();
        settings.auth.token_path = "/api/auth/oauth2/token".to_string();
        let config = OAuthClientConfig::from_settings(&settings).unwrap();
        assert_eq!(
            config.authorization_endpoint().as_str(),
            "https://auth.example.com/api/auth/oauth2/authorize"
        );
        assert_eq!(
            config.token_endpoint().as_str(),
            "https://auth.example.com/api/auth/oauth2/token"
        );
    }

    #[test]
    fn test_bad_endpoint_path_rejected() {
        let mut settings = GateSettings::default();
        settings.auth.token_path = "../token".to_string();
        assert!(OAuthClientConfig::from_settings(&settings).is_err());
    }
}
