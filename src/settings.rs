use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming a directory with a higher-priority `Settings.toml`
pub const SECRETS_DIR_ENV: &str = "LEARNGATE_SECRETS_DIR";

const SETTINGS_FILE: &str = "Settings.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GateSettings {
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
    pub pkce: PkceSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    /// Public origin of the site hosting the gated pages
    pub base_url: String,
    /// Route that receives `?code=...&state=...` from the provider
    pub callback_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Base URL of the OIDC provider
    pub auth_url: String,
    /// Public client identifier (no secret; PKCE client)
    pub client_id: String,
    pub scopes: Vec<String>,
    pub authorize_path: String,
    pub token_path: String,
    pub userinfo_path: String,
    /// Provider page that creates an account before continuing to `redirect`
    pub signup_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PkceSettings {
    /// How long a pending verifier survives the provider round-trip
    pub state_ttl_seconds: u64,
    /// Cap on concurrently pending attempts (several tabs, abandoned redirects)
    pub max_pending: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Location of the sealed pending-authorization file (file backend)
    pub path: String,
    /// Secret used to seal the file; required for the file backend
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            callback_path: "/auth/callback".to_string(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            auth_url: "http://localhost:3001".to_string(),
            client_id: "ai-native-public-client".to_string(),
            scopes: vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
            ],
            authorize_path: "/authorize".to_string(),
            token_path: "/token".to_string(),
            userinfo_path: "/userinfo".to_string(),
            signup_path: "/auth/sign-up".to_string(),
        }
    }
}

impl Default for PkceSettings {
    fn default() -> Self {
        Self {
            state_ttl_seconds: 600,
            max_pending: 16,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: "learngate-pending.json".to_string(),
            secret: String::new(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GateSettings {
    /// Load settings from configuration files and environment variables,
    /// then initialize logging
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A settings file cannot be read
    /// - TOML parsing fails
    pub fn load() -> Result<Self> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        settings.logging.init();
        Ok(settings)
    }

    /// Parse settings from TOML text; missing sections take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn from_toml_str(toml_content: &str) -> Result<Self> {
        basic_toml::from_str(toml_content).context("Failed to parse settings TOML")
    }

    /// Parse settings from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let toml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&toml_content)
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (applied separately)
    /// 2. `Settings.toml` in `LEARNGATE_SECRETS_DIR`
    /// 3. `Settings.toml` in the current directory
    /// 4. Defaults
    fn load_base_settings() -> Result<Self> {
        let mut settings = Self::default();

        let default_config_path = Path::new(SETTINGS_FILE);
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            log::debug!("Loaded base settings from {}", default_config_path.display());
        }

        if let Ok(secrets_dir) = std::env::var(SECRETS_DIR_ENV) {
            let secrets_path = Path::new(&secrets_dir).join(SETTINGS_FILE);
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                log::debug!("Overriding settings from {}", secrets_path.display());
            } else {
                log::debug!(
                    "{SECRETS_DIR_ENV} set but no {SETTINGS_FILE} found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_auth_env_overrides(&mut settings.auth);
        Self::apply_pkce_env_overrides(&mut settings.pkce);
        Self::apply_storage_env_overrides(&mut settings.storage);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(base_url) = std::env::var("APP_BASE_URL") {
            app_settings.base_url = base_url;
        }
        if let Ok(callback_path) = std::env::var("APP_CALLBACK_PATH") {
            app_settings.callback_path = callback_path;
        }
    }

    fn apply_auth_env_overrides(auth_settings: &mut AuthSettings) {
        if let Ok(auth_url) = std::env::var("AUTH_URL") {
            auth_settings.auth_url = auth_url;
        }
        if let Ok(client_id) = std::env::var("OAUTH_CLIENT_ID") {
            auth_settings.client_id = client_id;
        }
        if let Ok(scopes) = std::env::var("OAUTH_SCOPES") {
            auth_settings.scopes = scopes
                .split([' ', ','])
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
        }
    }

    fn apply_pkce_env_overrides(pkce_settings: &mut PkceSettings) {
        if let Some(ttl) = Self::parse_env("PKCE_STATE_TTL_SECONDS") {
            pkce_settings.state_ttl_seconds = ttl;
        }
        if let Some(max_pending) = Self::parse_env("PKCE_MAX_PENDING") {
            pkce_settings.max_pending = max_pending;
        }
    }

    fn apply_storage_env_overrides(storage_settings: &mut StorageSettings) {
        if let Ok(backend) = std::env::var("STORAGE_BACKEND") {
            match backend.to_ascii_lowercase().as_str() {
                "memory" => storage_settings.backend = StorageBackend::Memory,
                "file" => storage_settings.backend = StorageBackend::File,
                other => log::warn!("Ignoring unknown STORAGE_BACKEND '{other}'"),
            }
        }
        if let Ok(path) = std::env::var("STORAGE_PATH") {
            storage_settings.path = path;
        }
        if let Ok(secret) = std::env::var("STORAGE_SECRET") {
            if !secret.is_empty() {
                storage_settings.secret = secret;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Helper to parse numeric environment variable overrides
    fn parse_env<T: std::str::FromStr>(env_var: &str) -> Option<T> {
        std::env::var(env_var).ok()?.parse().ok()
    }

    /// Load environment variables from a `.env` file in the working directory
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    if std::env::var(key.trim()).is_err() {
                        std::env::set_var(key.trim(), value.trim());
                    }
                }
            }
        }
    }

    /// Full callback URL the provider redirects back to
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!(
            "{}{}",
            self.application.base_url.trim_end_matches('/'),
            self.application.callback_path
        )
    }
}

impl LoggingSettings {
    /// Initialize `env_logger`; `RUST_LOG` wins over the configured level
    pub fn init(&self) {
        let env = env_logger::Env::default().default_filter_or(self.level.as_str());
        // A second initialization (tests, embedding) is not an error
        let _ = env_logger::Builder::from_env(env).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_match_site_configuration() {
        let settings = GateSettings::default();
        assert_eq!(settings.auth.auth_url, "http://localhost:3001");
        assert_eq!(settings.auth.client_id, "ai-native-public-client");
        assert_eq!(settings.auth.scopes, vec!["openid", "profile", "email"]);
        assert_eq!(settings.callback_url(), "http://localhost:3000/auth/callback");
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = GateSettings::from_toml_str(
            r#"
[auth]
auth_url = "https://auth.example.com"
client_id = "app-1"

[storage]
backend = "file"
path = "/tmp/pending.json"
"#,
        )
        .unwrap();
        assert_eq!(settings.auth.auth_url, "https://auth.example.com");
        assert_eq!(settings.auth.client_id, "app-1");
        assert_eq!(settings.auth.authorize_path, "/authorize");
        assert_eq!(settings.pkce.state_ttl_seconds, 600);
        assert_eq!(settings.storage.backend, StorageBackend::File);
        assert_eq!(settings.storage.path, "/tmp/pending.json");
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        assert!(GateSettings::from_toml_str("[auth\nauth_url = ").is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("AUTH_URL", "https://sso.example.org");
        std::env::set_var("OAUTH_CLIENT_ID", "book-client");
        std::env::set_var("OAUTH_SCOPES", "openid email");
        std::env::set_var("PKCE_STATE_TTL_SECONDS", "120");
        std::env::set_var("PKCE_MAX_PENDING", "not-a-number");
        std::env::set_var("STORAGE_BACKEND", "FILE");

        let mut settings = GateSettings::default();
        GateSettings::apply_env_overrides(&mut settings);

        for var in [
            "AUTH_URL",
            "OAUTH_CLIENT_ID",
            "OAUTH_SCOPES",
            "PKCE_STATE_TTL_SECONDS",
            "PKCE_MAX_PENDING",
            "STORAGE_BACKEND",
        ] {
            std::env::remove_var(var);
        }

        assert_eq!(settings.auth.auth_url, "https://sso.example.org");
        assert_eq!(settings.auth.client_id, "book-client");
        assert_eq!(settings.auth.scopes, vec!["openid", "email"]);
        assert_eq!(settings.pkce.state_ttl_seconds, 120);
        assert_eq!(settings.pkce.max_pending, 16);
        assert_eq!(settings.storage.backend, StorageBackend::File);
    }
}
