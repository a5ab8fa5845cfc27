//! Test fixtures providing pre-built test objects

use std::sync::Arc;

use crate::oauth::{AuthProvider, OAuthClientConfig};
use crate::session::{Identity, SessionSnapshot};
use crate::settings::GateSettings;
use crate::store::{MemoryVerifierStore, StorePolicy};

use super::constants::{TEST_APP_URL, TEST_AUTH_URL, TEST_CLIENT_ID, TEST_EMAIL, TEST_USER_ID};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Settings pointing at the example provider and site
    #[must_use]
    pub fn settings() -> GateSettings {
        let mut settings = GateSettings::default();
        settings.auth.auth_url = TEST_AUTH_URL.to_string();
        settings.auth.client_id = TEST_CLIENT_ID.to_string();
        settings.application.base_url = TEST_APP_URL.to_string();
        settings
    }

    /// Client configuration built from [`Self::settings`]
    ///
    /// # Panics
    ///
    /// Never for the built-in fixture values.
    #[must_use]
    pub fn config() -> OAuthClientConfig {
        OAuthClientConfig::from_settings(&Self::settings()).expect("fixture settings are valid")
    }

    /// Provider backed by a fresh in-memory store
    #[must_use]
    pub fn provider() -> AuthProvider {
        AuthProvider::new(
            Self::config(),
            Arc::new(MemoryVerifierStore::new(StorePolicy::default())),
        )
    }

    /// Provider talking to `auth_url` (a local mock server) with a fresh
    /// in-memory store
    ///
    /// # Panics
    ///
    /// If `auth_url` is not an http(s) base URL.
    #[must_use]
    pub fn provider_at(auth_url: &str) -> AuthProvider {
        let mut settings = Self::settings();
        settings.auth.auth_url = auth_url.to_string();
        let config =
            OAuthClientConfig::from_settings(&settings).expect("mock provider URL is valid");
        AuthProvider::new(
            config,
            Arc::new(MemoryVerifierStore::new(StorePolicy::default())),
        )
    }

    #[must_use]
    pub fn identity() -> Identity {
        Identity::new(TEST_USER_ID).with_email(TEST_EMAIL)
    }

    #[must_use]
    pub fn signed_in() -> SessionSnapshot {
        SessionSnapshot::signed_in(Self::identity())
    }

    #[must_use]
    pub fn signed_out() -> SessionSnapshot {
        SessionSnapshot::signed_out()
    }
}
