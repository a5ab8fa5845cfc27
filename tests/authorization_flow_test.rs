use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use learngate::oauth::pkce::{derive_challenge, CHALLENGE_LENGTH};
use learngate::oauth::{
    AuthError, AuthIntent, AuthProvider, CallbackValidator, OAuthCallback, OAuthClientConfig,
    TokenExchangeRequest,
};
use learngate::settings::{GateSettings, StorageBackend};
use learngate::store::{FileVerifierStore, StorePolicy, VerifierStore};
use learngate::testing::TestFixtures;
use learngate::utils::crypto::derive_encryption_key;

#[test]
fn test_signup_scenario_query() {
    let provider = TestFixtures::provider();
    let request = provider.authorization_url(AuthIntent::SignUp).unwrap();

    assert_eq!(request.url.host_str(), Some("auth.example.com"));
    assert_eq!(request.query_param("client_id").as_deref(), Some("app-1"));
    assert_eq!(request.query_param("response_type").as_deref(), Some("code"));
    assert_eq!(
        request.query_param("code_challenge_method").as_deref(),
        Some("S256")
    );

    let challenge = request.query_param("code_challenge").unwrap();
    assert_eq!(challenge.len(), CHALLENGE_LENGTH);
    assert!(challenge
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[test]
fn test_challenge_is_digest_of_stored_verifier() {
    let provider = TestFixtures::provider();
    for intent in [AuthIntent::SignIn, AuthIntent::SignUp] {
        let request = provider.authorization_url(intent).unwrap();
        let pending = provider
            .store()
            .take(&request.state, Utc::now())
            .unwrap()
            .unwrap();

        assert_eq!(derive_challenge(&pending.code_verifier), request.code_challenge);
        assert!(!request.url.as_str().contains(&pending.code_verifier));
        assert!(!request
            .navigation_url(provider.config())
            .as_str()
            .contains(&pending.code_verifier));
    }
}

#[test]
fn test_successive_calls_never_reuse_state_or_verifier() {
    let provider = TestFixtures::provider();
    let mut states = HashSet::new();
    let mut verifiers = HashSet::new();

    for _ in 0..10 {
        let request = provider.authorization_url(AuthIntent::SignIn).unwrap();
        let pending = provider
            .store()
            .take(&request.state, Utc::now())
            .unwrap()
            .unwrap();
        assert!(states.insert(request.state));
        assert!(verifiers.insert(pending.code_verifier));
    }
}

#[test]
fn test_misconfigured_client_is_rejected() {
    let callback = "https://book.example.com/auth/callback";
    for (auth_url, client_id) in [
        ("", "app-1"),
        ("https://auth.example.com", ""),
        ("auth.example.com", "app-1"),
        ("https://auth.example.com", "has space"),
    ] {
        assert!(
            matches!(
                OAuthClientConfig::new(auth_url, client_id, callback),
                Err(AuthError::Configuration(_))
            ),
            "expected configuration error for ({auth_url:?}, {client_id:?})"
        );
    }
}

#[test]
fn test_full_round_trip_through_callback() {
    let provider = TestFixtures::provider();
    let request = provider.authorization_url(AuthIntent::SignIn).unwrap();

    let landing = format!(
        "https://book.example.com/auth/callback?code=xyz&state={}",
        request.state
    );
    let callback = OAuthCallback::from_url(&landing).unwrap();
    let validated = provider.validate_callback(&callback).unwrap();

    let exchange = TokenExchangeRequest::from_validated(provider.config(), &validated);
    assert_eq!(derive_challenge(&exchange.code_verifier), request.code_challenge);
    assert_eq!(exchange.redirect_uri, "https://book.example.com/auth/callback");

    // Single use
    assert_eq!(
        provider.validate_callback(&callback),
        Err(AuthError::StateMismatch)
    );
}

#[test]
fn test_abandoned_attempts_expire() {
    let provider = TestFixtures::provider();
    let now = Utc::now();
    let request = provider.authorization_url_at(AuthIntent::SignIn, now).unwrap();

    let callback = OAuthCallback {
        code: Some("late".to_string()),
        state: Some(request.state),
        ..OAuthCallback::default()
    };
    let later = now + Duration::minutes(11);
    assert_eq!(
        CallbackValidator::validate(&callback, provider.store().as_ref(), later),
        Err(AuthError::StateMismatch)
    );
}

#[test]
fn test_concurrent_tabs_do_not_collide() {
    let provider = TestFixtures::provider();
    let tab_a = provider.authorization_url(AuthIntent::SignIn).unwrap();
    let tab_b = provider.authorization_url(AuthIntent::SignUp).unwrap();

    let finish = |state: &str| {
        provider.validate_callback(&OAuthCallback {
            code: Some("c".to_string()),
            state: Some(state.to_string()),
            ..OAuthCallback::default()
        })
    };

    assert_eq!(finish(&tab_b.state).unwrap().pending.intent, AuthIntent::SignUp);
    assert_eq!(finish(&tab_a.state).unwrap().pending.intent, AuthIntent::SignIn);
}

#[test]
fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pending.json");
    let key = derive_encryption_key(b"integration secret");

    let first = AuthProvider::new(
        TestFixtures::config(),
        Arc::new(FileVerifierStore::new(&path, key, StorePolicy::default())),
    );
    let request = first.authorization_url(AuthIntent::SignIn).unwrap();
    drop(first);

    let second = AuthProvider::new(
        TestFixtures::config(),
        Arc::new(FileVerifierStore::new(&path, key, StorePolicy::default())),
    );
    let validated = second
        .validate_callback(&OAuthCallback {
            code: Some("code".to_string()),
            state: Some(request.state),
            ..OAuthCallback::default()
        })
        .unwrap();
    assert_eq!(
        derive_challenge(&validated.pending.code_verifier),
        request.code_challenge
    );
}

#[test]
fn test_provider_from_file_backend_settings() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings: GateSettings = TestFixtures::settings();
    settings.storage.backend = StorageBackend::File;
    settings.storage.path = dir.path().join("p.json").display().to_string();
    settings.storage.secret = "configured secret".to_string();

    let provider = AuthProvider::from_settings(&settings).unwrap();
    provider.authorization_url(AuthIntent::SignIn).unwrap();
    assert_eq!(provider.store().pending_count().unwrap(), 1);
    assert!(dir.path().join("p.json").exists());
}
