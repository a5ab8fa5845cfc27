//! Pending authorization storage
//!
//! The PKCE verifier has to survive the round-trip through the identity
//! provider. Entries are keyed by the OAuth `state`, so attempts from several
//! tabs never overwrite each other. Each entry expires after a TTL, is handed
//! out at most once, and the set is capped so abandoned attempts cannot pile
//! up.

pub mod file;
pub mod memory;

pub use file::FileVerifierStore;
pub use memory::MemoryVerifierStore;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::oauth::{AuthError, AuthIntent};
use crate::settings::{GateSettings, StorageBackend};
use crate::utils::crypto::derive_encryption_key;

/// One authorization attempt waiting for its callback
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub state: String,
    pub code_verifier: String,
    pub intent: AuthIntent,
    pub redirect_uri: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingAuthorization {
    #[must_use]
    pub fn new(
        state: String,
        code_verifier: String,
        intent: AuthIntent,
        redirect_uri: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            state,
            code_verifier,
            intent,
            redirect_uri,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for PendingAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAuthorization")
            .field("state", &self.state)
            .field("code_verifier", &"<redacted>")
            .field("intent", &self.intent)
            .field("redirect_uri", &self.redirect_uri)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Expiry and capacity policy shared by every store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorePolicy {
    pub ttl: Duration,
    pub max_pending: usize,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(600),
            max_pending: 16,
        }
    }
}

impl StorePolicy {
    #[must_use]
    pub fn from_settings(settings: &GateSettings) -> Self {
        let ttl_seconds = i64::try_from(settings.pkce.state_ttl_seconds).unwrap_or(i64::MAX);
        Self {
            ttl: Duration::try_seconds(ttl_seconds).unwrap_or_else(|| Duration::seconds(600)),
            max_pending: settings.pkce.max_pending.max(1),
        }
    }
}

/// Storage scope for pending authorizations
pub trait VerifierStore: Send + Sync {
    /// Remember a pending authorization under its `state`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backing storage fails.
    fn save(&self, pending: PendingAuthorization) -> Result<(), AuthError>;

    /// Remove and return the entry for `state`, unless it has expired
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backing storage fails.
    fn take(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingAuthorization>, AuthError>;

    /// Drop expired entries, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backing storage fails.
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AuthError>;

    /// Number of entries currently held, expired or not
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backing storage fails.
    fn pending_count(&self) -> Result<usize, AuthError>;

    /// Expiry policy applied to new entries
    fn policy(&self) -> StorePolicy;
}

/// In-memory set of pending entries with the shared expiry/eviction rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSet {
    entries: HashMap<String, PendingAuthorization>,
}

impl PendingSet {
    /// Insert, purging expired entries and evicting the oldest over capacity
    pub fn insert(&mut self, pending: PendingAuthorization, policy: StorePolicy) -> usize {
        let now = pending.created_at;
        let mut dropped = self.purge_expired(now);
        self.entries.insert(pending.state.clone(), pending);

        while self.entries.len() > policy.max_pending {
            let Some(oldest) = self
                .entries
                .values()
                .min_by_key(|p| p.created_at)
                .map(|p| p.state.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
            dropped += 1;
        }
        dropped
    }

    pub fn take(&mut self, state: &str, now: DateTime<Utc>) -> Option<PendingAuthorization> {
        let pending = self.entries.remove(state)?;
        if pending.is_expired(now) {
            log::debug!("Pending authorization for state expired at {}", pending.expires_at);
            return None;
        }
        Some(pending)
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, p| !p.is_expired(now));
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the store selected in settings
///
/// # Errors
///
/// Returns `AuthError::Configuration` when the file backend has no secret.
pub fn build_store(settings: &GateSettings) -> Result<Arc<dyn VerifierStore>, AuthError> {
    let policy = StorePolicy::from_settings(settings);
    match settings.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryVerifierStore::new(policy))),
        StorageBackend::File => {
            if settings.storage.secret.is_empty() {
                return Err(AuthError::Configuration(
                    "storage.secret must be set for the file backend".to_string(),
                ));
            }
            let key = derive_encryption_key(settings.storage.secret.as_bytes());
            Ok(Arc::new(FileVerifierStore::new(
                &settings.storage.path,
                key,
                policy,
            )))
        }
    }
}

/// Check that pending authorizations outlive the current process
///
/// A flow split across processes (start in one, callback in the next) only
/// works with the file backend.
///
/// # Errors
///
/// Returns `AuthError::Configuration` for the memory backend.
pub fn require_durable_store(settings: &GateSettings) -> Result<(), AuthError> {
    match settings.storage.backend {
        StorageBackend::File => Ok(()),
        StorageBackend::Memory => Err(AuthError::Configuration(
            "the memory store does not survive between commands; set STORAGE_BACKEND=file and STORAGE_SECRET".to_string(),
        )),
    }
}
