use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{PendingAuthorization, PendingSet, StorePolicy, VerifierStore};
use crate::oauth::AuthError;

/// Process-local verifier store
///
/// Suits an embedding where the same process handles the redirect out and
/// the callback back in.
#[derive(Debug, Default)]
pub struct MemoryVerifierStore {
    pending: Mutex<PendingSet>,
    policy: StorePolicy,
}

impl MemoryVerifierStore {
    #[must_use]
    pub fn new(policy: StorePolicy) -> Self {
        Self {
            pending: Mutex::new(PendingSet::default()),
            policy,
        }
    }
}

impl VerifierStore for MemoryVerifierStore {
    fn save(&self, pending: PendingAuthorization) -> Result<(), AuthError> {
        let dropped = self.pending.lock().insert(pending, self.policy);
        if dropped > 0 {
            log::debug!("Dropped {dropped} stale pending authorization(s)");
        }
        Ok(())
    }

    fn take(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingAuthorization>, AuthError> {
        Ok(self.pending.lock().take(state, now))
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AuthError> {
        Ok(self.pending.lock().purge_expired(now))
    }

    fn pending_count(&self) -> Result<usize, AuthError> {
        Ok(self.pending.lock().len())
    }

    fn policy(&self) -> StorePolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::AuthIntent;
    use chrono::Duration;
    use std::sync::Arc;

    fn pending(state: &str) -> PendingAuthorization {
        PendingAuthorization::new(
            state.to_string(),
            "v".repeat(43),
            AuthIntent::SignUp,
            "http://localhost:3000/auth/callback".to_string(),
            Utc::now(),
            Duration::seconds(60),
        )
    }

    #[test]
    fn test_save_and_take() {
        let store = MemoryVerifierStore::new(StorePolicy::default());
        store.save(pending("tab-1")).unwrap();
        store.save(pending("tab-2")).unwrap();
        assert_eq!(store.pending_count().unwrap(), 2);

        let taken = store.take("tab-2", Utc::now()).unwrap().unwrap();
        assert_eq!(taken.intent, AuthIntent::SignUp);
        assert!(store.take("tab-2", Utc::now()).unwrap().is_none());
        assert!(store.take("tab-1", Utc::now()).unwrap().is_some());
    }

    #[test]
    fn test_purge_expired() {
        let store = MemoryVerifierStore::new(StorePolicy::default());
        store.save(pending("a")).unwrap();
        let removed = store
            .purge_expired(Utc::now() + Duration::seconds(61))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let store = Arc::new(MemoryVerifierStore::new(StorePolicy {
            ttl: Duration::seconds(60),
            max_pending: 64,
        }));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.save(pending(&format!("state-{i}"))).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.pending_count().unwrap(), 8);
    }
}
