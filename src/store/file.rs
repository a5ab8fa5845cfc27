//! Durable verifier store
//!
//! Keeps pending authorizations in a single file sealed with AES-256-GCM, the
//! way a browser keeps them in local storage across a full-page redirect.
//! Every read-modify-write cycle holds an exclusive lock on a `.lock` sibling,
//! so stores in other threads or processes sharing the path see each other's
//! entries. The file is replaced through a uniquely named temporary file.

use chrono::{DateTime, Utc};
use fd_lock::RwLock;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::{PendingAuthorization, PendingSet, StorePolicy, VerifierStore};
use crate::oauth::AuthError;
use crate::utils::crypto::{decrypt_data, encrypt_data, ENCRYPTION_KEY_SIZE};

pub struct FileVerifierStore {
    path: PathBuf,
    lock_path: PathBuf,
    key: [u8; ENCRYPTION_KEY_SIZE],
    policy: StorePolicy,
    // Serializes cycles between threads sharing this instance
    lock: Mutex<()>,
}

/// How a cycle treats the file
#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Always writes, creating the file and its directory when missing
    Write,
    /// Writes only if entries were removed; a missing file is left missing
    Consume,
}

impl FileVerifierStore {
    #[must_use]
    pub fn new(path: impl AsRef<Path>, key: [u8; ENCRYPTION_KEY_SIZE], policy: StorePolicy) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        Self {
            lock_path: path.with_file_name(lock_name),
            path,
            key,
            policy,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn open_lock_file(&self) -> Result<File, AuthError> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| {
                AuthError::Storage(format!("cannot open {}: {e}", self.lock_path.display()))
            })
    }

    fn load(&self) -> Result<PendingSet, AuthError> {
        let sealed = match fs::read_to_string(&self.path) {
            Ok(sealed) => sealed,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PendingSet::default()),
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if sealed.trim().is_empty() {
            return Ok(PendingSet::default());
        }

        match decrypt_data::<PendingSet>(&sealed, &self.key) {
            Ok(set) => Ok(set),
            Err(e) => {
                // Unreadable content (rotated secret, truncated write) only
                // strands in-flight attempts; start over rather than fail forever
                log::warn!(
                    "Discarding unreadable pending authorizations in {}: {e}",
                    self.path.display()
                );
                Ok(PendingSet::default())
            }
        }
    }

    fn persist(&self, set: &PendingSet) -> Result<(), AuthError> {
        let sealed = encrypt_data(set, &self.key)
            .map_err(|e| AuthError::Storage(format!("cannot seal pending set: {e}")))?;

        let parent = self.parent_dir();
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| {
            AuthError::Storage(format!("cannot create temp file in {}: {e}", parent.display()))
        })?;
        tmp.write_all(sealed.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| AuthError::Storage(format!("cannot write pending set: {e}")))?;
        tmp.persist(&self.path).map_err(|e| {
            AuthError::Storage(format!("cannot replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }

    fn modify<R>(
        &self,
        access: Access,
        f: impl FnOnce(&mut PendingSet) -> R,
    ) -> Result<R, AuthError> {
        let _guard = self.lock.lock();

        if access == Access::Consume && !self.path.exists() {
            return Ok(f(&mut PendingSet::default()));
        }
        if access == Access::Write {
            let parent = self.parent_dir();
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::Storage(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let mut file_lock = RwLock::new(self.open_lock_file()?);
        let _file_guard = file_lock.write().map_err(|e| {
            AuthError::Storage(format!("cannot lock {}: {e}", self.lock_path.display()))
        })?;

        let mut set = self.load()?;
        let before = set.len();
        let result = f(&mut set);
        if access == Access::Write || set.len() != before {
            self.persist(&set)?;
        }
        Ok(result)
    }
}

impl VerifierStore for FileVerifierStore {
    fn save(&self, pending: PendingAuthorization) -> Result<(), AuthError> {
        let policy = self.policy;
        let dropped = self.modify(Access::Write, |set| set.insert(pending, policy))?;
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
        self.modify(Access::Consume, |set| set.take(state, now))
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AuthError> {
        self.modify(Access::Consume, |set| set.purge_expired(now))
    }

    fn pending_count(&self) -> Result<usize, AuthError> {
        self.modify(Access::Consume, |set| set.len())
    }

    fn policy(&self) -> StorePolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::AuthIntent;
    use crate::utils::crypto::derive_encryption_key;
    use chrono::Duration;

    fn pending(state: &str) -> PendingAuthorization {
        PendingAuthorization::new(
            state.to_string(),
            format!("verifier-for-{state}"),
            AuthIntent::SignIn,
            "http://localhost:3000/auth/callback".to_string(),
            Utc::now(),
            Duration::seconds(600),
        )
    }

    #[test]
    fn test_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.json");
        let key = derive_encryption_key(b"file store secret");

        FileVerifierStore::new(&path, key, StorePolicy::default())
            .save(pending("abc"))
            .unwrap();

        let reopened = FileVerifierStore::new(&path, key, StorePolicy::default());
        let taken = reopened.take("abc", Utc::now()).unwrap().unwrap();
        assert_eq!(taken.code_verifier, "verifier-for-abc");
        assert!(reopened.take("abc", Utc::now()).unwrap().is_none());
    }

    #[test]
    fn test_file_does_not_contain_plain_verifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.json");
        let store =
            FileVerifierStore::new(&path, derive_encryption_key(b"k"), StorePolicy::default());
        store.save(pending("xyz")).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("verifier-for-xyz"));
        assert!(!raw.contains("xyz"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVerifierStore::new(
            dir.path().join("nested/none.json"),
            derive_encryption_key(b"k"),
            StorePolicy::default(),
        );
        assert_eq!(store.pending_count().unwrap(), 0);
        assert!(store.take("nothing", Utc::now()).unwrap().is_none());
        assert_eq!(store.purge_expired(Utc::now()).unwrap(), 0);
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_unknown_take_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.json");
        let store =
            FileVerifierStore::new(&path, derive_encryption_key(b"k"), StorePolicy::default());
        store.save(pending("kept")).unwrap();
        let sealed = std::fs::read_to_string(&path).unwrap();

        assert!(store.take("other", Utc::now()).unwrap().is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), sealed);
    }

    #[test]
    fn test_two_instances_on_one_path_keep_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.json");
        let key = derive_encryption_key(b"shared secret");
        let policy = StorePolicy {
            ttl: Duration::seconds(600),
            max_pending: 1000,
        };

        let handles: Vec<_> = ["left", "right"]
            .into_iter()
            .map(|side| {
                let store = FileVerifierStore::new(&path, key, policy);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.save(pending(&format!("{side}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let reader = FileVerifierStore::new(&path, key, policy);
        assert_eq!(reader.pending_count().unwrap(), 100);
        assert!(reader.take("left-7", Utc::now()).unwrap().is_some());
        assert!(reader.take("right-49", Utc::now()).unwrap().is_some());
    }

    #[test]
    fn test_wrong_key_discards_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.json");
        FileVerifierStore::new(&path, derive_encryption_key(b"one"), StorePolicy::default())
            .save(pending("s1"))
            .unwrap();

        let rotated =
            FileVerifierStore::new(&path, derive_encryption_key(b"two"), StorePolicy::default());
        assert!(rotated.take("s1", Utc::now()).unwrap().is_none());
    }
}
