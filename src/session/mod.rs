//! Session context
//!
//! The session is owned here and only read by the gate. Consumers subscribe
//! to a `tokio::sync::watch` channel and re-evaluate on every change.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::watch;

/// Authenticated identity as reported by the provider's userinfo endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "sub")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Provider-specific claims (role, background, ...)
    #[serde(flatten)]
    pub claims: HashMap<String, serde_json::Value>,
}

impl Identity {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            email: None,
            name: None,
            claims: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// String claim such as `role`
    #[must_use]
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(serde_json::Value::as_str)
    }
}

/// What the gate sees of the session at one point in time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub session: Option<Identity>,
    pub is_loading: bool,
}

impl SessionSnapshot {
    /// Session status not yet known
    #[must_use]
    pub fn loading() -> Self {
        Self {
            session: None,
            is_loading: true,
        }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            session: Some(identity),
            is_loading: false,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.is_loading && self.session.is_some()
    }
}

/// Observable session holder, constructed once per application
#[derive(Debug, Clone)]
pub struct SessionStore {
    sender: watch::Sender<SessionSnapshot>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// New store in the loading state; the session is resolved asynchronously
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionSnapshot::loading());
        Self { sender }
    }

    #[must_use]
    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        let (sender, _) = watch::channel(snapshot);
        Self { sender }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.sender.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.sender.subscribe()
    }

    /// Mark the session as being re-checked
    pub fn begin_loading(&self) {
        self.sender.send_modify(|snapshot| snapshot.is_loading = true);
    }

    /// Resolve the session (present or absent)
    pub fn set_session(&self, session: Option<Identity>) {
        match &session {
            Some(identity) => log::info!("Session established for user {}", identity.id),
            None => log::debug!("No active session"),
        }
        self.sender.send_replace(SessionSnapshot {
            session,
            is_loading: false,
        });
    }

    pub fn sign_out(&self) {
        log::info!("Session cleared");
        self.set_session(None);
    }
}
