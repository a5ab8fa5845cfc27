//! Content gate state machine
//!
//! `Loading -> Locked | Unlocked`, re-evaluated on every session change.
//! Only [`ContentGate::apply`] can move the gate to `Unlocked`, and only for a
//! resolved session without `force_gate`; sign-in failures never touch the
//! state, so the gate fails closed.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tokio::sync::watch;

use super::descriptor::GateType;
use super::navigator::Navigator;
use super::view::{
    ActionButton, GateCard, GateView, ObscuredPreview, GATE_FOOTER, LOADING_MESSAGE,
    SIGNING_IN_LABEL, SIGN_IN_LABEL, SIGN_UP_LABEL, UNLOCK_ERROR_MESSAGE,
};
use crate::oauth::{AuthError, AuthIntent, AuthorizationUrlSource};
use crate::session::SessionSnapshot;
use crate::utils::logging::LoggingHelper;

/// How long the cosmetic unlock animation runs
pub const REVEAL_DURATION_MS: i64 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Locked,
    Unlocked { unlocked_at: DateTime<Utc> },
}

impl GateState {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            GateState::Loading => "loading",
            GateState::Locked => "locked",
            GateState::Unlocked { .. } => "unlocked",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Guard around one piece of protected content
pub struct ContentGate<C> {
    gate_type: GateType,
    children: C,
    preview: Option<C>,
    title: Option<String>,
    description: Option<String>,
    force_gate: bool,
    state: GateState,
    signing_in: bool,
    error: Option<&'static str>,
}

impl<C> ContentGate<C> {
    /// New gate in the `Loading` state
    #[must_use]
    pub fn new(gate_type: GateType, children: C) -> Self {
        Self {
            gate_type,
            children,
            preview: None,
            title: None,
            description: None,
            force_gate: false,
            state: GateState::Loading,
            signing_in: false,
            error: None,
        }
    }

    /// Substitute shown (obscured) instead of the children while locked
    #[must_use]
    pub fn with_preview(mut self, preview: C) -> Self {
        self.preview = Some(preview);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Keep the gate locked even with a session (for checking the locked UI)
    #[must_use]
    pub fn force_gate(mut self, force: bool) -> Self {
        self.force_gate = force;
        self
    }

    #[must_use]
    pub fn gate_type(&self) -> GateType {
        self.gate_type
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.state
    }

    #[must_use]
    pub fn is_signing_in(&self) -> bool {
        self.signing_in
    }

    #[must_use]
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Re-evaluate against a session snapshot
    pub fn apply(&mut self, snapshot: &SessionSnapshot, now: DateTime<Utc>) -> GateState {
        let next = if snapshot.is_loading {
            GateState::Loading
        } else if snapshot.session.is_some() && !self.force_gate {
            match self.state {
                GateState::Unlocked { unlocked_at } => GateState::Unlocked { unlocked_at },
                _ => GateState::Unlocked { unlocked_at: now },
            }
        } else {
            GateState::Locked
        };

        LoggingHelper::log_gate_transition(self.gate_type, &self.state, &next);

        if next.kind() != self.state.kind() {
            self.signing_in = false;
            if matches!(next, GateState::Unlocked { .. }) {
                self.error = None;
            }
        }
        self.state = next;
        next
    }

    /// Apply whatever the session store currently holds
    pub fn sync(&mut self, session: &mut watch::Receiver<SessionSnapshot>) -> GateState {
        let snapshot = session.borrow_and_update().clone();
        self.apply(&snapshot, Utc::now())
    }

    /// Wait for the next session change and apply it
    ///
    /// Returns `None` once the session store has been dropped.
    pub async fn follow(
        &mut self,
        session: &mut watch::Receiver<SessionSnapshot>,
    ) -> Option<GateState> {
        session.changed().await.ok()?;
        Some(self.sync(session))
    }

    /// "Sign In" action
    ///
    /// # Errors
    ///
    /// Returns the builder or navigation failure; the gate is left locked
    /// with an inline error and enabled buttons.
    pub fn sign_in(
        &mut self,
        source: &dyn AuthorizationUrlSource,
        navigator: &mut dyn Navigator,
    ) -> Result<(), AuthError> {
        self.start(AuthIntent::SignIn, source, navigator)
    }

    /// "Create Free Account" action
    ///
    /// # Errors
    ///
    /// Same as [`Self::sign_in`].
    pub fn sign_up(
        &mut self,
        source: &dyn AuthorizationUrlSource,
        navigator: &mut dyn Navigator,
    ) -> Result<(), AuthError> {
        self.start(AuthIntent::SignUp, source, navigator)
    }

    fn start(
        &mut self,
        intent: AuthIntent,
        source: &dyn AuthorizationUrlSource,
        navigator: &mut dyn Navigator,
    ) -> Result<(), AuthError> {
        if self.state != GateState::Locked {
            log::debug!("Ignoring {intent} on a {} gate", self.state);
            return Ok(());
        }
        if self.signing_in {
            log::debug!("Ignoring {intent}: attempt already in flight");
            return Ok(());
        }

        self.error = None;
        self.signing_in = true;

        let result = source
            .navigation_url(intent)
            .and_then(|url| navigator.navigate(&url));

        match result {
            Ok(()) => Ok(()),
            Err(e) if !e.is_user_visible() => {
                log::debug!("{intent} abandoned before redirect");
                self.signing_in = false;
                Ok(())
            }
            Err(e) => {
                LoggingHelper::log_unlock_failed(self.gate_type, intent, &e.to_string());
                self.signing_in = false;
                self.error = Some(UNLOCK_ERROR_MESSAGE);
                Err(e)
            }
        }
    }

    /// Current view
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> GateView<'_, C> {
        match self.state {
            GateState::Loading => GateView::Loading {
                message: LOADING_MESSAGE,
            },
            GateState::Unlocked { unlocked_at } => GateView::Unlocked {
                content: &self.children,
                revealing: now - unlocked_at < Duration::milliseconds(REVEAL_DURATION_MS),
            },
            GateState::Locked => GateView::Locked {
                preview: ObscuredPreview::new(self.preview.as_ref().unwrap_or(&self.children)),
                card: self.card(),
            },
        }
    }

    fn card(&self) -> GateCard {
        let descriptor = self.gate_type.descriptor();
        GateCard {
            icon: descriptor.icon,
            title: self
                .title
                .clone()
                .unwrap_or_else(|| descriptor.title.to_string()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| descriptor.description.to_string()),
            benefit: descriptor.benefit,
            sign_in: ActionButton {
                label: if self.signing_in {
                    SIGNING_IN_LABEL
                } else {
                    SIGN_IN_LABEL
                },
                intent: AuthIntent::SignIn,
                disabled: self.signing_in,
                busy: self.signing_in,
            },
            sign_up: ActionButton {
                label: SIGN_UP_LABEL,
                intent: AuthIntent::SignUp,
                disabled: self.signing_in,
                busy: false,
            },
            error: self.error,
            footer: GATE_FOOTER,
        }
    }
}
