//! Render output of the content gate
//!
//! The gate does not draw anything itself; it yields one of these views and
//! the host UI maps them onto markup.

use std::fmt;

use crate::oauth::AuthIntent;

pub const LOADING_MESSAGE: &str = "Checking access...";
pub const SIGN_IN_LABEL: &str = "Sign In";
pub const SIGNING_IN_LABEL: &str = "Signing in...";
pub const SIGN_UP_LABEL: &str = "Create Free Account";
pub const GATE_FOOTER: &str = "Free forever. No credit card required.";
pub const UNLOCK_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// What the gate shows right now
#[derive(Debug, Clone, PartialEq)]
pub enum GateView<'a, C> {
    /// Session status unknown; neither reveals nor denies
    Loading { message: &'static str },
    /// No access: obscured preview plus the call-to-action card
    Locked {
        preview: ObscuredPreview<'a, C>,
        card: GateCard,
    },
    /// Access granted; `revealing` drives the cosmetic unlock animation
    Unlocked { content: &'a C, revealing: bool },
}

impl<C> GateView<'_, C> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, GateView::Loading { .. })
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, GateView::Locked { .. })
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        matches!(self, GateView::Unlocked { .. })
    }

    #[must_use]
    pub fn card(&self) -> Option<&GateCard> {
        match self {
            GateView::Locked { card, .. } => Some(card),
            _ => None,
        }
    }
}

/// Blurred, inert rendition of the preview (or of the children)
#[derive(Debug, Clone, PartialEq)]
pub struct ObscuredPreview<'a, C> {
    pub content: &'a C,
    pub aria_hidden: bool,
    pub interactive: bool,
}

impl<'a, C> ObscuredPreview<'a, C> {
    #[must_use]
    pub fn new(content: &'a C) -> Self {
        Self {
            content,
            aria_hidden: true,
            interactive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: &'static str,
    pub intent: AuthIntent,
    pub disabled: bool,
    pub busy: bool,
}

/// Call-to-action card of the locked state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateCard {
    pub icon: &'static str,
    pub title: String,
    pub description: String,
    pub benefit: &'static str,
    pub sign_in: ActionButton,
    pub sign_up: ActionButton,
    /// Inline error after a failed attempt; buttons stay enabled
    pub error: Option<&'static str>,
    pub footer: &'static str,
}

impl<C: fmt::Display> fmt::Display for GateView<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateView::Loading { message } => writeln!(f, "[loading] {message}"),
            GateView::Unlocked { content, revealing } => {
                let tag = if *revealing { "unlocking" } else { "unlocked" };
                writeln!(f, "[{tag}]")?;
                writeln!(f, "{content}")
            }
            GateView::Locked { card, .. } => {
                writeln!(f, "[locked] {} {}", card.icon, card.title)?;
                writeln!(f, "{}", card.description)?;
                writeln!(f, "  ✓ {}", card.benefit)?;
                if let Some(error) = card.error {
                    writeln!(f, "  ! {error}")?;
                }
                writeln!(f, "  [{}]  [{}]", card.sign_in.label, card.sign_up.label)?;
                writeln!(f, "{}", card.footer)
            }
        }
    }
}
