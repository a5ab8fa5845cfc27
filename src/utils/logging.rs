// Centralized logging for the authorization flow and the content gate.
// Verifiers and tokens are never logged; states are shortened to a prefix.
use log::{debug, info, warn};

use crate::gate::{GateState, GateType};
use crate::oauth::{AuthIntent, OAuthClientConfig, TokenSet};

pub struct LoggingHelper;

impl LoggingHelper {
    /// First characters of a `state`, enough to correlate log lines
    #[must_use]
    pub fn state_hint(state: &str) -> String {
        let prefix: String = state.chars().take(8).collect();
        format!("{prefix}...")
    }

    /// Log provider configuration at startup
    pub fn log_provider_initialized(config: &OAuthClientConfig) {
        info!(
            "🔧 OAuth client '{}' configured against {} (callback {})",
            config.client_id(),
            config.auth_url(),
            config.redirect_uri()
        );
    }

    /// Log authorization URL building
    pub fn log_authorization_url_built(intent: AuthIntent, scopes: &str, state: &str) {
        info!(
            "🔍 Built {intent} authorization URL with scopes: {scopes} (state {})",
            Self::state_hint(state)
        );
    }

    /// Log a callback that passed validation
    pub fn log_callback_validated(intent: AuthIntent, state: &str) {
        info!(
            "✅ OAuth callback validated for {intent} (state {})",
            Self::state_hint(state)
        );
    }

    /// Log a callback that failed validation
    pub fn log_callback_rejected(reason: &str) {
        warn!("❌ OAuth callback rejected: {reason}");
    }

    /// Log token exchange start
    pub fn log_token_exchange_start(endpoint: &str) {
        info!("🔄 Exchanging authorization code for tokens at {endpoint}");
    }

    /// Log token exchange summary
    pub fn log_token_exchange_summary(tokens: &TokenSet) {
        info!(
            "🔍 Token exchange summary: refresh_token={}, id_token={}, token_type={}, expires_in={:?}, scope={:?}",
            if tokens.refresh_token.is_some() { "present" } else { "missing" },
            if tokens.id_token.is_some() { "present" } else { "missing" },
            tokens.token_type,
            tokens.expires_in,
            tokens.scope
        );
    }

    /// Log a content gate state change
    pub fn log_gate_transition(gate_type: GateType, from: &GateState, to: &GateState) {
        if from.kind() != to.kind() {
            debug!(
                "Gate '{}' {} -> {}",
                gate_type.as_str(),
                from.kind(),
                to.kind()
            );
        }
    }

    /// Log a failed unlock attempt from the gate
    pub fn log_unlock_failed(gate_type: GateType, intent: AuthIntent, error: &str) {
        warn!(
            "{intent} from '{}' gate failed: {error}",
            gate_type.as_str()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hint_truncates() {
        assert_eq!(
            LoggingHelper::state_hint("abcdefghijklmnopqrstuvwxyz"),
            "abcdefgh..."
        );
        assert_eq!(LoggingHelper::state_hint("abc"), "abc...");
    }
}
