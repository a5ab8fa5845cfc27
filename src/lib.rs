#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the learngate library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod gate;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod store;
pub mod testing;
pub mod utils;

/// Re-export commonly used items
pub use gate::{ContentGate, GateType, GateView, Navigator};
pub use oauth::{
    AuthError, AuthIntent, AuthProvider, AuthorizationRequest, AuthorizationUrlSource,
    OAuthCallback, OAuthClientConfig, TokenExchangeService,
};
pub use session::{Identity, SessionSnapshot, SessionStore};
pub use settings::GateSettings;
pub use store::{FileVerifierStore, MemoryVerifierStore, VerifierStore};
