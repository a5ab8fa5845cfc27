//! OAuth authorization-code + PKCE client
//!
//! This module builds authorization requests, validates callbacks and
//! performs the token exchange for a public (secretless) client.

pub mod authorization;
pub mod callback;
pub mod config;
pub mod errors;
pub mod pkce;
pub mod service;
pub mod token;

pub use authorization::{build_authorization_request, AuthIntent, AuthorizationRequest};
pub use callback::{CallbackValidator, OAuthCallback, ValidatedCallback};
pub use config::OAuthClientConfig;
pub use errors::AuthError;
pub use pkce::PkcePair;
pub use service::{AuthProvider, AuthorizationUrlSource, TokenExchangeService};
pub use token::{TokenExchangeRequest, TokenSet};
