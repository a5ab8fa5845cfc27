//! Testing utilities for learngate
//!
//! - [`fixtures`] - Pre-built settings, configurations and sessions
//! - [`mock`] - Recording navigators and scripted URL sources
//!
//! ## Usage
//!
//! ```rust
//! use learngate::gate::{ContentGate, GateType};
//! use learngate::testing::{mock::RecordingNavigator, TestFixtures};
//!
//! let provider = TestFixtures::provider();
//! let mut gate = ContentGate::new(GateType::Quiz, "answers");
//! gate.apply(&TestFixtures::signed_out(), chrono::Utc::now());
//!
//! let mut navigator = RecordingNavigator::default();
//! gate.sign_in(&provider, &mut navigator).unwrap();
//! assert_eq!(navigator.visited().len(), 1);
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Provider base URL used by fixtures
    pub const TEST_AUTH_URL: &str = "https://auth.example.com";

    /// Client id used by fixtures
    pub const TEST_CLIENT_ID: &str = "app-1";

    /// Site origin used by fixtures
    pub const TEST_APP_URL: &str = "https://book.example.com";

    /// Callback URL derived from [`TEST_APP_URL`]
    pub const TEST_CALLBACK_URL: &str = "https://book.example.com/auth/callback";

    /// User id of the fixture identity
    pub const TEST_USER_ID: &str = "u1";

    /// Email of the fixture identity
    pub const TEST_EMAIL: &str = "reader@example.com";
}
