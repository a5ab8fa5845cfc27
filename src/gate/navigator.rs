use url::Url;

use crate::oauth::AuthError;

/// Performs the browser redirect to the identity provider
///
/// Navigation is fire-and-forget: success means the redirect was issued,
/// not that the provider answered.
pub trait Navigator {
    /// Send the browser to `url`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NavigationAbort` if the user left before the
    /// redirect happened, or another error if navigation is impossible.
    fn navigate(&mut self, url: &Url) -> Result<(), AuthError>;
}
