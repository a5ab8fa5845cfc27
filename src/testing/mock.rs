//! Mock objects for exercising the gate without a browser

use url::Url;

use crate::gate::Navigator;
use crate::oauth::{AuthError, AuthIntent, AuthorizationUrlSource};

/// Navigator that records every redirect, or aborts them all
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Vec<Url>,
    abort: bool,
}

impl RecordingNavigator {
    /// Navigator simulating a user who leaves before the redirect
    #[must_use]
    pub fn aborting() -> Self {
        Self {
            visited: Vec::new(),
            abort: true,
        }
    }

    #[must_use]
    pub fn visited(&self) -> &[Url] {
        &self.visited
    }

    #[must_use]
    pub fn last(&self) -> Option<&Url> {
        self.visited.last()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, url: &Url) -> Result<(), AuthError> {
        if self.abort {
            return Err(AuthError::NavigationAbort);
        }
        self.visited.push(url.clone());
        Ok(())
    }
}

/// URL source that always fails with the given error
#[derive(Debug, Clone)]
pub struct FailingUrlSource {
    pub error: AuthError,
}

impl FailingUrlSource {
    #[must_use]
    pub fn misconfigured() -> Self {
        Self {
            error: AuthError::Configuration("auth_url is not set".to_string()),
        }
    }
}

impl AuthorizationUrlSource for FailingUrlSource {
    fn navigation_url(&self, _intent: AuthIntent) -> Result<Url, AuthError> {
        Err(self.error.clone())
    }
}
