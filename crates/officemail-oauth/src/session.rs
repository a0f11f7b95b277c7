//! Transient per-run token state.

use crate::token::{AccessToken, TokenPair};

/// In-memory token state of one run.
///
/// Operations take a `&Session` and hand back a new one; nothing is
/// mutated in place. The access token is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Authorization code delivered by the redirect callback.
    pub authorization_code: Option<String>,
    /// Most recent access token.
    pub access_token: Option<AccessToken>,
    /// Refresh token obtained during this run.
    pub refresh_token: Option<String>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a session carrying an authorization code from the callback.
    #[must_use]
    pub fn with_authorization_code(&self, code: impl Into<String>) -> Self {
        Self {
            authorization_code: Some(code.into()),
            ..self.clone()
        }
    }

    /// Returns the session after a successful code exchange.
    ///
    /// The code is single-use and is dropped.
    #[must_use]
    pub fn exchanged(&self, pair: TokenPair) -> Self {
        Self {
            authorization_code: None,
            access_token: Some(pair.access_token),
            refresh_token: Some(pair.refresh_token),
        }
    }

    /// Returns the session after a successful refresh.
    #[must_use]
    pub fn refreshed(&self, access_token: AccessToken, refresh_token: Option<String>) -> Self {
        Self {
            authorization_code: self.authorization_code.clone(),
            access_token: Some(access_token),
            refresh_token: refresh_token.or_else(|| self.refresh_token.clone()),
        }
    }
}
