//! `OAuth2` token types.

use std::fmt;

use crate::error::{Error, Result};
use serde::Deserialize;

/// Bearer credential for the mail-send endpoint.
///
/// Never empty, never persisted. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::Authentication(
                "token endpoint returned an empty access token".into(),
            ));
        }
        Ok(Self(token))
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken([redacted; {} bytes])", self.0.len())
    }
}

/// Token pair issued by the authorization-code grant.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Access token.
    pub access_token: AccessToken,
    /// Refresh token.
    pub refresh_token: String,
}

/// Token response from the token endpoint.
///
/// Every field is optional so that a malformed body still decodes and the
/// missing pieces can be reported precisely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Expires in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Scope.
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Extracts the access token.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` if the token is absent or empty.
    pub fn access_token(&self) -> Result<AccessToken> {
        self.access_token
            .as_deref()
            .ok_or_else(|| {
                Error::Authentication("token response does not contain access_token".into())
            })
            .and_then(AccessToken::new)
    }

    /// Returns the refresh token, treating an empty string as absent.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }
}

/// Error response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
}

impl ErrorResponse {
    /// Converts to an Error.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::oauth_error(self.error, self.error_description)
    }
}
