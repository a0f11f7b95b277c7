//! Error types for token lifecycle operations.

use std::io;

/// Result type alias for token lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Token lifecycle error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No token record is persisted.
    ///
    /// Recoverable: the caller falls back to the authorization flow.
    #[error("No token record found in {0}")]
    NotFound(String),

    /// The persisted token record could not be read back.
    #[error("Malformed token record: {0}")]
    Parse(String),

    /// The token record could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The code exchange succeeded but the provider issued no refresh token.
    ///
    /// Usually means `offline_access` is missing from the requested scope.
    #[error("Provider did not return a refresh token")]
    MissingRefreshToken,

    /// The token endpoint did not yield a usable access token.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The HTTP request itself failed (DNS, TLS, connection, timeout).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// User denied authorization.
    #[error("User denied authorization: {0}")]
    AccessDenied(String),

    /// The authorization callback carried an error or no code.
    #[error("Authorization failed: {error} - {description}")]
    Authorization {
        /// Error code (e.g., `invalid_request`).
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Creates an authentication error from an `OAuth2` error code and description.
    #[must_use]
    pub fn oauth_error(error: impl AsRef<str>, description: impl AsRef<str>) -> Self {
        let description = description.as_ref();
        if description.is_empty() {
            Self::Authentication(error.as_ref().to_string())
        } else {
            Self::Authentication(format!("{} - {description}", error.as_ref()))
        }
    }

    /// Returns true if this error means the caller should run the authorization flow.
    #[must_use]
    pub const fn requires_authorization(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_error_message() {
        let err = Error::oauth_error("invalid_grant", "AADSTS70000: expired");
        assert_eq!(
            err.to_string(),
            "Authentication failed: invalid_grant - AADSTS70000: expired"
        );

        let err = Error::oauth_error("invalid_grant", "");
        assert_eq!(err.to_string(), "Authentication failed: invalid_grant");
    }

    #[test]
    fn test_requires_authorization() {
        assert!(Error::NotFound("refresh.ini".into()).requires_authorization());
        assert!(!Error::Parse("bad date".into()).requires_authorization());
        assert!(!Error::Authentication("empty".into()).requires_authorization());
        assert!(!Error::MissingRefreshToken.requires_authorization());
    }
}
