//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur while sending mail.
#[derive(Debug, Error)]
pub enum Error {
    /// Obtaining an access token failed.
    #[error("Authorization error: {0}")]
    Auth(#[from] officemail_oauth::Error),

    /// HTTP transport failure talking to Graph.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Graph rejected the message.
    #[error("Send failed with status {status}: {body}")]
    Send {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The message cannot be sent as built.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Malformed endpoint URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
