//! Graph mail service for sending messages.
//!
//! Provides the outgoing message model and the `sendMail` call.

use std::time::Duration;

use officemail_oauth::{AccessToken, Session, TokenLifecycleManager, TokenStore};
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};

/// Graph endpoint that sends a message as the signed-in user.
pub const GRAPH_SEND_MAIL_URL: &str = "https://graph.microsoft.com/v1.0/me/sendMail";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An email message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
}

impl OutgoingMessage {
    /// Creates a new outgoing message.
    #[must_use]
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html_body: html_body.into(),
        }
    }

    /// Checks the message can be sent.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMessage` if the recipient is empty or has no `@`.
    pub fn validate(&self) -> Result<()> {
        let to = self.to.trim();
        if to.is_empty() {
            return Err(Error::InvalidMessage("No recipient specified".into()));
        }
        if !to.contains('@') {
            return Err(Error::InvalidMessage(format!(
                "Recipient is not an address: {to}"
            )));
        }
        Ok(())
    }

    fn to_graph(&self) -> SendMailRequest<'_> {
        SendMailRequest {
            message: GraphMessage {
                subject: &self.subject,
                body: ItemBody {
                    content_type: "HTML",
                    content: &self.html_body,
                },
                to_recipients: vec![Recipient {
                    email_address: EmailAddress {
                        address: self.to.trim(),
                    },
                }],
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    message: GraphMessage<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage<'a> {
    subject: &'a str,
    body: ItemBody<'a>,
    to_recipients: Vec<Recipient<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    content_type: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipient<'a> {
    email_address: EmailAddress<'a>,
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    address: &'a str,
}

/// Client for the Graph send-mail endpoint.
#[derive(Debug, Clone)]
pub struct MailClient {
    send_url: Url,
    http_client: Client,
}

impl MailClient {
    /// Creates a client for the public Graph endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            send_url: Url::parse(GRAPH_SEND_MAIL_URL)?,
            http_client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Points the client at another send-mail URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` does not parse.
    pub fn with_send_url(mut self, url: &str) -> Result<Self> {
        self.send_url = Url::parse(url)?;
        Ok(self)
    }

    /// The send-mail URL in use.
    #[must_use]
    pub const fn send_url(&self) -> &Url {
        &self.send_url
    }

    /// Sends `message` with `token`.
    ///
    /// The token goes into the `Authorization` header as is.
    ///
    /// # Errors
    ///
    /// `Error::InvalidMessage` before any request if the message does not
    /// validate, `Error::Send` when Graph answers with a non-2xx status,
    /// `Error::Transport` on network failure.
    pub async fn send(&self, token: &AccessToken, message: &OutgoingMessage) -> Result<()> {
        message.validate()?;
        debug!("Posting message to {}", self.send_url);

        let response = self
            .http_client
            .post(self.send_url.clone())
            .header(AUTHORIZATION, token.secret())
            .json(&message.to_graph())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Graph rejected message: {status}");
            return Err(Error::Send {
                status: status.as_u16(),
                body,
            });
        }

        info!("Message sent");
        Ok(())
    }
}

/// Refreshes an access token and sends `message` with it.
///
/// Returns the session produced by the refresh.
///
/// # Errors
///
/// `Error::InvalidMessage` before any token request, `Error::Auth` when no
/// access token can be obtained, plus any error from [`MailClient::send`].
pub async fn send_mail<S: TokenStore>(
    manager: &TokenLifecycleManager<S>,
    client: &MailClient,
    session: &Session,
    message: &OutgoingMessage,
) -> Result<Session> {
    message.validate()?;
    let (session, token) = manager.access_token_for_send(session).await?;
    client.send(&token, message).await?;
    Ok(session)
}
