//! `OAuth2` grants against the token endpoint.

mod code;
mod refresh;

pub use code::AuthorizationExchanger;
pub use refresh::TokenRefresher;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{ErrorResponse, TokenResponse};

/// Default timeout for token endpoint requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Common `OAuth2` client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Application credentials.
    pub credentials: Credentials,
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is invalid or the HTTP client cannot
    /// be built.
    pub fn new(credentials: Credentials, provider: Provider) -> Result<Self> {
        Self::with_timeout(credentials, provider, DEFAULT_TIMEOUT)
    }

    /// Creates a new OAuth client with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is invalid or the HTTP client cannot
    /// be built.
    pub fn with_timeout(
        credentials: Credentials,
        provider: Provider,
        timeout: Duration,
    ) -> Result<Self> {
        provider.validate()?;
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            credentials,
            provider,
            http_client,
        })
    }

    /// Creates a client for the Microsoft tenant named in `credentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant produces an invalid endpoint URL.
    pub fn microsoft(credentials: Credentials) -> Result<Self> {
        let provider = Provider::microsoft(credentials.tenant_id())?;
        Self::new(credentials, provider)
    }

    /// Posts a form-encoded grant to the token endpoint.
    ///
    /// Transport failures surface as `Error::Transport`. Error statuses and
    /// undecodable bodies surface as `Error::Authentication`.
    pub(crate) async fn post_token_request(
        &self,
        grant_type: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse> {
        debug!(
            "Requesting {grant_type} grant from {}",
            self.provider.token_url
        );

        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Token endpoint rejected {grant_type} grant: {status}");
            return Err(serde_json::from_str::<ErrorResponse>(&body).map_or_else(
                |_| Error::Authentication(format!("token endpoint returned {status}")),
                ErrorResponse::into_error,
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::Authentication(format!("malformed token response for {grant_type}: {e}"))
        })
    }
}
