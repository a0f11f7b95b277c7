//! Authorization Code grant.

use chrono::NaiveDate;
use tracing::{info, warn};
use url::Url;

use super::OAuthClient;
use crate::error::{Error, Result};
use crate::store::{TokenRecord, TokenStore};
use crate::token::TokenPair;

/// Turns a one-time authorization code into the initial token pair.
///
/// Obtaining the code (browser redirect and callback) happens outside this
/// type; its contract starts once a code string is available.
#[derive(Debug)]
pub struct AuthorizationExchanger<'a> {
    client: &'a OAuthClient,
}

impl<'a> AuthorizationExchanger<'a> {
    /// Creates a new exchanger.
    #[must_use]
    pub const fn new(client: &'a OAuthClient) -> Self {
        Self { client }
    }

    /// Builds the URL the user must visit to grant consent.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be constructed.
    pub fn authorization_url(&self) -> Result<Url> {
        let credentials = &self.client.credentials;
        let mut url = self.client.provider.auth_url.clone();

        url.query_pairs_mut()
            .append_pair("client_id", credentials.client_id())
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", credentials.redirect_uri())
            .append_pair("response_mode", "query")
            .append_pair("scope", credentials.scope());

        Ok(url)
    }

    /// Exchanges the authorization code for tokens.
    ///
    /// Persists `{refresh_token, today}` when `store` holds no record yet.
    /// Nothing is written when the exchange fails.
    ///
    /// # Errors
    ///
    /// `Error::MissingRefreshToken` when the provider issued no refresh
    /// token, `Error::Authentication` when it issued no access token,
    /// `Error::Transport` on network failure, `Error::Io` if the store
    /// cannot be written.
    pub async fn exchange<S: TokenStore>(
        &self,
        code: &str,
        store: &S,
        today: NaiveDate,
    ) -> Result<TokenPair> {
        if code.trim().is_empty() {
            return Err(Error::InvalidConfig("authorization code is empty".into()));
        }

        let credentials = &self.client.credentials;
        let params = [
            ("client_id", credentials.client_id()),
            ("scope", credentials.scope()),
            ("code", code),
            ("redirect_uri", credentials.redirect_uri()),
            ("grant_type", "authorization_code"),
            ("client_secret", credentials.client_secret()),
        ];

        let response = self
            .client
            .post_token_request("authorization_code", &params)
            .await?;

        let Some(refresh_token) = response.refresh_token().map(str::to_string) else {
            warn!("Code exchange returned no refresh token; is offline_access in the scope?");
            return Err(Error::MissingRefreshToken);
        };
        let access_token = response.access_token()?;

        if store.exists() {
            info!("Token record already present, leaving it for the refresh cycle");
        } else {
            store.save(&TokenRecord::new(refresh_token.clone(), today))?;
        }

        info!("Authorization code exchanged");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
