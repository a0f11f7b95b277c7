//! Refresh Token grant.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::OAuthClient;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::store::{self, DEFAULT_WINDOW_DAYS, TokenRecord, TokenStore};

/// Exchanges the stored refresh token for a new access token.
#[derive(Debug)]
pub struct TokenRefresher<'a> {
    client: &'a OAuthClient,
    window_days: u32,
}

impl<'a> TokenRefresher<'a> {
    /// Creates a refresher using the default 14-day window.
    #[must_use]
    pub const fn new(client: &'a OAuthClient) -> Self {
        Self {
            client,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Overrides the freshness window.
    #[must_use]
    pub const fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    /// Runs one refresh cycle and returns the updated session.
    ///
    /// The store is rewritten before the network call:
    /// - a fresh record is written back unchanged (its date does not move);
    /// - a stale record is replaced by a placeholder. When `session` holds a
    ///   refresh token issued earlier in this run, the placeholder carries it
    ///   dated `today`; otherwise the stale record is kept as is.
    ///
    /// A refresh token rotated by the provider is persisted dated `today`.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` when no record exists (the caller must run the
    /// authorization flow), `Error::Parse` for an unreadable record,
    /// `Error::Io` when the store cannot be written, `Error::Authentication`
    /// when no usable access token comes back, `Error::Transport` on network
    /// failure.
    pub async fn refresh<S: TokenStore>(
        &self,
        store: &S,
        session: &Session,
        today: NaiveDate,
    ) -> Result<Session> {
        // Absent record surfaces as Error::NotFound.
        let record = store.load()?;

        let refresh_token = if store::is_fresh(&record, today, self.window_days) {
            debug!("Token record from {} is fresh", record.created_at);
            store.save(&record)?;
            record.refresh_token
        } else {
            let placeholder = match session.refresh_token.as_deref() {
                Some(issued) if !issued.trim().is_empty() => TokenRecord::new(issued, today),
                _ => record,
            };
            warn!(
                "Token record is stale, writing placeholder dated {}",
                placeholder.created_at
            );
            store.save(&placeholder)?;
            placeholder.refresh_token
        };

        if refresh_token.trim().is_empty() {
            return Err(Error::Authentication(
                "stored refresh token is empty".into(),
            ));
        }

        let credentials = &self.client.credentials;
        let params = [
            ("client_id", credentials.client_id()),
            ("scope", credentials.scope()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
            ("client_secret", credentials.client_secret()),
        ];

        let response = self
            .client
            .post_token_request("refresh_token", &params)
            .await?;
        let access_token = response.access_token()?;

        let rotated = response
            .refresh_token()
            .filter(|token| *token != refresh_token)
            .map(str::to_string);

        if let Some(rotated) = &rotated {
            info!("Provider rotated the refresh token");
            store.save(&TokenRecord::new(rotated.clone(), today))?;
        }

        info!("Access token refreshed");
        Ok(session.refreshed(access_token, rotated))
    }
}
