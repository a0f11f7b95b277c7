//! Token lifecycle orchestration.

use chrono::{Local, NaiveDate};
use tracing::{debug, info};
use url::Url;

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::flow::{AuthorizationExchanger, OAuthClient, TokenRefresher};
use crate::session::Session;
use crate::store::{DEFAULT_WINDOW_DAYS, TokenStore, is_fresh};
use crate::token::AccessToken;

/// Source of the current date for expiry decisions.
pub type Clock = fn() -> NaiveDate;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Outcome of [`TokenLifecycleManager::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Start {
    /// A usable access token is in the session.
    Ready(Session),
    /// The user must visit this URL; the callback's code goes into the next
    /// `start` via [`Session::with_authorization_code`].
    AuthorizationRequired(Url),
}

/// Client-facing token lifecycle manager.
///
/// Construction is pure configuration. Network exchanges happen only in
/// [`start`](Self::start) and [`access_token_for_send`](Self::access_token_for_send).
#[derive(Debug)]
pub struct TokenLifecycleManager<S> {
    client: OAuthClient,
    store: S,
    window_days: u32,
    clock: Clock,
}

impl<S: TokenStore> TokenLifecycleManager<S> {
    /// Creates a manager for the Microsoft tenant named in `credentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant produces an invalid endpoint URL or the
    /// HTTP client cannot be built.
    pub fn new(credentials: Credentials, store: S) -> Result<Self> {
        Ok(Self::with_client(OAuthClient::microsoft(credentials)?, store))
    }

    /// Creates a manager around a preconfigured client.
    #[must_use]
    pub const fn with_client(client: OAuthClient, store: S) -> Self {
        Self {
            client,
            store,
            window_days: DEFAULT_WINDOW_DAYS,
            clock: local_today,
        }
    }

    /// Overrides the date source.
    #[must_use]
    pub const fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Overrides the freshness window.
    #[must_use]
    pub const fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    /// The backing token store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The underlying `OAuth2` client.
    #[must_use]
    pub const fn client(&self) -> &OAuthClient {
        &self.client
    }

    /// Builds the URL the user must visit to grant consent.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be constructed.
    pub fn authorization_url(&self) -> Result<Url> {
        AuthorizationExchanger::new(&self.client).authorization_url()
    }

    /// Returns true if the store holds a record inside the freshness window.
    ///
    /// # Errors
    ///
    /// `Error::Parse` if a record exists but cannot be read back.
    pub fn has_fresh_record(&self) -> Result<bool> {
        if !self.store.exists() {
            return Ok(false);
        }
        let record = self.store.load()?;
        Ok(is_fresh(&record, (self.clock)(), self.window_days))
    }

    /// Negotiates a usable session.
    ///
    /// - fresh record in the store: refresh;
    /// - otherwise, with an authorization code in `session`: exchange it;
    /// - otherwise: hand back the authorization URL.
    ///
    /// # Errors
    ///
    /// `Error::Parse` for an unreadable record, before any exchange. Refresh
    /// and exchange failures propagate.
    pub async fn start(&self, session: &Session) -> Result<Start> {
        if self.has_fresh_record()? {
            debug!("Fresh token record found, refreshing");
            return self.refresh(session).await.map(Start::Ready);
        }

        match session.authorization_code.as_deref() {
            Some(code) => {
                debug!("No fresh token record, exchanging authorization code");
                let pair = AuthorizationExchanger::new(&self.client)
                    .exchange(code, &self.store, (self.clock)())
                    .await?;
                Ok(Start::Ready(session.exchanged(pair)))
            }
            None => {
                info!("Authorization required");
                self.authorization_url().map(Start::AuthorizationRequired)
            }
        }
    }

    /// Returns an access token for one send.
    ///
    /// Always runs a full refresh cycle; an access token already in
    /// `session` is not reused.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if nothing was ever authorized,
    /// `Error::Authentication` if no usable access token came back, plus
    /// store and transport errors.
    pub async fn access_token_for_send(&self, session: &Session) -> Result<(Session, AccessToken)> {
        let session = self.refresh(session).await?;
        let token = session
            .access_token
            .clone()
            .ok_or_else(|| Error::Authentication("refresh produced no access token".into()))?;
        Ok((session, token))
    }

    async fn refresh(&self, session: &Session) -> Result<Session> {
        TokenRefresher::new(&self.client)
            .with_window_days(self.window_days)
            .refresh(&self.store, session, (self.clock)())
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use crate::store::{MemoryTokenStore, TokenRecord};

    fn jan_10() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn manager(base: &str, store: MemoryTokenStore) -> TokenLifecycleManager<MemoryTokenStore> {
        let credentials =
            Credentials::new("tenant", "test_client", "s3cret", "http://localhost:8080/").unwrap();
        let provider = Provider::new(
            "Stub",
            format!("{base}/authorize"),
            format!("{base}/token"),
        )
        .unwrap();
        TokenLifecycleManager::with_client(OAuthClient::new(credentials, provider).unwrap(), store)
            .with_clock(jan_10)
    }

    #[test]
    fn test_new_is_pure() {
        let credentials =
            Credentials::new("tenant", "client", "secret", "http://localhost:8080/").unwrap();
        let manager = TokenLifecycleManager::new(credentials, MemoryTokenStore::new()).unwrap();

        assert_eq!(manager.store().writes(), 0);
        assert!(!manager.has_fresh_record().unwrap());
    }

    #[test]
    fn test_has_fresh_record() {
        let fresh = MemoryTokenStore::with_record(&TokenRecord::new(
            "abc",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ));
        assert!(manager("http://127.0.0.1:9", fresh).has_fresh_record().unwrap());

        let stale = MemoryTokenStore::with_record(&TokenRecord::new(
            "abc",
            NaiveDate::from_ymd_opt(2023, 12, 20).unwrap(),
        ));
        assert!(!manager("http://127.0.0.1:9", stale).has_fresh_record().unwrap());

        let garbage = MemoryTokenStore::with_contents("garbage");
        assert!(matches!(
            manager("http://127.0.0.1:9", garbage).has_fresh_record(),
            Err(Error::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_start_with_unreadable_record_keeps_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .expect(0)
            .create_async()
            .await;

        let manager = manager(&server.url(), MemoryTokenStore::with_contents("garbage"));
        let session = Session::new().with_authorization_code("the-code");

        let err = manager.start(&session).await.unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(manager.store().contents().as_deref(), Some("garbage"));
        assert_eq!(manager.store().writes(), 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_start_without_record_or_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .expect(0)
            .create_async()
            .await;

        let manager = manager(&server.url(), MemoryTokenStore::new());
        let Start::AuthorizationRequired(url) = manager.start(&Session::new()).await.unwrap()
        else {
            panic!("expected authorization to be required");
        };

        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["client_id"], "test_client");
        assert_eq!(query["redirect_uri"], "http://localhost:8080/");
        assert_eq!(query["scope"], "Mail.Send offline_access SMTP.Send");
        assert_eq!(manager.store().writes(), 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_start_with_code_exchanges() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::UrlEncoded(
                "grant_type".into(),
                "authorization_code".into(),
            ))
            .with_status(200)
            .with_body(r#"{"access_token":"at-1","refresh_token":"rt-1"}"#)
            .create_async()
            .await;

        let manager = manager(&server.url(), MemoryTokenStore::new());
        let session = Session::new().with_authorization_code("the-code");

        let Start::Ready(ready) = manager.start(&session).await.unwrap() else {
            panic!("expected a ready session");
        };

        assert_eq!(ready.access_token.unwrap().secret(), "at-1");
        assert_eq!(ready.refresh_token.as_deref(), Some("rt-1"));
        assert!(ready.authorization_code.is_none());
        assert_eq!(
            manager.store().load().unwrap(),
            TokenRecord::new("rt-1", jan_10())
        );
    }

    #[tokio::test]
    async fn test_start_with_fresh_record_refreshes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::UrlEncoded(
                "grant_type".into(),
                "refresh_token".into(),
            ))
            .with_status(200)
            .with_body(r#"{"access_token":"tok1"}"#)
            .expect(1)
            .create_async()
            .await;

        let store = MemoryTokenStore::with_record(&TokenRecord::new(
            "abc123",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ));
        let manager = manager(&server.url(), store);

        // A code in the session is ignored while the record is fresh.
        let session = Session::new().with_authorization_code("unused");
        let Start::Ready(ready) = manager.start(&session).await.unwrap() else {
            panic!("expected a ready session");
        };

        assert_eq!(ready.access_token.unwrap().secret(), "tok1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_access_token_for_send_always_refreshes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"fresh"}"#)
            .expect(2)
            .create_async()
            .await;

        let store = MemoryTokenStore::with_record(&TokenRecord::new(
            "abc123",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ));
        let manager = manager(&server.url(), store);
        let session = Session {
            access_token: Some(AccessToken::new("cached").unwrap()),
            ..Session::default()
        };

        let (session, token) = manager.access_token_for_send(&session).await.unwrap();
        assert_eq!(token.secret(), "fresh");

        let (_, token) = manager.access_token_for_send(&session).await.unwrap();
        assert_eq!(token.secret(), "fresh");
        mock.assert_async().await;
    }
}
