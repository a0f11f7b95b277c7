//! # officemail-oauth
//!
//! `OAuth2` token lifecycle for sending mail through Microsoft Graph.
//!
//! ## Features
//!
//! - **Authorization Code grant**: authorization URL and code exchange
//! - **Refresh grant**: access tokens minted from a persisted refresh token
//! - **Token store**: refresh token plus creation date, with a 14-day
//!   freshness window
//! - **Lifecycle manager**: decides between refresh and authorization
//!
//! ## Quick Start
//!
//! ```ignore
//! use officemail_oauth::{Credentials, FileTokenStore, Session, Start, TokenLifecycleManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new(
//!         "contoso.onmicrosoft.com",
//!         "your_client_id",
//!         "your_secret",
//!         "http://localhost:8080/",
//!     )?;
//!     let manager = TokenLifecycleManager::new(credentials, FileTokenStore::new("refresh.ini"))?;
//!
//!     let session = match manager.start(&Session::new()).await? {
//!         Start::Ready(session) => session,
//!         Start::AuthorizationRequired(url) => {
//!             println!("Visit: {url}");
//!             // Receive ?code=... on the redirect target, then:
//!             let session = Session::new().with_authorization_code("code_from_redirect");
//!             match manager.start(&session).await? {
//!                 Start::Ready(session) => session,
//!                 Start::AuthorizationRequired(_) => unreachable!(),
//!             }
//!         }
//!     };
//!
//!     // Every send refreshes first.
//!     let (_session, token) = manager.access_token_for_send(&session).await?;
//!     println!("Authorization: {}", token.secret());
//!     Ok(())
//! }
//! ```
//!
//! ## Persisted format
//!
//! ```text
//! refresh_token=<string>
//! date_created=<YYYY-MM-DD>
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod callback;
mod credentials;
mod error;
pub mod flow;
mod manager;
pub mod provider;
mod session;
pub mod store;
pub mod token;

pub use credentials::{Credentials, DEFAULT_SCOPE};
pub use error::{Error, Result};
pub use flow::{AuthorizationExchanger, OAuthClient, TokenRefresher};
pub use manager::{Clock, Start, TokenLifecycleManager};
pub use provider::Provider;
pub use session::Session;
pub use store::{FileTokenStore, MemoryTokenStore, TokenRecord, TokenStore};
pub use token::{AccessToken, TokenPair};
