//! `officemail` - send HTML mail through Microsoft Graph
//!
//! Keeps a refresh token on disk and negotiates an access token before
//! every send.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod callback;
mod config;

use anyhow::{Context, Result, bail};
use chrono::Local;
use officemail_core::{MailClient, OutgoingMessage, send_mail};
use officemail_oauth::store::{DEFAULT_WINDOW_DAYS, is_fresh};
use officemail_oauth::{
    Error as OAuthError, FileTokenStore, OAuthClient, Provider, Session, Start,
    TokenLifecycleManager, TokenStore,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use config::{Command, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let (command, config) = Config::load()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "officemail=info,officemail_oauth=info,officemail_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match command {
        Command::AuthorizeUrl => {
            let manager = manager(&config)?;
            println!("{}", manager.authorization_url()?);
        }
        Command::Authorize { code, listen } => authorize(&config, code, listen).await?,
        Command::Send { to, subject, html } => {
            send(&config, OutgoingMessage::new(to, subject, html)).await?;
        }
        Command::Status => status(&config)?,
    }

    Ok(())
}

fn manager(config: &Config) -> Result<TokenLifecycleManager<FileTokenStore>> {
    let credentials = config.credentials()?;
    let provider = Provider::microsoft(credentials.tenant_id())?;
    let client = OAuthClient::with_timeout(credentials, provider, config.http_timeout)
        .context("Failed to build the OAuth client")?;
    Ok(TokenLifecycleManager::with_client(
        client,
        FileTokenStore::new(&config.token_file),
    ))
}

async fn authorize(config: &Config, code: Option<String>, listen: bool) -> Result<()> {
    let manager = manager(config)?;

    let code = if listen {
        let redirect = Url::parse(&config.redirect_uri).context("Invalid redirect URI")?;
        let listener = callback::bind(&redirect).await?;
        println!("Open this URL to grant access:\n{}", manager.authorization_url()?);
        callback::wait_for_code(listener, &redirect, callback::CALLBACK_TIMEOUT).await?
    } else {
        code.context("An authorization code is required")?
    };

    let session = Session::new().with_authorization_code(code);
    match manager
        .start(&session)
        .await
        .context("Authorization failed")?
    {
        Start::Ready(session) => {
            // A stale record survives the exchange; one refresh cycle replaces
            // it with the newly issued token.
            manager
                .access_token_for_send(&session)
                .await
                .context("Token refresh after authorization failed")?;
            info!("Token record at {}", config.token_file.display());
            println!("Authorized");
            Ok(())
        }
        Start::AuthorizationRequired(url) => bail!("Authorization still required: {url}"),
    }
}

async fn send(config: &Config, message: OutgoingMessage) -> Result<()> {
    let manager = manager(config)?;

    let session = match manager.start(&Session::new()).await.context("Token refresh failed")? {
        Start::Ready(session) => session,
        Start::AuthorizationRequired(url) => bail!(
            "No fresh refresh token; run `officemail authorize` after visiting:\n{url}"
        ),
    };

    let client = MailClient::with_timeout(config.http_timeout)?;
    send_mail(&manager, &client, &session, &message)
        .await
        .with_context(|| format!("Sending to {} failed", message.to))?;

    println!("Sent to {}", message.to);
    Ok(())
}

fn status(config: &Config) -> Result<()> {
    let store = FileTokenStore::new(&config.token_file);
    println!("Token file: {}", store.path().display());

    let record = match store.load() {
        Ok(record) => record,
        Err(OAuthError::NotFound(_)) => {
            println!("No token record; run `officemail authorize`");
            return Ok(());
        }
        Err(e) => return Err(e).context("Cannot read the token record"),
    };

    let today = Local::now().date_naive();
    let expires = record
        .created_at
        .checked_add_days(chrono::Days::new(u64::from(DEFAULT_WINDOW_DAYS)));

    println!("Created: {}", record.created_at);
    if let Some(expires) = expires {
        println!("Expires: {expires}");
    }
    if is_fresh(&record, today, DEFAULT_WINDOW_DAYS) {
        println!("Status: fresh");
    } else {
        println!("Status: stale; run `officemail authorize`");
    }
    Ok(())
}
