//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use officemail_oauth::store::DEFAULT_FILE_NAME;
use officemail_oauth::{Credentials, DEFAULT_SCOPE};

/// Default redirect target registered for the application.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/";

/// Send HTML mail through Microsoft Graph with a persisted `OAuth2` refresh token
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Azure AD tenant (directory) identifier
    #[arg(long, env = "OFFICEMAIL_TENANT_ID", global = true)]
    pub tenant_id: Option<String>,

    /// Application (client) identifier
    #[arg(long, env = "OFFICEMAIL_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// Application client secret
    #[arg(long, env = "OFFICEMAIL_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    /// Requested scopes, space separated
    #[arg(long, env = "OFFICEMAIL_SCOPE", default_value = DEFAULT_SCOPE, global = true)]
    pub scope: String,

    /// Redirect URI registered for the application
    #[arg(long, env = "OFFICEMAIL_REDIRECT_URI", default_value = DEFAULT_REDIRECT_URI, global = true)]
    pub redirect_uri: String,

    /// Path of the persisted refresh token record
    #[arg(long, env = "OFFICEMAIL_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "OFFICEMAIL_HTTP_TIMEOUT", default_value = "30", global = true)]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the URL the user must visit to grant consent
    AuthorizeUrl,

    /// Exchange an authorization code for the initial refresh token
    Authorize {
        /// Authorization code taken from the redirect
        #[arg(long, conflicts_with = "listen", required_unless_present = "listen")]
        code: Option<String>,

        /// Wait for the redirect on the loopback address of the redirect URI
        #[arg(long)]
        listen: bool,
    },

    /// Send an HTML message
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// HTML body
        #[arg(long)]
        html: String,
    },

    /// Show the stored token record and whether it is still fresh
    Status,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: String,
    pub redirect_uri: String,
    pub token_file: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration with priority: CLI > ENV > `.env` > defaults
    pub fn load() -> Result<(Command, Self)> {
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let config = Self::from_args(&args)?;
        Ok((args.command, config))
    }

    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let token_file = match &args.token_file {
            Some(path) => path.clone(),
            None => default_token_file()?,
        };

        Ok(Self {
            tenant_id: args.tenant_id.clone(),
            client_id: args.client_id.clone(),
            client_secret: args.client_secret.clone(),
            scope: args.scope.clone(),
            redirect_uri: args.redirect_uri.clone(),
            token_file,
            http_timeout: Duration::from_secs(args.http_timeout),
        })
    }

    /// Application credentials; only commands that talk to the provider need them.
    pub fn credentials(&self) -> Result<Credentials> {
        let tenant_id = self
            .tenant_id
            .as_deref()
            .context("OFFICEMAIL_TENANT_ID is required (use --tenant-id or set the env var)")?;
        let client_id = self
            .client_id
            .as_deref()
            .context("OFFICEMAIL_CLIENT_ID is required (use --client-id or set the env var)")?;
        let client_secret = self.client_secret.as_deref().context(
            "OFFICEMAIL_CLIENT_SECRET is required (use --client-secret or set the env var)",
        )?;

        let credentials = Credentials::new(tenant_id, client_id, client_secret, &self.redirect_uri)
            .context("Invalid credentials")?
            .with_scope(&self.scope)
            .context("Invalid scope")?;
        Ok(credentials)
    }
}

fn default_token_file() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine the config directory")?;
    Ok(dir.join("officemail").join(DEFAULT_FILE_NAME))
}
