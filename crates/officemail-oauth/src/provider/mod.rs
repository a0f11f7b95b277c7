//! `OAuth2` provider endpoints.

use crate::error::{Error, Result};
use url::Url;

/// Host of the Microsoft identity platform.
const MICROSOFT_LOGIN_HOST: &str = "https://login.microsoftonline.com";

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Microsoft").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
        })
    }

    /// Microsoft identity platform (v2.0 endpoints) for a tenant.
    ///
    /// `tenant` is a directory id, a verified domain, or one of
    /// `common`, `organizations`, `consumers`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tenant is empty or produces an invalid URL.
    pub fn microsoft(tenant: &str) -> Result<Self> {
        if tenant.trim().is_empty() {
            return Err(Error::InvalidConfig("tenant id is empty".into()));
        }

        let base = format!("{MICROSOFT_LOGIN_HOST}/{tenant}/oauth2/v2.0/");
        Self::new(
            "Microsoft",
            format!("{base}authorize"),
            format!("{base}token"),
        )
    }

    /// Validates that the endpoints can carry HTTP requests.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        for (label, url) in [("auth_url", &self.auth_url), ("token_url", &self.token_url)] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::InvalidConfig(format!(
                    "{label} must be http(s), got {}",
                    url.scheme()
                )));
            }
        }
        Ok(())
    }
}
