//! Application registration credentials.

use std::fmt;

use crate::error::{Error, Result};

/// Scope requested when none is configured.
///
/// `offline_access` is what makes the provider issue a refresh token.
pub const DEFAULT_SCOPE: &str = "Mail.Send offline_access SMTP.Send";

/// Immutable credentials of the registered application.
///
/// Every field is guaranteed non-empty once constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    scope: String,
    redirect_uri: String,
}

impl Credentials {
    /// Creates credentials with the default scope.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if any value is empty.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: DEFAULT_SCOPE.to_string(),
            redirect_uri: redirect_uri.into(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Replaces the requested scope.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the scope is empty.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Result<Self> {
        self.scope = scope.into();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("scope", &self.scope),
            ("redirect_uri", &self.redirect_uri),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Directory (tenant) identifier.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Application (client) identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Space-separated scope string.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Redirect target registered for the application.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("scope", &self.scope)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("tenant", "client", "secret", "http://localhost:8080/").unwrap()
    }

    #[test]
    fn test_default_scope() {
        let creds = credentials();
        assert_eq!(creds.scope(), DEFAULT_SCOPE);
        assert!(creds.scope().contains("offline_access"));
    }

    #[test]
    fn test_empty_values_rejected() {
        assert!(Credentials::new("", "client", "secret", "http://localhost/").is_err());
        assert!(Credentials::new("tenant", " ", "secret", "http://localhost/").is_err());
        assert!(Credentials::new("tenant", "client", "", "http://localhost/").is_err());
        assert!(Credentials::new("tenant", "client", "secret", "").is_err());
        assert!(credentials().with_scope("").is_err());
    }

    #[test]
    fn test_custom_scope() {
        let creds = credentials().with_scope("Mail.Send offline_access").unwrap();
        assert_eq!(creds.scope(), "Mail.Send offline_access");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("[redacted]"));
        assert!(!rendered.contains("\"secret\""));
    }
}
