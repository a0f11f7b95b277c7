//! Authorization redirect callback.

use url::Url;

use crate::error::{Error, Result};

/// Extracts the authorization code from the redirect target the provider
/// sent the browser to.
///
/// # Errors
///
/// `Error::AccessDenied` when the user declined consent,
/// `Error::Authorization` for any other provider error or a missing code.
pub fn code_from_redirect(url: &Url) -> Result<String> {
    let mut code = None;
    let mut error = None;
    let mut description = String::new();

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = value.into_owned(),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(if error == "access_denied" {
            Error::AccessDenied(description)
        } else {
            Error::Authorization { error, description }
        });
    }

    code.filter(|code| !code.is_empty())
        .ok_or_else(|| Error::Authorization {
            error: "missing_code".into(),
            description: "callback did not carry an authorization code".into(),
        })
}
