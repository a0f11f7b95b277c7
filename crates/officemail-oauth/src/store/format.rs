//! Text format of the persisted record.
//!
//! ```text
//! refresh_token=<string>
//! date_created=<YYYY-MM-DD>
//! ```

use chrono::NaiveDate;

use super::TokenRecord;
use crate::error::{Error, Result};

const REFRESH_TOKEN_KEY: &str = "refresh_token";
const DATE_CREATED_KEY: &str = "date_created";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Renders a record in the persisted format.
pub(super) fn serialize(record: &TokenRecord) -> String {
    format!(
        "{REFRESH_TOKEN_KEY}={}\n{DATE_CREATED_KEY}={}",
        record.refresh_token,
        record.created_at.format(DATE_FORMAT)
    )
}

/// Parses the persisted format.
///
/// Blank lines, `;`/`#` comments and unknown keys are skipped. Values may be
/// wrapped in double quotes.
pub(super) fn parse(contents: &str) -> Result<TokenRecord> {
    let mut refresh_token = None;
    let mut date_created = None;

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| {
            Error::Parse(format!("line {}: expected key=value", number + 1))
        })?;
        let value = unquote(value.trim());

        match key.trim() {
            REFRESH_TOKEN_KEY => refresh_token = Some(value.to_string()),
            DATE_CREATED_KEY => date_created = Some(value.to_string()),
            _ => {}
        }
    }

    let refresh_token =
        refresh_token.ok_or_else(|| Error::Parse(format!("missing {REFRESH_TOKEN_KEY}")))?;
    let date_created =
        date_created.ok_or_else(|| Error::Parse(format!("missing {DATE_CREATED_KEY}")))?;

    let created_at = NaiveDate::parse_from_str(&date_created, DATE_FORMAT)
        .map_err(|e| Error::Parse(format!("invalid {DATE_CREATED_KEY} {date_created:?}: {e}")))?;

    Ok(TokenRecord {
        refresh_token,
        created_at,
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize() {
        let record = TokenRecord::new("abc123", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(
            serialize(&record),
            "refresh_token=abc123\ndate_created=2024-01-01"
        );
    }

    #[test]
    fn test_parse_tolerates_ini_noise() {
        let contents = "; written by officemail\n\n  refresh_token = \"M.R3_BAY.abc\"  \r\n\
                        # comment\ndate_created=2024-03-09\nextra=ignored\n";
        let record = parse(contents).unwrap();
        assert_eq!(record.refresh_token, "M.R3_BAY.abc");
        assert_eq!(
            record.created_at,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
    }

    #[test]
    fn test_parse_keeps_equals_in_token() {
        let record = parse("refresh_token=abc==\ndate_created=2024-01-01").unwrap();
        assert_eq!(record.refresh_token, "abc==");
    }

    #[test]
    fn test_parse_empty_token_is_allowed() {
        let record = parse("refresh_token=\ndate_created=2024-01-01").unwrap();
        assert!(record.refresh_token.is_empty());
    }

    #[test]
    fn test_parse_missing_keys() {
        let err = parse("date_created=2024-01-01").unwrap_err();
        assert!(err.to_string().contains("refresh_token"));

        let err = parse("refresh_token=abc").unwrap_err();
        assert!(err.to_string().contains("date_created"));
    }

    #[test]
    fn test_parse_bad_date() {
        assert!(matches!(
            parse("refresh_token=abc\ndate_created=2024-13-01"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse("refresh_token=abc\ndate_created=01/01/2024"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_parse_line_without_separator() {
        assert!(matches!(parse("garbage"), Err(Error::Parse(_))));
    }
}
