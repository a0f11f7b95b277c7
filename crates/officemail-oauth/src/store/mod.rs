//! Persistent cache of the refresh token.
//!
//! A [`TokenRecord`] pairs the refresh token with the date it was issued or
//! last confirmed valid. That date drives the sole expiry policy, see
//! [`is_fresh`].

mod file;
mod format;

pub use file::{DEFAULT_FILE_NAME, FileTokenStore};

use std::sync::Mutex;

use chrono::{Days, NaiveDate};

use crate::error::{Error, Result};

/// Days a persisted refresh token is trusted after `created_at`.
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// Persisted refresh token and its creation date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Refresh token.
    pub refresh_token: String,
    /// Date the token was issued or last confirmed valid.
    pub created_at: NaiveDate,
}

impl TokenRecord {
    /// Creates a new record.
    #[must_use]
    pub fn new(refresh_token: impl Into<String>, created_at: NaiveDate) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            created_at,
        }
    }

    /// Checks freshness against the default 14-day window.
    #[must_use]
    pub fn is_fresh(&self, today: NaiveDate) -> bool {
        is_fresh(self, today, DEFAULT_WINDOW_DAYS)
    }
}

/// Returns true iff `today < record.created_at + window_days`.
///
/// The boundary day itself is stale. Access-token expiry is not considered.
#[must_use]
pub fn is_fresh(record: &TokenRecord, today: NaiveDate, window_days: u32) -> bool {
    record
        .created_at
        .checked_add_days(Days::new(u64::from(window_days)))
        .is_none_or(|expires_on| today < expires_on)
}

/// Storage backend for the token record.
///
/// `save` replaces the whole record; there is no merge.
pub trait TokenStore {
    /// Returns true iff a record is persisted.
    fn exists(&self) -> bool;

    /// Loads the record.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if no record is persisted, `Error::Parse` if it is
    /// unreadable.
    fn load(&self) -> Result<TokenRecord>;

    /// Replaces the persisted record.
    ///
    /// # Errors
    ///
    /// `Error::Io` if the backing store cannot be written.
    fn save(&self, record: &TokenRecord) -> Result<()>;
}

impl<S: TokenStore + ?Sized> TokenStore for &S {
    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn load(&self) -> Result<TokenRecord> {
        (**self).load()
    }

    fn save(&self, record: &TokenRecord) -> Result<()> {
        (**self).save(record)
    }
}

/// In-process token store.
///
/// Holds the record in the persisted text format so that it behaves like
/// the file store, including parse failures.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    contents: Mutex<Option<String>>,
    writes: Mutex<usize>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `record`.
    #[must_use]
    pub fn with_record(record: &TokenRecord) -> Self {
        Self::with_contents(format::serialize(record))
    }

    /// Creates a store holding raw persisted text.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            writes: Mutex::new(0),
        }
    }

    /// Returns the persisted text, if any.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns how many times `save` succeeded.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.lock().map(|guard| *guard).unwrap_or_default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn exists(&self) -> bool {
        self.contents().is_some()
    }

    fn load(&self) -> Result<TokenRecord> {
        let contents = self
            .contents()
            .ok_or_else(|| Error::NotFound("memory store".into()))?;
        format::parse(&contents)
    }

    fn save(&self, record: &TokenRecord) -> Result<()> {
        let mut contents = self
            .contents
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("memory store lock poisoned")))?;
        *contents = Some(format::serialize(record));

        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }
}
