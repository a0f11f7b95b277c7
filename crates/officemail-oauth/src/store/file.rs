//! File-backed token store.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{TokenRecord, TokenStore, format};
use crate::error::{Error, Result};

/// Default file name of the persisted record.
pub const DEFAULT_FILE_NAME: &str = "refresh.ini";

/// Token store backed by a single `key=value` file.
///
/// Writes go to a temporary file in the same directory that is then
/// renamed over the target, so readers see either the old or the new
/// record. There is no locking between processes.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store at `path`. No I/O happens until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the persisted record.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

impl TokenStore for FileTokenStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<TokenRecord> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(self.path.display().to_string()));
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(Error::Parse(format!("{}: {e}", self.path.display())));
            }
            Err(e) => return Err(e.into()),
        };

        let record = format::parse(&contents)?;
        debug!(
            "Loaded token record from {} (created {})",
            self.path.display(),
            record.created_at
        );
        Ok(record)
    }

    fn save(&self, record: &TokenRecord) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(dir)?;

        // Removed on drop unless persisted.
        let mut file = NamedTempFile::new_in(dir)?;
        restrict_permissions(file.as_file())?;
        file.write_all(format::serialize(record).as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        info!(
            "Saved token record to {} (created {})",
            self.path.display(),
            record.created_at
        );
        Ok(())
    }
}

/// Limits the record to its owner (0600).
#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
const fn restrict_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
