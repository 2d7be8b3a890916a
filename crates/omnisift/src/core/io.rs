//! File I/O utilities.

use crate::{OmnisiftError, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::fs;

/// Size and timestamps of a file on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStat {
    pub size: u64,
    /// Not every platform or filesystem records a creation time.
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Read a file asynchronously.
///
/// # Errors
///
/// Returns `OmnisiftError::Io` for I/O errors (these always bubble up).
pub async fn read_file_async(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    fs::read(path.as_ref()).await.map_err(OmnisiftError::Io)
}

/// Stat a file asynchronously.
///
/// # Errors
///
/// Returns `OmnisiftError::Io` if the file cannot be stat'ed and
/// `OmnisiftError::Validation` if the path is not a regular file.
pub async fn stat_file_async(path: impl AsRef<Path>) -> Result<FileStat> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).await.map_err(OmnisiftError::Io)?;

    if !metadata.is_file() {
        return Err(OmnisiftError::validation(format!(
            "Path is not a regular file: {}",
            path.display()
        )));
    }

    Ok(FileStat {
        size: metadata.len(),
        created_at: metadata.created().ok().map(DateTime::<Utc>::from),
        modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
    })
}
