use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CombinerError>;

/// Every failure is fatal for the run; the binary reports it and exits non-zero.
#[derive(Debug, Error)]
pub enum CombinerError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("not confirmed: {0}")]
    ConfirmationDeclined(String),
    #[error("{operation} failed for {path:?}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to read zip archive {path:?}: {source}")]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },
    #[error("archive {archive:?} contains an entry outside the staging directory: {entry}")]
    UnsafeArchiveEntry { archive: PathBuf, entry: String },
    #[error("{path:?} already exists: {reason}")]
    PreexistingState { path: PathBuf, reason: String },
}

pub trait IoResultExt<T> {
    fn at(self, operation: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, operation: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| CombinerError::Io {
            operation,
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T> IoResultExt<T> for std::result::Result<T, walkdir::Error> {
    fn at(self, operation: &'static str, path: &Path) -> Result<T> {
        self.map_err(io::Error::from).at(operation, path)
    }
}
