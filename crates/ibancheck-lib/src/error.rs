use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the ibancheck library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Identifier failed the structural pre-check and cannot be decomposed.
    #[error("cannot parse as IBAN: {message}")]
    Unparseable { message: String },

    /// Registry data file could not be located at the given path.
    #[error("registry file not found at {path}")]
    RegistryFileNotFound { path: PathBuf },

    /// A registry record was too short or otherwise malformed.
    #[error("malformed registry record at {path}:{line}")]
    MalformedRecord { path: PathBuf, line: usize },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for CSV parsing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
