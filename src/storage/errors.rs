//! Storage errors.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure of a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the storage file failed.
    #[error("failed to access storage file {path}")]
    Io {
        /// File that was being accessed.
        path: PathBuf,

        /// Underlying I/O error.

        #[source]
        source: io::Error,
    },

    /// The storage file holds something other than a JSON object of strings.
    #[error("storage file {path} is not a JSON object of strings")]
    Corrupt {
        /// File that failed to parse.
        path: PathBuf,

        /// Parse error.

        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to encode storage value")]
    Encode(#[source] serde_json::Error),

    /// The backend cannot be reached at all.
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
}
