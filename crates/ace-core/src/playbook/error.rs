//! Errors for playbook persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while persisting the playbook.
#[derive(Debug, Error)]
pub enum PlaybookError {
    /// Writing or renaming the backing file failed.
    #[error("failed to persist playbook to {}: {source}", .path.display())]
    Persist {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for playbook operations.
pub type Result<T> = std::result::Result<T, PlaybookError>;
