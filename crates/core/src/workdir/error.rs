//! Error types for the workdir module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a reconciliation step.
///
/// Per-file move problems are not errors; they are counted as skipped.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Directory could not be listed.
    #[error("Failed to list directory {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be removed while resetting a directory.
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReconcileError {
    /// Path the failure refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::List { path, .. } | Self::Remove { path, .. } => path,
        }
    }
}
