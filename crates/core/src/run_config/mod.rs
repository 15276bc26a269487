//! The run configuration artifact: created before a run, read by every stage.

mod store;
mod types;

pub use store::RunConfigStore;
pub use types::{NewRunConfiguration, RunConfiguration, DEFAULT_REQUIRE};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Run configuration not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to parse run configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize run configuration: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
