//! Error types for the pipeline module.

use std::path::PathBuf;
use thiserror::Error;

use crate::process::ProcessOutcome;
use crate::workdir::ReconcileError;

/// Reasons a run aborts. Each is reported to the observer as one `error` event.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run configuration artifact does not exist.
    #[error("Run configuration not found: {}", .path.display())]
    ConfigMissing { path: PathBuf },

    /// A stage script could not be started.
    #[error("{message}")]
    StageLaunchFailure { script: String, message: String },

    /// A stage script exited unsuccessfully.
    #[error("{message}")]
    StageExitFailure {
        script: String,
        code: Option<i32>,
        message: String,
    },

    /// A working directory could not be read.
    #[error("Failed to list directory {}: {source}", .path.display())]
    DirectoryListError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be removed while resetting a working directory.
    #[error("Failed to reset {}: {source}", .path.display())]
    DirectoryResetError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Map a stage outcome to an error, `None` on success.
    pub fn from_outcome(script: &str, outcome: ProcessOutcome) -> Option<Self> {
        match outcome {
            ProcessOutcome::Success => None,
            ProcessOutcome::Failure { code, message } => Some(Self::StageExitFailure {
                script: script.to_string(),
                code,
                message,
            }),
            ProcessOutcome::LaunchFailure { message } => Some(Self::StageLaunchFailure {
                script: script.to_string(),
                message,
            }),
        }
    }

    /// Exit status of the failed stage, when it ran.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::StageExitFailure { code, .. } => *code,
            _ => None,
        }
    }

    /// Script the failure belongs to.
    pub fn script(&self) -> Option<&str> {
        match self {
            Self::StageLaunchFailure { script, .. } | Self::StageExitFailure { script, .. } => {
                Some(script)
            }
            _ => None,
        }
    }
}

impl From<ReconcileError> for PipelineError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::List { path, source } => Self::DirectoryListError { path, source },
            ReconcileError::Remove { path, source } => Self::DirectoryResetError { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_outcome() {
        assert!(PipelineError::from_outcome("a.py", ProcessOutcome::Success).is_none());

        let err = PipelineError::from_outcome(
            "a.py",
            ProcessOutcome::Failure {
                code: Some(2),
                message: "a.py exited with code 2".to_string(),
            },
        )
        .unwrap();
        assert_eq!(err.code(), Some(2));
        assert_eq!(err.script(), Some("a.py"));
        assert_eq!(err.to_string(), "a.py exited with code 2");

        let err = PipelineError::from_outcome(
            "b.py",
            ProcessOutcome::LaunchFailure {
                message: "b.py failed to start: not found".to_string(),
            },
        )
        .unwrap();
        assert!(matches!(err, PipelineError::StageLaunchFailure { .. }));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_config_missing_names_path() {
        let err = PipelineError::ConfigMissing {
            path: PathBuf::from("/work/config.json"),
        };
        assert_eq!(err.to_string(), "Run configuration not found: /work/config.json");
        assert_eq!(err.script(), None);
    }

    #[test]
    fn test_from_reconcile_error() {
        let err: PipelineError = ReconcileError::List {
            path: PathBuf::from("data"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into();
        assert!(matches!(err, PipelineError::DirectoryListError { .. }));

        let err: PipelineError = ReconcileError::Remove {
            path: PathBuf::from("data/x"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into();
        assert!(matches!(err, PipelineError::DirectoryResetError { .. }));
    }
}
