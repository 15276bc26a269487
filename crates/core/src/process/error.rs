//! Error types for the process module.

use thiserror::Error;

/// Errors raised while starting a stage process.
///
/// Once a process is running, its fate is reported as a
/// [`ProcessOutcome`](super::ProcessOutcome) instead.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Program could not be found on PATH or at the given location.
    #[error("program not found: {program}")]
    ProgramNotFound { program: String },

    /// Program exists but may not be executed.
    #[error("permission denied running {program}")]
    PermissionDenied { program: String },

    /// Any other spawn failure.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Working directory for the process is missing.
    #[error("working directory does not exist: {path}")]
    WorkingDirMissing { path: std::path::PathBuf },
}

impl ProcessError {
    /// Classify a spawn error by its I/O kind.
    pub fn from_spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        let program = program.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::ProgramNotFound { program },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { program },
            _ => Self::Spawn { program, source },
        }
    }
}
