//! Testing utilities and mock implementations.
//!
//! This module provides a scriptable [`MockProcessRunner`] so the pipeline
//! can be exercised without launching real stage scripts.
//!
//! # Example
//!
//! ```rust,ignore
//! use docrunner_core::testing::{fixtures, MockProcessRunner};
//!
//! let workspace = fixtures::workspace(temp_dir.path());
//! fixtures::write_run_config(&workspace).await;
//! let runner = Arc::new(MockProcessRunner::new());
//! ```

mod mock_runner;

pub use mock_runner::{MockProcessRunner, RecordedInvocation};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::{StagesConfig, WorkspaceConfig};
    use crate::events::{EventKind, RunEvent};
    use crate::run_config::{NewRunConfiguration, RunConfigStore, RunConfiguration};

    /// Workspace rooted at `root` with the staging and processing directories created.
    pub fn workspace(root: &Path) -> WorkspaceConfig {
        let workspace = WorkspaceConfig::rooted_at(root);
        let _ = std::fs::create_dir_all(workspace.staging_path());
        let _ = std::fs::create_dir_all(workspace.processing_path());
        workspace
    }

    /// Stage scripts as configured by default, run with `interpreter`.
    pub fn stages_config(interpreter: &str) -> StagesConfig {
        StagesConfig {
            interpreter: interpreter.to_string(),
            ..StagesConfig::default()
        }
    }

    /// The run configuration used across tests.
    pub fn new_run_config() -> NewRunConfiguration {
        NewRunConfiguration {
            target_url: Some("https://example.com/docs".to_string()),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
            require: None,
        }
    }

    /// Write the run configuration artifact into `workspace`.
    pub async fn write_run_config(workspace: &WorkspaceConfig) -> RunConfiguration {
        RunConfigStore::new(workspace.run_config_path())
            .create(new_run_config())
            .await
            .expect("fixture run configuration is valid")
    }

    /// Kinds of `events`, in order.
    pub fn kinds(events: &[RunEvent]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    /// Number of events of `kind`.
    pub fn count(events: &[RunEvent], kind: EventKind) -> usize {
        events.iter().filter(|e| e.kind == kind).count()
    }
}
