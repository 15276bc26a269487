//! Working directory management: reset before a run, migrate between stages.

mod error;
mod reconciler;
mod types;

pub use error::ReconcileError;
pub use reconciler::DirectoryReconciler;
pub use types::{ExtensionFilter, MigrationSummary};
