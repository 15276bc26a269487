//! Multi-stage document pipeline.
//!
//! Stages are data ([`StageDescriptor`]); the orchestrator is a single loop
//! over them. Stages and per-document invocations run strictly one after the
//! other, and the first failure aborts the run.

mod error;
mod orchestrator;
mod stage;
mod types;

pub use error::PipelineError;
pub use orchestrator::PipelineOrchestrator;
pub use stage::{stages_from_config, ArgumentRule, StageDescriptor, StagePhase};
pub use types::{PhaseTracker, RunOutcome, RunPhase, RunReport};
