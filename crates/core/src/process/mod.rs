//! Process module for running external stage programs.
//!
//! This module provides the `ProcessRunner` trait and a tokio-backed
//! implementation that streams a child's output line by line while it runs.
//!
//! # Example
//!
//! ```ignore
//! use docrunner_core::events::EventStream;
//! use docrunner_core::process::{CommandRunner, Invocation, ProcessRunner};
//!
//! let runner = CommandRunner::default();
//! let (events, mut rx) = EventStream::channel(64);
//!
//! let outcome = runner
//!     .run(&Invocation::new("inputJson.py", "python", ["inputJson.py", "config.json"]), &events)
//!     .await;
//! ```

mod error;
mod runner;
mod traits;
mod types;

pub use error::ProcessError;
pub use runner::{CommandRunner, RunnerConfig, RunningProcess};
pub use traits::ProcessRunner;
pub use types::{Invocation, OutputLine, OutputOrigin, ProcessOutcome};
