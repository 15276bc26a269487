//! Trait definitions for the process module.

use async_trait::async_trait;

use super::types::{Invocation, ProcessOutcome};
use crate::events::EventStream;

/// Runs one external unit of work to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Returns the name of this runner implementation.
    fn name(&self) -> &str;

    /// Runs the invocation, forwarding every output line to `events` as soon
    /// as it is read and pushing a `close` event when the process exits.
    ///
    /// Never retries. Launch errors come back as
    /// [`ProcessOutcome::LaunchFailure`] without a `close` event.
    async fn run(&self, invocation: &Invocation, events: &EventStream) -> ProcessOutcome;
}
