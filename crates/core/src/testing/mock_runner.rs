//! Mock process runner for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use crate::events::{EventStream, RunEvent};
use crate::process::{Invocation, OutputLine, ProcessOutcome, ProcessRunner};

/// A recorded invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    /// The invocation that was requested.
    pub invocation: Invocation,
    /// What the mock answered.
    pub outcome: ProcessOutcome,
}

impl RecordedInvocation {
    /// Last argument (the run configuration or document path).
    pub fn argument(&self) -> Option<&str> {
        self.invocation.args.last().map(String::as_str)
    }
}

/// Mock implementation of the ProcessRunner trait.
///
/// Provides controllable behavior for testing:
/// - Record every invocation
/// - Script outcomes per stage script, or per script and argument
/// - Emit output lines before the `close` event
/// - Create files when a script runs (e.g. simulated downloads)
/// - Hold a script until the test releases it
///
/// # Example
///
/// ```rust,ignore
/// use docrunner_core::testing::MockProcessRunner;
///
/// let runner = MockProcessRunner::new();
/// runner.set_output("getPdfFiles.py", vec![OutputLine::stdout("downloading")]).await;
/// runner.creates_files("getPdfFiles.py", vec![staging.join("a.pdf")]).await;
/// runner.set_outcome("callLLM.py", ProcessOutcome::Failure { code: Some(1), message }).await;
///
/// let report = orchestrator.execute_run(&events).await;
/// assert_eq!(runner.invocation_count().await, 3);
/// ```
#[derive(Debug, Default)]
pub struct MockProcessRunner {
    invocations: Arc<RwLock<Vec<RecordedInvocation>>>,
    /// Outcomes keyed by script.
    outcomes: Arc<RwLock<HashMap<String, ProcessOutcome>>>,
    /// Outcomes keyed by (script, argument); take precedence.
    argument_outcomes: Arc<RwLock<HashMap<(String, String), ProcessOutcome>>>,
    outputs: Arc<RwLock<HashMap<String, Vec<OutputLine>>>>,
    files: Arc<RwLock<HashMap<String, Vec<PathBuf>>>>,
    gates: Arc<RwLock<HashMap<String, Arc<Notify>>>>,
}

impl MockProcessRunner {
    /// Create a new mock runner where every invocation succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded invocations.
    pub async fn recorded_invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.read().await.clone()
    }

    /// Get the number of invocations performed.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Scripts invoked, in order.
    pub async fn invoked_scripts(&self) -> Vec<String> {
        self.invocations
            .read()
            .await
            .iter()
            .map(|r| r.invocation.stage.clone())
            .collect()
    }

    /// Answer every invocation of `script` with `outcome`.
    pub async fn set_outcome(&self, script: &str, outcome: ProcessOutcome) {
        self.outcomes
            .write()
            .await
            .insert(script.to_string(), outcome);
    }

    /// Answer invocations of `script` whose last argument is `argument` with `outcome`.
    pub async fn set_outcome_for(&self, script: &str, argument: &str, outcome: ProcessOutcome) {
        self.argument_outcomes
            .write()
            .await
            .insert((script.to_string(), argument.to_string()), outcome);
    }

    /// Lines emitted by every invocation of `script`.
    pub async fn set_output(&self, script: &str, lines: Vec<OutputLine>) {
        self.outputs.write().await.insert(script.to_string(), lines);
    }

    /// Files written (empty) when `script` runs.
    pub async fn creates_files(&self, script: &str, paths: Vec<PathBuf>) {
        self.files.write().await.insert(script.to_string(), paths);
    }

    /// Make every invocation of `script` wait for a permit on the returned gate.
    ///
    /// Each `notify_one` releases one invocation; a permit given before the
    /// script starts is kept.
    pub async fn gate(&self, script: &str) -> Arc<Notify> {
        Arc::clone(
            self.gates
                .write()
                .await
                .entry(script.to_string())
                .or_default(),
        )
    }

    async fn outcome_for(&self, invocation: &Invocation) -> ProcessOutcome {
        if let Some(argument) = invocation.args.last() {
            let key = (invocation.stage.clone(), argument.clone());
            if let Some(outcome) = self.argument_outcomes.read().await.get(&key) {
                return outcome.clone();
            }
        }
        self.outcomes
            .read()
            .await
            .get(&invocation.stage)
            .cloned()
            .unwrap_or(ProcessOutcome::Success)
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, invocation: &Invocation, events: &EventStream) -> ProcessOutcome {
        let gate = self.gates.read().await.get(&invocation.stage).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let outcome = self.outcome_for(invocation).await;

        self.invocations.write().await.push(RecordedInvocation {
            invocation: invocation.clone(),
            outcome: outcome.clone(),
        });

        if matches!(outcome, ProcessOutcome::LaunchFailure { .. }) {
            return outcome;
        }

        let files = self
            .files
            .read()
            .await
            .get(&invocation.stage)
            .cloned()
            .unwrap_or_default();
        for path in files {
            if let Some(parent) = path.parent() {
                let _ = tokio::fs::create_dir_all(parent).await;
            }
            let _ = tokio::fs::write(&path, b"").await;
        }

        let lines = self
            .outputs
            .read()
            .await
            .get(&invocation.stage)
            .cloned()
            .unwrap_or_default();
        for line in lines {
            events.push(line.into_event()).await;
        }

        events
            .push(RunEvent::close(&invocation.stage, outcome.code()))
            .await;
        outcome
    }
}
