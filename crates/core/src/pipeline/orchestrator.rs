//! Pipeline orchestrator implementation.
//!
//! One run is a single sequential pass:
//! - check the run configuration exists
//! - reset the staging and processing directories
//! - run every stage in order, migrating documents before the first per-document stage
//!
//! Any failure aborts the rest of the run and is reported as one `error` event.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::config::WorkspaceConfig;
use crate::events::{EventStream, RunEvent};
use crate::metrics;
use crate::process::{ProcessOutcome, ProcessRunner};
use crate::workdir::{DirectoryReconciler, ExtensionFilter, MigrationSummary};

use super::error::PipelineError;
use super::stage::{ArgumentRule, StageDescriptor};
use super::types::{PhaseTracker, RunOutcome, RunPhase, RunReport};

/// Mutable bookkeeping of a run in progress.
struct RunContext {
    tracker: PhaseTracker,
    migration: Option<MigrationSummary>,
    documents_analyzed: usize,
}

/// Drives the stage list over the workspace.
pub struct PipelineOrchestrator<R: ProcessRunner + ?Sized> {
    runner: Arc<R>,
    reconciler: DirectoryReconciler,
    stages: Arc<[StageDescriptor]>,
    workspace: WorkspaceConfig,
    filter: ExtensionFilter,
}

impl<R: ProcessRunner + ?Sized> PipelineOrchestrator<R> {
    pub fn new(runner: Arc<R>, stages: Arc<[StageDescriptor]>, workspace: WorkspaceConfig) -> Self {
        let filter = ExtensionFilter::new(&workspace.document_extension);
        Self {
            runner,
            reconciler: DirectoryReconciler::new(),
            stages,
            workspace,
            filter,
        }
    }

    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    pub fn workspace(&self) -> &WorkspaceConfig {
        &self.workspace
    }

    /// Execute one full run, pushing progress to `events`.
    ///
    /// The first event is always `start` and the last is exactly one of
    /// `end` or `error`. The stream is not closed here; its owner does that.
    pub async fn execute_run(&self, events: &EventStream) -> RunReport {
        let started = Instant::now();
        let mut run = RunContext {
            tracker: PhaseTracker::new(),
            migration: None,
            documents_analyzed: 0,
        };

        info!(runner = self.runner.name(), "Starting pipeline run");
        events.push(RunEvent::start("Starting all tasks")).await;

        let (outcome, error) = match self.drive(&mut run, events).await {
            Ok(()) => {
                run.tracker.advance(RunPhase::Completed);
                info!(
                    documents = run.documents_analyzed,
                    "Pipeline run completed"
                );
                events.push(RunEvent::end("All tasks completed")).await;
                (RunOutcome::Completed, None)
            }
            Err(err) => {
                run.tracker.advance(RunPhase::Aborted);
                error!("Pipeline run aborted: {}", err);

                let mut event = RunEvent::error(format!("Task failed: {}", err)).with_code(err.code());
                if let Some(script) = err.script() {
                    event = event.for_stage(script);
                }
                events.push(event).await;
                (RunOutcome::Aborted, Some(err))
            }
        };

        let duration = started.elapsed();
        metrics::RUNS_TOTAL
            .with_label_values(&[outcome.as_str()])
            .inc();
        metrics::RUN_DURATION
            .with_label_values(&[outcome.as_str()])
            .observe(duration.as_secs_f64());

        RunReport {
            outcome,
            phases: run.tracker.into_history(),
            migration: run.migration,
            documents_analyzed: run.documents_analyzed,
            error,
            duration,
        }
    }

    async fn drive(&self, run: &mut RunContext, events: &EventStream) -> Result<(), PipelineError> {
        let config_path = self.workspace.run_config_path();
        if !is_file(&config_path).await {
            return Err(PipelineError::ConfigMissing { path: config_path });
        }

        run.tracker.advance(RunPhase::Resetting);
        for dir in [self.workspace.staging_path(), self.workspace.processing_path()] {
            let removed = self.reconciler.reset(&dir).await?;
            events
                .push(RunEvent::info(format!(
                    "Cleared {} ({} entries removed)",
                    dir.display(),
                    removed
                )))
                .await;
        }

        let processing = self.workspace.processing_path();
        for stage in self.stages.iter() {
            match stage.args {
                ArgumentRule::RunConfig => {
                    run.tracker.advance(RunPhase::for_stage(stage.phase, None));
                    self.run_stage(stage, &config_path, None, events).await?;
                }
                ArgumentRule::PerDocument => {
                    if run.migration.is_none() {
                        run.tracker.advance(RunPhase::Migrating);
                        let summary = self
                            .reconciler
                            .migrate(&self.workspace.staging_path(), &processing, &self.filter)
                            .await?;
                        info!("Migrated documents to {}: {}", processing.display(), summary);
                        events
                            .push(RunEvent::info(format!("Migrated documents: {}", summary)))
                            .await;
                        run.migration = Some(summary);
                    }

                    let documents = self.reconciler.list_matching(&processing, &self.filter).await?;
                    if documents.is_empty() {
                        warn!("No .{} documents to process for {}", self.filter.extension(), stage.name);
                    }

                    for (index, document) in documents.iter().enumerate() {
                        run.tracker
                            .advance(RunPhase::for_stage(stage.phase, Some(index)));
                        let subject = document
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned());
                        self.run_stage(stage, document, subject.as_deref(), events)
                            .await?;
                        run.documents_analyzed += 1;
                    }
                }
            }
        }

        Ok(())
    }

    async fn run_stage(
        &self,
        stage: &StageDescriptor,
        argument: &Path,
        subject: Option<&str>,
        events: &EventStream,
    ) -> Result<(), PipelineError> {
        let title = match subject {
            Some(subject) => format!("{}: {}", stage.label, subject),
            None => stage.label.clone(),
        };

        events
            .push(RunEvent::info(format!("{} started", title)).for_stage(&stage.script))
            .await;

        // Stages run inside the workspace root, not the server's directory.
        let argument = std::path::absolute(argument).unwrap_or_else(|_| argument.to_path_buf());
        let invocation = stage.invocation(&argument);
        let started = Instant::now();
        let outcome = self.runner.run(&invocation, events).await;

        let result = match outcome {
            ProcessOutcome::Success => "success",
            ProcessOutcome::Failure { .. } => "failure",
            ProcessOutcome::LaunchFailure { .. } => "launch_failure",
        };
        metrics::STAGE_DURATION
            .with_label_values(&[stage.name.as_str(), result])
            .observe(started.elapsed().as_secs_f64());

        if let Some(err) = PipelineError::from_outcome(&stage.script, outcome) {
            return Err(err);
        }

        events
            .push(RunEvent::info(format!("{} completed", title)).for_stage(&stage.script))
            .await;
        Ok(())
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
