//! Run state machine and run report.

use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use super::error::PipelineError;
use super::stage::StagePhase;
use crate::workdir::MigrationSummary;

/// Where a run currently is. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Resetting,
    Preprocessing,
    Acquiring,
    Migrating,
    /// Analyzing the `index`-th document (zero based).
    Analyzing { index: usize },
    Completed,
    Aborted,
}

impl RunPhase {
    fn order(&self) -> (u8, usize) {
        match self {
            Self::Idle => (0, 0),
            Self::Resetting => (1, 0),
            Self::Preprocessing => (2, 0),
            Self::Acquiring => (3, 0),
            Self::Migrating => (4, 0),
            Self::Analyzing { index } => (5, *index),
            Self::Completed | Self::Aborted => (6, 0),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: RunPhase) -> bool {
        !self.is_terminal() && next.order() > self.order()
    }

    /// Phase entered when a stage of `phase` runs on `document`.
    pub fn for_stage(phase: StagePhase, document: Option<usize>) -> Self {
        match phase {
            StagePhase::Preprocessing => Self::Preprocessing,
            StagePhase::Acquiring => Self::Acquiring,
            StagePhase::Analyzing => Self::Analyzing {
                index: document.unwrap_or(0),
            },
        }
    }
}

/// Records the phases a run went through.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: RunPhase,
    history: Vec<RunPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: RunPhase::Idle,
            history: vec![RunPhase::Idle],
        }
    }

    pub fn current(&self) -> RunPhase {
        self.current
    }

    /// Move to `next`. Re-entering the current phase is a no-op; going back is refused.
    pub fn advance(&mut self, next: RunPhase) -> bool {
        if next == self.current {
            return true;
        }
        if !self.current.can_advance_to(next) {
            warn!("Refusing phase transition {:?} -> {:?}", self.current, next);
            return false;
        }
        self.current = next;
        self.history.push(next);
        true
    }

    pub fn into_history(self) -> Vec<RunPhase> {
        self.history
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Aborted,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

/// What happened during one `execute_run`.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Every phase entered, in order, starting with `Idle`.
    pub phases: Vec<RunPhase>,
    pub migration: Option<MigrationSummary>,
    pub documents_analyzed: usize,
    /// Why the run aborted.
    pub error: Option<PipelineError>,
    pub duration: Duration,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}
