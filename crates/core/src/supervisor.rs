//! Single-run slot.
//!
//! At most one run is active at a time. Claiming the slot yields a
//! [`RunGuard`] that owns the run's event stream; dropping the guard closes
//! the stream and frees the slot, whichever way the run ended.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::EventStream;

/// The run currently holding the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("A run is already in progress (started {})", .active.started_at.to_rfc3339())]
    Busy { active: ActiveRun },
}

type Slot = Arc<Mutex<Option<ActiveRun>>>;

/// Guards the single run slot. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct RunSupervisor {
    slot: Slot,
}

impl RunSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for a new run bound to `stream`.
    ///
    /// Fails with [`SupervisorError::Busy`] while another guard is alive; the
    /// stream is left untouched in that case.
    pub fn begin_run(&self, stream: EventStream) -> Result<RunGuard, SupervisorError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = slot.as_ref() {
            return Err(SupervisorError::Busy {
                active: active.clone(),
            });
        }

        let run = ActiveRun {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        };
        *slot = Some(run.clone());
        info!(run_id = %run.run_id, "Run slot claimed");

        Ok(RunGuard {
            slot: Arc::clone(&self.slot),
            run,
            stream,
        })
    }

    pub fn current(&self) -> Option<ActiveRun> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_busy(&self) -> bool {
        self.current().is_some()
    }
}

/// Ownership of the run slot and of the run's event stream.
#[derive(Debug)]
pub struct RunGuard {
    slot: Slot,
    run: ActiveRun,
    stream: EventStream,
}

impl RunGuard {
    pub fn stream(&self) -> &EventStream {
        &self.stream
    }

    pub fn run(&self) -> &ActiveRun {
        &self.run
    }

    pub fn run_id(&self) -> Uuid {
        self.run.run_id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        // The slot is free by the time the observer sees end of stream.
        {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(active) if active.run_id == self.run.run_id => {
                    *slot = None;
                    info!(run_id = %self.run.run_id, "Run slot released");
                }
                _ => warn!(run_id = %self.run.run_id, "Run slot held by another run on release"),
            }
        }

        self.stream.close();
    }
}
