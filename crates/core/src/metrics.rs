//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Runs (outcomes, duration)
//! - Stages (per-stage duration and result)
//! - Document migration between working directories

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Run Metrics
// =============================================================================

/// Runs finished, by outcome.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("docrunner_runs_total", "Total pipeline runs"),
        &["outcome"], // "completed", "aborted"
    )
    .unwrap()
});

/// Run duration in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("docrunner_run_duration_seconds", "Duration of pipeline runs")
            .buckets(vec![1.0, 10.0, 30.0, 60.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Stage Metrics
// =============================================================================

/// Stage process duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "docrunner_stage_duration_seconds",
            "Duration of a single stage process",
        )
        .buckets(vec![0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 1800.0]),
        &["stage", "result"], // result: "success", "failure", "launch_failure"
    )
    .unwrap()
});

// =============================================================================
// Migration Metrics
// =============================================================================

/// Documents handled by staging -> processing migration.
pub static DOCUMENTS_MIGRATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "docrunner_documents_migrated_total",
            "Documents moved or skipped during migration",
        ),
        &["result"], // "moved", "skipped"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RUNS_TOTAL.clone()),
        Box::new(RUN_DURATION.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(DOCUMENTS_MIGRATED.clone()),
    ]
}
