//! Run start (as a Server-Sent Events stream) and run status.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use docrunner_core::{EventStream, RunEvent, SupervisorError};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::handlers::api_error;
use super::middleware::AuthUser;
use crate::metrics::{EVENTS_STREAMED, RUNS_REJECTED_TOTAL};
use crate::state::AppState;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

#[derive(Debug, Serialize)]
pub struct RunStatusResponse {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

/// Start a run and stream its events until the terminal one.
///
/// The run lives in its own task: a client that disconnects only stops
/// receiving, the run itself carries on and releases the slot when done.
pub async fn run_tasks(State(state): State<Arc<AppState>>, AuthUser(user): AuthUser) -> Response {
    let (stream, rx) = EventStream::channel(state.event_buffer_size());

    let guard = match state.supervisor().begin_run(stream) {
        Ok(guard) => guard,
        Err(e @ SupervisorError::Busy { .. }) => {
            RUNS_REJECTED_TOTAL.inc();
            warn!(user = %user, "Run request rejected: {}", e);
            return api_error(StatusCode::CONFLICT, e.to_string()).into_response();
        }
    };

    info!(run_id = %guard.run_id(), user = %user, "Starting pipeline run");

    let orchestrator = Arc::clone(state.orchestrator());
    tokio::spawn(async move {
        let report = orchestrator.execute_run(guard.stream()).await;
        info!(
            run_id = %guard.run_id(),
            outcome = report.outcome.as_str(),
            documents = report.documents_analyzed,
            "Pipeline run finished in {:.1}s",
            report.duration.as_secs_f64()
        );
        drop(guard);
    });

    event_stream_response(rx)
}

/// `text/event-stream` body with one `data:` record per event.
fn event_stream_response(rx: mpsc::Receiver<RunEvent>) -> Response {
    let frames = futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        EVENTS_STREAMED
            .with_label_values(&[event.kind.as_str()])
            .inc();
        Some((Ok::<_, Infallible>(event.to_sse_frame()), rx))
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

pub async fn run_status(State(state): State<Arc<AppState>>) -> Json<RunStatusResponse> {
    let active = state.supervisor().current();

    Json(RunStatusResponse {
        running: active.is_some(),
        run_id: active.as_ref().map(|run| run.run_id.to_string()),
        started_at: active.map(|run| run.started_at),
    })
}
