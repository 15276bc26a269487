//! Run configuration endpoints.

use axum::{extract::State, http::StatusCode, Json};
use docrunner_core::{NewRunConfiguration, RunConfigError, RunConfiguration};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use super::handlers::{api_error, ApiError, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateConfigResponse {
    pub success: bool,
    pub message: String,
    pub file: String,
    pub config: RunConfiguration,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    #[serde(default)]
    pub require: Option<String>,
}

fn map_error(e: RunConfigError) -> ApiError {
    match e {
        RunConfigError::MissingField(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        RunConfigError::NotFound { .. } => {
            api_error(StatusCode::NOT_FOUND, "Configuration file not found")
        }
        _ => {
            error!("Run configuration error: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Replace the run configuration with a fresh one.
pub async fn create_config(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewRunConfiguration>,
) -> Result<Json<CreateConfigResponse>, ApiError> {
    let store = state.run_config();
    let config = store.create(request).await.map_err(map_error)?;

    Ok(Json(CreateConfigResponse {
        success: true,
        message: "Configuration created".to_string(),
        file: store.path().display().to_string(),
        config,
    }))
}

/// The run configuration as currently on disk, including stage-written fields.
pub async fn get_config_content(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunConfiguration>, ApiError> {
    state.run_config().load().await.map(Json).map_err(map_error)
}

/// Saved `config_*.json` files in the workspace.
pub async fn list_configs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    state.run_config().list_saved().await.map(Json).map_err(map_error)
}

/// Change the analysis instruction of the existing configuration.
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateConfigRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let require = request
        .require
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| map_error(RunConfigError::MissingField("require")))?;

    state
        .run_config()
        .update_require(require)
        .await
        .map_err(map_error)?;

    Ok(Json(SuccessResponse::new("Configuration updated successfully")))
}
