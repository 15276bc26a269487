use axum::{extract::State, http::StatusCode, Json};
use docrunner_core::EnvFileError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use super::handlers::{api_error, ApiError, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnvRequest {
    #[serde(default)]
    pub llm_provider: Option<String>,
}

/// Point the analysis stage at another LLM provider.
pub async fn update_env(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateEnvRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let provider = request
        .llm_provider
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing required field: llmProvider"))?;

    match state.env_file().set_llm_provider(&provider).await {
        Ok(()) => Ok(Json(SuccessResponse::new(
            "LLM provider updated successfully",
        ))),
        Err(EnvFileError::NotFound { .. }) => {
            Err(api_error(StatusCode::NOT_FOUND, ".env file not found"))
        }
        Err(e @ EnvFileError::InvalidValue { .. }) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => {
            error!("Failed to update env file: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
