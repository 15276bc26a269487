//! Session login and logout.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use docrunner_core::{AuthError, LoginSession, SESSION_COOKIE};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::handlers::{api_error, SuccessResponse};
use super::middleware::auth_request;
use crate::metrics::AUTH_FAILURES_TOTAL;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

fn session_cookie(session: &LoginSession) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/",
        SESSION_COOKIE, session.token
    );
    if let Some(expires_at) = session.expires_at {
        let max_age = (expires_at - Utc::now()).num_seconds().max(0);
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    cookie
}

fn cleared_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}

/// Exchange the password for a session token, also set as a cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match state.authenticator().login(&request.password).await {
        Ok(session) => {
            info!("Session opened");
            let cookie = session_cookie(&session);
            ([(header::SET_COOKIE, cookie)], Json(session)).into_response()
        }
        Err(e @ AuthError::InvalidCredentials(_)) => {
            AUTH_FAILURES_TOTAL
                .with_label_values(&["invalid_credentials"])
                .inc();
            api_error(StatusCode::UNAUTHORIZED, e.to_string()).into_response()
        }
        Err(e @ AuthError::LockedOut { retry_after_secs }) => {
            AUTH_FAILURES_TOTAL.with_label_values(&["locked_out"]).inc();
            warn!("Login refused while locked out");
            let (status, body) = api_error(StatusCode::TOO_MANY_REQUESTS, e.to_string());
            (
                status,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                body,
            )
                .into_response()
        }
        Err(e) => {
            error!("Login failed: {}", e);
            AUTH_FAILURES_TOTAL
                .with_label_values(&["internal_error"])
                .inc();
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Drop the caller's session, if any, and clear the cookie.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let dropped = state
        .authenticator()
        .logout(&auth_request(&headers, None))
        .await;

    let message = if dropped {
        info!("Session closed");
        "Logged out"
    } else {
        "No active session"
    };

    (
        [(header::SET_COOKIE, cleared_cookie())],
        Json(SuccessResponse::new(message)),
    )
        .into_response()
}
