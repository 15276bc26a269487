use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::middleware::{auth_middleware, metrics_middleware};
use super::{auth, env, handlers, run_config, runs};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config().server.static_dir.clone();

    // Reachable without a session
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    let protected_routes = Router::new()
        .route("/settings", get(handlers::get_settings))
        // Run configuration
        .route("/config", post(run_config::create_config))
        .route("/configs", get(run_config::list_configs))
        .route("/config-content", get(run_config::get_config_content))
        .route("/update-config", post(run_config::update_config))
        .route("/update-env", post(env::update_env))
        // Runs
        .route("/run-tasks", post(runs::run_tasks))
        .route("/run-status", get(runs::run_status))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .route("/metrics", get(handlers::metrics))
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
