pub mod auth;
pub mod env;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod run_config;
pub mod runs;

pub use routes::create_router;
