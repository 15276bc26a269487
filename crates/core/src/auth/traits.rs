use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity, LoginSession};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Too many failed login attempts, retry in {retry_after_secs}s")]
    LockedOut { retry_after_secs: u64 },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request and return the identity
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Exchange a password for a session
    async fn login(&self, password: &str) -> Result<LoginSession, AuthError>;

    /// Drop the request's session. Returns whether one existed.
    async fn logout(&self, request: &AuthRequest) -> bool;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}
