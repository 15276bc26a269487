mod none;
mod session;
mod traits;
mod types;

pub use none::*;
pub use session::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    use crate::config::AuthMethod;

    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::Session => {
            let password = config
                .password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    AuthError::ConfigurationError(
                        "password must be set when using Session auth method".to_string(),
                    )
                })?;
            Ok(Box::new(SessionAuthenticator::new(
                password,
                config.max_failed_attempts,
                config.lockout_secs,
                config.session_ttl_secs,
            )))
        }
    }
}
