use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde)
/// - Session auth has a non-empty password
/// - Server port is not 0
/// - Staging and processing directories differ
/// - Document extension and event buffer are non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::Session
        && config.auth.password.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::ValidationError(
            "auth.password must be set when using session auth".to_string(),
        ));
    }

    if config.auth.max_failed_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "auth.max_failed_attempts cannot be 0".to_string(),
        ));
    }

    let workspace = &config.workspace;
    if workspace.staging_path() == workspace.processing_path() {
        return Err(ConfigError::ValidationError(
            "workspace.staging_dir and workspace.processing_dir must differ".to_string(),
        ));
    }

    if workspace.document_extension.trim_start_matches('.').is_empty() {
        return Err(ConfigError::ValidationError(
            "workspace.document_extension cannot be empty".to_string(),
        ));
    }

    if config.events.buffer_size == 0 {
        return Err(ConfigError::ValidationError(
            "events.buffer_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, EventsConfig, ServerConfig, StagesConfig, WorkspaceConfig};
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config {
            auth: AuthConfig::none(),
            server: ServerConfig::default(),
            workspace: WorkspaceConfig::default(),
            stages: StagesConfig::default(),
            events: EventsConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_session_without_password_fails() {
        let mut config = valid_config();
        config.auth.method = AuthMethod::Session;
        assert!(validate_config(&config).is_err());

        config.auth.password = Some(String::new());
        assert!(validate_config(&config).is_err());

        config.auth.password = Some("pw".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_same_directories_fails() {
        let mut config = valid_config();
        config.workspace.processing_dir = PathBuf::from("downloads");
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_validate_empty_extension_fails() {
        let mut config = valid_config();
        config.workspace.document_extension = ".".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_buffer_fails() {
        let mut config = valid_config();
        config.events.buffer_size = 0;
        assert!(validate_config(&config).is_err());
    }
}
