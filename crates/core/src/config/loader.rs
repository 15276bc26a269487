use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variables with this prefix override file values,
/// `__` separating nested keys (`DOCRUNNER_SERVER__PORT`).
const ENV_PREFIX: &str = "DOCRUNNER_";

/// Load configuration from `path`, apply environment overrides and anchor
/// the workspace root to the current directory.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let mut config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.workspace.anchor()?;
    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[auth]
method = "none"

[server]
port = 9000

[stages]
interpreter = "python3"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.stages.interpreter, "python3");
    }

    #[test]
    fn test_load_config_from_str_missing_auth() {
        let toml = r#"
[server]
port = 8080
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[auth]
method = "none"

[server]
host = "127.0.0.1"
port = 3100

[workspace]
staging_dir = "incoming"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3100);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(
            config.workspace.staging_dir,
            std::path::PathBuf::from("incoming")
        );
    }

    #[test]
    fn test_load_config_anchors_relative_root() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[auth]
method = "none"

[workspace]
root = "work"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        let expected = std::env::current_dir().unwrap().join("work");
        assert!(config.workspace.root.is_absolute());
        assert_eq!(config.workspace.root, expected);
        assert_eq!(
            config.workspace.run_config_path(),
            expected.join("config.json")
        );
    }
}
