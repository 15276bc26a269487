use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub stages: StagesConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served as the fallback for non-API paths.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Login password (required for `session`).
    #[serde(default)]
    pub password: Option<String>,
    /// Consecutive failed logins before the lockout kicks in.
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: u64,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl AuthConfig {
    /// Auth config that accepts every request.
    pub fn none() -> Self {
        Self {
            method: AuthMethod::None,
            password: None,
            max_failed_attempts: default_max_failed_attempts(),
            lockout_secs: default_lockout_secs(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_lockout_secs() -> u64 {
    300
}

fn default_session_ttl_secs() -> u64 {
    86_400
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    Session,
}

/// Filesystem layout shared by the server and the external stages.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Working directory for stage processes; relative paths below resolve against it.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// The run configuration artifact read by every stage.
    #[serde(default = "default_run_config")]
    pub run_config: PathBuf,
    /// Where the acquisition stage drops downloaded documents.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Where the analysis stage picks documents up.
    #[serde(default = "default_processing_dir")]
    pub processing_dir: PathBuf,
    /// Document extension, matched case-insensitively.
    #[serde(default = "default_document_extension")]
    pub document_extension: String,
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
}

impl WorkspaceConfig {
    /// Workspace rooted at `root` with default file names.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Make `root` absolute against the current directory.
    ///
    /// Stages run with `root` as their working directory, so paths handed to
    /// them must not be relative to the server's own directory.
    pub fn anchor(&mut self) -> Result<(), super::ConfigError> {
        if self.root.is_absolute() {
            return Ok(());
        }
        self.root = std::path::absolute(&self.root).map_err(|source| {
            super::ConfigError::WorkspaceRoot {
                path: self.root.clone(),
                source,
            }
        })?;
        Ok(())
    }

    fn resolve(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn run_config_path(&self) -> PathBuf {
        self.resolve(&self.run_config)
    }

    pub fn staging_path(&self) -> PathBuf {
        self.resolve(&self.staging_dir)
    }

    pub fn processing_path(&self) -> PathBuf {
        self.resolve(&self.processing_dir)
    }

    pub fn env_file_path(&self) -> PathBuf {
        self.resolve(&self.env_file)
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            run_config: default_run_config(),
            staging_dir: default_staging_dir(),
            processing_dir: default_processing_dir(),
            document_extension: default_document_extension(),
            env_file: default_env_file(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_run_config() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_processing_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_document_extension() -> String {
    "pdf".to_string()
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

/// External scripts making up the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagesConfig {
    /// Program every script is handed to.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_preprocess")]
    pub preprocess: String,
    #[serde(default = "default_acquire")]
    pub acquire: String,
    #[serde(default = "default_analyze")]
    pub analyze: String,
    /// Extra environment for stage processes.
    #[serde(default = "default_stage_env")]
    pub env: BTreeMap<String, String>,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            preprocess: default_preprocess(),
            acquire: default_acquire(),
            analyze: default_analyze(),
            env: default_stage_env(),
        }
    }
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_preprocess() -> String {
    "inputJson.py".to_string()
}

fn default_acquire() -> String {
    "getPdfFiles.py".to_string()
}

fn default_analyze() -> String {
    "callLLM.py".to_string()
}

fn default_stage_env() -> BTreeMap<String, String> {
    // Python block-buffers piped stdout otherwise, which defeats live streaming.
    BTreeMap::from([("PYTHONUNBUFFERED".to_string(), "1".to_string())])
}

/// Event stream configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    /// Capacity of the channel between the run task and the SSE response.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_buffer_size() -> usize {
    256
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub workspace: WorkspaceConfig,
    pub stages: StagesConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub password_configured: bool,
    pub max_failed_attempts: u32,
    pub lockout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::Session => "session".to_string(),
                },
                password_configured: config
                    .auth
                    .password
                    .as_ref()
                    .is_some_and(|p| !p.is_empty()),
                max_failed_attempts: config.auth.max_failed_attempts,
                lockout_secs: config.auth.lockout_secs,
            },
            server: config.server.clone(),
            workspace: config.workspace.clone(),
            stages: config.stages.clone(),
            events: config.events.clone(),
        }
    }
}
