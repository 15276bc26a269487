//! File-backed storage of the single run configuration.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::types::{NewRunConfiguration, RunConfiguration};
use super::RunConfigError;

/// Reads and writes the run configuration artifact at a fixed path.
#[derive(Debug, Clone)]
pub struct RunConfigStore {
    path: PathBuf,
}

impl RunConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Replace whatever is on disk with a fresh configuration.
    pub async fn create(
        &self,
        request: NewRunConfiguration,
    ) -> Result<RunConfiguration, RunConfigError> {
        let config = request.into_configuration()?;

        match fs::remove_file(&self.path).await {
            Ok(()) => info!("Removed previous {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(e)),
        }

        self.write(&config).await?;
        info!("Created run configuration {}", self.path.display());
        Ok(config)
    }

    pub async fn load(&self) -> Result<RunConfiguration, RunConfigError> {
        let raw = fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                RunConfigError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                self.io_error(e)
            }
        })?;

        serde_json::from_str(&raw).map_err(|source| RunConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Change only the `require` instruction; every other field is kept.
    pub async fn update_require(
        &self,
        require: impl Into<String>,
    ) -> Result<RunConfiguration, RunConfigError> {
        let mut config = self.load().await?;
        config.require = require.into();
        self.write(&config).await?;
        info!("Updated require in {}", self.path.display());
        Ok(config)
    }

    /// Saved configurations (`config_*.json`) next to the artifact, by file name.
    ///
    /// Each entry is the file's JSON object with `filename` set to its file name.
    /// Files that cannot be read or are not JSON objects are skipped.
    pub async fn list_saved(&self) -> Result<Vec<Value>, RunConfigError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut entries = fs::read_dir(&dir).await.map_err(|source| RunConfigError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut saved = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| RunConfigError::Io {
            path: dir.clone(),
            source,
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !(name.starts_with("config_") && name.ends_with(".json")) {
                continue;
            }
            match read_object(&entry.path()).await {
                Ok(object) => saved.push((name, object)),
                Err(reason) => warn!("Skipping saved configuration {}: {}", name, reason),
            }
        }

        saved.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(saved
            .into_iter()
            .map(|(name, mut fields)| {
                fields.insert("filename".to_string(), Value::String(name));
                Value::Object(fields)
            })
            .collect())
    }

    async fn write(&self, config: &RunConfiguration) -> Result<(), RunConfigError> {
        let json = serde_json::to_string_pretty(config).map_err(RunConfigError::Serialize)?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> RunConfigError {
        RunConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

async fn read_object(path: &Path) -> Result<Map<String, Value>, String> {
    let raw = fs::read_to_string(path).await.map_err(|e| e.to_string())?;
    match serde_json::from_str(&raw).map_err(|e| e.to_string())? {
        Value::Object(fields) => Ok(fields),
        _ => Err("not a JSON object".to_string()),
    }
}
