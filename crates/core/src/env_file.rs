//! Patching of the `.env` file read by the stage scripts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use regex_lite::{NoExpand, Regex};
use thiserror::Error;
use tokio::fs;
use tracing::info;

/// Variable selecting the LLM backend of the analysis stage.
pub const LLM_PROVIDER: &str = "LLM_PROVIDER";

#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error(".env file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid value for {key}: must be a single non-empty line")]
    InvalidValue { key: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A dotenv file edited in place. The file must already exist.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current value of `key`, if set.
    pub async fn get(&self, key: &str) -> Result<Option<String>, EnvFileError> {
        let content = self.read().await?;
        let prefix = format!("{}=", key);
        Ok(content
            .lines()
            .find_map(|line| line.strip_prefix(&prefix))
            .map(|v| v.trim().to_string()))
    }

    /// Set `key=value`, replacing an existing assignment or appending one.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), EnvFileError> {
        let value = value.trim();
        if value.is_empty() || value.contains(['\n', '\r']) {
            return Err(EnvFileError::InvalidValue {
                key: key.to_string(),
            });
        }

        let content = self.read().await?;
        let updated = assign(&content, key, value);
        fs::write(&self.path, updated)
            .await
            .map_err(|source| EnvFileError::Io {
                path: self.path.clone(),
                source,
            })?;

        info!("Set {} in {}", key, self.path.display());
        Ok(())
    }

    pub async fn set_llm_provider(&self, provider: &str) -> Result<(), EnvFileError> {
        self.set(LLM_PROVIDER, provider).await
    }

    async fn read(&self) -> Result<String, EnvFileError> {
        fs::read_to_string(&self.path).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                EnvFileError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                EnvFileError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })
    }
}

fn assign(content: &str, key: &str, value: &str) -> String {
    let line = format!("{}={}", key, value);
    let pattern = format!(r"(?m)^{}=.*$", regex_lite::escape(key));
    // Built from an escaped key, so the pattern is always valid.
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return format!("{}\n{}", content, line),
    };

    if re.is_match(content) {
        re.replace(content, NoExpand(&line)).into_owned()
    } else if content.is_empty() || content.ends_with('\n') {
        format!("{}{}\n", content, line)
    } else {
        format!("{}\n{}\n", content, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_assign_replaces_existing_line() {
        let content = "API_KEY=abc\nLLM_PROVIDER=openai\nMODEL=x\n";
        assert_eq!(
            assign(content, LLM_PROVIDER, "qwen"),
            "API_KEY=abc\nLLM_PROVIDER=qwen\nMODEL=x\n"
        );
    }

    #[test]
    fn test_assign_appends_missing_line() {
        assert_eq!(
            assign("API_KEY=abc", LLM_PROVIDER, "qwen"),
            "API_KEY=abc\nLLM_PROVIDER=qwen\n"
        );
        assert_eq!(
            assign("API_KEY=abc\n", LLM_PROVIDER, "qwen"),
            "API_KEY=abc\nLLM_PROVIDER=qwen\n"
        );
        assert_eq!(assign("", LLM_PROVIDER, "qwen"), "LLM_PROVIDER=qwen\n");
    }

    #[test]
    fn test_assign_ignores_similar_keys() {
        let content = "OLD_LLM_PROVIDER=a\n";
        assert_eq!(
            assign(content, LLM_PROVIDER, "b"),
            "OLD_LLM_PROVIDER=a\nLLM_PROVIDER=b\n"
        );
    }

    #[test]
    fn test_assign_value_with_dollar_is_literal() {
        assert_eq!(assign("K=1\n", "K", "$1x"), "K=$1x\n");
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "API_KEY=abc\n").unwrap();
        let env = EnvFile::new(&path);

        assert_eq!(env.get(LLM_PROVIDER).await.unwrap(), None);
        env.set_llm_provider("deepseek").await.unwrap();
        assert_eq!(
            env.get(LLM_PROVIDER).await.unwrap().as_deref(),
            Some("deepseek")
        );
        env.set_llm_provider("qwen").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "API_KEY=abc\nLLM_PROVIDER=qwen\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let env = EnvFile::new(dir.path().join(".env"));

        let result = env.set_llm_provider("qwen").await;

        assert!(matches!(result, Err(EnvFileError::NotFound { .. })));
        assert!(!dir.path().join(".env").exists());
    }

    #[tokio::test]
    async fn test_rejects_multiline_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "").unwrap();

        let result = EnvFile::new(&path).set(LLM_PROVIDER, "a\nEVIL=1").await;

        assert!(matches!(result, Err(EnvFileError::InvalidValue { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
