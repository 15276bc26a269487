//! Types for the workdir module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Case-insensitive file extension match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extension: String,
}

impl ExtensionFilter {
    /// Accepts `pdf` as well as `.pdf`.
    pub fn new(extension: impl AsRef<str>) -> Self {
        Self {
            extension: extension.as_ref().trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

/// Result of moving documents from staging into the processing area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSummary {
    /// Files now in the destination.
    pub moved: usize,
    /// Files left in the source (name collision or move failure).
    pub skipped: usize,
}

impl MigrationSummary {
    /// Number of matching files seen in the source.
    pub fn total(&self) -> usize {
        self.moved + self.skipped
    }
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "moved={}, skipped={}", self.moved, self.skipped)
    }
}
