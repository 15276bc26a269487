//! Directory reset and document migration between working directories.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use super::error::ReconcileError;
use super::types::{ExtensionFilter, MigrationSummary};
use crate::metrics;

/// Keeps the flat working directories in the state a run expects.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryReconciler;

impl DirectoryReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Remove every entry directly inside `dir`.
    ///
    /// A missing directory is a no-op. Returns the number of removed entries.
    pub async fn reset(&self, dir: &Path) -> Result<usize, ReconcileError> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist, nothing to reset", dir.display());
                return Ok(0);
            }
            Err(e) => return Err(list_error(dir, e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| list_error(dir, e))? {
            let path = entry.path();
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);

            let result = if is_dir {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };
            result.map_err(|source| ReconcileError::Remove {
                path: path.clone(),
                source,
            })?;
            removed += 1;
        }

        info!("Cleared {} entries from {}", removed, dir.display());
        Ok(removed)
    }

    /// Move every file in `src` matching `filter` into `dst`.
    ///
    /// A destination that already has a file of the same name leaves the
    /// source where it is and counts it as skipped, as does a failed move.
    /// Only a failure to list `src` is an error; a missing `src` moves nothing.
    pub async fn migrate(
        &self,
        src: &Path,
        dst: &Path,
        filter: &ExtensionFilter,
    ) -> Result<MigrationSummary, ReconcileError> {
        let candidates = match self.list_matching(src, filter).await {
            Ok(candidates) => candidates,
            Err(ReconcileError::List { source, .. }) if source.kind() == ErrorKind::NotFound => {
                warn!("{} does not exist, nothing to migrate", src.display());
                return Ok(MigrationSummary::default());
            }
            Err(e) => return Err(e),
        };

        info!(
            "Found {} .{} files in {}",
            candidates.len(),
            filter.extension(),
            src.display()
        );

        if let Err(e) = fs::create_dir_all(dst).await {
            warn!("Failed to create {}: {}", dst.display(), e);
        }

        let mut summary = MigrationSummary::default();
        for source in candidates {
            let Some(name) = source.file_name() else {
                summary.skipped += 1;
                continue;
            };
            let destination = dst.join(name);

            if fs::symlink_metadata(&destination).await.is_ok() {
                info!("{} already exists, skipping", destination.display());
                summary.skipped += 1;
                continue;
            }

            match move_file(&source, &destination).await {
                Ok(()) => {
                    debug!("Moved {} -> {}", source.display(), destination.display());
                    summary.moved += 1;
                }
                Err(e) => {
                    warn!("Failed to move {}: {}", source.display(), e);
                    summary.skipped += 1;
                }
            }
        }

        metrics::DOCUMENTS_MIGRATED
            .with_label_values(&["moved"])
            .inc_by(summary.moved as u64);
        metrics::DOCUMENTS_MIGRATED
            .with_label_values(&["skipped"])
            .inc_by(summary.skipped as u64);

        info!("Migrated documents into {}: {}", dst.display(), summary);
        Ok(summary)
    }

    /// Regular files in `dir` matching `filter`, sorted by path.
    pub async fn list_matching(
        &self,
        dir: &Path,
        filter: &ExtensionFilter,
    ) -> Result<Vec<PathBuf>, ReconcileError> {
        let mut entries = fs::read_dir(dir).await.map_err(|e| list_error(dir, e))?;

        let mut matching = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| list_error(dir, e))? {
            let path = entry.path();
            if !filter.matches(&path) {
                continue;
            }
            let is_file = fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if is_file {
                matching.push(path);
            }
        }

        matching.sort();
        Ok(matching)
    }
}

fn list_error(dir: &Path, source: std::io::Error) -> ReconcileError {
    ReconcileError::List {
        path: dir.to_path_buf(),
        source,
    }
}

/// Rename, falling back to copy and delete across filesystems.
async fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        // EXDEV is 18 on Linux
        Err(e) if e.kind() == ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) => {
            copy_then_remove(source, destination).await
        }
        Err(e) => Err(e),
    }
}

/// Copy `source` to `destination`, then delete `source`.
///
/// On any failure the destination is removed again so the file stays only
/// in `source`.
async fn copy_then_remove(source: &Path, destination: &Path) -> std::io::Result<()> {
    if let Err(e) = fs::copy(source, destination).await {
        discard_copy(destination).await;
        return Err(e);
    }
    if let Err(e) = fs::remove_file(source).await {
        discard_copy(destination).await;
        return Err(e);
    }
    Ok(())
}

async fn discard_copy(destination: &Path) {
    match fs::remove_file(destination).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Failed to remove incomplete copy {}: {}",
            destination.display(),
            e
        ),
    }
}
