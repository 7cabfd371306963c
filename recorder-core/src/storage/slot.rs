use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::error::RecorderError;
use crate::storage::metadata;

/// A well-known path holding at most one live take.
///
/// New writes go through `partial_path()` or replace the slot after `clear()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleSlot {
    path: PathBuf,
}

impl SingleSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Scratch file the next version is written to before it replaces the slot.
    pub fn partial_path(&self) -> PathBuf {
        let ext = self
            .path
            .extension()
            .map(|e| format!("partial.{}", e.to_string_lossy()))
            .unwrap_or_else(|| "partial".into());
        self.path.with_extension(ext)
    }

    /// Delete the take and its sidecar. Returns whether a take existed.
    pub fn clear(&self) -> Result<bool, RecorderError> {
        let removed = remove_if_exists(&self.path)?;
        metadata::remove_metadata(&self.path)?;
        Ok(removed)
    }

    /// Delete a leftover partial file.
    pub fn clear_partial(&self) -> Result<bool, RecorderError> {
        remove_if_exists(&self.partial_path())
    }

    /// Move `partial` over the slot, dropping the previous take's sidecar.
    pub fn replace_with(&self, partial: &Path) -> Result<(), RecorderError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RecorderError::Storage(format!("failed to create directory: {}", e)))?;
        }
        metadata::remove_metadata(&self.path)?;
        fs::rename(partial, &self.path).map_err(|e| {
            RecorderError::Storage(format!(
                "failed to move {} into {}: {}",
                partial.display(),
                self.path.display(),
                e
            ))
        })
    }
}

fn remove_if_exists(path: &Path) -> Result<bool, RecorderError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RecorderError::Storage(format!(
            "failed to remove {}: {}",
            path.display(),
            e
        ))),
    }
}
