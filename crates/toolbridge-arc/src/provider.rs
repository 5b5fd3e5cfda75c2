//! Temporary file allocation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use toolbridge_types::BridgeConfig;
use tracing::debug;

/// Allocates and deletes the files backing managed proxies.
///
/// Implementations must hand out a fresh, unique path on every call; the
/// extension (including its leading dot) is appended verbatim.
pub trait TemporaryFilesProvider: Send + Sync {
    fn new_temporary_file(&self, file_ext: Option<&str>) -> Result<PathBuf>;

    fn delete(&self, path: &Path) -> Result<()>;
}

/// Creates real files through [`tempfile::Builder`] and keeps them on disk
/// until [`TemporaryFilesProvider::delete`] is called.
#[derive(Debug, Clone)]
pub struct SystemTempFiles {
    dir: Option<PathBuf>,
    prefix: String,
}

impl SystemTempFiles {
    pub fn new() -> Self {
        Self::from_config(&BridgeConfig::default())
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            dir: config.temp_dir.clone(),
            prefix: config.temp_prefix.clone(),
        }
    }

    /// Place files in `dir` instead of the OS temp directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::new()
        }
    }
}

impl Default for SystemTempFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl TemporaryFilesProvider for SystemTempFiles {
    fn new_temporary_file(&self, file_ext: Option<&str>) -> Result<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.prefix).suffix(file_ext.unwrap_or(""));

        let file = match &self.dir {
            Some(dir) => builder
                .tempfile_in(dir)
                .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?,
            None => builder
                .tempfile()
                .context("Failed to create temporary file")?,
        };
        let (_, path) = file.keep().context("Failed to persist temporary file")?;

        debug!("Creating new temporary file at {}", path.display());
        Ok(path)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        debug!("Remove file at {}", path.display());
        std::fs::remove_file(path).with_context(|| format!("Failed to delete {}", path.display()))
    }
}
