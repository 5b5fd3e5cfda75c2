//! Reference counts for managed file paths.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use toolbridge_types::BridgeConfig;
use tracing::{debug, trace, warn};

use crate::provider::{SystemTempFiles, TemporaryFilesProvider};

static MANAGER: LazyLock<Arc<FileReferenceCounter>> = LazyLock::new(|| {
    let provider = SystemTempFiles::from_config(&BridgeConfig::from_env());
    Arc::new(FileReferenceCounter::new(Arc::new(provider)))
});

/// The process-wide reference counter.
pub fn manager() -> Arc<FileReferenceCounter> {
    MANAGER.clone()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArcError {
    /// Released a reference for a path that is not being counted.
    Untracked(PathBuf),
}

impl fmt::Display for ArcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArcError::Untracked(path) => write!(
                f,
                "Path {} not managed by automatic reference counting",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ArcError {}

/// Tracks live references to ephemeral files.
///
/// A path enters the table with a count of 1 and leaves it when the count
/// drops to zero, at which point the backing file is deleted through the
/// provider. Counts never go below 1 while tracked.
pub struct FileReferenceCounter {
    references: Mutex<HashMap<PathBuf, usize>>,
    provider: Arc<dyn TemporaryFilesProvider>,
}

impl FileReferenceCounter {
    pub fn new(provider: Arc<dyn TemporaryFilesProvider>) -> Self {
        Self {
            references: Mutex::new(HashMap::new()),
            provider,
        }
    }

    pub fn provider(&self) -> &Arc<dyn TemporaryFilesProvider> {
        &self.provider
    }

    /// Allocate a fresh temporary file, tracked with a count of 1.
    pub fn new_managed_file(&self, file_ext: Option<&str>) -> anyhow::Result<PathBuf> {
        let path = self.provider.new_temporary_file(file_ext)?;
        self.references.lock().insert(path.clone(), 1);
        trace!(path = %path.display(), "tracking new managed file");
        Ok(path)
    }

    /// Start tracking an existing file with a count of 1.
    ///
    /// Used when ownership of a managed file moves to a new path. A path that
    /// is already tracked gains one reference instead.
    pub fn track(&self, path: &Path) {
        let mut references = self.references.lock();
        let count = references.entry(path.to_path_buf()).or_insert(0);
        *count += 1;
        trace!(path = %path.display(), count = *count, "tracking file");
    }

    pub fn add_reference(&self, path: &Path) {
        let mut references = self.references.lock();
        match references.get_mut(path) {
            Some(count) => *count += 1,
            None => {
                warn!(
                    path = %path.display(),
                    "Counting references for non-temporary files is deprecated \
                     (such files are usually persistent, and counting would delete them)"
                );
                references.insert(path.to_path_buf(), 1);
            }
        }
    }

    /// Release one reference, deleting the file when it was the last.
    ///
    /// # Panics
    ///
    /// Releasing an untracked path is a programming error and panics. Use
    /// [`FileReferenceCounter::try_remove_reference`] where a panic is not
    /// acceptable (destructors).
    pub fn remove_reference(&self, path: &Path) {
        if let Err(err) = self.try_remove_reference(path) {
            panic!("{}", err);
        }
    }

    pub fn try_remove_reference(&self, path: &Path) -> Result<(), ArcError> {
        let mut references = self.references.lock();
        let count = references
            .get_mut(path)
            .ok_or_else(|| ArcError::Untracked(path.to_path_buf()))?;

        if *count > 1 {
            *count -= 1;
            return Ok(());
        }

        if let Err(err) = self.provider.delete(path) {
            warn!("Failed to delete file at {}: {:#}", path.display(), err);
        }
        references.remove(path);
        debug!(path = %path.display(), "released last reference");
        Ok(())
    }

    /// Move the count of `from` to `to` once the file itself was renamed.
    /// Nothing is deleted. Counts merge if `to` is already tracked.
    pub fn relocate(&self, from: &Path, to: &Path) -> Result<(), ArcError> {
        let mut references = self.references.lock();
        let count = references
            .remove(from)
            .ok_or_else(|| ArcError::Untracked(from.to_path_buf()))?;
        let moved = references.entry(to.to_path_buf()).or_insert(0);
        *moved += count;
        trace!(from = %from.display(), to = %to.display(), count = *moved, "relocated file");
        Ok(())
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.references.lock().contains_key(path)
    }

    /// Current count, or 0 (with a warning) for untracked paths.
    pub fn get_count(&self, path: &Path) -> usize {
        match self.references.lock().get(path) {
            Some(count) => *count,
            None => {
                warn!(
                    "Reference count requested for untracked path {}; returned 0",
                    path.display()
                );
                0
            }
        }
    }

    /// Snapshot of every tracked path, sorted by path.
    pub fn tracked(&self) -> Vec<(PathBuf, usize)> {
        let mut entries: Vec<_> = self
            .references
            .lock()
            .iter()
            .map(|(path, count)| (path.clone(), *count))
            .collect();
        entries.sort();
        entries
    }
}

impl fmt::Debug for FileReferenceCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileReferenceCounter")
            .field("tracked", &self.references.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Default)]
    struct NoopFiles {
        deleted: Mutex<Vec<PathBuf>>,
    }

    impl TemporaryFilesProvider for NoopFiles {
        fn new_temporary_file(&self, file_ext: Option<&str>) -> anyhow::Result<PathBuf> {
            Ok(PathBuf::from(format!("/tmp/noop{}", file_ext.unwrap_or(""))))
        }

        fn delete(&self, path: &Path) -> anyhow::Result<()> {
            self.deleted.lock().push(path.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn test_reference_counting() {
        let files = Arc::new(NoopFiles::default());
        let manager = FileReferenceCounter::new(files.clone());
        let path_1 = Path::new("/path/to/file_1.txt");
        let path_2 = Path::new("/path/to/file_2.txt");

        assert_eq!(manager.get_count(path_1), 0);

        manager.add_reference(path_1);
        manager.add_reference(path_1);
        assert_eq!(manager.get_count(path_1), 2);

        manager.remove_reference(path_1);
        manager.add_reference(path_2);
        assert_eq!(manager.get_count(path_1), 1);
        assert_eq!(manager.get_count(path_2), 1);

        manager.remove_reference(path_1);
        assert!(!manager.is_tracked(path_1));
        assert_eq!(*files.deleted.lock(), vec![path_1.to_path_buf()]);

        assert_eq!(
            manager.try_remove_reference(path_1),
            Err(ArcError::Untracked(path_1.to_path_buf()))
        );
    }

    #[test]
    #[should_panic(expected = "not managed by automatic reference counting")]
    fn test_remove_untracked_panics() {
        let manager = FileReferenceCounter::new(Arc::new(NoopFiles::default()));
        manager.remove_reference(Path::new("/never/tracked"));
    }

    #[test]
    fn test_managed_file_deleted_on_last_release() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let manager = FileReferenceCounter::new(Arc::new(SystemTempFiles::in_dir(temp_dir.path())));

        let path = manager.new_managed_file(Some(".txt"))?;
        assert_eq!(manager.get_count(&path), 1);
        assert!(path.exists());

        manager.add_reference(&path);
        manager.remove_reference(&path);
        assert!(path.exists());

        manager.remove_reference(&path);
        assert!(!path.exists());
        assert!(manager.tracked().is_empty());
        Ok(())
    }

    #[test]
    fn test_relocate_moves_count_without_deleting() {
        let files = Arc::new(NoopFiles::default());
        let manager = FileReferenceCounter::new(files.clone());
        let old = Path::new("/tmp/noop");
        let new = Path::new("/tmp/noop.vol");

        manager.add_reference(old);
        manager.add_reference(old);
        manager.relocate(old, new).unwrap();

        assert!(!manager.is_tracked(old));
        assert_eq!(manager.get_count(new), 2);
        assert!(files.deleted.lock().is_empty());
        assert_eq!(
            manager.relocate(old, new),
            Err(ArcError::Untracked(old.to_path_buf()))
        );
    }

    #[test]
    fn test_track_existing_path() {
        let manager = FileReferenceCounter::new(Arc::new(NoopFiles::default()));
        let path = Path::new("/tmp/renamed.vol");

        manager.track(path);
        assert_eq!(manager.get_count(path), 1);
        manager.track(path);
        assert_eq!(manager.tracked(), vec![(path.to_path_buf(), 2)]);
    }
}
