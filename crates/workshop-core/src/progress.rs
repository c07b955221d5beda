//! Persisted learner progress.
//!
//! Progress lives in two small JSON documents in the workshop's data
//! directory: `current.json` holds the selected exercise name and
//! `completed.json` holds the names of every exercise passed so far.
//! Reads never fail; a missing or corrupt document is simply absent.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Document holding the selected exercise name.
pub const CURRENT: &str = "current";

/// Document holding the set of passed exercise names.
pub const COMPLETED: &str = "completed";

/// JSON document store rooted at a data directory.
///
/// Assumes a single foreground process. Writes replace the whole document.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    data_dir: PathBuf,
}

impl ProgressStore {
    /// Creates a store rooted at `data_dir`. Nothing is created on disk
    /// until the first write.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The directory documents are stored in.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }

    /// Reads and parses a document, returning `None` on any failure.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.path_for(name);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable progress file");
                }
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt progress file");
                None
            }
        }
    }

    /// Applies `f` to the current value of a document and writes the result back.
    ///
    /// Returns the value that was written.
    pub fn update<T, F>(&self, name: &str, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> T,
    {
        let value = f(self.get(name));
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.path_for(name), serde_json::to_string(&value)?)?;
        Ok(value)
    }

    /// Deletes both progress documents. Missing files are not an error.
    pub fn reset(&self) -> Result<()> {
        for name in [COMPLETED, CURRENT] {
            match std::fs::remove_file(self.path_for(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(data_dir = %self.data_dir.display(), "Progress reset");
        Ok(())
    }

    /// The selected exercise, if any.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.get(CURRENT)
    }

    /// Persists the selected exercise.
    pub fn set_current(&self, name: &str) -> Result<()> {
        self.update(CURRENT, |_: Option<String>| name.to_string())?;
        Ok(())
    }

    /// Names of every exercise passed so far.
    #[must_use]
    pub fn completed(&self) -> Vec<String> {
        self.get(COMPLETED).unwrap_or_default()
    }

    /// Adds `name` to the completed set unless it is already there.
    ///
    /// Returns the completed set as written.
    pub fn mark_completed(&self, name: &str) -> Result<Vec<String>> {
        self.update(COMPLETED, |completed: Option<Vec<String>>| {
            let mut completed = completed.unwrap_or_default();
            if !completed.iter().any(|done| done == name) {
                completed.push(name.to_string());
            }
            completed
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ProgressStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("data"));
        (dir, store)
    }

    #[test]
    fn test_get_missing_is_none() {
        let (_dir, store) = store();
        assert_eq!(store.get::<String>(CURRENT), None);
        assert!(store.completed().is_empty());
    }

    #[test]
    fn test_get_corrupt_is_none() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.data_dir()).unwrap();
        std::fs::write(store.data_dir().join("completed.json"), "[\"one\",").unwrap();
        assert_eq!(store.get::<Vec<String>>(COMPLETED), None);
    }

    #[test]
    fn test_update_creates_directory_lazily() {
        let (_dir, store) = store();
        assert!(!store.data_dir().exists());

        store.set_current("Hello World").unwrap();
        assert!(store.data_dir().exists());
        assert_eq!(store.current().as_deref(), Some("Hello World"));
    }

    #[test]
    fn test_current_file_is_json_string() {
        let (_dir, store) = store();
        store.set_current("Baby Steps").unwrap();
        let raw = std::fs::read_to_string(store.data_dir().join("current.json")).unwrap();
        assert_eq!(raw, "\"Baby Steps\"");
    }

    #[test]
    fn test_update_sees_previous_value() {
        let (_dir, store) = store();
        store.update("counter", |n: Option<u32>| n.unwrap_or(0) + 1).unwrap();
        let n = store.update("counter", |n: Option<u32>| n.unwrap_or(0) + 1).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn test_mark_completed_is_idempotent() {
        let (_dir, store) = store();
        store.mark_completed("one").unwrap();
        let completed = store.mark_completed("one").unwrap();
        assert_eq!(completed, vec!["one"]);
        assert_eq!(store.completed(), vec!["one"]);
    }

    #[test]
    fn test_mark_completed_recovers_from_corrupt_file() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.data_dir()).unwrap();
        std::fs::write(store.data_dir().join("completed.json"), "{}").unwrap();

        let completed = store.mark_completed("two").unwrap();
        assert_eq!(completed, vec!["two"]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (_dir, store) = store();
        store.set_current("one").unwrap();
        store.mark_completed("one").unwrap();

        store.reset().unwrap();
        assert_eq!(store.current(), None);
        assert_eq!(store.get::<Vec<String>>(COMPLETED), None);
    }

    #[test]
    fn test_reset_without_files_is_ok() {
        let (_dir, store) = store();
        store.reset().unwrap();
        store.reset().unwrap();
        assert_eq!(store.current(), None);
        assert!(store.completed().is_empty());
    }
}
