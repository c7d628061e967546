//! Reference Store
//!
//! Labeled reference shapes persisted as a JSON list. Loading degrades to an
//! empty store on any failure so a missing or corrupt database never blocks
//! solving; mutation persists synchronously so a successful add is durable.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::geometry::Point;

/// One labeled reference shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub label: String,
    pub points: Vec<Point>,
}

/// Why a database file could not be read
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database file not found: {0}")]
    Missing(PathBuf),
    #[error("database file unreadable: {0}")]
    Unreadable(#[from] io::Error),
    #[error("database file corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// In-memory reference set bound to its backing file
#[derive(Debug)]
pub struct ReferenceStore {
    entries: Vec<ReferenceEntry>,
    path: Option<PathBuf>,
}

/// Store handle shared across readers with exclusive mutation
pub type SharedStore = Arc<RwLock<ReferenceStore>>;

impl ReferenceStore {
    /// Empty store with no backing file; adds are in-memory only
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            path: None,
        }
    }

    /// Load the store from `path`, degrading to empty on any failure.
    ///
    /// Missing files are the normal first-run state and log at debug; a file
    /// that exists but cannot be parsed is worth a warning because it means
    /// training data is being ignored.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => {
                debug!(
                    "Loaded {} reference entries from {}",
                    store.entries.len(),
                    path.display()
                );
                store
            }
            Err(StoreError::Missing(_)) => {
                debug!("No reference database at {}, starting empty", path.display());
                Self {
                    entries: Vec::new(),
                    path: Some(path.to_path_buf()),
                }
            }
            Err(e) => {
                warn!(
                    "Ignoring reference database at {}: {}",
                    path.display(),
                    e
                );
                Self {
                    entries: Vec::new(),
                    path: Some(path.to_path_buf()),
                }
            }
        }
    }

    /// Strict load that surfaces the failure instead of degrading
    pub fn try_load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<ReferenceEntry> = serde_json::from_str(&content)?;
        Ok(Self {
            entries,
            path: Some(path.to_path_buf()),
        })
    }

    /// Append an entry and persist the whole store
    pub fn add(&mut self, entry: ReferenceEntry) -> Result<()> {
        self.entries.push(entry);
        self.persist()
    }

    /// Append an entry without touching the backing file
    pub fn insert(&mut self, entry: ReferenceEntry) {
        self.entries.push(entry);
    }

    /// Drop all entries and persist the empty store
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the store to its backing file, if it has one
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let content = serde_json::to_string(&self.entries)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "captchatoolkit", "CaptchaToolkit")
        .context("Failed to determine project directories")?;
    let data_dir = proj_dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir)
}

/// Get the application config directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "captchatoolkit", "CaptchaToolkit")
        .context("Failed to determine project directories")?;
    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Default location of the reference database
pub fn default_database_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("database.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(label: &str) -> ReferenceEntry {
        ReferenceEntry {
            label: label.to_string(),
            points: vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
        }
    }

    #[test]
    fn test_add_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database.json");

        let mut store = ReferenceStore::load(&path);
        store.add(entry("A")).unwrap();
        store.add(entry("B")).unwrap();

        let reloaded = ReferenceStore::load(&path);
        assert_eq!(reloaded.entry_count(), 2);
        assert_eq!(reloaded.entries()[0].label, "A");
        assert_eq!(reloaded.entries()[1].label, "B");
        assert_eq!(reloaded.entries()[0].points[0], Point::new(1.0, 2.0));
    }

    #[test]
    fn test_load_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = ReferenceStore::load(&dir.path().join("nope.json"));
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn test_load_corrupt_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database.json");
        std::fs::write(&path, "{ not json ]").unwrap();

        let store = ReferenceStore::load(&path);
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn test_try_load_reports_failure_kind() {
        let dir = TempDir::new().unwrap();

        let missing = ReferenceStore::try_load(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(StoreError::Missing(_))));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[[[").unwrap();
        let corrupt = ReferenceStore::try_load(&path);
        assert!(matches!(corrupt, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_persisted_shape_is_label_points_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database.json");

        let mut store = ReferenceStore::load(&path);
        store.add(entry("X")).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["label"], "X");
        assert_eq!(value[0]["points"][0][0], 1.0);
        assert_eq!(value[0]["points"][0][1], 2.0);
    }

    #[test]
    fn test_clear_persists_empty_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database.json");

        let mut store = ReferenceStore::load(&path);
        store.add(entry("A")).unwrap();
        store.clear().unwrap();

        let reloaded = ReferenceStore::load(&path);
        assert_eq!(reloaded.entry_count(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_empty_store_has_no_backing_file() {
        let mut store = ReferenceStore::empty();
        store.insert(entry("A"));
        store.persist().unwrap();
        assert!(store.path().is_none());
        assert_eq!(store.entry_count(), 1);
    }
}
