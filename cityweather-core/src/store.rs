use anyhow::{Context, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;

/// Maximum number of saved locations.
pub const MAX_SAVED_LOCATIONS: usize = 5;

/// Store failures. The first three are user mistakes and their messages
/// are shown verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("City name is empty.")]
    EmptyLabel,

    #[error("You already saved 5 cities.")]
    CapacityExceeded,

    #[error("City already saved.")]
    DuplicateLabel,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// On-disk document: labels in insertion order, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SavedLocationsFile {
    locations: Vec<String>,
}

/// Durable bounded set of saved city labels.
///
/// An explicitly constructed handle: open it once and hand it to whatever
/// needs it. Every mutation is written through to disk before returning,
/// so a caller may immediately re-list and see the change, and the list
/// survives process restart.
///
/// Labels are unique by exact comparison after trimming. Near-duplicates
/// that differ only in formatting ("Halifax, NS, Canada" vs
/// "Halifax, Nova Scotia, Canada") are treated as distinct; semantic
/// dedup is a known limitation.
#[derive(Debug)]
pub struct LocationStore {
    path: PathBuf,
    /// Insertion order, oldest first. Guards the check-then-insert in
    /// `save` as well as the write-through.
    labels: Mutex<Vec<String>>,
}

impl LocationStore {
    /// Open the store at the platform default location.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_store_path()?)
    }

    /// Open a store backed by the given file. A missing file is an empty
    /// store; it is created on the first successful save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let labels = if path.exists() {
            let contents = fs::read_to_string(&path).with_context(|| {
                format!("Failed to read saved locations file: {}", path.display())
            })?;

            let file: SavedLocationsFile = toml::from_str(&contents).with_context(|| {
                format!("Failed to parse saved locations file: {}", path.display())
            })?;

            file.locations
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            labels: Mutex::new(labels),
        })
    }

    /// Saved labels, most recently saved first.
    pub fn list(&self) -> Vec<String> {
        self.lock().iter().rev().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Validate and insert a label. The empty/capacity/duplicate checks,
    /// the insert, and the durable write all happen under one lock
    /// acquisition, so two concurrent saves cannot both slip past the
    /// capacity limit.
    pub fn save(&self, label: &str) -> Result<(), StoreError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(StoreError::EmptyLabel);
        }

        let mut labels = self.lock();
        if labels.len() >= MAX_SAVED_LOCATIONS {
            return Err(StoreError::CapacityExceeded);
        }
        if labels.iter().any(|l| l == trimmed) {
            return Err(StoreError::DuplicateLabel);
        }

        labels.push(trimmed.to_string());
        if let Err(e) = self.persist(&labels) {
            labels.pop();
            return Err(e);
        }

        tracing::debug!(label = trimmed, count = labels.len(), "saved location");
        Ok(())
    }

    /// Remove a label. Removing an absent label is a no-op, not an error.
    pub fn remove(&self, label: &str) -> Result<(), StoreError> {
        let mut labels = self.lock();
        let before = labels.len();
        labels.retain(|l| l != label);
        if labels.len() == before {
            return Ok(());
        }

        self.persist(&labels)?;
        tracing::debug!(label, "removed location");
        Ok(())
    }

    fn persist(&self, labels: &[String]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create storage directory: {}", parent.display())
            })?;
        }

        let doc = SavedLocationsFile {
            locations: labels.to_vec(),
        };
        let toml = toml::to_string_pretty(&doc)
            .context("Failed to serialize saved locations to TOML")?;

        fs::write(&self.path, toml).with_context(|| {
            format!(
                "Failed to write saved locations file: {}",
                self.path.display()
            )
        })?;

        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.labels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Path to the saved locations file in the platform data directory.
pub fn default_store_path() -> Result<PathBuf, StoreError> {
    let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
        .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

    Ok(dirs.data_dir().join("saved_locations.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, LocationStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store =
            LocationStore::open(dir.path().join("saved_locations.toml")).expect("open store");
        (dir, store)
    }

    #[test]
    fn list_is_most_recently_saved_first() {
        let (_dir, store) = temp_store();

        store.save("Halifax").unwrap();
        store.save("Tokyo").unwrap();
        store.save("Paris").unwrap();

        assert_eq!(store.list(), vec!["Paris", "Tokyo", "Halifax"]);
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn save_trims_input() {
        let (_dir, store) = temp_store();

        store.save("  Halifax  ").unwrap();
        assert_eq!(store.list(), vec!["Halifax"]);
    }

    #[test]
    fn empty_label_rejected_regardless_of_count() {
        let (_dir, store) = temp_store();

        assert!(matches!(store.save(""), Err(StoreError::EmptyLabel)));
        assert!(matches!(store.save("   "), Err(StoreError::EmptyLabel)));

        for city in ["a", "b", "c", "d", "e"] {
            store.save(city).unwrap();
        }
        assert!(matches!(store.save("  "), Err(StoreError::EmptyLabel)));
    }

    #[test]
    fn duplicate_label_rejected_after_trimming() {
        let (_dir, store) = temp_store();

        store.save("Halifax").unwrap();
        assert!(matches!(
            store.save("  Halifax "),
            Err(StoreError::DuplicateLabel)
        ));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn duplicate_check_is_case_sensitive() {
        let (_dir, store) = temp_store();

        store.save("Paris").unwrap();
        store.save("paris").unwrap();
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn capacity_is_capped_at_five() {
        let (_dir, store) = temp_store();

        for city in ["a", "b", "c", "d", "e"] {
            store.save(city).unwrap();
        }
        assert!(matches!(
            store.save("f"),
            Err(StoreError::CapacityExceeded)
        ));
        assert_eq!(store.count(), MAX_SAVED_LOCATIONS);
    }

    #[test]
    fn remove_is_idempotent() {
        let (_dir, store) = temp_store();

        store.save("Halifax").unwrap();
        store.save("Tokyo").unwrap();

        store.remove("Halifax").unwrap();
        assert_eq!(store.list(), vec!["Tokyo"]);

        store.remove("Halifax").unwrap();
        store.remove("never saved").unwrap();
        assert_eq!(store.list(), vec!["Tokyo"]);
    }

    #[test]
    fn saved_labels_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("saved_locations.toml");

        {
            let store = LocationStore::open(&path).unwrap();
            store.save("Halifax").unwrap();
            store.save("Tokyo").unwrap();
        }

        let reopened = LocationStore::open(&path).unwrap();
        assert_eq!(reopened.list(), vec!["Tokyo", "Halifax"]);
    }

    #[test]
    fn removal_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("saved_locations.toml");

        {
            let store = LocationStore::open(&path).unwrap();
            store.save("Halifax").unwrap();
            store.save("Tokyo").unwrap();
            store.remove("Halifax").unwrap();
        }

        let reopened = LocationStore::open(&path).unwrap();
        assert_eq!(reopened.list(), vec!["Tokyo"]);
    }

    #[test]
    fn concurrent_saves_never_exceed_capacity() {
        let (_dir, store) = temp_store();

        std::thread::scope(|scope| {
            for i in 0..10 {
                let store = &store;
                scope.spawn(move || {
                    // Outcome per thread depends on scheduling; the cap must not.
                    let _ = store.save(&format!("city-{i}"));
                });
            }
        });

        assert!(store.count() <= MAX_SAVED_LOCATIONS);
        assert_eq!(store.count(), MAX_SAVED_LOCATIONS);
    }
}
