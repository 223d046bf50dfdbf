use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::models::{CheckedMap, CompletionLog, ExtrasMap, PantryMap, Selection};

/// Logical persisted records; each maps to one JSON file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Selections,
    Extras,
    Pantry,
    Checked,
    Completed,
    /// Pre-selection aggregated list; read-only migration source.
    LegacyList,
}

impl StorageKey {
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Selections => "selections.json",
            Self::Extras => "extras.json",
            Self::Pantry => "pantry.json",
            Self::Checked => "checked.json",
            Self::Completed => "completed.json",
            Self::LegacyList => "manual-list.json",
        }
    }
}

enum ReadOutcome<T> {
    Value(T),
    Missing,
    Unreadable,
    WrongShape,
}

/// JSON-file-per-key storage. Reads degrade to a caller-supplied fallback
/// and writes swallow-and-log failures, so callers never see a storage
/// fault.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create storage directory: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    #[must_use]
    pub fn exists(&self, key: StorageKey) -> bool {
        self.path(key).exists()
    }

    /// Read a record, degrading to `fallback` on any fault. A value that is
    /// valid JSON of the wrong shape is replaced on disk by the fallback
    /// immediately.
    pub fn read<T>(&self, key: StorageKey, fallback: T) -> T
    where
        T: DeserializeOwned + Serialize,
    {
        match self.read_guarded(key) {
            ReadOutcome::Value(value) => value,
            ReadOutcome::Missing | ReadOutcome::Unreadable => fallback,
            ReadOutcome::WrongShape => {
                self.write(key, &fallback);
                fallback
            }
        }
    }

    /// Read without ever writing back; used for the legacy migration source.
    pub fn read_readonly<T: DeserializeOwned>(&self, key: StorageKey, fallback: T) -> T {
        match self.read_guarded(key) {
            ReadOutcome::Value(value) => value,
            _ => fallback,
        }
    }

    fn read_guarded<T: DeserializeOwned>(&self, key: StorageKey) -> ReadOutcome<T> {
        let raw = match std::fs::read_to_string(self.path(key)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return ReadOutcome::Missing,
            Err(err) => {
                warn!(key = key.file_name(), error = %err, "storage read failed");
                return ReadOutcome::Unreadable;
            }
        };
        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = key.file_name(), error = %err, "stored value is not valid JSON");
                return ReadOutcome::Unreadable;
            }
        };
        match serde_json::from_value(value) {
            Ok(typed) => ReadOutcome::Value(typed),
            Err(err) => {
                warn!(key = key.file_name(), error = %err, "stored value has the wrong shape, resetting");
                ReadOutcome::WrongShape
            }
        }
    }

    /// Serialize and persist. On failure the in-memory value stays the only
    /// copy until the next successful write.
    pub fn write<T: Serialize>(&self, key: StorageKey, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => {
                if let Err(err) = std::fs::write(self.path(key), json) {
                    warn!(key = key.file_name(), error = %err, "storage write failed");
                }
            }
            Err(err) => warn!(key = key.file_name(), error = %err, "failed to serialize record"),
        }
    }
}

/// All persisted records, owned in one place. Storage I/O is confined to
/// [`AppState::load`] and the `save_*` boundary functions; everything else
/// mutates plain fields.
#[derive(Debug, Default)]
pub struct AppState {
    pub selections: Vec<Selection>,
    pub extras: ExtrasMap,
    pub pantry: PantryMap,
    pub checked: CheckedMap,
    pub completed: CompletionLog,
}

impl AppState {
    #[must_use]
    pub fn load(store: &StateStore) -> Self {
        let selections = store.read(StorageKey::Selections, Vec::new());
        // One-time migration: an extras record absent from disk is seeded
        // from the legacy aggregated list. The legacy key is never written.
        let extras = if store.exists(StorageKey::Extras) {
            store.read(StorageKey::Extras, ExtrasMap::new())
        } else {
            store.read_readonly(StorageKey::LegacyList, ExtrasMap::new())
        };
        let pantry = store.read(StorageKey::Pantry, PantryMap::new());
        let checked = store.read(StorageKey::Checked, CheckedMap::new());
        let completed = store.read(StorageKey::Completed, CompletionLog::new());
        Self {
            selections,
            extras,
            pantry,
            checked,
            completed,
        }
    }

    pub fn save_selections(&self, store: &StateStore) {
        store.write(StorageKey::Selections, &self.selections);
    }

    pub fn save_extras(&self, store: &StateStore) {
        store.write(StorageKey::Extras, &self.extras);
    }

    pub fn save_pantry(&self, store: &StateStore) {
        store.write(StorageKey::Pantry, &self.pantry);
    }

    pub fn save_checked(&self, store: &StateStore) {
        store.write(StorageKey::Checked, &self.checked);
    }

    pub fn save_completed(&self, store: &StateStore) {
        store.write(StorageKey::Completed, &self.completed);
    }
}
