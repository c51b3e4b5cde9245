// Durable key/value storage for the persisted game record
//
// The session stores a single JSON document under a fixed key. Two stores are
// provided: one file per key inside a directory, and a shared in-memory map.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::board;
use crate::types::{Board, GameState};

/// Errors raised by a store or by (de)serializing the persisted record
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("corrupt saved state: {0}")]
    Corrupt(String),
}

/// Record written after every state-changing player operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub tile_matrix: Board,
    #[serde(default)]
    pub score: u64,
    /// Epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
}

impl PersistedState {
    /// Stamps a game state with the current time
    pub fn from_state(state: &GameState) -> Self {
        PersistedState {
            tile_matrix: board::deep_copy(&state.board),
            score: state.score,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn into_state(self) -> GameState {
        GameState::new(self.tile_matrix, self.score)
    }
}

/// Minimal string key/value storage
pub trait StateStore: Send {
    /// Returns the stored value, or None when the key is absent
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Stores each key as `<directory>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        FileStore {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }
}

impl StateStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.directory)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Serializes the state and writes it under `key`
pub fn save_state(store: &dyn StateStore, key: &str, state: &GameState) -> Result<(), StoreError> {
    let json = serde_json::to_string(&PersistedState::from_state(state))?;
    store.write(key, &json)
}

/// Reads the record under `key`.
///
/// A record whose tile matrix breaks the board preconditions is reported as
/// `StoreError::Corrupt` so callers can fall back to a fresh game.
pub fn load_state(store: &dyn StateStore, key: &str) -> Result<Option<PersistedState>, StoreError> {
    let Some(json) = store.read(key)? else {
        return Ok(None);
    };

    let saved: PersistedState = serde_json::from_str(&json)?;
    if !board::is_well_formed(&saved.tile_matrix) {
        return Err(StoreError::Corrupt(format!(
            "tile matrix is not a square grid of powers of two up to 2^30 ({} rows)",
            saved.tile_matrix.len()
        )));
    }
    Ok(Some(saved))
}
