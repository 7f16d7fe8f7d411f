//! Save-slot backends for [`GameStorage`](crate::GameStorage).
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

use crate::GameStorage;
use crate::state::GameState;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("save I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("save data is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// In-process save slots holding serialized JSON.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    saves: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw serialized payload for a slot, if any.
    #[must_use]
    pub fn raw(&self, save_name: &str) -> Option<String> {
        self.saves.borrow().get(save_name).cloned()
    }
}

impl GameStorage for MemoryStorage {
    type Error = StorageError;

    fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error> {
        let payload = serde_json::to_string(game_state)?;
        self.saves
            .borrow_mut()
            .insert(save_name.to_string(), payload);
        Ok(())
    }

    fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error> {
        self.saves
            .borrow()
            .get(save_name)
            .map(|payload| serde_json::from_str(payload))
            .transpose()
            .map_err(StorageError::from)
    }

    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
        self.saves.borrow_mut().remove(save_name);
        Ok(())
    }
}

/// One pretty-printed JSON file per save slot inside `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn slot_path(&self, save_name: &str) -> PathBuf {
        self.dir.join(format!("{save_name}.json"))
    }
}

impl GameStorage for JsonFileStorage {
    type Error = StorageError;

    fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir)?;
        let payload = serde_json::to_vec_pretty(game_state)?;
        let path = self.slot_path(save_name);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error> {
        match fs::read(self.slot_path(save_name)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.slot_path(save_name)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
