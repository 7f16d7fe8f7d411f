//! Bachelors Battleground Game Engine
//!
//! Platform-agnostic progression and state-resolution engine for the
//! Bachelors Battleground college-life choice game. This crate provides
//! the game rules without any UI or platform-specific dependencies.

pub mod clock;
pub mod constants;
pub mod data;
pub mod exam;
pub mod loader;
pub mod numbers;
pub mod requirement;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;

use std::sync::Arc;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use constants::STORAGE_KEY;
pub use data::{
    Catalog, CatalogError, CatalogLoadError, Category, Choice, ChoiceKind, Effect, ExamChapter,
    Importance, Month, Rarity, Semester,
};
pub use exam::{ExamConfig, ExamResult, Performance, calculate_exam_result};
pub use loader::{LoaderError, StaticCatalogLoader};
pub use requirement::{Requirement, RequirementCheck, StatPredicate, check_requirement};
pub use session::{
    Advance, AvailableChoice, Command, GameSession, IgnoreReason, Resolution, SessionConfig,
};
pub use state::{GameState, Outcome, Phase, StoryEntry};
pub use stats::{BalanceRating, StatDelta, StatField, Stats};
pub use storage::{JsonFileStorage, MemoryStorage, StorageError};

/// Trait for abstracting content loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load and validate the content catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error>;

    /// Load game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Main game engine binding content, storage, and sessions
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source handed to new sessions
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Start a fresh game over freshly loaded content
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or session config cannot be loaded.
    pub fn new_session(&self) -> Result<GameSession, L::Error> {
        self.bind(GameState::default())
    }

    fn bind(&self, state: GameState) -> Result<GameSession, L::Error> {
        let catalog = Arc::new(self.data_loader.load_catalog()?);
        let config: SessionConfig = self.data_loader.load_config("session")?;
        Ok(GameSession::from_state(
            state,
            catalog,
            config,
            Arc::clone(&self.clock),
        ))
    }

    /// Apply a command and autosave when it changed state.
    ///
    /// Save failures are logged and never undo the transition.
    pub fn apply(&self, session: &mut GameSession, command: &Command) -> bool {
        let changed = session.apply(command);
        if changed {
            self.autosave(session);
        }
        changed
    }

    /// Persist the session under [`STORAGE_KEY`], logging any failure
    pub fn autosave(&self, session: &GameSession) {
        if let Err(err) = self.storage.save_game(STORAGE_KEY, session.state()) {
            log::warn!("autosave to `{STORAGE_KEY}` failed: {err}");
        }
    }

    /// Save a game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    pub fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), S::Error> {
        self.storage.save_game(save_name, game_state)
    }

    /// Load a game state and bind it to freshly loaded content
    ///
    /// # Errors
    ///
    /// Returns an error if the save or the content cannot be loaded.
    pub fn load_game(&self, save_name: &str) -> Result<Option<GameSession>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(game_state) = self.storage.load_game(save_name).map_err(Into::into)? {
            let session = self.bind(game_state).map_err(Into::into)?;
            Ok(Some(session))
        } else {
            Ok(None)
        }
    }

    /// Resume the autosaved game, or start a new one when none exists
    ///
    /// # Errors
    ///
    /// Returns an error if the save or the content cannot be loaded.
    pub fn resume(&self) -> Result<GameSession, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        match self.load_game(STORAGE_KEY)? {
            Some(session) => Ok(session),
            None => self.new_session().map_err(Into::into),
        }
    }

    /// Delete a saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_save(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}
