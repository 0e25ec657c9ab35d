use std::path::PathBuf;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::game::storage::{
    self, Storage, PLAYER_NAME_KEY, SETTINGS_KEY, THEME_KEY, WELCOME_COMPLETED_KEY,
};
use crate::model::{Difficulty, GameMode};

pub const SEED_ENV: &str = "GUESS_RUSH_SEED";
pub const DATA_DIR_ENV: &str = "GUESS_RUSH_DATA_DIR";
pub const DEFAULT_PLAYER_NAME: &str = "Player 1";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default)]
    pub default_mode: GameMode,

    #[serde(default)]
    pub default_difficulty: Difficulty,

    #[serde(default = "default_true")]
    pub auto_next_round: bool,
}

// Helper functions for default values
fn default_version() -> u32 {
    2
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: default_version(),
            default_mode: GameMode::default(),
            default_difficulty: Difficulty::default(),
            auto_next_round: true,
        }
    }
}

impl Settings {
    pub fn load(storage: &dyn Storage) -> Self {
        if let Ok(Some(mut settings)) = storage::load_json::<Settings>(storage, SETTINGS_KEY) {
            settings.migrate();
            return settings;
        }
        let default = Settings::default();
        if let Err(e) = default.save(storage) {
            warn!(target: "storage", "Could not save default settings: {}", e);
        }
        default
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        storage::save_json(storage, SETTINGS_KEY, self)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn migrate(&mut self) {
        match self.version {
            // version 1 documents predate the auto-advance switch
            0 | 1 => {
                self.auto_next_round = true;
                self.version = 2;
            }
            _ => (),
        }
    }

    pub fn is_debug_mode() -> bool {
        std::env::var("DEBUG").map(|v| v == "1").unwrap_or(false)
    }

    pub fn seed_from_env() -> Option<u64> {
        let raw = std::env::var(SEED_ENV).ok()?;
        match raw.trim().parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(_) => {
                warn!(target: "game_engine", "Ignoring unparseable {}={:?}", SEED_ENV, raw);
                None
            }
        }
    }

    /// Directory used by file storage: `GUESS_RUSH_DATA_DIR`, else
    /// `$HOME/.local/share/guess-rush`, else `./.guess-rush`
    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                return PathBuf::from(dir);
            }
        }
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".local/share/guess-rush"),
            Err(_) => PathBuf::from(".guess-rush"),
        }
    }
}

/// Raw-string preferences stored outside the settings document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub theme: Option<String>,
    pub player_name: Option<String>,
    pub welcome_completed: bool,
}

impl PlayerProfile {
    pub fn load(storage: &dyn Storage) -> Self {
        let raw = |key: &str| match storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(target: "storage", "Could not read {}: {}", key, e);
                None
            }
        };
        Self {
            theme: raw(THEME_KEY),
            player_name: raw(PLAYER_NAME_KEY),
            welcome_completed: raw(WELCOME_COMPLETED_KEY).as_deref() == Some("true"),
        }
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        match &self.theme {
            Some(theme) => storage.set(THEME_KEY, theme)?,
            None => {
                storage.remove(THEME_KEY)?;
            }
        }
        match &self.player_name {
            Some(name) => storage.set(PLAYER_NAME_KEY, name)?,
            None => {
                storage.remove(PLAYER_NAME_KEY)?;
            }
        }
        storage.set(
            WELCOME_COMPLETED_KEY,
            if self.welcome_completed { "true" } else { "false" },
        )
    }

    pub fn display_name(&self) -> &str {
        self.player_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_PLAYER_NAME)
    }
}
