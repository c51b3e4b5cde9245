// Configuration module for reading Game.toml
// Holds every tunable of the engine, the session and the agent in one place

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub board: BoardConfig,
    pub search: SearchConfig,
    pub history: HistoryConfig,
    pub spawn: SpawnConfig,
    pub persistence: PersistenceConfig,
    pub debug: DebugConfig,
    pub autoplay: AutoplayConfig,
}

/// Board geometry and win condition
#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    pub size: usize,
    pub win_tile: u32,
}

/// Search agent parameters
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Requested search depth, clamped to [1, 5] when the agent is built
    pub depth: u8,
    /// Use the snake-heuristic evaluator instead of plain expectimax
    pub use_heuristic: bool,
}

/// Undo/redo bounds
#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

/// Random tile placement
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SpawnConfig {
    /// Fixed RNG seed; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Durable storage of the live game
#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub directory: String,
    pub key: String,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

/// Limits for unattended play
#[derive(Debug, Deserialize, Clone)]
pub struct AutoplayConfig {
    pub max_moves: u64,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Game.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Game.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Game.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the values in Game.toml
    pub fn default_hardcoded() -> Self {
        Config {
            board: BoardConfig {
                size: 4,
                win_tile: 2048,
            },
            search: SearchConfig {
                depth: 3,
                use_heuristic: false,
            },
            history: HistoryConfig { max_entries: 256 },
            spawn: SpawnConfig { seed: None },
            persistence: PersistenceConfig {
                enabled: true,
                directory: ".twenty48".to_string(),
                key: "2048_game_state".to_string(),
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "twenty48_debug.jsonl".to_string(),
            },
            autoplay: AutoplayConfig { max_moves: 10_000 },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Game.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
