// Debug logging module for agent decisions
//
// Each decision is appended to a JSONL file as one line. Writes are best-effort:
// failures are reported through the log facade and never reach the game loop.

use log::error;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::sync::Arc;

use crate::types::{Board, Direction, GameState};

/// Represents a single debug log entry
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogEntry {
    pub turn: u64,
    pub chosen_move: String,
    pub board: Board,
    pub score: u64,
    pub timestamp: String,
    /// Search that produced the move; absent in logs that predate these fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchSettings>,
}

/// Evaluator and depth the agent used for a decision
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub depth: u8,
    pub use_heuristic: bool,
}

impl LogEntry {
    /// The position the decision was taken from
    pub fn state(&self) -> GameState {
        GameState::new(self.board.clone(), self.score)
    }
}

/// Shared decision logger; clones write to the same file
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<BufWriter<File>>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Appends one decision taken from `state` by a search run with `search`
    pub fn log_move(&self, turn: u64, state: &GameState, chosen_move: Direction, search: SearchSettings) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            turn,
            chosen_move: chosen_move.as_str().to_string(),
            board: state.board.clone(),
            score: state.score,
            timestamp: chrono::Utc::now().to_rfc3339(),
            search: Some(search),
        };

        let json_line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
                return;
            }
        };

        let mut guard = self.file.lock();
        if let Some(writer) = guard.as_mut() {
            if let Err(e) = writeln!(writer, "{}", json_line) {
                error!("Failed to write debug log entry: {}", e);
            } else if let Err(e) = writer.flush() {
                error!("Failed to flush debug log: {}", e);
            }
        }
    }
}
