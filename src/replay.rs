// Replay module for analyzing recorded agent decisions
//
// This module provides functionality to:
// 1. Parse JSONL decision logs
// 2. Re-run the agent on each logged position
// 3. Compare logged vs replayed moves
// 4. Generate summary reports

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::agent::SearchAgent;
use crate::config::Config;
use crate::debug_logger::{LogEntry, SearchSettings};
use crate::simulator::BoardSimulator;
use crate::types::{Direction, GameState};

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: u64,
    pub original_move: Direction,
    pub replayed_move: Option<Direction>,
    pub matches: bool,
    pub search_depth: u8,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing decision logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file = File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Search settings from the configuration, used for entries that do not record their own
    pub fn configured_search(&self) -> SearchSettings {
        SearchSettings {
            depth: self.config.search.depth,
            use_heuristic: self.config.search.use_heuristic,
        }
    }

    /// Runs the agent on a single position with the given search settings.
    /// Returns the chosen move, the depth searched and the time taken.
    pub fn replay_state(&self, state: &GameState, search: SearchSettings) -> (Option<Direction>, u8, u128) {
        let start_time = Instant::now();
        let mut agent = SearchAgent::new(search.depth);
        let mut simulator = BoardSimulator::new(state.clone());

        let (decision, depth) = if search.use_heuristic {
            (
                agent.compute_decision_ec(&mut simulator),
                crate::agent::EC_SEARCH_DEPTH,
            )
        } else {
            (agent.compute_decision(&mut simulator), agent.search_depth())
        };

        (decision, depth, start_time.elapsed().as_millis())
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let original_move: Direction = entry.chosen_move.parse()?;
        let search = entry.search.unwrap_or_else(|| self.configured_search());
        let (replayed_move, search_depth, computation_time) = self.replay_state(&entry.state(), search);
        let matches = replayed_move == Some(original_move);

        if self.verbose {
            let replayed = replayed_move.map_or("none", |d| d.as_str());
            if matches {
                info!(
                    "Turn {}: MATCH - {} (depth: {}, time: {}ms)",
                    entry.turn, replayed, search_depth, computation_time
                );
            } else {
                warn!(
                    "Turn {}: MISMATCH - Original: {}, Replayed: {} (depth: {}, time: {}ms)",
                    entry.turn,
                    original_move.as_str(),
                    replayed,
                    search_depth,
                    computation_time
                );
            }
        }

        Ok(ReplayResult {
            turn: entry.turn,
            original_move,
            replayed_move,
            matches,
            search_depth,
            computation_time_ms: computation_time,
        })
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                }
            }
        }

        results
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(&self, entries: &[LogEntry], turn_numbers: &[u64]) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", turn_num, e);
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n===========================================================");
        println!("                    REPLAY REPORT");
        println!("===========================================================");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("===========================================================\n");

        if !results.is_empty() {
            let avg_time: f64 =
                results.iter().map(|r| r.computation_time_ms as f64).sum::<f64>() / results.len() as f64;
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("===========================================================");
            println!("                  DETAILED MISMATCHES");
            println!("===========================================================");

            for result in mismatches {
                println!(
                    "Turn {}: {} -> {} (depth: {}, time: {}ms)",
                    result.turn,
                    result.original_move.as_str(),
                    result.replayed_move.map_or("none", |d| d.as_str()),
                    result.search_depth,
                    result.computation_time_ms
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were logged
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expected_moves: &[(u64, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            let actual_move: Direction = entry.chosen_move.parse()?;

            if !acceptable.contains(&actual_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    actual_move.as_str()
                ));
            }
        }

        Ok(())
    }
}
