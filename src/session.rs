// Game session: the single owner of the live 2048 state
//
// Wraps the pure board engine with score bookkeeping, bounded undo/redo history,
// random tile spawning and best-effort persistence. Persistence never fails a
// caller: storage errors are logged and the session carries on in memory.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

use crate::board;
use crate::config::Config;
use crate::simulator::Simulator;
use crate::storage::{self, FileStore, StateStore};
use crate::types::{Board, Direction, GameState, Position, SPAWN_TILE};

/// Default key of the persisted record
pub const STORAGE_KEY: &str = "2048_game_state";

/// Where and whether the session persists itself
struct Persistence {
    store: Box<dyn StateStore>,
    key: String,
}

/// Live game with history
pub struct GameSession {
    board_size: usize,
    win_tile: u32,
    state: GameState,
    undo_stack: VecDeque<GameState>,
    redo_stack: VecDeque<GameState>,
    history_limit: usize,
    rng: StdRng,
    persistence: Option<Persistence>,
}

impl GameSession {
    /// Creates an in-memory session with a fresh board of the given size
    pub fn new(board_size: usize, rng: StdRng) -> Self {
        let mut session = GameSession {
            board_size,
            win_tile: 2048,
            state: GameState::new(board::create_empty_board(board_size), 0),
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            history_limit: 256,
            rng,
            persistence: None,
        };
        session.setup_state(None, 0);
        session
    }

    /// Creates an in-memory session with a seeded RNG
    pub fn seeded(board_size: usize, seed: u64) -> Self {
        Self::new(board_size, StdRng::seed_from_u64(seed))
    }

    /// Builds a session from configuration, resuming a persisted game when one exists
    pub fn from_config(config: &Config) -> Self {
        let rng = match config.spawn.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let session = Self::new(config.board.size, rng)
            .with_history_limit(config.history.max_entries)
            .with_win_tile(config.board.win_tile);

        if config.persistence.enabled {
            session.with_store(
                Box::new(FileStore::new(&config.persistence.directory)),
                &config.persistence.key,
            )
        } else {
            session
        }
    }

    /// Bounds the undo and redo stacks (at least one entry is kept)
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn with_win_tile(mut self, win_tile: u32) -> Self {
        self.win_tile = win_tile;
        self
    }

    /// Attaches durable storage and resumes the game saved under `key`, if any.
    ///
    /// An unreadable or corrupt record is logged and ignored; the current fresh
    /// game is kept in that case.
    pub fn with_store(mut self, store: Box<dyn StateStore>, key: &str) -> Self {
        match storage::load_state(store.as_ref(), key) {
            Ok(Some(saved)) => {
                info!("Resuming saved game (score {})", saved.score);
                self.state = saved.into_state();
                self.board_size = self.state.board.len();
                self.undo_stack.clear();
                self.redo_stack.clear();
            }
            Ok(None) => debug!("No saved game under '{}'", key),
            Err(e) => warn!("Failed to load saved game, starting fresh: {}", e),
        }

        self.persistence = Some(Persistence {
            store,
            key: key.to_string(),
        });
        self
    }

    /// Resets the live state and clears both history stacks.
    ///
    /// With no board, an empty board of the session size gets two random tiles.
    /// A given board is copied and its size becomes the session size.
    pub fn setup_state(&mut self, initial: Option<&Board>, score: u64) {
        self.undo_stack.clear();
        self.redo_stack.clear();

        match initial {
            Some(b) => {
                self.state = GameState::new(board::deep_copy(b), score);
                self.board_size = b.len();
            }
            None => {
                self.state = GameState::new(board::create_empty_board(self.board_size), score);
                self.place_random_tile();
                self.place_random_tile();
            }
        }
    }

    /// Copy of the live state
    pub fn current_state(&self) -> GameState {
        self.state.clone()
    }

    pub fn board(&self) -> &Board {
        &self.state.board
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Moves without spawning.
    ///
    /// The pre-move state is pushed onto the undo stack even when the move turns
    /// out to be a no-op, and the redo stack is always cleared.
    pub fn make_move(&mut self, direction: Direction) -> bool {
        let snapshot = self.state.clone();
        Self::push_bounded(&mut self.undo_stack, snapshot, self.history_limit);
        self.redo_stack.clear();

        let outcome = board::execute_move(&self.state.board, self.state.score, direction);
        if outcome.moved {
            self.state = GameState::new(outcome.board, outcome.score);
        }
        outcome.moved
    }

    /// Player entry point: move, then spawn a tile and save if anything moved
    pub fn move_and_place(&mut self, direction: Direction) -> bool {
        if !self.make_move(direction) {
            return false;
        }
        self.place_random_tile();
        self.save();
        true
    }

    /// Puts a 2 on a uniformly chosen empty cell; None if the board is full
    pub fn place_random_tile(&mut self) -> Option<Position> {
        let open = board::open_tiles(&self.state.board);
        if open.is_empty() {
            return None;
        }
        let pos = open[self.rng.random_range(0..open.len())];
        self.state.board[pos.row][pos.col] = SPAWN_TILE;
        Some(pos)
    }

    pub fn open_tiles(&self) -> Vec<Position> {
        board::open_tiles(&self.state.board)
    }

    /// Steps back one state; false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.state, previous);
        Self::push_bounded(&mut self.redo_stack, current, self.history_limit);
        self.save();
        true
    }

    /// Re-applies the last undone state; false when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.state, next);
        Self::push_bounded(&mut self.undo_stack, current, self.history_limit);
        self.save();
        true
    }

    pub fn game_over(&self) -> bool {
        board::is_game_over(&self.state.board)
    }

    /// True once any tile has reached the win tile
    pub fn has_won(&self) -> bool {
        board::highest_tile(&self.state.board) >= self.win_tile
    }

    /// Starts a new game and saves it
    pub fn reset(&mut self) {
        self.setup_state(None, 0);
        self.save();
    }

    /// Writes the live state to storage, logging any failure
    pub fn save(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(e) = storage::save_state(persistence.store.as_ref(), &persistence.key, &self.state) {
            warn!("Failed to save game state: {}", e);
        }
    }

    /// Deletes the persisted record, if any
    pub fn clear_saved_state(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(e) = persistence.store.remove(&persistence.key) {
            warn!("Failed to clear saved game state: {}", e);
        }
    }

    fn push_bounded(stack: &mut VecDeque<GameState>, state: GameState, limit: usize) {
        stack.push_back(state);
        while stack.len() > limit {
            stack.pop_front();
        }
    }
}

impl Simulator for GameSession {
    fn current_state(&self) -> GameState {
        GameSession::current_state(self)
    }

    fn make_move(&mut self, direction: Direction) -> bool {
        GameSession::make_move(self, direction)
    }

    fn setup_state(&mut self, board: &Board, score: u64) {
        GameSession::setup_state(self, Some(board), score)
    }

    fn open_tiles(&self) -> Vec<Position> {
        GameSession::open_tiles(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn scenario_board() -> Board {
        vec![vec![2, 2, 0, 0], vec![0, 0, 0, 0], vec![0, 0, 0, 0], vec![0, 0, 0, 0]]
    }

    #[test]
    fn test_fresh_session_has_two_tiles() {
        let session = GameSession::seeded(4, 1);
        assert_eq!(board::count_tiles(session.board()), 2);
        assert!(session.board().iter().flatten().all(|&v| v == 0 || v == SPAWN_TILE));
        assert_eq!(session.score(), 0);
        assert_eq!(session.undo_len(), 0);
        assert_eq!(session.redo_len(), 0);
    }

    #[test]
    fn test_setup_state_copies_board_and_clears_history() {
        let mut session = GameSession::seeded(4, 2);
        session.make_move(Direction::Left);
        session.setup_state(Some(&scenario_board()), 10);

        assert_eq!(session.board(), &scenario_board());
        assert_eq!(session.score(), 10);
        assert_eq!(session.undo_len(), 0);
        assert_eq!(session.redo_len(), 0);
    }

    #[test]
    fn test_make_move_scenario() {
        let mut session = GameSession::seeded(4, 3);
        session.setup_state(Some(&scenario_board()), 0);

        assert!(session.make_move(Direction::Left));
        assert_eq!(session.board()[0], vec![4, 0, 0, 0]);
        assert_eq!(board::count_tiles(session.board()), 1);
        assert_eq!(session.score(), 4);
    }

    #[test]
    fn test_noop_move_still_records_history() {
        let mut session = GameSession::seeded(4, 4);
        session.setup_state(Some(&scenario_board()), 0);

        assert!(!session.make_move(Direction::Up));
        assert_eq!(session.board(), &scenario_board());
        assert_eq!(session.undo_len(), 1);
    }

    #[test]
    fn test_move_and_place_spawns_only_on_change() {
        let mut session = GameSession::seeded(4, 5);
        session.setup_state(Some(&scenario_board()), 0);

        assert!(!session.move_and_place(Direction::Up));
        assert_eq!(board::count_tiles(session.board()), 2);

        assert!(session.move_and_place(Direction::Left));
        assert_eq!(board::count_tiles(session.board()), 2);
        assert_eq!(session.score(), 4);
    }

    #[test]
    fn test_undo_redo_symmetry() {
        let mut session = GameSession::seeded(4, 6);
        let s0 = session.current_state();

        let dir = Direction::all()
            .into_iter()
            .find(|&d| board::apply_move(&s0, d).is_some())
            .expect("a fresh board always has a legal move");
        assert!(session.move_and_place(dir));
        let s1 = session.current_state();

        assert!(session.undo());
        assert_eq!(session.current_state(), s0);
        assert!(session.redo());
        assert_eq!(session.current_state(), s1);
    }

    #[test]
    fn test_undo_redo_on_empty_stacks() {
        let mut session = GameSession::seeded(4, 7);
        let before = session.current_state();
        assert!(!session.undo());
        assert!(!session.redo());
        assert_eq!(session.current_state(), before);
    }

    #[test]
    fn test_move_clears_redo() {
        let mut session = GameSession::seeded(4, 8);
        session.setup_state(Some(&scenario_board()), 0);
        session.make_move(Direction::Left);
        session.undo();
        assert_eq!(session.redo_len(), 1);

        session.make_move(Direction::Right);
        assert_eq!(session.redo_len(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut session = GameSession::seeded(4, 9).with_history_limit(3);
        session.setup_state(Some(&scenario_board()), 0);
        for _ in 0..10 {
            session.make_move(Direction::Up);
        }
        assert_eq!(session.undo_len(), 3);
    }

    #[test]
    fn test_reset_starts_fresh() {
        let mut session = GameSession::seeded(4, 10);
        session.setup_state(Some(&scenario_board()), 99);
        session.make_move(Direction::Left);
        session.reset();

        assert_eq!(session.score(), 0);
        assert_eq!(board::count_tiles(session.board()), 2);
        assert_eq!(session.undo_len(), 0);
    }

    #[test]
    fn test_has_won() {
        let mut session = GameSession::seeded(4, 11).with_win_tile(8);
        session.setup_state(Some(&vec![vec![4, 4, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]]), 0);
        assert!(!session.has_won());
        session.make_move(Direction::Left);
        assert!(session.has_won());
    }

    #[test]
    fn test_place_random_tile_on_full_board() {
        let full = vec![vec![2, 4], vec![4, 2]];
        let mut session = GameSession::seeded(2, 12);
        session.setup_state(Some(&full), 0);
        assert!(session.place_random_tile().is_none());
        assert!(session.game_over());
    }

    #[test]
    fn test_spawn_is_reproducible_with_seed() {
        let a = GameSession::seeded(4, 42);
        let b = GameSession::seeded(4, 42);
        assert_eq!(a.current_state(), b.current_state());
    }

    #[test]
    fn test_session_persists_and_resumes() {
        let store = MemoryStore::new();
        let mut session = GameSession::seeded(4, 13).with_store(Box::new(store.clone()), STORAGE_KEY);
        session.setup_state(Some(&scenario_board()), 0);
        assert!(session.move_and_place(Direction::Left));
        let saved = session.current_state();

        let resumed = GameSession::seeded(4, 14).with_store(Box::new(store.clone()), STORAGE_KEY);
        assert_eq!(resumed.current_state(), saved);
        assert_eq!(resumed.undo_len(), 0);

        resumed.clear_saved_state();
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_save_falls_back_to_fresh_game() {
        let store = MemoryStore::new();
        store.write(STORAGE_KEY, "definitely not json").unwrap();

        let session = GameSession::seeded(4, 15).with_store(Box::new(store), STORAGE_KEY);
        assert_eq!(board::count_tiles(session.board()), 2);
        assert_eq!(session.score(), 0);
    }
}
