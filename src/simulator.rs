// The narrow game surface the search agent explores through
//
// The agent never touches a board directly: it reads the current state, tries a
// move, and sets hypothetical states up again. `GameSession` implements this
// trait; `BoardSimulator` implements it over a detached snapshot so that a search
// leaves the live session untouched.

use crate::board;
use crate::types::{Board, Direction, GameState, Position};

/// Game surface needed by the search agent
pub trait Simulator {
    /// Copy of the current board and score
    fn current_state(&self) -> GameState;
    /// Applies a move without spawning a tile; false if nothing moved
    fn make_move(&mut self, direction: Direction) -> bool;
    /// Replaces the current board and score
    fn setup_state(&mut self, board: &Board, score: u64);
    /// Empty cells of the current board, row-major
    fn open_tiles(&self) -> Vec<Position>;
}

/// History-free simulator over a snapshot of a game
#[derive(Debug, Clone)]
pub struct BoardSimulator {
    state: GameState,
}

impl BoardSimulator {
    pub fn new(state: GameState) -> Self {
        BoardSimulator { state }
    }

    pub fn from_board(board: &Board, score: u64) -> Self {
        BoardSimulator {
            state: GameState::new(board::deep_copy(board), score),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }
}

impl From<GameState> for BoardSimulator {
    fn from(state: GameState) -> Self {
        BoardSimulator::new(state)
    }
}

impl Simulator for BoardSimulator {
    fn current_state(&self) -> GameState {
        self.state.clone()
    }

    fn make_move(&mut self, direction: Direction) -> bool {
        match board::apply_move(&self.state, direction) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }

    fn setup_state(&mut self, board: &Board, score: u64) {
        self.state = GameState::new(board::deep_copy(board), score);
    }

    fn open_tiles(&self) -> Vec<Position> {
        board::open_tiles(&self.state.board)
    }
}
