// Core 2048 types shared by the board engine, the game session and the agent

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tile matrix, row-major. 0 is an empty cell, anything else is a power of two.
pub type Board = Vec<Vec<u32>>;

/// Value of every spawned tile
pub const SPAWN_TILE: u32 = 2;

/// Cell coordinate on the board
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

/// The four move directions.
///
/// The numeric encoding is public and fixed: `0 = up, 1 = left, 2 = down, 3 = right`.
/// Search iterates directions in this order, so it also decides tie-breaks.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Left = 1,
    Down = 2,
    Right = 3,
}

impl Direction {
    /// Returns all directions in encoding order
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Left, Direction::Down, Direction::Right]
    }

    /// Decodes a direction from its public index
    pub fn from_index(idx: u8) -> Option<Direction> {
        match idx {
            0 => Some(Direction::Up),
            1 => Some(Direction::Left),
            2 => Some(Direction::Down),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    /// Public index of this direction
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Converts direction to its lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Left => "left",
            Direction::Down => "down",
            Direction::Right => "right",
        }
    }

    /// Number of clockwise quarter turns that bring this direction onto "left".
    ///
    /// One clockwise turn carries the bottom row into column 0, three carry the top row there.
    pub fn quarter_turns(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Down => 1,
            Direction::Right => 2,
            Direction::Up => 3,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "left" => Ok(Direction::Left),
            "down" => Ok(Direction::Down),
            "right" => Ok(Direction::Right),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }
}

/// Board plus accumulated score
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub score: u64,
}

impl GameState {
    pub fn new(board: Board, score: u64) -> Self {
        GameState { board, score }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "score: {}", self.score)?;
        for row in &self.board {
            let cells: Vec<String> = row
                .iter()
                .map(|&v| if v == 0 { format!("{:>6}", ".") } else { format!("{:>6}", v) })
                .collect();
            writeln!(f, "{}", cells.join(""))?;
        }
        Ok(())
    }
}

/// Result of executing one directional move on a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub board: Board,
    pub score: u64,
    pub moved: bool,
    /// Cells holding a freshly merged tile, in the board's own orientation
    pub merged: Vec<Position>,
}

/// Result of a merge pass over an already-compacted board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub board: Board,
    pub score: u64,
    pub merged: Vec<Position>,
}
