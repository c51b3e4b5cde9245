// Pure 2048 board engine
//
// Every function here takes a board by reference and returns a fresh value.
// Boards must be square and non-empty; jagged or zero-sized boards are a
// precondition violation and are not checked on the hot path (see `is_well_formed`).
//
// All four directions share one "slide left" implementation: the board is rotated
// clockwise by the direction's quarter-turn count, slid and merged, then rotated back.

use crate::types::{Board, Direction, GameState, MergeOutcome, MoveOutcome, Position};

/// Creates an n×n board of zeros
pub fn create_empty_board(n: usize) -> Board {
    vec![vec![0; n]; n]
}

/// Returns an independent copy of the board
pub fn deep_copy(board: &Board) -> Board {
    board.iter().map(|row| row.to_vec()).collect()
}

/// Rotates the board 90° clockwise
pub fn rotate_board(board: &Board) -> Board {
    let n = board.len();
    (0..n)
        .map(|r| (0..n).map(|c| board[n - 1 - c][r]).collect())
        .collect()
}

/// Rotates the board clockwise `turns` times
fn rotate_times(board: &Board, turns: usize) -> Board {
    let mut rotated = deep_copy(board);
    for _ in 0..turns % 4 {
        rotated = rotate_board(&rotated);
    }
    rotated
}

/// Where a cell lands after one clockwise rotation of an n×n board
fn rotate_position(pos: Position, n: usize) -> Position {
    Position::new(pos.col, n - 1 - pos.row)
}

/// Compacts a single row leftward, keeping tile order
fn slide_row(row: &mut [u32]) {
    let mut write = 0;
    for read in 0..row.len() {
        if row[read] != 0 {
            row.swap(write, read);
            write += 1;
        }
    }
}

/// Slides every row's tiles to the left without merging
pub fn move_tiles(board: &Board) -> Board {
    let mut moved = deep_copy(board);
    for row in moved.iter_mut() {
        slide_row(row);
    }
    moved
}

/// Merges equal neighbours left-to-right on an already-slid board.
///
/// After each merge the row is slid again. The scan keeps going from the next
/// cell, so a freshly merged tile is never merged a second time in the same pass:
/// `[2, 2, 2, 0]` becomes `[4, 2, 0, 0]`, not `[4, 4, 0, 0]`.
pub fn merge_tiles(board: &Board, score: u64) -> MergeOutcome {
    let mut merged_board = deep_copy(board);
    let mut new_score = score;
    let mut merged = Vec::new();

    for (i, row) in merged_board.iter_mut().enumerate() {
        for k in 0..row.len().saturating_sub(1) {
            if row[k] != 0 && row[k] == row[k + 1] {
                row[k] *= 2;
                row[k + 1] = 0;
                new_score += u64::from(row[k]);
                merged.push(Position::new(i, k));
                slide_row(row);
            }
        }
    }

    MergeOutcome {
        board: merged_board,
        score: new_score,
        merged,
    }
}

/// True if sliding left would change the board in its current orientation
pub fn can_move(board: &Board) -> bool {
    board.iter().any(|row| {
        row.windows(2)
            .any(|pair| (pair[0] == 0 && pair[1] > 0) || (pair[0] != 0 && pair[0] == pair[1]))
    })
}

/// Empty cells in row-major order
pub fn open_tiles(board: &Board) -> Vec<Position> {
    board
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &v)| v == 0)
                .map(move |(j, _)| Position::new(i, j))
        })
        .collect()
}

/// Number of non-empty cells
pub fn count_tiles(board: &Board) -> usize {
    board.iter().flatten().filter(|&&v| v != 0).count()
}

/// Largest tile on the board, 0 for an empty board
pub fn highest_tile(board: &Board) -> u32 {
    board.iter().flatten().copied().max().unwrap_or(0)
}

/// Largest tile a well-formed board may hold; merging two of them still fits in a `u32`
pub const MAX_TILE: u32 = 1 << 30;

/// Checks the engine's preconditions: non-empty, square, cells 0 or a power of two
/// no larger than `MAX_TILE`
pub fn is_well_formed(board: &Board) -> bool {
    let n = board.len();
    n > 0
        && board.iter().all(|row| row.len() == n)
        && board
            .iter()
            .flatten()
            .all(|&v| v == 0 || (v.is_power_of_two() && v <= MAX_TILE))
}

/// Executes a full move in the given direction.
///
/// When nothing can slide or merge the original board and score come back
/// with `moved == false`; callers must not spawn a tile for that.
pub fn execute_move(board: &Board, score: u64, direction: Direction) -> MoveOutcome {
    let turns = direction.quarter_turns();
    let back = (4 - turns) % 4;
    let rotated = rotate_times(board, turns);

    if !can_move(&rotated) {
        return MoveOutcome {
            board: deep_copy(board),
            score,
            moved: false,
            merged: Vec::new(),
        };
    }

    let slid = move_tiles(&rotated);
    let merge = merge_tiles(&slid, score);

    let n = board.len();
    let merged = merge
        .merged
        .into_iter()
        .map(|pos| (0..back).fold(pos, |p, _| rotate_position(p, n)))
        .collect();

    MoveOutcome {
        board: rotate_times(&merge.board, back),
        score: merge.score,
        moved: true,
        merged,
    }
}

/// Pure simulate step: the state after moving, or None if the move does nothing
pub fn apply_move(state: &GameState, direction: Direction) -> Option<GameState> {
    let outcome = execute_move(&state.board, state.score, direction);
    if outcome.moved {
        Some(GameState::new(outcome.board, outcome.score))
    } else {
        None
    }
}

/// True when the board is full and no direction can move
pub fn is_game_over(board: &Board) -> bool {
    if !open_tiles(board).is_empty() {
        return false;
    }

    let mut current = deep_copy(board);
    for _ in 0..4 {
        if can_move(&current) {
            return false;
        }
        current = rotate_board(&current);
    }
    true
}
