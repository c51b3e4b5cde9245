// Snake heuristic for the extramax evaluator
//
// Weights run along a boustrophedon path: row 0 left-to-right gets 2^0..2^(n-1),
// row 1 continues right-to-left with 2^n..2^(2n-1), and so on. Boards that keep
// large tiles strung along that path in order score highest.

use crate::types::Board;

/// Multiplier applied to the snake value at extramax leaves
pub const SNAKE_WEIGHT: f64 = 4.0;

/// Weight matrix for an n×n board
pub fn make_snake(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|row| {
            let base = (row * n) as i32;
            (0..n)
                .map(|col| {
                    let step = if row % 2 == 0 { col } else { n - 1 - col };
                    2f64.powi(base + step as i32)
                })
                .collect()
        })
        .collect()
}

/// Weighted sum of tiles along the snake path
pub fn snake_value(board: &Board) -> f64 {
    let weights = make_snake(board.len());
    board
        .iter()
        .zip(weights.iter())
        .map(|(tiles, ws)| {
            tiles
                .iter()
                .zip(ws.iter())
                .map(|(&tile, &w)| w * f64::from(tile))
                .sum::<f64>()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_snake_4x4() {
        let snake = make_snake(4);
        assert_eq!(snake[0], vec![1.0, 2.0, 4.0, 8.0]);
        assert_eq!(snake[1], vec![128.0, 64.0, 32.0, 16.0]);
        assert_eq!(snake[2], vec![256.0, 512.0, 1024.0, 2048.0]);
        assert_eq!(snake[3], vec![32768.0, 16384.0, 8192.0, 4096.0]);
    }

    #[test]
    fn test_snake_value_weights_tiles() {
        let mut board = vec![vec![0; 4]; 4];
        board[0][0] = 2;
        assert_eq!(snake_value(&board), 2.0);

        board[3][0] = 4;
        assert_eq!(snake_value(&board), 2.0 + 4.0 * 32768.0);
    }

    #[test]
    fn test_corner_anchor_beats_scattered() {
        let anchored = vec![vec![0; 4], vec![0; 4], vec![0; 4], vec![64, 32, 16, 8]];
        let scattered = vec![vec![64, 0, 0, 8], vec![0; 4], vec![0; 4], vec![0, 32, 16, 0]];
        assert!(snake_value(&anchored) > snake_value(&scattered));
    }
}
