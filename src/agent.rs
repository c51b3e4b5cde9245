// Expectimax search agent
//
// Each decision builds a fresh game tree that alternates MAX layers (the player's
// four moves) and CHANCE layers (a 2 spawned on every open cell), scores it, and
// throws it away. The tree is explored through a `Simulator`: every branch moves
// the simulator forward and restores it afterwards, so siblings all start from
// the same base state.

use log::{debug, error};

use crate::board;
use crate::config::Config;
use crate::heuristic::{snake_value, SNAKE_WEIGHT};
use crate::simulator::Simulator;
use crate::types::{Direction, GameState, SPAWN_TILE};

/// Lowest configurable search depth
pub const MIN_SEARCH_DEPTH: u8 = 1;
/// Highest configurable search depth
pub const MAX_SEARCH_DEPTH: u8 = 5;
/// Recursion guard: deeper requests are treated as programming errors and not expanded
pub const MAX_RECURSION_DEPTH: u8 = 10;
/// Fixed depth of the heuristic (extramax) decision
pub const EC_SEARCH_DEPTH: u8 = 3;

/// Whose turn a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerType {
    /// The searching player picks a direction
    Max,
    /// The environment spawns a tile
    Chance,
}

/// Game tree node. MAX edges carry the direction taken, CHANCE edges carry none.
#[derive(Debug, Clone)]
pub struct Node {
    pub state: GameState,
    pub player: PlayerType,
    pub children: Vec<(Option<Direction>, Node)>,
}

impl Node {
    pub fn new(state: GameState, player: PlayerType) -> Self {
        Node {
            state,
            player,
            children: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including this one
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(|(_, child)| child.size()).sum::<usize>()
    }
}

/// Malformed simulator responses detected while building a tree
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SearchError {
    #[error("simulator returned a malformed board ({rows} rows)")]
    MalformedBoard { rows: usize },
    #[error("open tile ({row}, {col}) lies outside the board")]
    OpenTileOutOfBounds { row: usize, col: usize },
    #[error("open tile ({row}, {col}) is already occupied")]
    OpenTileOccupied { row: usize, col: usize },
}

/// Tears the tree down when a decision finishes, however it finishes
struct TreeGuard<'a> {
    tree: &'a mut Option<Node>,
}

impl Drop for TreeGuard<'_> {
    fn drop(&mut self) {
        self.tree.take();
    }
}

/// Replaces NaN and infinities with 0
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Bounded-depth expectimax player
pub struct SearchAgent {
    search_depth: u8,
    tree: Option<Node>,
}

impl SearchAgent {
    /// Creates an agent; the depth is clamped to [1, 5]
    pub fn new(search_depth: u8) -> Self {
        SearchAgent {
            search_depth: search_depth.clamp(MIN_SEARCH_DEPTH, MAX_SEARCH_DEPTH),
            tree: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.search.depth)
    }

    pub fn search_depth(&self) -> u8 {
        self.search_depth
    }

    /// Nodes currently held; always 0 between decisions
    pub fn tree_size(&self) -> usize {
        self.tree.as_ref().map_or(0, Node::size)
    }

    /// Picks a move by plain expectimax at the configured depth.
    ///
    /// Returns None when no move is legal or the simulator misbehaves; callers
    /// should treat None as "no move", not retry. The simulator is restored to its
    /// starting board and score before returning.
    pub fn compute_decision<S: Simulator + ?Sized>(&mut self, simulator: &mut S) -> Option<Direction> {
        let depth = self.search_depth;
        self.decide(simulator, depth, Self::expectimax, "expectimax")
    }

    /// Picks a move by extramax (snake heuristic) at depth 3, whatever the configured depth
    pub fn compute_decision_ec<S: Simulator + ?Sized>(&mut self, simulator: &mut S) -> Option<Direction> {
        self.decide(simulator, EC_SEARCH_DEPTH, Self::extramax, "extramax")
    }

    fn decide<S, E>(&mut self, simulator: &mut S, depth: u8, evaluate: E, label: &str) -> Option<Direction>
    where
        S: Simulator + ?Sized,
        E: Fn(&Node) -> (Option<Direction>, f64),
    {
        let origin = simulator.current_state();
        let guard = TreeGuard { tree: &mut self.tree };
        let root = guard.tree.insert(Node::new(origin.clone(), PlayerType::Max));

        let built = Self::build_tree(simulator, root, depth);
        simulator.setup_state(&origin.board, origin.score);

        match built {
            Ok(()) if root.is_terminal() => {
                debug!("{}: no legal move from this position", label);
                None
            }
            Ok(()) => {
                let nodes = root.size();
                let (direction, value) = evaluate(root);
                debug!(
                    "{}: chose {:?} (value {:.1}, depth {}, {} nodes)",
                    label, direction, value, depth, nodes
                );
                direction
            }
            Err(e) => {
                error!("{} search failed: {}", label, e);
                None
            }
        }
    }

    /// Expands `node` depth-first, `depth` layers deep.
    ///
    /// The simulator must hold `node`'s state on entry. On return it may hold any
    /// explored state; callers restore it.
    pub fn build_tree<S: Simulator + ?Sized>(
        simulator: &mut S,
        node: &mut Node,
        depth: u8,
    ) -> Result<(), SearchError> {
        if depth == 0 || depth > MAX_RECURSION_DEPTH {
            return Ok(());
        }

        let origin = simulator.current_state();
        if !board::is_well_formed(&origin.board) {
            return Err(SearchError::MalformedBoard {
                rows: origin.board.len(),
            });
        }

        match node.player {
            PlayerType::Max => {
                for direction in Direction::all() {
                    if simulator.make_move(direction) {
                        let mut child = Node::new(simulator.current_state(), PlayerType::Chance);
                        Self::build_tree(simulator, &mut child, depth - 1)?;
                        node.children.push((Some(direction), child));
                        simulator.setup_state(&origin.board, origin.score);
                    }
                }
            }
            PlayerType::Chance => {
                for pos in simulator.open_tiles() {
                    let mut spawned = board::deep_copy(&origin.board);
                    let cell = spawned
                        .get_mut(pos.row)
                        .and_then(|row| row.get_mut(pos.col))
                        .ok_or(SearchError::OpenTileOutOfBounds {
                            row: pos.row,
                            col: pos.col,
                        })?;
                    if *cell != 0 {
                        return Err(SearchError::OpenTileOccupied {
                            row: pos.row,
                            col: pos.col,
                        });
                    }
                    *cell = SPAWN_TILE;

                    simulator.setup_state(&spawned, origin.score);
                    let mut child = Node::new(simulator.current_state(), PlayerType::Max);
                    Self::build_tree(simulator, &mut child, depth - 1)?;
                    node.children.push((None, child));
                }
            }
        }

        Ok(())
    }

    /// Scores a tree with leaves valued by their raw score
    pub fn expectimax(node: &Node) -> (Option<Direction>, f64) {
        Self::evaluate(node, &|state: &GameState| state.score as f64)
    }

    /// Scores a tree with leaves valued by score plus the weighted snake heuristic
    pub fn extramax(node: &Node) -> (Option<Direction>, f64) {
        Self::evaluate(node, &|state: &GameState| {
            finite_or_zero(state.score as f64) + SNAKE_WEIGHT * finite_or_zero(snake_value(&state.board))
        })
    }

    /// Shared tree walk: CHANCE nodes average, MAX nodes keep the first best child
    fn evaluate<F: Fn(&GameState) -> f64>(node: &Node, leaf: &F) -> (Option<Direction>, f64) {
        if node.is_terminal() {
            return (None, finite_or_zero(leaf(&node.state)));
        }

        match node.player {
            PlayerType::Chance => {
                let count = node.children.len() as f64;
                let total = node
                    .children
                    .iter()
                    .map(|(_, child)| Self::evaluate(child, leaf).1 / count)
                    .sum();
                (None, total)
            }
            PlayerType::Max => {
                let mut best_direction = None;
                let mut best_value = f64::NEG_INFINITY;
                for (direction, child) in &node.children {
                    let (_, value) = Self::evaluate(child, leaf);
                    if value > best_value {
                        best_direction = *direction;
                        best_value = value;
                    }
                }
                (best_direction, best_value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::GameSession;
    use crate::simulator::BoardSimulator;
    use crate::types::{Board, Position};

    fn locked_board() -> Board {
        vec![
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
        ]
    }

    fn leaf(score: u64) -> Node {
        Node::new(GameState::new(vec![vec![0; 4]; 4], score), PlayerType::Max)
    }

    #[test]
    fn test_depth_is_clamped() {
        assert_eq!(SearchAgent::new(0).search_depth(), 1);
        assert_eq!(SearchAgent::new(3).search_depth(), 3);
        assert_eq!(SearchAgent::new(9).search_depth(), 5);
    }

    #[test]
    fn test_prefers_merging_move() {
        let board = vec![vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
        let mut sim = BoardSimulator::from_board(&board, 0);
        let mut agent = SearchAgent::new(1);
        // Left and Right both merge for 4; Left comes first in encoding order
        assert_eq!(agent.compute_decision(&mut sim), Some(Direction::Left));
    }

    #[test]
    fn test_ties_go_to_first_direction() {
        let board = vec![vec![0; 4], vec![0, 2, 0, 0], vec![0; 4], vec![0; 4]];
        let mut sim = BoardSimulator::from_board(&board, 0);
        let mut agent = SearchAgent::new(1);
        assert_eq!(agent.compute_decision(&mut sim), Some(Direction::Up));
    }

    #[test]
    fn test_game_over_board_has_no_decision() {
        let mut sim = BoardSimulator::from_board(&locked_board(), 100);
        let mut agent = SearchAgent::new(3);
        assert_eq!(agent.compute_decision(&mut sim), None);
        assert_eq!(agent.compute_decision_ec(&mut sim), None);
    }

    #[test]
    fn test_tree_is_torn_down_and_simulator_restored() {
        let mut session = GameSession::seeded(4, 21);
        let before = session.current_state();
        let mut agent = SearchAgent::new(2);

        let decision = agent.compute_decision(&mut session);
        assert!(decision.is_some());
        assert_eq!(agent.tree_size(), 0);
        assert_eq!(session.current_state(), before);
    }

    #[test]
    fn test_build_tree_layers() {
        let board = vec![vec![2, 0], vec![0, 0]];
        let mut sim = BoardSimulator::from_board(&board, 0);
        let mut root = Node::new(sim.current_state(), PlayerType::Max);
        SearchAgent::build_tree(&mut sim, &mut root, 2).unwrap();

        // Only Down and Right move a lone tile in the top-left corner
        let dirs: Vec<Option<Direction>> = root.children.iter().map(|(d, _)| *d).collect();
        assert_eq!(dirs, vec![Some(Direction::Down), Some(Direction::Right)]);

        for (_, chance) in &root.children {
            assert_eq!(chance.player, PlayerType::Chance);
            assert_eq!(chance.children.len(), 3);
            for (edge, max) in &chance.children {
                assert!(edge.is_none());
                assert_eq!(max.player, PlayerType::Max);
                assert!(max.is_terminal());
                assert_eq!(board::count_tiles(&max.state.board), 2);
            }
        }
    }

    #[test]
    fn test_recursion_guard_stops_expansion() {
        let board = vec![vec![2, 0], vec![0, 0]];
        let mut sim = BoardSimulator::from_board(&board, 0);
        let mut root = Node::new(sim.current_state(), PlayerType::Max);
        SearchAgent::build_tree(&mut sim, &mut root, MAX_RECURSION_DEPTH + 1).unwrap();
        assert!(root.is_terminal());
    }

    #[test]
    fn test_chance_nodes_average_children() {
        let mut chance = Node::new(GameState::new(vec![vec![0; 4]; 4], 0), PlayerType::Chance);
        chance.children.push((None, leaf(2)));
        chance.children.push((None, leaf(6)));

        let mut root = leaf(0);
        root.children.push((Some(Direction::Down), chance));
        root.children.push((Some(Direction::Right), leaf(3)));

        assert_eq!(SearchAgent::expectimax(&root), (Some(Direction::Down), 4.0));
    }

    #[test]
    fn test_extramax_adds_weighted_snake() {
        let mut board = vec![vec![0; 4]; 4];
        board[0][1] = 2;
        let node = Node::new(GameState::new(board, 10), PlayerType::Chance);
        // weight of (0, 1) is 2
        assert_eq!(SearchAgent::extramax(&node), (None, 10.0 + 4.0 * 4.0));
    }

    #[test]
    fn test_non_finite_heuristic_is_coerced() {
        let n = 33;
        let mut board = vec![vec![0; n]; n];
        board[n - 1][n - 1] = 2;
        let node = Node::new(GameState::new(board, 10), PlayerType::Max);
        assert_eq!(SearchAgent::extramax(&node), (None, 10.0));
    }

    struct JaggedSimulator;

    impl Simulator for JaggedSimulator {
        fn current_state(&self) -> GameState {
            GameState::new(vec![vec![2, 0, 0], vec![0]], 0)
        }
        fn make_move(&mut self, _direction: Direction) -> bool {
            true
        }
        fn setup_state(&mut self, _board: &Board, _score: u64) {}
        fn open_tiles(&self) -> Vec<Position> {
            vec![Position::new(0, 1)]
        }
    }

    #[test]
    fn test_malformed_simulator_yields_no_decision() {
        let mut agent = SearchAgent::new(3);
        assert_eq!(agent.compute_decision(&mut JaggedSimulator), None);
        assert_eq!(agent.tree_size(), 0);
    }

    struct LyingSimulator {
        inner: BoardSimulator,
    }

    impl Simulator for LyingSimulator {
        fn current_state(&self) -> GameState {
            self.inner.current_state()
        }
        fn make_move(&mut self, direction: Direction) -> bool {
            self.inner.make_move(direction)
        }
        fn setup_state(&mut self, board: &Board, score: u64) {
            self.inner.setup_state(board, score)
        }
        fn open_tiles(&self) -> Vec<Position> {
            vec![Position::new(7, 7)]
        }
    }

    #[test]
    fn test_out_of_bounds_open_tile_is_an_error() {
        let mut sim = LyingSimulator {
            inner: BoardSimulator::from_board(&vec![vec![2, 0], vec![0, 0]], 0),
        };
        let mut root = Node::new(sim.current_state(), PlayerType::Chance);
        assert_eq!(
            SearchAgent::build_tree(&mut sim, &mut root, 1),
            Err(SearchError::OpenTileOutOfBounds { row: 7, col: 7 })
        );

        let mut agent = SearchAgent::new(2);
        assert_eq!(agent.compute_decision(&mut sim), None);
        assert_eq!(sim.current_state().board, vec![vec![2, 0], vec![0, 0]]);
    }
}
