// Scenario tests for the game session
//
// Exercises the session through its public surface:
// - Deterministic setup and the left-move scenario
// - Undo/redo symmetry over a played sequence
// - Resuming a game persisted to disk
// - Falling back to a fresh game on a corrupt record
// - Playing on when the save location is unusable

use std::fs;
use std::path::PathBuf;

use twenty48::board;
use twenty48::session::{GameSession, STORAGE_KEY};
use twenty48::storage::{FileStore, MemoryStore, StateStore};
use twenty48::types::Direction;

/// Fresh scratch directory under the system temp dir
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("twenty48-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_scenario_left_merge_through_session() {
    let mut session = GameSession::seeded(4, 3);
    let board = vec![vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
    session.setup_state(Some(&board), 0);

    assert!(session.make_move(Direction::Left));
    assert_eq!(session.board()[0], vec![4, 0, 0, 0]);
    assert_eq!(session.score(), 4);
    assert_eq!(session.open_tiles().len(), 15);
}

#[test]
fn test_move_and_place_spawns_exactly_one_tile() {
    let mut session = GameSession::seeded(4, 21);
    let board = vec![vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
    session.setup_state(Some(&board), 0);

    assert!(session.move_and_place(Direction::Left));
    assert_eq!(board::count_tiles(session.board()), 2);
    assert_eq!(session.score(), 4);
}

#[test]
fn test_undo_redo_walks_history_both_ways() {
    let mut session = GameSession::seeded(4, 42);
    let mut history = vec![session.current_state()];

    for direction in [Direction::Left, Direction::Up, Direction::Right, Direction::Down] {
        // A refused move still records a history entry
        session.move_and_place(direction);
        history.push(session.current_state());
    }

    for expected in history.iter().rev().skip(1) {
        assert!(session.undo());
        assert_eq!(&session.current_state(), expected);
    }
    assert!(!session.undo());

    for expected in history.iter().skip(1) {
        assert!(session.redo());
        assert_eq!(&session.current_state(), expected);
    }
    assert!(!session.redo());
}

#[test]
fn test_new_move_clears_redo() {
    let mut session = GameSession::seeded(4, 8);
    let board = vec![vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![4, 0, 0, 0]];
    session.setup_state(Some(&board), 0);

    session.make_move(Direction::Left);
    session.undo();
    assert_eq!(session.redo_len(), 1);

    session.make_move(Direction::Down);
    assert_eq!(session.redo_len(), 0);
}

#[test]
fn test_game_resumes_from_disk() {
    let dir = scratch_dir("resume");

    let saved = {
        let mut session = GameSession::seeded(4, 5).with_store(Box::new(FileStore::new(&dir)), STORAGE_KEY);
        let board = vec![vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
        session.setup_state(Some(&board), 0);
        assert!(session.move_and_place(Direction::Left));
        session.current_state()
    };

    let raw = fs::read_to_string(dir.join(format!("{}.json", STORAGE_KEY))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["score"], 4);
    assert!(json["tileMatrix"].is_array());
    assert!(json["timestamp"].as_i64().unwrap() > 0);

    let resumed = GameSession::seeded(4, 99).with_store(Box::new(FileStore::new(&dir)), STORAGE_KEY);
    assert_eq!(resumed.current_state(), saved);
    assert_eq!(resumed.undo_len(), 0);

    resumed.clear_saved_state();
    assert!(FileStore::new(&dir).read(STORAGE_KEY).unwrap().is_none());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_corrupt_record_starts_fresh_game() {
    let dir = scratch_dir("corrupt");
    let store = FileStore::new(&dir);
    store
        .write(STORAGE_KEY, r#"{"tileMatrix":[[2,2],[4]],"score":10,"timestamp":0}"#)
        .unwrap();

    let session = GameSession::seeded(4, 5).with_store(Box::new(FileStore::new(&dir)), STORAGE_KEY);
    assert_eq!(session.board_size(), 4);
    assert_eq!(session.score(), 0);
    assert_eq!(board::count_tiles(session.board()), 2);

    store.write(STORAGE_KEY, "not json at all").unwrap();
    let session = GameSession::seeded(4, 5).with_store(Box::new(FileStore::new(&dir)), STORAGE_KEY);
    assert_eq!(session.score(), 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_oversized_saved_tiles_start_fresh_game() {
    let store = MemoryStore::new();
    store
        .write(
            STORAGE_KEY,
            r#"{"tileMatrix":[[2147483648,2147483648],[0,0]],"score":0,"timestamp":1}"#,
        )
        .unwrap();

    let mut session = GameSession::seeded(4, 12).with_store(Box::new(store.clone()), STORAGE_KEY);
    assert_eq!(session.board_size(), 4);
    assert_eq!(board::count_tiles(session.board()), 2);

    let board = vec![vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
    session.setup_state(Some(&board), 0);
    assert!(session.make_move(Direction::Left));
    assert_eq!(session.score(), 4);
}

#[test]
fn test_failed_save_does_not_interrupt_play() {
    let dir = scratch_dir("blocked");
    fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("not-a-directory");
    fs::write(&blocker, "occupied").unwrap();

    let mut session = GameSession::seeded(4, 6).with_store(Box::new(FileStore::new(&blocker)), STORAGE_KEY);
    let board = vec![vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
    session.setup_state(Some(&board), 0);

    assert!(session.move_and_place(Direction::Left));
    assert_eq!(session.score(), 4);
    assert_eq!(session.board()[0][0], 4);
    assert_eq!(board::count_tiles(session.board()), 2);

    assert!(session.undo());
    assert_eq!(session.current_state().board, board);
    session.reset();
    assert_eq!(session.score(), 0);
    assert!(FileStore::new(&blocker).write(STORAGE_KEY, "{}").is_err());

    let _ = fs::remove_dir_all(&dir);
}
