// Self-play benchmark: the search agent plays many independent games in parallel
//
// Usage:
//   cargo run --release --bin selfplay -- [--games N] [--depth D] [--ec] [--seed S]
//
// Game g is seeded with S + g, so a fixed --seed reproduces the whole run.

use log::info;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::env;
use std::process;
use std::time::Instant;

use twenty48::agent::SearchAgent;
use twenty48::board;
use twenty48::config::Config;
use twenty48::session::GameSession;
use twenty48::simulator::BoardSimulator;

struct GameResult {
    seed: u64,
    score: u64,
    moves: u64,
    highest_tile: u32,
}

fn print_usage() {
    eprintln!("2048 Self-Play");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  selfplay [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --games <n>     Number of games to play (default: 8)");
    eprintln!("  --depth <d>     Search depth, clamped to [1, 5] (default: search.depth)");
    eprintln!("  --ec            Use the snake-heuristic search");
    eprintln!("  --seed <s>      Base RNG seed (default: random)");
    eprintln!("  --config <path> Path to Game.toml (default: Game.toml)");
    eprintln!("  --help          Show this help message");
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T
where
    T::Err: std::fmt::Display,
{
    let Some(raw) = args.get(i + 1) else {
        eprintln!("Error: {} requires an argument", flag);
        process::exit(1);
    };
    raw.parse().unwrap_or_else(|e| {
        eprintln!("Error: invalid value '{}' for {}: {}", raw, flag, e);
        process::exit(1);
    })
}

fn play_game(config: &Config, seed: u64, depth: u8, use_ec: bool) -> GameResult {
    let mut session = GameSession::seeded(config.board.size, seed)
        .with_history_limit(config.history.max_entries)
        .with_win_tile(config.board.win_tile);
    let mut agent = SearchAgent::new(depth);
    let mut moves = 0;

    while moves < config.autoplay.max_moves && !session.game_over() {
        let mut simulator = BoardSimulator::from(session.current_state());
        let decision = if use_ec {
            agent.compute_decision_ec(&mut simulator)
        } else {
            agent.compute_decision(&mut simulator)
        };
        let Some(direction) = decision else {
            break;
        };
        session.move_and_place(direction);
        moves += 1;
    }

    GameResult {
        seed,
        score: session.score(),
        moves,
        highest_tile: board::highest_tile(session.board()),
    }
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config_path = "Game.toml".to_string();
    let mut games: u64 = 8;
    let mut depth: Option<u8> = None;
    let mut use_ec = false;
    let mut base_seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                games = parse_value(&args, i, "--games");
                i += 1;
            }
            "--depth" => {
                depth = Some(parse_value(&args, i, "--depth"));
                i += 1;
            }
            "--seed" => {
                base_seed = Some(parse_value(&args, i, "--seed"));
                i += 1;
            }
            "--config" => {
                config_path = parse_value(&args, i, "--config");
                i += 1;
            }
            "--ec" => use_ec = true,
            "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Error: Unknown option '{}'", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        log::warn!("Could not load config from '{}': {}, using defaults", config_path, e);
        Config::default_hardcoded()
    });
    let depth = depth.unwrap_or(config.search.depth);
    let use_ec = use_ec || config.search.use_heuristic;
    let base_seed = base_seed.unwrap_or_else(rand::random);

    info!(
        "Playing {} game(s), depth {}, {} search, base seed {}",
        games,
        depth,
        if use_ec { "extramax" } else { "expectimax" },
        base_seed
    );

    let start = Instant::now();
    let results: Vec<GameResult> = (0..games)
        .into_par_iter()
        .map(|g| play_game(&config, base_seed.wrapping_add(g), depth, use_ec))
        .collect();
    let elapsed = start.elapsed().as_secs_f64().max(1e-6);

    if results.is_empty() {
        println!("No games played");
        return;
    }

    let total_moves: u64 = results.iter().map(|r| r.moves).sum();
    let mean_score = results.iter().map(|r| r.score as f64).sum::<f64>() / results.len() as f64;
    let best = results.iter().max_by_key(|r| r.score).map(|r| (r.score, r.seed));

    let mut tiles: BTreeMap<u32, usize> = BTreeMap::new();
    for r in &results {
        *tiles.entry(r.highest_tile).or_default() += 1;
    }

    println!("\n===========================================================");
    println!("                    SELF-PLAY REPORT");
    println!("===========================================================");
    println!("Games:          {}", results.len());
    println!("Mean score:     {:.1}", mean_score);
    if let Some((score, seed)) = best {
        println!("Max score:      {} (seed {})", score, seed);
    }
    println!("Total moves:    {} ({:.1} moves/sec)", total_moves, total_moves as f64 / elapsed);
    let wins = results
        .iter()
        .filter(|r| r.highest_tile >= config.board.win_tile)
        .count();
    println!("Wins (>= {}):  {}", config.board.win_tile, wins);
    println!("===========================================================");
    println!("Highest tile distribution:");
    for (tile, count) in tiles.iter().rev() {
        println!(
            "  {:>6}: {:>4} ({:.1}%)",
            tile,
            count,
            *count as f64 * 100.0 / results.len() as f64
        );
    }
    println!();
}
