// Autoplay driver: the search agent plays one game of 2048
//
// Usage:
//   cargo run -- [--config <path>] [--moves <n>] [--ec] [--fresh]

use log::{info, warn};
use std::env;
use std::process;

use twenty48::agent::SearchAgent;
use twenty48::board;
use twenty48::config::Config;
use twenty48::debug_logger::{DebugLogger, SearchSettings};
use twenty48::session::GameSession;
use twenty48::simulator::BoardSimulator;

fn print_usage() {
    eprintln!("2048 Autoplay");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  twenty48 [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --config <path>   Path to Game.toml (default: Game.toml)");
    eprintln!("  --moves <n>       Stop after n moves (default: autoplay.max_moves)");
    eprintln!("  --ec              Use the snake-heuristic search");
    eprintln!("  --fresh           Ignore any saved game and start a new one");
    eprintln!("  --help            Show this help message");
}

fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<String> = None;
    let mut max_moves: Option<u64> = None;
    let mut use_ec = false;
    let mut fresh = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires an argument");
                    process::exit(1);
                }
                config_path = Some(args[i + 1].clone());
                i += 1;
            }
            "--moves" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --moves requires an argument");
                    process::exit(1);
                }
                max_moves = match args[i + 1].parse::<u64>() {
                    Ok(n) => Some(n),
                    Err(e) => {
                        eprintln!("Error: invalid move count '{}': {}", args[i + 1], e);
                        process::exit(1);
                    }
                };
                i += 1;
            }
            "--ec" => use_ec = true,
            "--fresh" => fresh = true,
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

    let config = match config_path {
        Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
            warn!("Could not load config from '{}': {}, using defaults", path, e);
            Config::default_hardcoded()
        }),
        None => Config::load_or_default(),
    };
    let use_ec = use_ec || config.search.use_heuristic;
    let max_moves = max_moves.unwrap_or(config.autoplay.max_moves);

    let mut session = GameSession::from_config(&config);
    if fresh {
        session.reset();
    }

    let mut agent = SearchAgent::from_config(&config);
    let debug_logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path);
    let search = SearchSettings {
        depth: agent.search_depth(),
        use_heuristic: use_ec,
    };

    info!(
        "Starting game: {}x{} board, {} search, limit {} moves",
        session.board_size(),
        session.board_size(),
        if use_ec { "extramax" } else { "expectimax" },
        max_moves
    );

    let mut turn: u64 = 0;
    while turn < max_moves && !session.game_over() {
        let state = session.current_state();
        let mut simulator = BoardSimulator::from(state.clone());
        let decision = if use_ec {
            agent.compute_decision_ec(&mut simulator)
        } else {
            agent.compute_decision(&mut simulator)
        };

        let Some(direction) = decision else {
            warn!("Agent found no legal move at turn {}", turn);
            break;
        };

        debug_logger.log_move(turn, &state, direction, search);
        session.move_and_place(direction);
        turn += 1;

        if turn % 100 == 0 {
            info!(
                "Turn {}: score {}, highest tile {}",
                turn,
                session.score(),
                board::highest_tile(session.board())
            );
        }
    }

    let final_state = session.current_state();
    println!("{}", final_state);
    println!("Moves:        {}", turn);
    println!("Score:        {}", final_state.score);
    println!("Highest tile: {}", board::highest_tile(&final_state.board));

    if session.has_won() {
        info!("Reached the win tile");
    }
    if session.game_over() {
        info!("Game over after {} moves", turn);
    } else {
        info!("Stopped after {} moves, game saved", turn);
    }
}
