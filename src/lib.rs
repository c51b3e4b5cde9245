// Library exports for the 2048 engine
// The binaries (autoplay, replay, selfplay) and the integration tests build on these

pub mod agent;
pub mod board;
pub mod config;
pub mod debug_logger;
pub mod heuristic;
pub mod replay;
pub mod session;
pub mod simulator;
pub mod storage;
pub mod types;
