//! # Kalah agent
//!
//! A Kalah (Mancala) player: a rules engine for the configurable board, an
//! alpha-beta search that knows about the pie rule, and both ends of the
//! line protocol used to play matches against other programs.
//!
//! ## Modules
//!
//! - [`game`]: Board, sides, moves and the rules engine
//! - [`ai`]: Agent trait, minimax search with heuristics, random agent
//! - [`protocol`]: Encoding and decoding of protocol messages
//! - [`session`]: Agent side of a match played over the protocol
//! - [`arbiter`]: Turn arbiter refereeing a match against a peer
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

pub mod ai;
pub mod arbiter;
pub mod config;
pub mod error;
pub mod game;
pub mod protocol;
pub mod session;

/// Send log output to stderr; stdout belongs to the protocol. The filter is
/// read from `RUST_LOG` and defaults to `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
