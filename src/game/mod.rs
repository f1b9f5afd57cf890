//! Core Kalah game logic: board representation, sides, and the rules engine.

mod board;
pub mod rules;
mod side;

pub use board::Board;
pub use rules::{Action, Move, Phase};
pub use side::Side;
