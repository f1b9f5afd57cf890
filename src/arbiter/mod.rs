//! Match refereeing: a turn arbiter driving one local party against a peer
//! that speaks the line protocol.

mod peer;
mod turn;

pub use peer::{InProcessPeer, Peer, ProcessPeer, ScriptedPeer};
pub use turn::{ArbiterState, MatchOutcome, MatchState, StepReport, TurnArbiter};

use crate::game::Side;

/// Configuration for the turn arbiter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Opponent command line, split on whitespace. `None` plays against the
    /// built-in opponent.
    pub opponent: Option<String>,
    /// Side initially taken by the local party.
    pub agent_side: Side,
    /// Relay `END` to the peer once the game is over.
    pub send_end: bool,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        ArbiterConfig {
            opponent: None,
            agent_side: Side::South,
            send_end: true,
        }
    }
}
