mod agent;
pub mod minimax;
mod random;

pub use agent::{Agent, Position};
pub use minimax::{
    search, Heuristic, HeuristicWeights, Minimax, MinimaxAgent, SearchResult, StoreDifference,
    WeightedHeuristic,
};
pub use random::RandomAgent;
