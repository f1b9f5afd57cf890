use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::game::{rules, Action};

use super::agent::{Agent, Position};

/// An agent that sows from a uniformly random legal hole. It never swaps.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        RandomAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic agent for reproducible matches.
    pub fn seeded(seed: u64) -> Self {
        RandomAgent {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn select_action(&mut self, position: &Position<'_>) -> Option<Action> {
        let holes = rules::legal_moves(position.board, position.side);
        if holes.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..holes.len());
        Some(Action::Hole(holes[idx]))
    }

    fn name(&self) -> &str {
        "Random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Move, Phase, Side};

    #[test]
    fn test_random_agent_selects_legal_action() {
        let mut agent = RandomAgent::seeded(1);
        let mut board = Board::new(7, 3).unwrap();
        board.set_seeds(Side::South, 2, 0);
        board.set_seeds(Side::South, 5, 0);
        let position = Position::new(&board, Side::South, Phase::Midgame);
        let legal = rules::legal_moves(&board, Side::South);

        for _ in 0..100 {
            match agent.select_action(&position) {
                Some(Action::Hole(hole)) => assert!(legal.contains(&hole), "hole {hole} is not legal"),
                other => panic!("unexpected action {other:?}"),
            }
        }
    }

    #[test]
    fn test_random_agent_plays_full_game() {
        let mut agent = RandomAgent::seeded(9);
        let mut board = Board::new(7, 7).unwrap();
        let mut side = Side::FIRST;
        let mut phase = Phase::Opening;

        while !rules::is_terminal(&board) {
            let position = Position::new(&board, side, phase);
            let Some(Action::Hole(hole)) = agent.select_action(&position) else {
                panic!("random agent must pick a hole");
            };
            side = rules::apply_in_phase(&mut board, Move::new(side, hole).unwrap(), phase).unwrap();
            phase = phase.after_move();
        }

        assert!(rules::is_terminal(&board));
        assert_eq!(board.total_seeds(), 98);
    }

    #[test]
    fn test_random_agent_has_nothing_to_do_on_terminal_board() {
        let mut agent = RandomAgent::seeded(0);
        let board = Board::new(3, 0).unwrap();
        let position = Position::new(&board, Side::North, Phase::Midgame);
        assert_eq!(agent.select_action(&position), None);
    }

    #[test]
    fn test_random_agent_name() {
        let agent = RandomAgent::new();
        assert_eq!(agent.name(), "Random");
    }
}
