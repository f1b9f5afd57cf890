//! Kalah rules: legality, sowing, capture, extra turns and the end-of-game sweep.
//!
//! All functions operate on a [`Board`] in place and are deterministic, so the
//! search can replay them freely on private copies.

use std::fmt;

use super::{Board, Side};
use crate::error::GameError;

/// A hole chosen by a side. Holes are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    side: Side,
    hole: usize,
}

impl Move {
    pub fn new(side: Side, hole: usize) -> Result<Self, GameError> {
        if hole < 1 {
            return Err(GameError::InvalidArgument(format!(
                "hole numbers must be >= 1, but {hole} was given"
            )));
        }
        Ok(Move { side, hole })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn hole(&self) -> usize {
        self.hole
    }
}

/// What a player can do on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Sow from this hole (1-based).
    Hole(usize),
    /// Take over the opponent's side after the opening move (pie rule).
    Swap,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Hole(hole) => write!(f, "hole {hole}"),
            Action::Swap => f.write_str("swap"),
        }
    }
}

/// Where a position sits relative to the opening and the swap option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No move has been played; the mover never gets an extra turn.
    Opening,
    /// Exactly one move has been played and the second side may still swap.
    SwapWindow,
    Midgame,
}

impl Phase {
    /// Phase of a match in which `moves_played` hole moves were made.
    pub fn from_history(moves_played: usize, swapped: bool) -> Phase {
        match (moves_played, swapped) {
            (0, _) => Phase::Opening,
            (1, false) => Phase::SwapWindow,
            _ => Phase::Midgame,
        }
    }

    /// Phase after a hole move is played from this one.
    pub fn after_move(self) -> Phase {
        match self {
            Phase::Opening => Phase::SwapWindow,
            Phase::SwapWindow | Phase::Midgame => Phase::Midgame,
        }
    }

    pub fn swap_available(self) -> bool {
        self == Phase::SwapWindow
    }
}

/// A move is legal if its hole exists and holds at least one seed.
pub fn is_legal(board: &Board, mv: Move) -> bool {
    mv.hole <= board.holes() && board.seeds(mv.side, mv.hole) > 0
}

/// Legal holes of `side` in ascending order. Empty means the game is over.
pub fn legal_moves(board: &Board, side: Side) -> Vec<usize> {
    (1..=board.holes())
        .filter(|&hole| board.seeds(side, hole) > 0)
        .collect()
}

/// The game ends as soon as one side has no seeds left in its holes.
pub fn is_terminal(board: &Board) -> bool {
    board.holes_empty(Side::North) || board.holes_empty(Side::South)
}

/// Apply `mv` and return the side that moves next.
///
/// Seeds are sown anticlockwise from the hole after the chosen one, including
/// the mover's store but skipping the opponent's. Whole laps are added in a
/// single pass, so the cost does not depend on the seed count.
pub fn apply(board: &mut Board, mv: Move) -> Result<Side, GameError> {
    if !is_legal(board, mv) {
        return Err(GameError::IllegalMove {
            side: mv.side,
            hole: mv.hole,
        });
    }

    let holes = board.holes();
    let seeds = board.seeds(mv.side, mv.hole);
    board.set_seeds(mv.side, mv.hole, 0);

    let receiving_pits = (2 * holes + 1) as u32;
    let laps = seeds / receiving_pits;
    let mut remainder = seeds % receiving_pits;

    if laps != 0 {
        for hole in 1..=holes {
            board.add_seeds(Side::North, hole, laps);
            board.add_seeds(Side::South, hole, laps);
        }
        board.add_to_store(mv.side, laps);
    }

    // sow_hole == 0 means the mover's store
    let mut sow_side = mv.side;
    let mut sow_hole = mv.hole;
    while remainder > 0 {
        sow_hole += 1;
        if sow_hole == 1 {
            // previous pit was the mover's store
            sow_side = sow_side.opposite();
        }
        if sow_hole > holes {
            if sow_side == mv.side {
                sow_hole = 0;
                board.add_to_store(sow_side, 1);
                remainder -= 1;
                continue;
            }
            sow_side = sow_side.opposite();
            sow_hole = 1;
        }
        board.add_seeds(sow_side, sow_hole, 1);
        remainder -= 1;
    }

    if sow_side == mv.side
        && sow_hole > 0
        && board.seeds(sow_side, sow_hole) == 1
        && board.seeds_opposite(sow_side, sow_hole) > 0
    {
        let captured = 1 + board.seeds_opposite(sow_side, sow_hole);
        board.add_to_store(mv.side, captured);
        board.set_seeds(sow_side, sow_hole, 0);
        board.set_seeds_opposite(sow_side, sow_hole, 0);
    }

    // Both sides can be empty at once, but then there is nothing to collect.
    let finished = if board.holes_empty(mv.side) {
        Some(mv.side)
    } else if board.holes_empty(mv.side.opposite()) {
        Some(mv.side.opposite())
    } else {
        None
    };
    if let Some(finished) = finished {
        sweep(board, finished.opposite());
    }

    if sow_hole == 0 {
        Ok(mv.side)
    } else {
        Ok(mv.side.opposite())
    }
}

/// Apply the first move of a match: the turn always passes to the opponent.
pub fn apply_opening(board: &mut Board, mv: Move) -> Result<Side, GameError> {
    apply(board, mv)?;
    Ok(mv.side.opposite())
}

/// Apply `mv` honouring the first-move exception of `phase`.
pub fn apply_in_phase(board: &mut Board, mv: Move, phase: Phase) -> Result<Side, GameError> {
    match phase {
        Phase::Opening => apply_opening(board, mv),
        Phase::SwapWindow | Phase::Midgame => apply(board, mv),
    }
}

fn sweep(board: &mut Board, collecting: Side) {
    let mut seeds = 0;
    for hole in 1..=board.holes() {
        seeds += board.seeds(collecting, hole);
        board.set_seeds(collecting, hole, 0);
    }
    board.add_to_store(collecting, seeds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn south(hole: usize) -> Move {
        Move::new(Side::South, hole).unwrap()
    }

    /// Reference sowing: one seed at a time, no lap shortcut.
    fn sow_naively(board: &mut Board, mv: Move) -> Side {
        let holes = board.holes();
        let mut seeds = board.seeds(mv.side(), mv.hole());
        board.set_seeds(mv.side(), mv.hole(), 0);
        let mut side = mv.side();
        let mut hole = mv.hole();
        while seeds > 0 {
            if hole == 0 {
                side = side.opposite();
                hole = 1;
            } else if hole == holes {
                if side == mv.side() {
                    hole = 0;
                    board.add_to_store(side, 1);
                    seeds -= 1;
                    continue;
                }
                side = side.opposite();
                hole = 1;
            } else {
                hole += 1;
            }
            board.add_seeds(side, hole, 1);
            seeds -= 1;
        }
        if side == mv.side()
            && hole > 0
            && board.seeds(side, hole) == 1
            && board.seeds_opposite(side, hole) > 0
        {
            let captured = 1 + board.seeds_opposite(side, hole);
            board.add_to_store(side, captured);
            board.set_seeds(side, hole, 0);
            board.set_seeds_opposite(side, hole, 0);
        }
        for finished in [mv.side(), mv.side().opposite()] {
            if board.holes_empty(finished) {
                sweep(board, finished.opposite());
                break;
            }
        }
        if hole == 0 {
            mv.side()
        } else {
            mv.side().opposite()
        }
    }

    #[test]
    fn test_move_rejects_hole_zero() {
        assert!(matches!(
            Move::new(Side::North, 0),
            Err(GameError::InvalidArgument(_))
        ));
        assert_eq!(Move::new(Side::North, 4).unwrap().hole(), 4);
    }

    #[test]
    fn test_is_legal() {
        let mut board = Board::new(7, 7).unwrap();
        assert!(is_legal(&board, south(1)));
        assert!(!is_legal(&board, south(8)));
        board.set_seeds(Side::South, 2, 0);
        assert!(!is_legal(&board, south(2)));
    }

    #[test]
    fn test_extra_turn_from_last_hole() {
        let mut board = Board::new(7, 7).unwrap();
        board.set_seeds(Side::South, 7, 1);
        let before = board.clone();

        let next = apply(&mut board, south(7)).unwrap();

        assert_eq!(next, Side::South);
        assert_eq!(board.seeds(Side::South, 7), 0);
        assert_eq!(board.store(Side::South), 1);
        for hole in 1..=6 {
            assert_eq!(board.seeds(Side::South, hole), before.seeds(Side::South, hole));
        }
        assert_eq!(board.side_holes(Side::North), before.side_holes(Side::North));
        assert_eq!(board.store(Side::North), 0);
    }

    #[test]
    fn test_seven_seeds_from_last_hole_pass_the_turn() {
        let mut board = Board::new(7, 7).unwrap();
        let next = apply(&mut board, south(7)).unwrap();
        // one seed into the store, six onto North holes 1..=6
        assert_eq!(next, Side::North);
        assert_eq!(board.store(Side::South), 1);
        assert_eq!(board.seeds(Side::North, 6), 8);
        assert_eq!(board.seeds(Side::North, 7), 7);
        assert_eq!(board.total_seeds(), 98);
    }

    #[test]
    fn test_extra_turn_when_last_seed_hits_store() {
        let mut board = Board::new(7, 7).unwrap();
        let next = apply(&mut board, south(1)).unwrap();
        // holes 2..=7 get one seed each and the store gets the last one
        assert_eq!(next, Side::South);
        assert_eq!(board.store(Side::South), 1);
        for hole in 2..=7 {
            assert_eq!(board.seeds(Side::South, hole), 8);
        }
        for hole in 1..=7 {
            assert_eq!(board.seeds(Side::North, hole), 7);
        }
    }

    #[test]
    fn test_opening_never_grants_extra_turn() {
        let mut board = Board::new(7, 7).unwrap();
        let next = apply_opening(&mut board, south(1)).unwrap();
        assert_eq!(next, Side::North);
        assert_eq!(board.store(Side::South), 1);

        let mut board = Board::new(7, 7).unwrap();
        assert_eq!(
            apply_in_phase(&mut board, south(1), Phase::Opening).unwrap(),
            Side::North
        );
        let mut board = Board::new(7, 7).unwrap();
        assert_eq!(
            apply_in_phase(&mut board, south(1), Phase::Midgame).unwrap(),
            Side::South
        );
    }

    #[test]
    fn test_turn_passes_when_landing_elsewhere() {
        let mut board = Board::new(7, 7).unwrap();
        let next = apply(&mut board, south(3)).unwrap();
        assert_eq!(next, Side::North);
        assert_eq!(board.seeds(Side::North, 1), 8);
        assert_eq!(board.seeds(Side::North, 2), 8);
        assert_eq!(board.seeds(Side::North, 3), 7);
    }

    #[test]
    fn test_capture() {
        let mut board = Board::new(7, 2).unwrap();
        board.set_seeds(Side::South, 2, 1);
        board.set_seeds(Side::South, 3, 0);
        // South hole 3 faces North hole 5
        board.set_seeds(Side::North, 5, 5);
        let before = board.total_seeds();

        let next = apply(&mut board, south(2)).unwrap();

        assert_eq!(next, Side::North);
        assert_eq!(board.seeds(Side::South, 3), 0);
        assert_eq!(board.seeds(Side::North, 5), 0);
        assert_eq!(board.store(Side::South), 6);
        assert_eq!(board.total_seeds(), before);
    }

    #[test]
    fn test_no_capture_when_opposite_empty() {
        let mut board = Board::new(7, 2).unwrap();
        board.set_seeds(Side::South, 2, 1);
        board.set_seeds(Side::South, 3, 0);
        board.set_seeds(Side::North, 5, 0);

        apply(&mut board, south(2)).unwrap();

        assert_eq!(board.seeds(Side::South, 3), 1);
        assert_eq!(board.store(Side::South), 0);
    }

    #[test]
    fn test_no_capture_on_opponent_side() {
        let mut board = Board::new(2, 0).unwrap();
        board.set_seeds(Side::South, 2, 3);
        board.set_seeds(Side::North, 2, 4);
        board.set_seeds(Side::South, 1, 1);
        // lands in store, North 1, North 2: last seed on North's side
        apply(&mut board, south(2)).unwrap();
        assert_eq!(board.seeds(Side::North, 1), 1);
        assert_eq!(board.seeds(Side::North, 2), 5);
        assert_eq!(board.store(Side::South), 1);
    }

    #[test]
    fn test_full_lap_skips_opponent_store() {
        let mut board = Board::new(2, 0).unwrap();
        board.set_seeds(Side::South, 1, 6);
        board.set_seeds(Side::North, 1, 1);
        // 6 seeds over 5 receiving pits: one lap plus one seed into South 2
        let next = apply(&mut board, south(1)).unwrap();
        assert_eq!(next, Side::North);
        assert_eq!(board.store(Side::North), 0);
        assert_eq!(board.store(Side::South), 1);
        assert_eq!(board.seeds(Side::South, 1), 1);
        assert_eq!(board.seeds(Side::South, 2), 2);
        assert_eq!(board.seeds(Side::North, 1), 2);
        assert_eq!(board.seeds(Side::North, 2), 1);
    }

    #[test]
    fn test_termination_sweep() {
        let mut board = Board::new(3, 0).unwrap();
        board.set_seeds(Side::South, 3, 1);
        board.set_seeds(Side::North, 1, 2);
        board.set_seeds(Side::North, 2, 3);
        board.set_seeds(Side::North, 3, 4);

        let next = apply(&mut board, south(3)).unwrap();

        assert_eq!(next, Side::South);
        assert!(is_terminal(&board));
        assert_eq!(board.store(Side::South), 1);
        assert_eq!(board.store(Side::North), 9);
        assert!(board.holes_empty(Side::North));
        assert_eq!(board.total_seeds(), 10);
    }

    #[test]
    fn test_illegal_moves_are_rejected() {
        let mut board = Board::new(3, 1).unwrap();
        board.set_seeds(Side::South, 2, 0);
        let snapshot = board.clone();
        assert!(matches!(
            apply(&mut board, south(2)),
            Err(GameError::IllegalMove { hole: 2, .. })
        ));
        assert!(apply(&mut board, south(4)).is_err());
        assert_eq!(board, snapshot);
    }

    #[test]
    fn test_phase_progression() {
        assert_eq!(Phase::from_history(0, false), Phase::Opening);
        assert_eq!(Phase::from_history(1, false), Phase::SwapWindow);
        assert_eq!(Phase::from_history(1, true), Phase::Midgame);
        assert_eq!(Phase::from_history(5, false), Phase::Midgame);
        assert_eq!(Phase::Opening.after_move(), Phase::SwapWindow);
        assert_eq!(Phase::SwapWindow.after_move(), Phase::Midgame);
        assert!(Phase::SwapWindow.swap_available());
        assert!(!Phase::Opening.swap_available());
    }

    #[test]
    fn test_lap_shortcut_matches_naive_sowing() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let holes = rng.random_range(1..=6);
            let pits = (0..2 * (holes + 1))
                .map(|_| rng.random_range(0..40))
                .collect();
            let board = Board::from_pits(holes, pits).unwrap();
            let side = if rng.random_bool(0.5) {
                Side::North
            } else {
                Side::South
            };
            for hole in legal_moves(&board, side) {
                let mv = Move::new(side, hole).unwrap();
                let mut fast = board.clone();
                let mut slow = board.clone();
                let fast_next = apply(&mut fast, mv).unwrap();
                let slow_next = sow_naively(&mut slow, mv);
                assert_eq!(fast, slow, "board mismatch for {mv:?} on {board:?}");
                assert_eq!(fast_next, slow_next);
            }
        }
    }

    #[test]
    fn test_seed_conservation_over_random_games() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let holes = rng.random_range(1..=7);
            let seeds = rng.random_range(0..=8);
            let mut board = Board::new(holes, seeds).unwrap();
            let total = board.total_seeds();
            assert_eq!(total, 2 * holes as u32 * seeds);
            let mut side = Side::FIRST;
            let mut phase = Phase::Opening;
            while !is_terminal(&board) {
                let moves = legal_moves(&board, side);
                assert!(!moves.is_empty());
                let hole = moves[rng.random_range(0..moves.len())];
                side = apply_in_phase(&mut board, Move::new(side, hole).unwrap(), phase).unwrap();
                phase = phase.after_move();
                assert_eq!(board.total_seeds(), total);
            }
            assert!(legal_moves(&board, Side::North).is_empty()
                || legal_moves(&board, Side::South).is_empty());
        }
    }

    #[test]
    fn test_legality_matches_legal_moves() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let holes = rng.random_range(1..=7);
            let pits = (0..2 * (holes + 1))
                .map(|_| if rng.random_bool(0.4) { 0 } else { rng.random_range(1..10) })
                .collect();
            let board = Board::from_pits(holes, pits).unwrap();
            for side in [Side::North, Side::South] {
                let legal = legal_moves(&board, side);
                for hole in 1..=holes + 2 {
                    let mv = Move::new(side, hole).unwrap();
                    assert_eq!(is_legal(&board, mv), legal.contains(&hole));
                }
            }
        }
    }
}
