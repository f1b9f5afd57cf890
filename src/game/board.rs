use std::fmt;

use super::Side;
use crate::error::GameError;

/// Kalah board: `H` holes and one store per side.
///
/// Pits are kept in wire order: North holes `1..=H`, North store, South holes
/// `1..=H`, South store. Holes are numbered from 1; hole `h` of one side faces
/// hole `H + 1 - h` of the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Board {
    holes: usize,
    pits: Vec<u32>,
}

impl Board {
    /// Create a board with `seeds` in every hole and empty stores.
    pub fn new(holes: usize, seeds: u32) -> Result<Self, GameError> {
        if holes < 1 {
            return Err(GameError::InvalidArgument(format!(
                "there has to be at least one hole, but {holes} were requested"
            )));
        }
        let total = u32::try_from(2 * holes)
            .ok()
            .and_then(|pits| pits.checked_mul(seeds));
        if total.is_none() {
            return Err(GameError::InvalidArgument(format!(
                "{holes} holes with {seeds} seeds each do not fit a seed count"
            )));
        }
        let mut pits = vec![seeds; 2 * (holes + 1)];
        pits[holes] = 0;
        pits[2 * holes + 1] = 0;
        Ok(Board { holes, pits })
    }

    /// Rebuild a board from a wire-ordered pit list of length `2 * (holes + 1)`.
    pub fn from_pits(holes: usize, pits: Vec<u32>) -> Result<Self, GameError> {
        if holes < 1 {
            return Err(GameError::InvalidArgument(format!(
                "there has to be at least one hole, but {holes} were requested"
            )));
        }
        if pits.len() != 2 * (holes + 1) {
            return Err(GameError::InvalidArgument(format!(
                "expected {} pit counts for {holes} holes, got {}",
                2 * (holes + 1),
                pits.len()
            )));
        }
        if pits.iter().try_fold(0u32, |acc, &p| acc.checked_add(p)).is_none() {
            return Err(GameError::InvalidArgument(
                "total seed count does not fit a seed count".into(),
            ));
        }
        Ok(Board { holes, pits })
    }

    /// All pit counts in wire order.
    pub fn pits(&self) -> &[u32] {
        &self.pits
    }

    pub fn holes(&self) -> usize {
        self.holes
    }

    fn hole_index(&self, side: Side, hole: usize) -> usize {
        debug_assert!(
            (1..=self.holes).contains(&hole),
            "hole {hole} outside 1..={}",
            self.holes
        );
        side.index() * (self.holes + 1) + hole - 1
    }

    fn store_index(&self, side: Side) -> usize {
        side.index() * (self.holes + 1) + self.holes
    }

    /// Seeds in hole `hole` (1-based) of `side`.
    pub fn seeds(&self, side: Side, hole: usize) -> u32 {
        self.pits[self.hole_index(side, hole)]
    }

    pub fn set_seeds(&mut self, side: Side, hole: usize, seeds: u32) {
        let idx = self.hole_index(side, hole);
        self.pits[idx] = seeds;
    }

    pub fn add_seeds(&mut self, side: Side, hole: usize, seeds: u32) {
        let idx = self.hole_index(side, hole);
        self.pits[idx] += seeds;
    }

    /// Seeds in the hole facing hole `hole` of `side`.
    pub fn seeds_opposite(&self, side: Side, hole: usize) -> u32 {
        self.seeds(side.opposite(), self.holes + 1 - hole)
    }

    pub fn set_seeds_opposite(&mut self, side: Side, hole: usize, seeds: u32) {
        let opposite = self.holes + 1 - hole;
        self.set_seeds(side.opposite(), opposite, seeds);
    }

    pub fn store(&self, side: Side) -> u32 {
        self.pits[self.store_index(side)]
    }

    pub fn set_store(&mut self, side: Side, seeds: u32) {
        let idx = self.store_index(side);
        self.pits[idx] = seeds;
    }

    pub fn add_to_store(&mut self, side: Side, seeds: u32) {
        let idx = self.store_index(side);
        self.pits[idx] += seeds;
    }

    /// Hole counts of one side, hole 1 first.
    pub fn side_holes(&self, side: Side) -> &[u32] {
        let start = side.index() * (self.holes + 1);
        &self.pits[start..start + self.holes]
    }

    /// Total seeds in the holes of one side (stores excluded).
    pub fn seeds_on_side(&self, side: Side) -> u32 {
        self.side_holes(side).iter().sum()
    }

    pub fn holes_empty(&self, side: Side) -> bool {
        self.side_holes(side).iter().all(|&s| s == 0)
    }

    /// Seeds on the whole board, stores included.
    pub fn total_seeds(&self) -> u32 {
        self.pits.iter().sum()
    }

    /// Store difference from `side`'s point of view.
    pub fn store_difference(&self, side: Side) -> i64 {
        i64::from(self.store(side)) - i64::from(self.store(side.opposite()))
    }
}

impl fmt::Display for Board {
    /// North is printed right to left above South, stores at the row ends.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}  --", self.store(Side::North))?;
        for hole in (1..=self.holes).rev() {
            write!(f, "  {:>3}", self.seeds(Side::North, hole))?;
        }
        writeln!(f)?;
        write!(f, "       ")?;
        for hole in 1..=self.holes {
            write!(f, "{:>3}  ", self.seeds(Side::South, hole))?;
        }
        write!(f, "--  {:>3}", self.store(Side::South))
    }
}
