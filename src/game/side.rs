use std::fmt;

/// One of the two sides of the board. South always makes the first move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    North,
    South,
}

impl Side {
    /// The side that opens every match.
    pub const FIRST: Side = Side::South;
    /// The side that may answer the opening move with a swap.
    pub const SECOND: Side = Side::North;

    /// Get the other side
    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
        }
    }

    /// Wire label used by the START message
    pub fn name(self) -> &'static str {
        match self {
            Side::North => "North",
            Side::South => "South",
        }
    }

    /// Row index into the board's pit array
    pub(crate) fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::South => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_side() {
        assert_eq!(Side::North.opposite(), Side::South);
        assert_eq!(Side::South.opposite(), Side::North);
        assert_eq!(Side::FIRST.opposite(), Side::SECOND);
    }

    #[test]
    fn test_side_name() {
        assert_eq!(Side::North.name(), "North");
        assert_eq!(Side::South.to_string(), "South");
    }
}
