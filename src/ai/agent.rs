use crate::game::{Action, Board, Phase, Side};

/// What an agent sees when it is asked to move.
#[derive(Debug, Clone, Copy)]
pub struct Position<'a> {
    pub board: &'a Board,
    /// The side to move, which is always the agent's own side.
    pub side: Side,
    pub phase: Phase,
}

impl<'a> Position<'a> {
    pub fn new(board: &'a Board, side: Side, phase: Phase) -> Self {
        Position { board, side, phase }
    }
}

/// Universal interface for all Kalah agents.
pub trait Agent: Send {
    /// Choose an action for the side to move. Returns `None` only when the
    /// position has no legal action (the game is over).
    fn select_action(&mut self, position: &Position<'_>) -> Option<Action>;

    /// Return the agent's display name.
    fn name(&self) -> &str;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn select_action(&mut self, position: &Position<'_>) -> Option<Action> {
        (**self).select_action(position)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
