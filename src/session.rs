//! Client side of the line protocol: keeps track of the match as seen by one
//! agent and answers the game engine whenever it is this agent's turn.

use std::io::{self, BufRead, Write};

use tracing::{debug, info};

use crate::ai::{Agent, Position};
use crate::error::{GameError, ProtocolError, SessionError};
use crate::game::{rules, Action, Board, Phase, Side};
use crate::protocol::{Message, Turn};

pub struct Session<A: Agent> {
    agent: A,
    seeds: u32,
    /// Seeds on the board of every match; snapshots must keep this total.
    total: u32,
    board: Board,
    side: Option<Side>,
    moves_played: usize,
    swapped: bool,
    finished: bool,
}

impl<A: Agent> Session<A> {
    pub fn new(agent: A, holes: usize, seeds: u32) -> Result<Self, GameError> {
        let board = Board::new(holes, seeds)?;
        Ok(Session {
            agent,
            seeds,
            total: board.total_seeds(),
            board,
            side: None,
            moves_played: 0,
            swapped: false,
            finished: false,
        })
    }

    /// The agent's current side, once `START` has been received.
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves_played(&self) -> usize {
        self.moves_played
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    fn phase(&self) -> Phase {
        Phase::from_history(self.moves_played, self.swapped)
    }

    /// Process one message from the game engine and return the reply, if the
    /// message hands the turn to this agent.
    pub fn handle(&mut self, message: &Message) -> Result<Option<Message>, ProtocolError> {
        match message {
            Message::Start(side) => {
                self.board = Board::new(self.board.holes(), self.seeds)
                    .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))?;
                self.side = Some(*side);
                self.moves_played = 0;
                self.swapped = false;
                self.finished = false;
                info!(agent = self.agent.name(), side = %side, "match started");
                if *side == Side::FIRST {
                    return self.reply().map(Some);
                }
                Ok(None)
            }
            Message::Change {
                action,
                board,
                turn,
            } => {
                let side = self.side.ok_or_else(|| {
                    ProtocolError::InvalidMessage("CHANGE received before START".into())
                })?;
                if board.holes() != self.board.holes() {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "board has {} holes per side, expected {}",
                        board.holes(),
                        self.board.holes()
                    )));
                }
                if board.total_seeds() != self.total {
                    return Err(ProtocolError::InvalidMessage(format!(
                        "board holds {} seeds, expected {}",
                        board.total_seeds(),
                        self.total
                    )));
                }
                self.board = board.clone();
                match action {
                    Action::Hole(_) => self.moves_played += 1,
                    Action::Swap => {
                        // Only the opponent's swap is announced to us.
                        self.swapped = true;
                        self.side = Some(side.opposite());
                    }
                }
                debug!(%action, ?turn, "board changed");
                match turn {
                    Turn::You => self.reply().map(Some),
                    Turn::Opp => Ok(None),
                    Turn::End => {
                        self.finished = true;
                        Ok(None)
                    }
                }
            }
            Message::End => {
                self.finished = true;
                info!(
                    agent = self.agent.name(),
                    moves = self.moves_played,
                    "match ended"
                );
                Ok(None)
            }
            Message::Move(_) | Message::Swap => Err(ProtocolError::InvalidMessage(format!(
                "unexpected message from game engine: {}",
                message.encode().trim_end()
            ))),
        }
    }

    fn reply(&mut self) -> Result<Message, ProtocolError> {
        let side = self
            .side
            .ok_or_else(|| ProtocolError::InvalidMessage("asked to move before START".into()))?;
        let phase = self.phase();
        let position = Position::new(&self.board, side, phase);

        let action = match self.agent.select_action(&position) {
            Some(Action::Swap) if phase.swap_available() => Action::Swap,
            Some(Action::Hole(hole)) if rules::legal_moves(&self.board, side).contains(&hole) => {
                Action::Hole(hole)
            }
            _ => {
                let hole = rules::legal_moves(&self.board, side)
                    .first()
                    .copied()
                    .ok_or_else(|| {
                        ProtocolError::InvalidMessage("asked to move without a legal move".into())
                    })?;
                Action::Hole(hole)
            }
        };
        debug!(%side, %action, "replying");

        match action {
            Action::Hole(hole) => Ok(Message::Move(hole)),
            Action::Swap => {
                self.swapped = true;
                self.side = Some(side.opposite());
                Ok(Message::Swap)
            }
        }
    }

    /// Talk to the game engine until it sends `END` or closes the connection
    /// after the game has ended.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<(), SessionError> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                if self.finished {
                    return Ok(());
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "game engine closed the connection",
                )
                .into());
            }
            let text = std::str::from_utf8(&line)
                .map_err(|_| ProtocolError::InvalidMessage("message is not valid UTF-8".into()))?;
            let message = Message::decode(text, self.board.holes())?;
            if let Some(reply) = self.handle(&message)? {
                output.write_all(reply.encode().as_bytes())?;
                output.flush()?;
            }
            if message == Message::End {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MinimaxAgent, RandomAgent, StoreDifference};

    /// Always asks for a swap when it may, otherwise plays the last legal hole.
    struct Swapper;

    impl Agent for Swapper {
        fn select_action(&mut self, position: &Position<'_>) -> Option<Action> {
            if position.phase.swap_available() {
                return Some(Action::Swap);
            }
            rules::legal_moves(position.board, position.side)
                .last()
                .map(|&hole| Action::Hole(hole))
        }

        fn name(&self) -> &str {
            "Swapper"
        }
    }

    fn decode(line: &str) -> Message {
        Message::decode(line, 7).unwrap()
    }

    #[test]
    fn test_south_moves_on_start() {
        let mut session = Session::new(RandomAgent::seeded(3), 7, 7).unwrap();
        let reply = session.handle(&decode("START;South\n")).unwrap();
        assert!(matches!(reply, Some(Message::Move(1..=7))));
        assert_eq!(session.side(), Some(Side::South));
    }

    #[test]
    fn test_north_waits_on_start() {
        let mut session = Session::new(RandomAgent::seeded(3), 7, 7).unwrap();
        assert_eq!(session.handle(&decode("START;North\n")).unwrap(), None);
        assert_eq!(session.side(), Some(Side::North));
    }

    #[test]
    fn test_change_before_start_is_rejected() {
        let mut session = Session::new(RandomAgent::seeded(3), 7, 7).unwrap();
        let change = decode("CHANGE;1;7,7,7,7,7,7,7,0,0,8,8,8,8,8,8,1;YOU\n");
        assert!(session.handle(&change).is_err());
    }

    #[test]
    fn test_change_must_conserve_seeds() {
        let mut session = Session::new(RandomAgent::seeded(3), 7, 7).unwrap();
        session.handle(&decode("START;North\n")).unwrap();
        // Totals past the seed count range never decode.
        assert!(Message::decode(
            "CHANGE;1;4000000000,4000000000,7,7,7,7,7,0,0,8,8,8,8,8,8,1;YOU\n",
            7
        )
        .is_err());
        let inflated = decode("CHANGE;1;4000000000,7,7,7,7,7,7,0,0,8,8,8,8,8,8,1;YOU\n");
        assert!(session.handle(&inflated).is_err());
        let short = decode("CHANGE;1;7,7,7,7,7,7,7,0,0,8,8,8,8,8,8,0;YOU\n");
        assert!(session.handle(&short).is_err());
        assert_eq!(session.moves_played(), 0);
        assert_eq!(session.board(), &Board::new(7, 7).unwrap());
    }

    #[test]
    fn test_agent_messages_from_engine_are_rejected() {
        let mut session = Session::new(RandomAgent::seeded(3), 7, 7).unwrap();
        session.handle(&decode("START;North\n")).unwrap();
        assert!(session.handle(&Message::Move(3)).is_err());
        assert!(session.handle(&Message::Swap).is_err());
    }

    #[test]
    fn test_swapper_swaps_in_window_and_changes_side() {
        let mut session = Session::new(Swapper, 7, 7).unwrap();
        session.handle(&decode("START;North\n")).unwrap();
        let reply = session
            .handle(&decode("CHANGE;1;7,7,7,7,7,7,7,0,0,8,8,8,8,8,8,1;YOU\n"))
            .unwrap();
        assert_eq!(reply, Some(Message::Swap));
        assert_eq!(session.side(), Some(Side::South));

        // The opponent, now North, sows hole 7 and the turn comes back to us.
        let reply = session
            .handle(&decode("CHANGE;7;7,7,7,7,7,7,0,1,1,9,9,9,9,9,8,1;YOU\n"))
            .unwrap();
        assert_eq!(reply, Some(Message::Move(7)));
        assert_eq!(session.moves_played(), 2);
    }

    #[test]
    fn test_opponent_swap_flips_side() {
        let mut session = Session::new(Swapper, 7, 7).unwrap();
        assert_eq!(
            session.handle(&decode("START;South\n")).unwrap(),
            Some(Message::Move(7))
        );
        session
            .handle(&decode("CHANGE;7;8,8,8,8,8,8,7,0,7,7,7,7,7,7,0,1;OPP\n"))
            .unwrap();
        assert_eq!(session.side(), Some(Side::South));

        let reply = session
            .handle(&decode("CHANGE;SWAP;8,8,8,8,8,8,7,0,7,7,7,7,7,7,0,1;YOU\n"))
            .unwrap();
        assert_eq!(session.side(), Some(Side::North));
        assert_eq!(reply, Some(Message::Move(7)));
    }

    #[test]
    fn test_no_swap_after_window() {
        let mut session = Session::new(Swapper, 7, 7).unwrap();
        session.handle(&decode("START;North\n")).unwrap();
        session
            .handle(&decode("CHANGE;1;7,7,7,7,7,7,7,0,0,8,8,8,8,8,8,1;OPP\n"))
            .unwrap();
        let reply = session
            .handle(&decode("CHANGE;2;7,7,7,7,7,7,7,0,0,0,9,9,9,9,9,4;YOU\n"))
            .unwrap();
        assert_eq!(reply, Some(Message::Move(7)));
        assert_eq!(session.side(), Some(Side::North));
    }

    #[test]
    fn test_end_of_game() {
        let mut session = Session::new(RandomAgent::seeded(1), 7, 7).unwrap();
        session.handle(&decode("START;North\n")).unwrap();
        let reply = session
            .handle(&decode("CHANGE;3;0,0,0,0,0,0,0,50,0,0,0,0,0,0,0,48;END\n"))
            .unwrap();
        assert_eq!(reply, None);
        assert!(session.is_finished());
    }

    #[test]
    fn test_run_answers_engine_until_end() {
        let input = "START;South\n\
                     CHANGE;1;7,7,7,7,7,7,7,0,0,8,8,8,8,8,8,1;OPP\n\
                     END\n";
        let mut output = Vec::new();
        let agent = MinimaxAgent::with_heuristic(2, Box::new(StoreDifference));
        let mut session = Session::new(agent, 7, 7).unwrap();
        session.run(input.as_bytes(), &mut output).unwrap();

        let written = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("MOVE;"));
        assert!(session.is_finished());
    }

    #[test]
    fn test_run_fails_on_early_eof() {
        let mut session = Session::new(RandomAgent::seeded(1), 7, 7).unwrap();
        let err = session.run("START;North\n".as_bytes(), Vec::new()).unwrap_err();
        assert!(matches!(err, SessionError::Io(_)));
    }

    #[test]
    fn test_run_fails_on_garbage() {
        let mut session = Session::new(RandomAgent::seeded(1), 7, 7).unwrap();
        let err = session.run("HELLO\n".as_bytes(), Vec::new()).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }

    #[test]
    fn test_run_rejects_invalid_utf8() {
        let mut session = Session::new(RandomAgent::seeded(1), 7, 7).unwrap();
        let err = session.run(&[0xff, b'\n'][..], Vec::new()).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)), "{err}");
    }
}
