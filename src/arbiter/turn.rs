use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::ai::Position;
use crate::error::ArbiterError;
use crate::game::{rules, Action, Board, Move, Phase, Side};
use crate::protocol::{Message, Turn};

use super::peer::Peer;
use super::ArbiterConfig;

/// Coarse state of the arbiter, derived from the current match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    AwaitingStart,
    SwapWindowOpen,
    InProgress,
    Finished,
}

/// How a match ended. `score` is the local side's store minus the peer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The game reached a terminal board.
    Completed { score: i64 },
    /// The peer sent a malformed or out-of-place message.
    ProtocolViolation { score: i64 },
    /// The peer played an illegal move or its process failed.
    Aborted { score: i64 },
}

impl MatchOutcome {
    pub fn score(&self) -> i64 {
        match *self {
            MatchOutcome::Completed { score }
            | MatchOutcome::ProtocolViolation { score }
            | MatchOutcome::Aborted { score } => score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
    Local,
    Peer,
}

/// Bookkeeping for one match.
#[derive(Debug, Clone)]
pub struct MatchState {
    board: Board,
    local_side: Side,
    peer_side: Side,
    active: Side,
    /// 1 before the first move, incremented by every move and by a swap.
    move_count: usize,
    local_moves: usize,
    peer_moves: usize,
    local_time: Duration,
    peer_time: Duration,
}

impl MatchState {
    fn new(board: Board, local_side: Side) -> Self {
        MatchState {
            board,
            local_side,
            peer_side: local_side.opposite(),
            active: Side::FIRST,
            move_count: 1,
            local_moves: 0,
            peer_moves: 0,
            local_time: Duration::ZERO,
            peer_time: Duration::ZERO,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn local_side(&self) -> Side {
        self.local_side
    }

    pub fn peer_side(&self) -> Side {
        self.peer_side
    }

    /// The side to move.
    pub fn active(&self) -> Side {
        self.active
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// Hole moves played by the local party and by the peer.
    pub fn moves_by_party(&self) -> (usize, usize) {
        (self.local_moves, self.peer_moves)
    }

    /// Time spent deciding by the local party and by the peer. The peer is
    /// timed from the start of each read to the arrival of its reply; the local
    /// party from the moment the turn comes back until it acts.
    pub fn time_by_party(&self) -> (Duration, Duration) {
        (self.local_time, self.peer_time)
    }

    /// Average decision time per action of the local party and of the peer,
    /// in milliseconds. Zero when a party has not acted.
    pub fn millis_per_move(&self) -> (u128, u128) {
        let per_move = |time: Duration, moves: usize| match moves {
            0 => 0,
            n => time.as_millis() / n as u128,
        };
        (
            per_move(self.local_time, self.local_moves),
            per_move(self.peer_time, self.peer_moves),
        )
    }

    /// Swapping is allowed only as the reply to the very first move.
    pub fn swap_available(&self) -> bool {
        self.move_count == 2
    }

    pub fn phase(&self) -> Phase {
        match self.move_count {
            1 => Phase::Opening,
            2 => Phase::SwapWindow,
            _ => Phase::Midgame,
        }
    }

    fn score(&self) -> i64 {
        self.board.store_difference(self.local_side)
    }
}

/// Snapshot returned after every call that advances the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub board: Board,
    /// The local party's side, which changes after a swap.
    pub side: Side,
    pub phase: Phase,
    pub local_to_move: bool,
    pub outcome: Option<MatchOutcome>,
}

impl StepReport {
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Referees a match between the local caller and a peer. The local party
/// submits actions through [`TurnArbiter::step`]; the peer's replies are read
/// and applied until the turn comes back or the game ends.
pub struct TurnArbiter<P: Peer> {
    config: ArbiterConfig,
    holes: usize,
    seeds: u32,
    peer: Option<P>,
    game: Option<MatchState>,
    outcome: Option<MatchOutcome>,
    /// Set while the local party is to move.
    local_clock: Option<Instant>,
}

impl<P: Peer> TurnArbiter<P> {
    pub fn new(config: ArbiterConfig, holes: usize, seeds: u32) -> Self {
        TurnArbiter {
            config,
            holes,
            seeds,
            peer: None,
            game: None,
            outcome: None,
            local_clock: None,
        }
    }

    pub fn state(&self) -> ArbiterState {
        match &self.game {
            None => ArbiterState::AwaitingStart,
            Some(_) if self.outcome.is_some() => ArbiterState::Finished,
            Some(game) if game.swap_available() => ArbiterState::SwapWindowOpen,
            Some(_) => ArbiterState::InProgress,
        }
    }

    pub fn game(&self) -> Option<&MatchState> {
        self.game.as_ref()
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn peer(&self) -> Option<&P> {
        self.peer.as_ref()
    }

    /// The position the local party has to move from, if it is its turn.
    pub fn position(&self) -> Option<Position<'_>> {
        let game = self.game.as_ref()?;
        if self.outcome.is_some() || game.active != game.local_side {
            return None;
        }
        Some(Position::new(&game.board, game.local_side, game.phase()))
    }

    /// Start a new match against `peer`. Any previous peer is dropped first.
    /// Peer moves are processed until the local party has to move or the
    /// game ends.
    pub fn reset(&mut self, peer: P) -> Result<StepReport, ArbiterError> {
        self.peer = None;
        self.game = None;
        self.outcome = None;
        let board = Board::new(self.holes, self.seeds)?;
        let game = MatchState::new(board, self.config.agent_side);
        let peer_side = game.peer_side;
        self.game = Some(game);
        self.peer = Some(peer);
        info!(local = %self.config.agent_side, holes = self.holes, seeds = self.seeds, "match started");

        if let Err(e) = self.send(&Message::Start(peer_side)) {
            return Err(self.abort(e));
        }
        self.run_peer()?;
        self.start_local_clock();
        self.report()
    }

    /// Play `action` for the local party, relay it, then let the peer play
    /// until the turn comes back.
    pub fn step(&mut self, action: Action) -> Result<StepReport, ArbiterError> {
        let game = self.game.as_ref().ok_or(ArbiterError::NoMatch)?;
        if self.outcome.is_some() {
            return Err(ArbiterError::MatchOver);
        }
        if game.active != game.local_side {
            return Err(ArbiterError::IllegalMove("not your turn".into()));
        }

        let thinking = self.local_clock.map(|started| started.elapsed());
        let played = match action {
            Action::Hole(hole) => {
                let illegal = || ArbiterError::IllegalMove(format!("{} hole {hole}", game.local_side));
                let mv = Move::new(game.local_side, hole).map_err(|_| illegal())?;
                if !rules::is_legal(&game.board, mv) {
                    return Err(illegal());
                }
                self.play(mv, Party::Local)
            }
            Action::Swap => {
                if !game.swap_available() {
                    return Err(ArbiterError::IllegalMove(
                        "swap is only allowed as the reply to the first move".into(),
                    ));
                }
                self.swap(Party::Local)
            }
        };
        if let Err(e) = played {
            return Err(self.abort(e));
        }
        if let (Some(elapsed), Some(game)) = (thinking, self.game.as_mut()) {
            game.local_time += elapsed;
        }
        self.local_clock = None;
        self.run_peer()?;
        self.start_local_clock();
        self.report()
    }

    fn start_local_clock(&mut self) {
        let local_to_move = self.outcome.is_none()
            && self
                .game
                .as_ref()
                .is_some_and(|game| game.active == game.local_side);
        self.local_clock = local_to_move.then(Instant::now);
    }

    fn game_mut(&mut self) -> Result<&mut MatchState, ArbiterError> {
        self.game.as_mut().ok_or(ArbiterError::NoMatch)
    }

    fn report(&self) -> Result<StepReport, ArbiterError> {
        let game = self.game.as_ref().ok_or(ArbiterError::NoMatch)?;
        Ok(StepReport {
            board: game.board.clone(),
            side: game.local_side,
            phase: game.phase(),
            local_to_move: self.outcome.is_none() && game.active == game.local_side,
            outcome: self.outcome,
        })
    }

    fn send(&mut self, message: &Message) -> Result<(), ArbiterError> {
        let peer = self.peer.as_mut().ok_or(ArbiterError::NoMatch)?;
        let line = message.encode();
        debug!(line = line.trim_end(), "to peer");
        peer.send_line(&line)?;
        Ok(())
    }

    /// Read and apply peer messages while the peer is to move.
    fn run_peer(&mut self) -> Result<(), ArbiterError> {
        while self.outcome.is_none() {
            let game = self.game.as_ref().ok_or(ArbiterError::NoMatch)?;
            if game.active != game.peer_side {
                break;
            }
            if let Err(e) = self.peer_turn() {
                return Err(self.abort(e));
            }
        }
        Ok(())
    }

    fn peer_turn(&mut self) -> Result<(), ArbiterError> {
        let started = Instant::now();
        let bytes = self.peer.as_mut().ok_or(ArbiterError::NoMatch)?.recv_line()?;
        let game = self.game_mut()?;
        game.peer_time += started.elapsed();
        let line = String::from_utf8(bytes)
            .map_err(|_| ArbiterError::InvalidMessage("message is not valid UTF-8".into()))?;
        debug!(line = line.trim_end(), "from peer");
        let game = self.game.as_ref().ok_or(ArbiterError::NoMatch)?;

        match Message::decode(&line, self.holes)? {
            Message::Move(hole) => {
                let mv = Move::new(game.peer_side, hole)
                    .map_err(|_| ArbiterError::InvalidMessage("hole numbers start at 1".into()))?;
                if !rules::is_legal(&game.board, mv) {
                    return Err(ArbiterError::IllegalMove(format!("{} hole {hole}", game.peer_side)));
                }
                self.play(mv, Party::Peer)
            }
            Message::Swap if game.swap_available() => self.swap(Party::Peer),
            Message::Swap => Err(ArbiterError::InvalidMessage(
                "swap is only allowed as the reply to the first move".into(),
            )),
            other => Err(ArbiterError::InvalidMessage(format!(
                "expected a move, got {}",
                other.encode().trim_end()
            ))),
        }
    }

    /// Apply a legal hole move, update the turn and tell the peer.
    fn play(&mut self, mv: Move, by: Party) -> Result<(), ArbiterError> {
        let game = self.game_mut()?;
        let phase = game.phase();
        let next = rules::apply_in_phase(&mut game.board, mv, phase)?;
        game.active = next;
        game.move_count += 1;
        match by {
            Party::Local => game.local_moves += 1,
            Party::Peer => game.peer_moves += 1,
        }
        let done = rules::is_terminal(&game.board);
        let turn = if done {
            Turn::End
        } else if game.active == game.peer_side {
            Turn::You
        } else {
            Turn::Opp
        };
        debug!(?by, side = %mv.side(), hole = mv.hole(), next = %next, "move applied");
        let change = Message::Change {
            action: Action::Hole(mv.hole()),
            board: game.board.clone(),
            turn,
        };
        self.send(&change)?;
        if done {
            self.finish();
        }
        Ok(())
    }

    /// Exchange the sides of both parties. The board and the side to move
    /// stay as they are, so the party that did not swap moves next.
    fn swap(&mut self, by: Party) -> Result<(), ArbiterError> {
        let game = self.game_mut()?;
        std::mem::swap(&mut game.local_side, &mut game.peer_side);
        game.move_count += 1;
        info!(?by, local = %game.local_side, "sides swapped");
        if by == Party::Local {
            let change = Message::Change {
                action: Action::Swap,
                board: game.board.clone(),
                turn: Turn::You,
            };
            self.send(&change)?;
        }
        Ok(())
    }

    fn finish(&mut self) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        let outcome = MatchOutcome::Completed {
            score: game.score(),
        };
        let (local_moves, peer_moves) = game.moves_by_party();
        let (local_ms, peer_ms) = game.millis_per_move();
        info!(
            score = outcome.score(),
            local_moves, local_ms, peer_moves, peer_ms, "match finished"
        );
        self.outcome = Some(outcome);
        if self.config.send_end {
            if let Err(e) = self.send(&Message::End) {
                warn!("failed to send END to peer: {e}");
            }
        }
    }

    /// Force the match to its end after a peer failure and hand back `err`.
    fn abort(&mut self, err: ArbiterError) -> ArbiterError {
        let score = self.game.as_ref().map_or(0, MatchState::score);
        let outcome = match err {
            ArbiterError::InvalidMessage(_) => MatchOutcome::ProtocolViolation { score },
            _ => MatchOutcome::Aborted { score },
        };
        warn!(%err, ?outcome, "match aborted");
        self.outcome = Some(outcome);
        if !matches!(err, ArbiterError::ProcessFailure(_)) {
            if let Err(e) = self.send(&Message::End) {
                warn!("failed to send END to peer: {e}");
            }
        }
        err
    }
}
