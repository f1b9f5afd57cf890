use std::time::{Duration, Instant};

use tracing::debug;

use crate::game::{rules, Action, Board, Move, Phase, Side};

use super::agent::{Agent, Position};

/// Trait for evaluating a non-terminal board from one side's perspective.
///
/// Implementations must be deterministic. Higher is better for `side`.
pub trait Heuristic: Send {
    fn evaluate(&self, board: &Board, side: Side) -> f64;
}

impl<F> Heuristic for F
where
    F: Fn(&Board, Side) -> f64 + Send,
{
    fn evaluate(&self, board: &Board, side: Side) -> f64 {
        self(board, side)
    }
}

/// Plain store difference.
pub struct StoreDifference;

impl Heuristic for StoreDifference {
    fn evaluate(&self, board: &Board, side: Side) -> f64 {
        board.store_difference(side) as f64
    }
}

/// Weights of the linear evaluator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub own_store: f64,
    pub opponent_store: f64,
    pub own_seeds: f64,
    pub opponent_seeds: f64,
    pub non_empty_holes: f64,
    pub leftmost_hole: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        HeuristicWeights {
            own_store: 1.0,
            opponent_store: 0.57,
            own_seeds: 0.19,
            opponent_seeds: 0.0,
            non_empty_holes: 0.37,
            leftmost_hole: 0.20,
        }
    }
}

/// Hand-tuned linear combination of store and hole features.
pub struct WeightedHeuristic {
    weights: HeuristicWeights,
}

impl WeightedHeuristic {
    pub fn new(weights: HeuristicWeights) -> Self {
        WeightedHeuristic { weights }
    }
}

impl Default for WeightedHeuristic {
    fn default() -> Self {
        Self::new(HeuristicWeights::default())
    }
}

impl Heuristic for WeightedHeuristic {
    fn evaluate(&self, board: &Board, side: Side) -> f64 {
        let w = &self.weights;
        let own = board.side_holes(side);
        let non_empty = own.iter().filter(|&&s| s > 0).count();

        w.own_store * f64::from(board.store(side))
            - w.opponent_store * f64::from(board.store(side.opposite()))
            + w.own_seeds * f64::from(board.seeds_on_side(side))
            - w.opponent_seeds * f64::from(board.seeds_on_side(side.opposite()))
            + w.non_empty_holes * non_empty as f64
            + w.leftmost_hole * f64::from(own[0])
    }
}

/// Score and chosen action of a search. `action` is `None` when the root was
/// already terminal or the depth was zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub score: f64,
    pub action: Option<Action>,
}

/// Depth-limited minimax with alpha-beta pruning, maximizing for `my_side`.
///
/// `phase` describes the root: in [`Phase::Opening`] the first move never
/// earns an extra turn, and in [`Phase::SwapWindow`] the side to move may
/// also answer with [`Action::Swap`]. The caller's board is never modified.
pub fn search(
    board: &Board,
    my_side: Side,
    active_side: Side,
    phase: Phase,
    depth: usize,
    heuristic: &dyn Heuristic,
) -> SearchResult {
    Minimax::new(heuristic).search(board, my_side, active_side, phase, depth)
}

/// Reusable search state: node counter, optional deadline and a per-ply arena
/// of scratch boards so exploring siblings does not allocate.
pub struct Minimax<'h> {
    heuristic: &'h dyn Heuristic,
    deadline: Option<Instant>,
    timed_out: bool,
    nodes: u64,
    arena: Vec<Board>,
}

impl<'h> Minimax<'h> {
    pub fn new(heuristic: &'h dyn Heuristic) -> Self {
        Minimax {
            heuristic,
            deadline: None,
            timed_out: false,
            nodes: 0,
            arena: Vec::new(),
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Nodes visited since creation.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Search ignoring any deadline.
    pub fn search(
        &mut self,
        board: &Board,
        my_side: Side,
        active_side: Side,
        phase: Phase,
        depth: usize,
    ) -> SearchResult {
        let deadline = self.deadline.take();
        self.timed_out = false;
        let result = self.node(
            board,
            my_side,
            active_side,
            phase,
            depth,
            0,
            f64::NEG_INFINITY,
            f64::INFINITY,
        );
        self.deadline = deadline;
        result
    }

    /// Search that gives up once the deadline passes. `None` means the
    /// iteration did not finish and its result must not be used.
    pub fn search_until(
        &mut self,
        board: &Board,
        my_side: Side,
        active_side: Side,
        phase: Phase,
        depth: usize,
    ) -> Option<SearchResult> {
        self.timed_out = false;
        let result = self.node(
            board,
            my_side,
            active_side,
            phase,
            depth,
            0,
            f64::NEG_INFINITY,
            f64::INFINITY,
        );
        if self.timed_out {
            None
        } else {
            Some(result)
        }
    }

    fn out_of_time(&mut self) -> bool {
        if self.timed_out {
            return true;
        }
        if let Some(deadline) = self.deadline {
            if self.nodes % 1024 == 0 && Instant::now() >= deadline {
                self.timed_out = true;
            }
        }
        self.timed_out
    }

    fn take_scratch(&mut self, ply: usize) -> Board {
        if self.arena.len() <= ply {
            self.arena.resize_with(ply + 1, Board::default);
        }
        std::mem::take(&mut self.arena[ply])
    }

    #[allow(clippy::too_many_arguments)]
    fn node(
        &mut self,
        board: &Board,
        my_side: Side,
        active: Side,
        phase: Phase,
        depth: usize,
        ply: usize,
        mut alpha: f64,
        mut beta: f64,
    ) -> SearchResult {
        self.nodes += 1;

        if rules::is_terminal(board) {
            return SearchResult {
                score: board.store_difference(my_side) as f64,
                action: None,
            };
        }
        if depth == 0 || self.out_of_time() {
            return SearchResult {
                score: self.heuristic.evaluate(board, my_side),
                action: None,
            };
        }

        let maximizing = active == my_side;
        let mut best = SearchResult {
            score: if maximizing {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            },
            action: None,
        };

        // Swapping keeps the board and the side to move; only ownership flips.
        // It goes first so that a hole move has to be strictly better.
        if phase.swap_available() {
            let score = self
                .node(
                    board,
                    my_side.opposite(),
                    active,
                    Phase::Midgame,
                    depth - 1,
                    ply + 1,
                    alpha,
                    beta,
                )
                .score;
            best = SearchResult {
                score,
                action: Some(Action::Swap),
            };
            if maximizing {
                alpha = alpha.max(score);
            } else {
                beta = beta.min(score);
            }
        }

        let mut child = self.take_scratch(ply);
        for hole in rules::legal_moves(board, active) {
            if alpha >= beta || self.timed_out {
                break;
            }
            let Ok(mv) = Move::new(active, hole) else {
                continue;
            };
            child.clone_from(board);
            let Ok(next) = rules::apply_in_phase(&mut child, mv, phase) else {
                continue;
            };
            let score = self
                .node(
                    &child,
                    my_side,
                    next,
                    phase.after_move(),
                    depth - 1,
                    ply + 1,
                    alpha,
                    beta,
                )
                .score;

            if maximizing {
                if score > best.score {
                    best = SearchResult {
                        score,
                        action: Some(Action::Hole(hole)),
                    };
                }
                alpha = alpha.max(score);
            } else {
                if score < best.score {
                    best = SearchResult {
                        score,
                        action: Some(Action::Hole(hole)),
                    };
                }
                beta = beta.min(score);
            }
        }
        self.arena[ply] = child;

        best
    }
}

/// Minimax agent with iterative deepening under an optional time limit.
pub struct MinimaxAgent {
    depth: usize,
    time_limit: Option<Duration>,
    heuristic: Box<dyn Heuristic>,
}

impl MinimaxAgent {
    pub fn new(depth: usize) -> Self {
        MinimaxAgent {
            depth,
            time_limit: None,
            heuristic: Box::new(WeightedHeuristic::default()),
        }
    }

    pub fn with_heuristic(depth: usize, heuristic: Box<dyn Heuristic>) -> Self {
        MinimaxAgent {
            depth,
            time_limit: None,
            heuristic,
        }
    }

    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    fn best_action(&mut self, position: &Position<'_>) -> Option<Action> {
        let legal = rules::legal_moves(position.board, position.side);
        let fallback = legal.first().map(|&hole| Action::Hole(hole))?;

        let deadline = self.time_limit.map(|limit| Instant::now() + limit);
        let mut searcher = Minimax::new(&*self.heuristic).with_deadline(deadline);
        let (board, side, phase) = (position.board, position.side, position.phase);

        let Some(deadline) = deadline else {
            let result = searcher.search(board, side, side, phase, self.depth);
            debug!(
                depth = self.depth,
                score = result.score,
                nodes = searcher.nodes(),
                "search finished"
            );
            return result.action.or(Some(fallback));
        };

        let mut best = None;
        for depth in 1..=self.depth {
            match searcher.search_until(board, side, side, phase, depth) {
                Some(result) => {
                    debug!(depth, score = result.score, action = ?result.action, "iteration complete");
                    best = result.action.or(best);
                }
                None => {
                    debug!(depth, "deadline reached, keeping previous iteration");
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
        }
        debug!(nodes = searcher.nodes(), "iterative deepening finished");
        best.or(Some(fallback))
    }
}

impl Agent for MinimaxAgent {
    fn select_action(&mut self, position: &Position<'_>) -> Option<Action> {
        self.best_action(position)
    }

    fn name(&self) -> &str {
        "Minimax"
    }
}
