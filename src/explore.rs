//! Depth-first expansion of a move line into a pruned opening tree.
//!
//! At every node the explorer is either *branching* (follow each of the
//! engine's top-N moves) or *only-best* (follow the single best move). The
//! mode flips every ply, so one side is answered with its best move while
//! the other side's replies fan out.

use std::collections::{BTreeSet, HashSet};
use std::io::{BufRead, Write};

use log::{debug, info};

use crate::engine::{Candidates, Engine};
use crate::error::{EngineError, ExploreError};
use crate::moves::{Move, MoveSequence};

/// Candidates at or below this score (centipawns, engine's sign convention)
/// are treated as losing. Not renormalised per side to move.
pub const CP_THRESHOLD: i32 = -250;

/// Milestone interval for `Progress::milestone`, in collected lines.
const MILESTONE_EVERY: usize = 100;

/// What the explorer needs from an engine.
pub trait Oracle {
    /// Transposition key for the position after `line`; empty when unknown.
    fn position_key(&mut self, line: &MoveSequence) -> Result<String, EngineError>;

    fn best_moves(&mut self, line: &MoveSequence, depth: u32, lines: u32) -> Result<Candidates, EngineError>;

    /// Number of variations to request in branching mode.
    fn multipv(&self) -> u32;
}

impl<R: BufRead, W: Write> Oracle for Engine<R, W> {
    fn position_key(&mut self, line: &MoveSequence) -> Result<String, EngineError> {
        self.set_position(line)?;
        self.current_fen()
    }

    fn best_moves(&mut self, line: &MoveSequence, depth: u32, lines: u32) -> Result<Candidates, EngineError> {
        self.find_best_moves(line, depth, lines)
    }

    fn multipv(&self) -> u32 { Engine::multipv(self) }
}

pub struct NodeReport<'a> {
    pub line: &'a MoveSequence,
    pub candidates: &'a Candidates,
    /// Variation depth left below the children of this node.
    pub remaining: u32,
    pub collected: usize,
}

/// Receives diagnostics while a tree is being explored.
pub trait Progress {
    fn node(&mut self, report: &NodeReport<'_>);

    fn milestone(&mut self, _collected: usize) {}
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn node(&mut self, _report: &NodeReport<'_>) {}
}

/// Forwards diagnostics to the `log` facade under the `explore` target.
pub struct LogProgress;

impl Progress for LogProgress {
    fn node(&mut self, report: &NodeReport<'_>) {
        debug!(target: "explore", "line: {}", report.line);
        let best: Vec<String> = report.candidates.iter().map(|(mv, cp)| format!("{mv} ({cp})")).collect();
        info!(target: "explore", "best: {} | depth left: {}", best.join(", "), report.remaining);
    }

    fn milestone(&mut self, collected: usize) {
        info!(target: "explore", "variations calculated: {collected}");
    }
}

pub struct ExploreParams<'p> {
    pub variation_depth: u32,
    pub search_depth: u32,
    /// True when white answers with its best move only and black branches.
    pub is_white: bool,
    pub progress: &'p mut dyn Progress,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExploreStats {
    pub nodes: usize,
    pub transpositions: usize,
    pub pruned: usize,
}

/// Mode of the root node: only-best when the side to move is `is_white`'s side.
pub fn root_only_best(initial: &MoveSequence, is_white: bool) -> bool {
    (initial.len() % 2 == 1) != is_white
}

pub struct Explorer<'o, O: Oracle> {
    oracle: &'o mut O,
}

struct Run<'p> {
    search_depth: u32,
    multipv: u32,
    progress: &'p mut dyn Progress,
    visited: HashSet<String>,
    results: BTreeSet<String>,
    stats: ExploreStats,
}

impl<'o, O: Oracle> Explorer<'o, O> {
    pub fn new(oracle: &'o mut O) -> Self { Self { oracle } }

    pub fn explore(&mut self, initial: &MoveSequence, params: ExploreParams<'_>) -> Result<BTreeSet<String>, ExploreError> {
        self.explore_with_stats(initial, params).map(|(set, _)| set)
    }

    /// Expands `initial` and returns every terminal line. On error nothing
    /// collected so far is returned.
    pub fn explore_with_stats(
        &mut self,
        initial: &MoveSequence,
        params: ExploreParams<'_>,
    ) -> Result<(BTreeSet<String>, ExploreStats), ExploreError> {
        let mut run = Run {
            search_depth: params.search_depth,
            multipv: self.oracle.multipv().max(1),
            progress: params.progress,
            visited: HashSet::new(),
            results: BTreeSet::new(),
            stats: ExploreStats::default(),
        };
        let only_best = root_only_best(initial, params.is_white);
        self.expand(&mut run, initial, params.variation_depth, only_best)?;
        Ok((run.results, run.stats))
    }

    fn expand(&mut self, run: &mut Run<'_>, line: &MoveSequence, depth: u32, only_best: bool) -> Result<(), ExploreError> {
        if depth == 0 {
            run.results.insert(line.to_string());
            return Ok(());
        }

        let key = self.oracle.position_key(line).map_err(|e| wrap(line, e))?;
        if !key.is_empty() && !run.visited.insert(key) {
            run.stats.transpositions += 1;
            run.results.insert(line.to_string());
            return Ok(());
        }

        let lines = if only_best { 1 } else { run.multipv };
        let candidates = self.oracle.best_moves(line, run.search_depth, lines).map_err(|e| wrap(line, e))?;
        run.stats.nodes += 1;

        let collected = run.results.len();
        run.progress.node(&NodeReport { line, candidates: &candidates, remaining: depth - 1, collected });
        if collected > 0 && collected % MILESTONE_EVERY == 0 {
            run.progress.milestone(collected);
        }

        if candidates.is_empty() {
            run.results.insert(line.to_string());
            return Ok(());
        }

        if only_best {
            let Some(best) = pick_best(&candidates) else { return Ok(()) };
            if best.eval() < CP_THRESHOLD {
                run.stats.pruned += 1;
                return Ok(());
            }
            return self.expand(run, &line.extended(best), depth - 1, false);
        }

        let mut any_good = false;
        for (token, &cp) in &candidates {
            let next = line.extended(Move::new(token.as_str(), cp));
            if cp > CP_THRESHOLD {
                any_good = true;
                self.expand(run, &next, depth - 1, true)?;
            } else {
                // one more ply to confirm the line is really lost
                self.expand(run, &next, 1, true)?;
            }
        }
        if !any_good {
            run.results.insert(line.to_string());
        }
        Ok(())
    }
}

// Several same-depth reports with different moves can survive in only-best
// mode; take the highest score, lowest token on ties.
fn pick_best(candidates: &Candidates) -> Option<Move> {
    candidates
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(token, &cp)| Move::new(token.as_str(), cp))
}

fn wrap(line: &MoveSequence, source: EngineError) -> ExploreError {
    ExploreError::Engine { line: line.to_string(), source }
}
