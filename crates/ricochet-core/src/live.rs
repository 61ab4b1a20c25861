//! Live "moves remaining from here" overlay.
//!
//! While enabled, every player move asks the live solver for the optimal
//! number of moves from the current position. Only the newest request's
//! answer is applied. Answers are remembered per position for the rest of
//! the session, so returning to a solved position reads instantly.

use crate::solver::SolveFailure;
use crate::trace;
use crate::types::{Generation, Solution};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Colour bucket for the deviation overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Tier0,
    Tier1,
    Tier2,
    Tier3,
    Tier4,
    Tier5,
}

impl Severity {
    /// Total over all integers: `<= 0` is Tier0, `>= 5` is Tier5
    pub fn from_deviation(deviation: i64) -> Self {
        match deviation {
            i64::MIN..=0 => Severity::Tier0,
            1 => Severity::Tier1,
            2 => Severity::Tier2,
            3 => Severity::Tier3,
            4 => Severity::Tier4,
            _ => Severity::Tier5,
        }
    }

    /// Display colour, green through dark red
    pub fn color_hex(&self) -> &'static str {
        match self {
            Severity::Tier0 => "#006400",
            Severity::Tier1 => "#7CB342",
            Severity::Tier2 => "#C6A700",
            Severity::Tier3 => "#E65100",
            Severity::Tier4 => "#D50000",
            Severity::Tier5 => "#8B0000",
        }
    }
}

/// One applied live result, ready for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviationReading {
    /// Optimal moves from the current position, as reported by the solver
    pub remaining: u32,
    /// Moves over the session optimum if the player finishes optimally from here
    pub delta: i64,
    pub severity: Severity,
    /// Optimal length of the whole puzzle, when known
    pub baseline: Option<u32>,
}

impl DeviationReading {
    pub fn new(remaining: u32, moves_played: u32, baseline: Option<u32>) -> Self {
        let baseline = baseline.filter(|b| *b > 0);
        let delta = baseline
            .map(|b| i64::from(moves_played) + i64::from(remaining) - i64::from(b))
            .unwrap_or(0);
        Self {
            remaining,
            delta,
            severity: Severity::from_deviation(delta),
            baseline,
        }
    }

    /// Overlay text such as `Optimal: 4 (Δ+2)`
    pub fn text(&self) -> String {
        match self.baseline {
            Some(_) => format!("Optimal: {} (Δ{:+})", self.remaining, self.delta),
            None => format!("Optimal: {}", self.remaining),
        }
    }
}

/// Live overlay state
#[derive(Debug, Clone, Default)]
pub struct LiveSolveState {
    pub enabled: bool,
    pub solution: Option<Arc<Solution>>,
    /// Latest non-stale minimal-moves-from-here value
    pub deviation: Option<u32>,
    pub calculating: bool,
    /// Generation of the newest request issued for the overlay
    pub generation: Generation,
}

/// What happened to a delivered result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveUpdate {
    /// Older than the newest request, dropped
    Stale,
    /// Overlay switched off, dropped
    Disabled,
    /// Applied; `None` when the solver found nothing
    Applied(Option<u32>),
}

#[derive(Debug, Clone, Default)]
pub struct LiveDeviationTracker {
    state: LiveSolveState,
}

impl LiveDeviationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LiveSolveState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn deviation(&self) -> Option<u32> {
        self.state.deviation
    }

    pub fn is_calculating(&self) -> bool {
        self.state.calculating
    }

    /// Switch the overlay. Returns true when a solve should be requested
    /// for the current board.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let was_enabled = self.state.enabled;
        self.state.enabled = enabled;
        if !enabled {
            self.clear_result();
        }
        enabled && !was_enabled
    }

    /// Whether a committed move should trigger a new request
    pub fn on_player_move(&self) -> bool {
        self.state.enabled
    }

    /// Record a freshly issued request
    pub fn begin_request(&mut self, generation: Generation) {
        self.state.generation = self.state.generation.max(generation);
        self.state.calculating = true;
    }

    pub fn on_solve_result(
        &mut self,
        generation: Generation,
        result: Result<Arc<Solution>, SolveFailure>,
    ) -> LiveUpdate {
        if generation < self.state.generation {
            trace::debug(
                "live",
                &format!(
                    "dropping stale result: generation {} < {}",
                    generation, self.state.generation
                ),
            );
            return LiveUpdate::Stale;
        }
        if !self.state.enabled {
            return LiveUpdate::Disabled;
        }
        self.state.generation = generation;
        self.state.calculating = false;
        match result {
            Ok(solution) if !solution.is_empty() => {
                let remaining = solution.len() as u32;
                self.state.deviation = Some(remaining);
                self.state.solution = Some(solution);
                LiveUpdate::Applied(Some(remaining))
            }
            Ok(_) | Err(_) => {
                trace::debug("live", "no solution from current position");
                self.state.deviation = None;
                self.state.solution = None;
                LiveUpdate::Applied(None)
            }
        }
    }

    /// Apply a remembered answer for the current position without solving
    pub fn apply_cached(&mut self, remaining: u32) -> LiveUpdate {
        if !self.state.enabled {
            return LiveUpdate::Disabled;
        }
        self.state.calculating = false;
        self.state.solution = None;
        self.state.deviation = Some(remaining);
        LiveUpdate::Applied(Some(remaining))
    }

    /// The newest request was cancelled without a replacement
    pub fn on_cancelled(&mut self, generation: Generation) {
        if generation == self.state.generation {
            self.state.calculating = false;
        }
    }

    /// Session boundary: drop results but keep the toggle and the
    /// generation watermark
    pub fn reset(&mut self) {
        self.clear_result();
    }

    fn clear_result(&mut self) {
        self.state.solution = None;
        self.state.deviation = None;
        self.state.calculating = false;
    }
}

/// Moves remaining from positions already solved in this session
#[derive(Debug, Clone)]
pub struct LiveCache<B> {
    entries: HashMap<B, u32>,
}

impl<B> Default for LiveCache<B> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<B: Hash + Eq> LiveCache<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, board: &B) -> Option<u32> {
        self.entries.get(board).copied()
    }

    /// Only positions with a solution are kept
    pub fn insert(&mut self, board: B, remaining: u32) {
        if remaining > 0 {
            self.entries.insert(board, remaining);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
