use super::sequencer::HintSequencer;
use crate::types::Move;
use std::time::{Duration, Instant};

/// Result of comparing a player move with the displayed hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// No real hint on screen
    Ignored,
    /// The move did not follow the hint
    Mismatch,
    /// The move followed the hint; an advance is pending until `due`
    Scheduled { due: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingAdvance {
    due: Instant,
    hint_index: usize,
}

/// Follows player moves against the displayed real hint and schedules
/// a delayed auto-advance when the player plays the hinted move.
///
/// At most one advance is pending at any time.
#[derive(Debug, Clone)]
pub struct MoveMatcher {
    delay: Duration,
    pending: Option<PendingAdvance>,
}

impl MoveMatcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn on_player_move(
        &mut self,
        sequencer: &HintSequencer,
        mv: Move,
        now: Instant,
    ) -> MatchOutcome {
        if !sequencer.is_showing() {
            return MatchOutcome::Ignored;
        }
        let Some(index) = sequencer.current_stage().real_index() else {
            return MatchOutcome::Ignored;
        };
        let Some(expected) = sequencer.solution().and_then(|s| s.get(index)) else {
            return MatchOutcome::Ignored;
        };
        if expected != mv {
            return MatchOutcome::Mismatch;
        }
        let due = now + self.delay;
        self.pending = Some(PendingAdvance {
            due,
            hint_index: index,
        });
        MatchOutcome::Scheduled { due }
    }

    /// Fire the pending advance once its deadline has passed.
    ///
    /// Returns the hint index that was followed.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        match self.pending {
            Some(pending) if pending.due <= now => {
                self.pending = None;
                Some(pending.hint_index)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending_due(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
