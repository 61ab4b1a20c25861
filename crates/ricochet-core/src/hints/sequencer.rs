//! Staged hint disclosure.
//!
//! A session walks through `num_pre_hints` regressing pre-hints, then three
//! fixed pre-hints, then one real hint per solution move:
//!
//! ```text
//! step:   0 .. n-1        n        n+1        n+2         n+3 ..
//! stage:  fewer than B    exact    involved   first robot real move 0 ..
//! ```

use super::policy::{HintPolicy, HintTier};
use super::stage::HintStage;
use crate::config::SessionConfig;
use crate::trace;
use crate::types::{Generation, Solution};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Hint progress for one session
#[derive(Debug, Clone)]
pub struct HintState {
    current_step: usize,
    num_pre_hints: usize,
    fixed_pre_hint_count: usize,
    solution: Option<Arc<Solution>>,
    tier: HintTier,
    /// Distinct real hints reached so far
    real_hints_shown: usize,
    /// Whether the hint panel is currently displayed
    showing: bool,
    /// Generation of the latest solve request for this consumer
    generation: Generation,
}

impl HintState {
    pub fn new(session: &SessionConfig) -> Self {
        Self {
            current_step: 0,
            num_pre_hints: session.num_pre_hints,
            fixed_pre_hint_count: session.fixed_pre_hint_count,
            solution: None,
            tier: session.tier,
            real_hints_shown: 0,
            showing: false,
            generation: 0,
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn num_pre_hints(&self) -> usize {
        self.num_pre_hints
    }

    pub fn fixed_pre_hint_count(&self) -> usize {
        self.fixed_pre_hint_count
    }

    pub fn solution(&self) -> Option<&Arc<Solution>> {
        self.solution.as_ref()
    }

    pub fn tier(&self) -> HintTier {
        self.tier
    }

    pub fn real_hints_shown(&self) -> usize {
        self.real_hints_shown
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of stages available, `None` while no solution is installed
    pub fn total_possible_hints(&self) -> Option<usize> {
        self.solution
            .as_ref()
            .map(|s| s.len() + self.num_pre_hints + self.fixed_pre_hint_count)
    }
}

/// Step counters that can be saved and restored within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintSnapshot {
    pub current_step: usize,
    pub num_pre_hints: usize,
    pub real_hints_shown: usize,
}

/// State machine mapping the current step to a disclosure stage
#[derive(Debug, Clone)]
pub struct HintSequencer {
    state: HintState,
    policy: HintPolicy,
}

impl HintSequencer {
    pub fn new(session: &SessionConfig, policy: HintPolicy) -> Self {
        Self {
            state: HintState::new(session),
            policy,
        }
    }

    pub fn state(&self) -> &HintState {
        &self.state
    }

    pub fn policy(&self) -> &HintPolicy {
        &self.policy
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn solution(&self) -> Option<&Arc<Solution>> {
        self.state.solution.as_ref()
    }

    pub fn total_possible_hints(&self) -> Option<usize> {
        self.state.total_possible_hints()
    }

    pub fn is_showing(&self) -> bool {
        self.state.showing
    }

    pub fn show(&mut self) {
        self.state.showing = true;
    }

    pub fn hide(&mut self) {
        self.state.showing = false;
    }

    /// Back to the first stage with the panel hidden
    pub fn reset(&mut self) {
        self.state.current_step = 0;
        self.state.showing = false;
    }

    /// Session teardown: like `reset` but also drops the solution
    pub fn clear(&mut self) {
        self.reset();
        self.state.solution = None;
        self.state.real_hints_shown = 0;
    }

    /// Rebuild for a new session. The generation watermark survives so
    /// results from the previous session stay stale.
    pub fn start_session(&mut self, session: &SessionConfig) {
        let generation = self.state.generation;
        self.state = HintState::new(session);
        self.state.generation = generation;
    }

    /// Record the generation of a newly issued solve request
    pub fn expect_generation(&mut self, generation: Generation) {
        if generation > self.state.generation {
            self.state.generation = generation;
        }
    }

    /// Install a solution unless it belongs to an older request.
    ///
    /// Progress restarts at the first stage; the panel keeps its visibility.
    pub fn offer_solution(&mut self, solution: Arc<Solution>) -> bool {
        if solution.generation() < self.state.generation {
            trace::debug(
                "hint",
                &format!(
                    "dropping stale solution: generation {} < {}",
                    solution.generation(),
                    self.state.generation
                ),
            );
            return false;
        }
        self.state.generation = solution.generation();
        self.state.current_step = 0;
        self.state.real_hints_shown = 0;
        self.state.solution = Some(solution);
        true
    }

    pub fn can_advance(&self) -> bool {
        self.state.solution.is_some() && self.policy.can_advance(&self.state)
    }

    pub fn current_stage(&self) -> HintStage {
        self.stage_at(self.state.current_step)
    }

    /// Move one stage forward if the policy allows it
    pub fn advance(&mut self) -> HintStage {
        let Some(total) = self.total_possible_hints() else {
            return HintStage::AwaitingSolution;
        };
        if !self.policy.can_advance(&self.state) {
            trace::debug(
                "hint",
                &format!(
                    "advance refused: tier={} step={} real_hints_shown={}",
                    self.state.tier, self.state.current_step, self.state.real_hints_shown
                ),
            );
            return self.current_stage();
        }
        if self.state.current_step + 1 < total {
            self.state.current_step += 1;
        }
        let stage = self.current_stage();
        if let Some(index) = stage.real_index() {
            self.state.real_hints_shown = self.state.real_hints_shown.max(index + 1);
        }
        stage
    }

    /// Move one stage back; never gated by the policy
    pub fn retreat(&mut self) -> HintStage {
        if self.state.solution.is_none() {
            return HintStage::AwaitingSolution;
        }
        self.state.current_step = self.state.current_step.saturating_sub(1);
        self.current_stage()
    }

    /// Stage shown at `step`
    pub fn stage_at(&self, step: usize) -> HintStage {
        let Some(solution) = self.state.solution.as_ref() else {
            return HintStage::AwaitingSolution;
        };
        let n = self.state.num_pre_hints;
        if step < n {
            return HintStage::RegressingPreHint { remaining: n - step };
        }
        if step == n {
            return HintStage::ExactLengthPreHint {
                length: solution.len(),
            };
        }
        if step == n + 1 {
            return HintStage::InvolvedAgentsPreHint {
                agents: solution.involved_agents(),
            };
        }
        if step == n + 2 {
            return match solution.get(0) {
                Some(first) => HintStage::FirstMoveAgentPreHint { agent: first.agent },
                None => HintStage::NoSolution,
            };
        }
        if solution.is_empty() {
            return HintStage::NoSolution;
        }
        let index = step - (n + self.state.fixed_pre_hint_count);
        if index >= solution.len() {
            trace::error(
                "hint",
                &format!(
                    "invalid hint index {} (solution has {} moves), clamping",
                    index,
                    solution.len()
                ),
            );
            return HintStage::RealMoveHint {
                index: solution.len() - 1,
            };
        }
        HintStage::RealMoveHint { index }
    }

    pub fn snapshot(&self) -> HintSnapshot {
        HintSnapshot {
            current_step: self.state.current_step,
            num_pre_hints: self.state.num_pre_hints,
            real_hints_shown: self.state.real_hints_shown,
        }
    }

    /// Restore saved counters. Snapshots from a session with a different
    /// pre-hint count are rejected.
    pub fn restore(&mut self, snapshot: HintSnapshot) -> bool {
        if snapshot.num_pre_hints != self.state.num_pre_hints {
            return false;
        }
        let last = self
            .total_possible_hints()
            .map(|t| t.saturating_sub(1))
            .unwrap_or(0);
        self.state.current_step = snapshot.current_step.min(last);
        self.state.real_hints_shown = snapshot.real_hints_shown;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HintConfig;
    use crate::types::{Direction, Move};

    fn solution(len: usize, generation: Generation) -> Arc<Solution> {
        let moves = (0..len)
            .map(|i| Move::new((i % 3) as u32, Direction::all()[i % 4]))
            .collect();
        Arc::new(Solution::new(generation, moves))
    }

    fn sequencer(level_id: i32, num_pre_hints: usize) -> HintSequencer {
        let config = HintConfig::default();
        let session = SessionConfig::with_pre_hints(level_id, num_pre_hints, &config);
        HintSequencer::new(&session, HintPolicy::new(&config))
    }

    #[test]
    fn test_total_possible_hints() {
        for n in 2..=4 {
            for len in 0..10 {
                let mut seq = sequencer(0, n);
                assert_eq!(seq.total_possible_hints(), None);
                seq.offer_solution(solution(len, 1));
                assert_eq!(seq.total_possible_hints(), Some(len + n + 3));
            }
        }
    }

    #[test]
    fn test_six_move_walkthrough() {
        let mut seq = sequencer(0, 3);
        let sol = solution(6, 1);
        seq.offer_solution(sol.clone());
        assert_eq!(seq.total_possible_hints(), Some(12));

        let bounds: Vec<_> = (0..3)
            .map(|s| seq.stage_at(s).regressing_bound(6).unwrap())
            .collect();
        assert_eq!(bounds, vec![9, 8, 7]);
        assert_eq!(seq.stage_at(3), HintStage::ExactLengthPreHint { length: 6 });
        assert_eq!(
            seq.stage_at(4),
            HintStage::InvolvedAgentsPreHint {
                agents: sol.involved_agents()
            }
        );
        assert_eq!(seq.stage_at(5), HintStage::FirstMoveAgentPreHint { agent: 0 });
        for step in 6..12 {
            assert_eq!(seq.stage_at(step), HintStage::RealMoveHint { index: step - 6 });
        }
    }

    #[test]
    fn test_regressing_bounds_strictly_decrease() {
        for n in 2..=4 {
            let mut seq = sequencer(0, n);
            seq.offer_solution(solution(5, 1));
            let mut previous = usize::MAX;
            for s in 0..n {
                let bound = seq.stage_at(s).regressing_bound(5).unwrap();
                assert_eq!(bound, 5 + (n - s));
                assert!(bound < previous);
                previous = bound;
            }
            assert_eq!(seq.stage_at(n - 1).regressing_bound(5), Some(6));
        }
    }

    #[test]
    fn test_stage_at_is_pure() {
        let mut seq = sequencer(0, 2);
        seq.offer_solution(solution(4, 1));
        for step in 0..9 {
            assert_eq!(seq.stage_at(step), seq.stage_at(step));
        }
        assert_eq!(seq.current_step(), 0);
    }

    #[test]
    fn test_snapshot_restore_reproduces_stage() {
        let mut seq = sequencer(0, 4);
        seq.offer_solution(solution(5, 1));
        for _ in 0..8 {
            seq.advance();
        }
        let stage = seq.current_stage();
        let json = serde_json::to_string(&seq.snapshot()).unwrap();

        let mut restored = sequencer(0, 4);
        restored.offer_solution(solution(5, 1));
        assert!(restored.restore(serde_json::from_str(&json).unwrap()));
        assert_eq!(restored.current_step(), 8);
        assert_eq!(restored.current_stage(), stage);

        let mut other = sequencer(0, 2);
        other.offer_solution(solution(5, 1));
        assert!(!other.restore(serde_json::from_str(&json).unwrap()));
    }

    #[test]
    fn test_advance_then_retreat() {
        let mut seq = sequencer(0, 3);
        seq.offer_solution(solution(6, 1));
        let total = seq.total_possible_hints().unwrap();
        for start in 0..total - 1 {
            seq.restore(HintSnapshot {
                current_step: start,
                num_pre_hints: 3,
                real_hints_shown: 0,
            });
            seq.advance();
            seq.retreat();
            assert_eq!(seq.current_step(), start);
        }
    }

    #[test]
    fn test_boundaries_are_no_ops() {
        let mut seq = sequencer(0, 2);
        seq.offer_solution(solution(3, 1));
        assert_eq!(seq.retreat(), HintStage::RegressingPreHint { remaining: 2 });
        assert_eq!(seq.current_step(), 0);

        for _ in 0..20 {
            seq.advance();
        }
        assert_eq!(seq.current_step(), 7);
        assert_eq!(seq.advance(), HintStage::RealMoveHint { index: 2 });
        assert_eq!(seq.current_step(), 7);
    }

    #[test]
    fn test_no_solution_is_inert() {
        let mut seq = sequencer(0, 3);
        assert_eq!(seq.advance(), HintStage::AwaitingSolution);
        assert_eq!(seq.retreat(), HintStage::AwaitingSolution);
        assert_eq!(seq.stage_at(5), HintStage::AwaitingSolution);
        seq.reset();
        assert_eq!(seq.current_step(), 0);
        assert!(!seq.can_advance());
    }

    #[test]
    fn test_out_of_range_index_clamps() {
        let mut seq = sequencer(0, 2);
        seq.offer_solution(solution(3, 1));
        assert_eq!(seq.stage_at(40), HintStage::RealMoveHint { index: 2 });
    }

    #[test]
    fn test_empty_solution_stages() {
        let mut seq = sequencer(0, 2);
        seq.offer_solution(solution(0, 1));
        assert_eq!(seq.total_possible_hints(), Some(5));
        assert_eq!(seq.stage_at(2), HintStage::ExactLengthPreHint { length: 0 });
        assert_eq!(seq.stage_at(4), HintStage::NoSolution);
        assert_eq!(seq.stage_at(5), HintStage::NoSolution);
    }

    #[test]
    fn test_high_tier_refuses_from_first_call() {
        let mut seq = sequencer(15, 0);
        seq.offer_solution(solution(6, 1));
        for _ in 0..5 {
            assert_eq!(seq.advance(), HintStage::ExactLengthPreHint { length: 6 });
        }
        assert_eq!(seq.current_step(), 0);
    }

    #[test]
    fn test_low_tier_caps_real_hints() {
        let mut seq = sequencer(5, 0);
        seq.offer_solution(solution(8, 1));
        let mut reached = Vec::new();
        for _ in 0..20 {
            reached.push(seq.advance());
        }
        let real: Vec<usize> = reached.iter().filter_map(|s| s.real_index()).collect();
        assert_eq!(real.first(), Some(&0));
        assert_eq!(real.iter().max(), Some(&3));
        assert_eq!(seq.state().real_hints_shown(), 4);
        assert_eq!(
            seq.state().real_hints_shown(),
            seq.policy().max_real_hints(HintTier::Low).unwrap()
        );
        assert_eq!(seq.current_stage(), HintStage::RealMoveHint { index: 3 });
        assert!(!seq.can_advance());

        // going back does not lift the cap
        seq.retreat();
        assert_eq!(seq.advance(), HintStage::RealMoveHint { index: 2 });
    }

    #[test]
    fn test_stale_solution_rejected() {
        let mut seq = sequencer(0, 2);
        seq.expect_generation(4);
        assert!(!seq.offer_solution(solution(3, 3)));
        assert!(seq.solution().is_none());
        assert!(seq.offer_solution(solution(3, 4)));
        assert_eq!(seq.state().generation(), 4);
    }

    #[test]
    fn test_new_solution_restarts_progress() {
        let mut seq = sequencer(0, 2);
        seq.offer_solution(solution(3, 1));
        seq.show();
        seq.advance();
        seq.advance();
        seq.offer_solution(solution(4, 2));
        assert_eq!(seq.current_step(), 0);
        assert!(seq.is_showing());
    }

    #[test]
    fn test_clear_drops_solution() {
        let mut seq = sequencer(0, 2);
        seq.offer_solution(solution(3, 1));
        seq.show();
        seq.advance();
        seq.clear();
        assert_eq!(seq.current_step(), 0);
        assert!(!seq.is_showing());
        assert!(seq.solution().is_none());
        assert_eq!(seq.current_stage(), HintStage::AwaitingSolution);
    }

    #[test]
    fn test_start_session_keeps_generation() {
        let config = HintConfig::default();
        let mut seq = sequencer(0, 2);
        seq.expect_generation(9);
        seq.offer_solution(solution(3, 9));
        seq.start_session(&SessionConfig::with_pre_hints(3, 0, &config));
        assert!(seq.solution().is_none());
        assert_eq!(seq.current_step(), 0);
        assert_eq!(seq.state().tier(), HintTier::Low);
        assert!(!seq.offer_solution(solution(3, 8)));
    }
}
