//! Session reducer.
//!
//! `HintSession` owns every piece of hint and live-deviation state. Inputs
//! arrive as [`SessionEvent`]s, outputs leave as [`Notification`]s; solver
//! results are picked up by [`HintSession::pump`] on the owner's tick.

use crate::config::{HintConfig, SessionConfig};
use crate::hints::{HintPolicy, HintSequencer, HintStage, MatchOutcome, MoveMatcher};
use crate::live::{DeviationReading, LiveCache, LiveDeviationTracker, LiveUpdate};
use crate::presentation::{HintFormatter, Presenter};
use crate::solver::{
    Consumer, SolveEvent, SolveFailure, SolverBackend, SolverCoordinator, SolverEvent,
};
use crate::trace;
use crate::types::{AgentId, Direction, Generation, Move, PlayerMove};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

/// User-facing switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Hint panel on or off
    Hints(bool),
    /// Live deviation overlay on or off
    LiveDeviation(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintNavigation {
    Next,
    Previous,
    Restart,
}

/// Everything that can happen to a session
#[derive(Debug, Clone)]
pub enum SessionEvent<B> {
    /// New random map, new level or retry
    SessionReset { level_id: i32, board: B },
    /// The player moved a robot; `board` is the position after the move
    MoveCommitted {
        agent: AgentId,
        direction: Direction,
        board: B,
    },
    ToggleChanged(Toggle),
    HintNavigation(HintNavigation),
    SolveCompleted(SolverEvent),
    Tick,
}

/// Why a consumer has no solution to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason")]
pub enum SolveProblem {
    NoSolutionFound,
    Failed(String),
}

impl SolveProblem {
    fn from_failure(failure: &SolveFailure) -> Self {
        match failure {
            SolveFailure::NoSolution => SolveProblem::NoSolutionFound,
            other => SolveProblem::Failed(other.to_string()),
        }
    }
}

/// Progress of one consumer's solver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolverStatus {
    pub consumer: Consumer,
    pub calculating: bool,
    pub restart_count: u32,
    pub last_minimal_moves: Option<u32>,
    /// Status line while the hint solver runs
    pub message: Option<String>,
}

/// Outward notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Notification {
    StageChanged {
        stage: HintStage,
        payload: String,
        announcement: Option<String>,
    },
    HintAvailabilityChanged {
        available: bool,
    },
    DeviationChanged {
        reading: Option<DeviationReading>,
    },
    SolverStatus(SolverStatus),
    SolveFailed {
        consumer: Consumer,
        problem: SolveProblem,
    },
}

impl Notification {
    pub fn deliver(&self, presenter: &mut dyn Presenter) {
        match self {
            Notification::StageChanged {
                stage,
                payload,
                announcement,
            } => presenter.stage_changed(stage, payload, announcement.as_deref()),
            Notification::HintAvailabilityChanged { available } => {
                presenter.hint_availability_changed(*available)
            }
            Notification::DeviationChanged { reading } => {
                presenter.deviation_changed(reading.as_ref())
            }
            Notification::SolverStatus(status) => presenter.solver_status(status),
            Notification::SolveFailed { consumer, problem } => {
                presenter.solve_failed(*consumer, problem)
            }
        }
    }
}

/// Single owner of hint, matcher and live-deviation state for one player
pub struct HintSession<B> {
    config: HintConfig,
    session: SessionConfig,
    rng: StdRng,
    formatter: HintFormatter,
    sequencer: HintSequencer,
    matcher: MoveMatcher,
    live: LiveDeviationTracker,
    hints_solver: SolverCoordinator<B>,
    live_solver: SolverCoordinator<B>,
    live_cache: LiveCache<B>,
    /// Board of the running live request
    live_pending: Option<(Generation, B)>,
    moves: Vec<PlayerMove>,
    board: Option<B>,
    /// Hint solve ended without a usable solution
    hints_failed: bool,
}

impl<B: Clone + Hash + Eq + Send + 'static> HintSession<B> {
    pub fn new(config: HintConfig, backend: Arc<dyn SolverBackend<B>>) -> Self {
        Self::with_rng(config, backend, StdRng::from_entropy())
    }

    /// Reproducible session: the same seed draws the same pre-hint counts
    pub fn with_seed(
        config: HintConfig,
        backend: Arc<dyn SolverBackend<B>>,
        seed: u64,
    ) -> Self {
        Self::with_rng(config, backend, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        config: HintConfig,
        backend: Arc<dyn SolverBackend<B>>,
        mut rng: StdRng,
    ) -> Self {
        let session = SessionConfig::new(0, &config, &mut rng);
        let policy = HintPolicy::new(&config);
        Self {
            formatter: HintFormatter::new(&config),
            sequencer: HintSequencer::new(&session, policy),
            matcher: MoveMatcher::new(config.auto_advance_delay()),
            live: LiveDeviationTracker::new(),
            hints_solver: SolverCoordinator::new(Consumer::Hints, Arc::clone(&backend)),
            live_solver: SolverCoordinator::new(Consumer::Live, backend),
            live_cache: LiveCache::new(),
            live_pending: None,
            moves: Vec::new(),
            board: None,
            hints_failed: false,
            config,
            session,
            rng,
        }
    }

    pub fn config(&self) -> &HintConfig {
        &self.config
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }

    pub fn sequencer(&self) -> &HintSequencer {
        &self.sequencer
    }

    pub fn matcher(&self) -> &MoveMatcher {
        &self.matcher
    }

    pub fn live(&self) -> &LiveDeviationTracker {
        &self.live
    }

    pub fn hints_solver(&self) -> &SolverCoordinator<B> {
        &self.hints_solver
    }

    pub fn live_solver(&self) -> &SolverCoordinator<B> {
        &self.live_solver
    }

    pub fn live_cache(&self) -> &LiveCache<B> {
        &self.live_cache
    }

    /// Moves played since the session started
    pub fn moves(&self) -> &[PlayerMove] {
        &self.moves
    }

    /// Whether either consumer still waits for its solver
    pub fn is_solving(&self) -> bool {
        self.hints_solver.is_pending() || self.live_solver.is_pending()
    }

    pub fn handle(&mut self, event: SessionEvent<B>, now: Instant) -> Vec<Notification> {
        match event {
            SessionEvent::SessionReset { level_id, board } => {
                self.reset_session(level_id, board)
            }
            SessionEvent::MoveCommitted {
                agent,
                direction,
                board,
            } => self.report_move(agent, direction, board, now),
            SessionEvent::ToggleChanged(toggle) => self.toggle(toggle),
            SessionEvent::HintNavigation(nav) => self.navigate(nav),
            SessionEvent::SolveCompleted(event) => self.apply_solver_event(event),
            SessionEvent::Tick => self.pump(now),
        }
    }

    /// Collect solver results and fire a due auto-advance
    pub fn pump(&mut self, now: Instant) -> Vec<Notification> {
        let mut events = self.hints_solver.drain();
        events.extend(self.live_solver.drain());

        let mut out = Vec::new();
        for event in events {
            out.extend(self.apply_solver_event(event));
        }

        if let Some(index) = self.matcher.poll(now) {
            let still_shown = self.sequencer.current_stage().real_index() == Some(index);
            if self.sequencer.is_showing() && still_shown {
                trace::debug("hint", &format!("auto-advance after followed hint {}", index + 1));
                let stage = self.sequencer.advance();
                out.push(self.stage_notification(stage));
            }
        }
        out
    }

    fn reset_session(&mut self, level_id: i32, board: B) -> Vec<Notification> {
        self.hints_solver.invalidate();
        self.live_solver.invalidate();
        self.matcher.cancel();
        self.moves.clear();
        self.hints_failed = false;

        self.session = SessionConfig::new(level_id, &self.config, &mut self.rng);
        self.sequencer.start_session(&self.session);
        self.live.reset();
        self.live_cache.clear();
        self.live_pending = None;
        trace::debug(
            "session",
            &format!(
                "session started: level={} tier={} pre_hints={}",
                self.session.level_id, self.session.tier, self.session.num_pre_hints
            ),
        );

        let handle = self.hints_solver.request(&board);
        self.sequencer.expect_generation(handle.generation);
        let mut out = vec![
            Notification::HintAvailabilityChanged {
                available: self.session.tier.hints_available(),
            },
            Notification::DeviationChanged { reading: None },
        ];
        if self.live.is_enabled() {
            out.extend(self.request_live(&board));
        }
        self.board = Some(board);
        out
    }

    /// A committed player move
    pub fn report_move(
        &mut self,
        agent: AgentId,
        direction: Direction,
        board: B,
        now: Instant,
    ) -> Vec<Notification> {
        let mv = Move::new(agent, direction);
        self.moves.push(PlayerMove {
            agent,
            direction,
            at: now,
        });

        match self.matcher.on_player_move(&self.sequencer, mv, now) {
            MatchOutcome::Scheduled { .. } => {
                trace::debug("hint", &format!("hint followed: {} {}", agent, direction))
            }
            MatchOutcome::Mismatch | MatchOutcome::Ignored => {}
        }

        let mut out = Vec::new();
        if self.live.on_player_move() {
            out.extend(self.request_live(&board));
        }
        self.board = Some(board);
        out
    }

    /// Ask for the moves remaining from `board`, answering from the cache
    /// when the position was solved before. A hit still cancels the running
    /// request.
    fn request_live(&mut self, board: &B) -> Vec<Notification> {
        if let Some(remaining) = self.live_cache.get(board) {
            trace::debug("live", &format!("cache hit: {} moves remaining", remaining));
            self.live_solver.cancel_active();
            self.live_pending = None;
            if let LiveUpdate::Applied(_) = self.live.apply_cached(remaining) {
                return vec![
                    Notification::SolverStatus(self.status(Consumer::Live)),
                    Notification::DeviationChanged {
                        reading: Some(self.reading(remaining)),
                    },
                ];
            }
            return Vec::new();
        }
        let handle = self.live_solver.request(board);
        self.live.begin_request(handle.generation);
        self.live_pending = Some((handle.generation, board.clone()));
        Vec::new()
    }

    fn toggle(&mut self, toggle: Toggle) -> Vec<Notification> {
        match toggle {
            Toggle::Hints(true) => {
                if !self.session.tier.hints_available() {
                    trace::debug("hint", &format!("hints refused for tier {}", self.session.tier));
                    return vec![Notification::HintAvailabilityChanged { available: false }];
                }
                self.sequencer.show();
                vec![self.stage_notification(self.current_display_stage())]
            }
            Toggle::Hints(false) => {
                self.sequencer.hide();
                self.matcher.cancel();
                Vec::new()
            }
            Toggle::LiveDeviation(enabled) => {
                let request = self.live.set_enabled(enabled);
                if !enabled {
                    self.live_solver.cancel_active();
                    self.live_pending = None;
                    return vec![Notification::DeviationChanged { reading: None }];
                }
                match self.board.clone() {
                    Some(board) if request => self.request_live(&board),
                    _ => Vec::new(),
                }
            }
        }
    }

    fn navigate(&mut self, nav: HintNavigation) -> Vec<Notification> {
        if !self.sequencer.is_showing() {
            return Vec::new();
        }
        self.matcher.cancel();
        let stage = match nav {
            HintNavigation::Next => self.sequencer.advance(),
            HintNavigation::Previous => self.sequencer.retreat(),
            HintNavigation::Restart => {
                self.sequencer.reset();
                self.sequencer.show();
                self.sequencer.current_stage()
            }
        };
        vec![self.stage_notification(self.display_stage(stage))]
    }

    fn apply_solver_event(&mut self, event: SolverEvent) -> Vec<Notification> {
        match event.consumer {
            Consumer::Hints => self.apply_hints_event(event),
            Consumer::Live => self.apply_live_event(event),
        }
    }

    fn apply_hints_event(&mut self, event: SolverEvent) -> Vec<Notification> {
        let mut out = Vec::new();
        match event.event {
            SolveEvent::Started => {
                out.push(Notification::SolverStatus(self.status(Consumer::Hints)));
                if self.sequencer.is_showing() && self.sequencer.solution().is_none() {
                    out.push(self.stage_notification(HintStage::AwaitingSolution));
                }
            }
            SolveEvent::Completed(solution) => {
                let empty = solution.is_empty();
                if !self.sequencer.offer_solution(solution) {
                    return out;
                }
                self.hints_failed = empty;
                out.push(Notification::SolverStatus(self.status(Consumer::Hints)));
                if empty {
                    out.push(Notification::SolveFailed {
                        consumer: Consumer::Hints,
                        problem: SolveProblem::NoSolutionFound,
                    });
                }
                if self.sequencer.is_showing() {
                    out.push(self.stage_notification(self.current_display_stage()));
                }
                if let Some(remaining) = self.live.deviation() {
                    out.push(Notification::DeviationChanged {
                        reading: Some(self.reading(remaining)),
                    });
                }
            }
            SolveEvent::Failed(failure) => {
                if event.generation < self.sequencer.state().generation() {
                    return out;
                }
                trace::debug("solver", &format!("hint solve failed: {}", failure));
                self.hints_failed = true;
                out.push(Notification::SolverStatus(self.status(Consumer::Hints)));
                out.push(Notification::SolveFailed {
                    consumer: Consumer::Hints,
                    problem: SolveProblem::from_failure(&failure),
                });
                if self.sequencer.is_showing() {
                    out.push(self.stage_notification(HintStage::NoSolution));
                }
            }
            SolveEvent::Cancelled => {
                if !self.hints_solver.is_pending() {
                    out.push(Notification::SolverStatus(self.status(Consumer::Hints)));
                }
            }
        }
        out
    }

    fn apply_live_event(&mut self, event: SolverEvent) -> Vec<Notification> {
        let result = match event.event {
            SolveEvent::Started => {
                return vec![Notification::SolverStatus(self.status(Consumer::Live))];
            }
            SolveEvent::Cancelled => {
                self.live.on_cancelled(event.generation);
                if self.live_solver.is_pending() {
                    return Vec::new();
                }
                return vec![Notification::SolverStatus(self.status(Consumer::Live))];
            }
            SolveEvent::Completed(solution) => Ok(solution),
            SolveEvent::Failed(failure) => Err(failure),
        };

        let problem = match &result {
            Ok(solution) if solution.is_empty() => Some(SolveProblem::NoSolutionFound),
            Ok(_) => None,
            Err(failure) => Some(SolveProblem::from_failure(failure)),
        };
        match self.live.on_solve_result(event.generation, result) {
            LiveUpdate::Stale | LiveUpdate::Disabled => Vec::new(),
            LiveUpdate::Applied(remaining) => {
                let solved = self.live_pending.take().filter(|(g, _)| *g == event.generation);
                if let (Some((_, board)), Some(remaining)) = (solved, remaining) {
                    self.live_cache.insert(board, remaining);
                }
                let mut out = vec![
                    Notification::SolverStatus(self.status(Consumer::Live)),
                    Notification::DeviationChanged {
                        reading: remaining.map(|r| self.reading(r)),
                    },
                ];
                if let Some(problem) = problem {
                    out.push(Notification::SolveFailed {
                        consumer: Consumer::Live,
                        problem,
                    });
                }
                out
            }
        }
    }

    fn reading(&self, remaining: u32) -> DeviationReading {
        let baseline = self.sequencer.solution().map(|s| s.len() as u32);
        DeviationReading::new(remaining, self.moves.len() as u32, baseline)
    }

    fn status(&self, consumer: Consumer) -> SolverStatus {
        match consumer {
            Consumer::Hints => {
                let calculating = self.hints_solver.is_pending();
                SolverStatus {
                    consumer,
                    calculating,
                    restart_count: self.hints_solver.restart_count(),
                    last_minimal_moves: self.hints_solver.last_minimal_moves(),
                    message: calculating.then(|| {
                        self.formatter.calculating_text(
                            self.hints_solver.restart_count(),
                            self.hints_solver.last_minimal_moves(),
                        )
                    }),
                }
            }
            Consumer::Live => SolverStatus {
                consumer,
                calculating: self.live.is_calculating(),
                restart_count: self.live_solver.restart_count(),
                last_minimal_moves: self.live_solver.last_minimal_moves(),
                message: None,
            },
        }
    }

    /// Current stage, or `NoSolution` when the hint solve has given up
    fn current_display_stage(&self) -> HintStage {
        self.display_stage(self.sequencer.current_stage())
    }

    fn display_stage(&self, stage: HintStage) -> HintStage {
        if self.hints_failed {
            HintStage::NoSolution
        } else {
            stage
        }
    }

    fn stage_notification(&self, stage: HintStage) -> Notification {
        let status = self.status(Consumer::Hints);
        let text = self.formatter.stage_text(&stage, self.sequencer.state(), &status);
        Notification::StageChanged {
            stage,
            payload: text.payload,
            announcement: text.announcement,
        }
    }
}
