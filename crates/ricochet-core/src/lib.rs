//! Hint disclosure and live deviation tracking for sliding-robot puzzles.
//!
//! The solver itself is not part of this crate; it is plugged in through
//! [`SolverBackend`]. Everything else, from the staged hints to the
//! "moves from here" overlay, is driven by a [`HintSession`].

pub mod config;
pub mod hints;
pub mod live;
pub mod presentation;
pub mod session;
pub mod solver;
pub mod trace;
pub mod types;

pub use config::{ConfigError, HintConfig, SessionConfig};
pub use hints::{HintPolicy, HintSequencer, HintStage, HintTier, MoveMatcher};
pub use live::{DeviationReading, LiveCache, LiveDeviationTracker, Severity};
pub use presentation::{HintFormatter, Presenter};
pub use session::{
    HintNavigation, HintSession, Notification, SessionEvent, SolveProblem, SolverStatus, Toggle,
};
pub use solver::{
    CancelToken, Consumer, RequestHandle, ScriptedAnswer, ScriptedSolver, SolveEvent, SolveFailure,
    SolverBackend, SolverCoordinator, SolverEvent,
};
pub use types::{AgentId, Direction, Generation, Move, PlayerMove, Solution};
