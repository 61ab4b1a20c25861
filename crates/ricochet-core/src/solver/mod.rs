//! Solver boundary.
//!
//! The search itself lives behind [`SolverBackend`]. The coordinator runs
//! it on a worker thread per request and reports back through a channel
//! owned by the consumer.

mod coordinator;
mod scripted;

pub use coordinator::SolverCoordinator;
pub use scripted::{ScriptedAnswer, ScriptedSolver};

use crate::types::{Generation, Move, Solution};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// The opaque solve function.
///
/// Implementations should check `cancel` periodically and return
/// [`SolveFailure::Cancelled`] once it is set.
pub trait SolverBackend<B>: Send + Sync {
    fn solve(&self, board: &B, cancel: &CancelToken) -> Result<Vec<Move>, SolveFailure>;
}

/// Shared cancellation flag handed to a running solve
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a solve did not produce a solution
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SolveFailure {
    #[error("solve cancelled")]
    Cancelled,
    #[error("no solution found")]
    NoSolution,
    #[error("solver failed: {0}")]
    Backend(String),
}

/// Logical consumer of solver results, each with its own coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Consumer {
    /// Solution for the staged hints, solved from the session's start board
    Hints,
    /// Live deviation overlay, solved from the current board
    Live,
}

impl std::fmt::Display for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Consumer::Hints => write!(f, "hints"),
            Consumer::Live => write!(f, "live"),
        }
    }
}

/// Identifies one solve request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RequestHandle {
    pub consumer: Consumer,
    pub generation: Generation,
}

/// Lifecycle event of a request. Every handle sees `Started` followed by
/// exactly one of the other three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveEvent {
    Started,
    Completed(Arc<Solution>),
    Failed(SolveFailure),
    Cancelled,
}

impl SolveEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SolveEvent::Started)
    }
}

/// A solve event addressed to its request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverEvent {
    pub consumer: Consumer,
    pub generation: Generation,
    pub event: SolveEvent,
}

impl SolverEvent {
    pub fn handle(&self) -> RequestHandle {
        RequestHandle {
            consumer: self.consumer,
            generation: self.generation,
        }
    }
}
