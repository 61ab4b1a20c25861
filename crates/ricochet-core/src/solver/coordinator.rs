use super::{
    CancelToken, Consumer, RequestHandle, SolveEvent, SolveFailure, SolverBackend, SolverEvent,
};
use crate::trace;
use crate::types::{Generation, Move, Solution};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct ActiveRequest {
    handle: RequestHandle,
    cancel: CancelToken,
}

/// Single-outstanding-request adapter between one consumer and the solver.
///
/// `Started` and `Cancelled` are queued on the owner side; `Completed` and
/// `Failed` arrive from the worker thread. Worker results that do not belong
/// to the active request are dropped, so each handle terminates exactly once.
pub struct SolverCoordinator<B> {
    consumer: Consumer,
    backend: Arc<dyn SolverBackend<B>>,
    tx: mpsc::Sender<SolverEvent>,
    rx: mpsc::Receiver<SolverEvent>,
    queued: VecDeque<SolverEvent>,
    last_generation: Generation,
    active: Option<ActiveRequest>,
    restart_count: u32,
    last_minimal_moves: Option<u32>,
}

impl<B: Clone + Send + 'static> SolverCoordinator<B> {
    pub fn new(consumer: Consumer, backend: Arc<dyn SolverBackend<B>>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            consumer,
            backend,
            tx,
            rx,
            queued: VecDeque::new(),
            last_generation: 0,
            active: None,
            restart_count: 0,
            last_minimal_moves: None,
        }
    }

    pub fn consumer(&self) -> Consumer {
        self.consumer
    }

    /// Times a new request replaced one that was still running
    pub fn restart_count(&self) -> u32 {
        self.restart_count
    }

    /// Length of the most recent completed solution, kept across restarts
    pub fn last_minimal_moves(&self) -> Option<u32> {
        self.last_minimal_moves
    }

    pub fn is_pending(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_handle(&self) -> Option<RequestHandle> {
        self.active.as_ref().map(|a| a.handle)
    }

    pub fn last_generation(&self) -> Generation {
        self.last_generation
    }

    /// Start solving `board`, superseding any running request
    pub fn request(&mut self, board: &B) -> RequestHandle {
        if let Some(previous) = self.active.take() {
            self.restart_count += 1;
            self.abort(previous);
        }
        self.last_generation += 1;
        let handle = RequestHandle {
            consumer: self.consumer,
            generation: self.last_generation,
        };

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let board = board.clone();
        std::thread::spawn(move || {
            let outcome = run_solve(backend.as_ref(), &board, &worker_cancel);
            if worker_cancel.is_cancelled() {
                return;
            }
            let event = match outcome {
                Ok(moves) => {
                    SolveEvent::Completed(Arc::new(Solution::new(handle.generation, moves)))
                }
                Err(SolveFailure::Cancelled) => SolveEvent::Cancelled,
                Err(failure) => SolveEvent::Failed(failure),
            };
            let _ = tx.send(SolverEvent {
                consumer: handle.consumer,
                generation: handle.generation,
                event,
            });
        });

        trace::debug(
            "solver",
            &format!("{} request started: generation {}", self.consumer, handle.generation),
        );
        self.active = Some(ActiveRequest { handle, cancel });
        self.queued.push_back(SolverEvent {
            consumer: handle.consumer,
            generation: handle.generation,
            event: SolveEvent::Started,
        });
        handle
    }

    /// Cancel `handle` if it is the running request
    pub fn cancel(&mut self, handle: RequestHandle) -> bool {
        match self.active.take() {
            Some(active) if active.handle == handle => {
                self.abort(active);
                true
            }
            other => {
                self.active = other;
                false
            }
        }
    }

    pub fn cancel_active(&mut self) {
        if let Some(active) = self.active.take() {
            self.abort(active);
        }
    }

    /// Session boundary: cancel, skip a generation and forget the counters
    pub fn invalidate(&mut self) {
        self.cancel_active();
        self.last_generation += 1;
        self.restart_count = 0;
        self.last_minimal_moves = None;
    }

    fn abort(&mut self, active: ActiveRequest) {
        // the detached worker exits on its own once it sees the flag
        active.cancel.cancel();
        trace::debug(
            "solver",
            &format!(
                "{} request cancelled: generation {}",
                self.consumer, active.handle.generation
            ),
        );
        self.queued.push_back(SolverEvent {
            consumer: active.handle.consumer,
            generation: active.handle.generation,
            event: SolveEvent::Cancelled,
        });
    }

    /// Collect every event available without blocking
    pub fn drain(&mut self) -> Vec<SolverEvent> {
        let mut events: Vec<SolverEvent> = self.queued.drain(..).collect();
        while let Ok(event) = self.rx.try_recv() {
            if let Some(event) = self.accept(event) {
                events.push(event);
            }
        }
        events
    }

    /// Block until the next event or `timeout`
    pub fn wait_event(&mut self, timeout: Duration) -> Option<SolverEvent> {
        if let Some(event) = self.queued.pop_front() {
            return Some(event);
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(event) => {
                    if let Some(event) = self.accept(event) {
                        return Some(event);
                    }
                }
                Err(_) => return None,
            }
        }
    }

    fn accept(&mut self, event: SolverEvent) -> Option<SolverEvent> {
        let is_active = self
            .active
            .as_ref()
            .is_some_and(|a| a.handle.generation == event.generation);
        if !is_active {
            trace::debug(
                "solver",
                &format!(
                    "{} dropping result for inactive generation {}",
                    self.consumer, event.generation
                ),
            );
            return None;
        }
        self.active = None;
        if let SolveEvent::Completed(solution) = &event.event {
            if !solution.is_empty() {
                self.last_minimal_moves = Some(solution.len() as u32);
            }
        }
        Some(event)
    }
}

/// Run the backend, turning a panic into a backend failure so the request
/// still ends with a terminal event
fn run_solve<B>(
    backend: &dyn SolverBackend<B>,
    board: &B,
    cancel: &CancelToken,
) -> Result<Vec<Move>, SolveFailure> {
    panic::catch_unwind(AssertUnwindSafe(|| backend.solve(board, cancel))).unwrap_or_else(
        |payload| {
            let reason = panic_reason(payload.as_ref());
            trace::error("solver", &format!("solver panicked: {}", reason));
            Err(SolveFailure::Backend(format!("solver panicked: {}", reason)))
        },
    )
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<B> Drop for SolverCoordinator<B> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}
