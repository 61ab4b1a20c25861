//! Lightweight diagnostic trace.
//!
//! Every line is kept in a bounded in-memory history. Lines are also written
//! to stderr when `RICOCHET_TRACE` is set to `1` or `true`.

use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

/// Maximum number of lines kept in memory
pub const HISTORY_CAPACITY: usize = 512;

static START: OnceLock<Instant> = OnceLock::new();
static STDERR_ENABLED: OnceLock<bool> = OnceLock::new();
static HISTORY: OnceLock<Mutex<History>> = OnceLock::new();

/// Ring buffer of formatted lines
#[derive(Debug)]
struct History {
    lines: VecDeque<String>,
    capacity: usize,
}

impl History {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }
}

/// Severity of a trace line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Error,
}

impl Level {
    fn tag(&self) -> &'static str {
        match self {
            Level::Debug => "D",
            Level::Error => "E",
        }
    }
}

fn stderr_enabled() -> bool {
    *STDERR_ENABLED.get_or_init(|| {
        std::env::var("RICOCHET_TRACE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

/// Record one line under a scope such as `"hint"` or `"live"`
pub fn record(level: Level, scope: &str, message: &str) {
    let start = START.get_or_init(Instant::now);
    let line = format!(
        "[{}] t={}ms {} {}",
        scope,
        start.elapsed().as_millis(),
        level.tag(),
        message
    );
    if stderr_enabled() {
        eprintln!("{}", line);
    }
    let history = HISTORY.get_or_init(|| Mutex::new(History::new(HISTORY_CAPACITY)));
    if let Ok(mut history) = history.lock() {
        history.push(line);
    }
}

pub fn debug(scope: &str, message: &str) {
    record(Level::Debug, scope, message);
}

pub fn error(scope: &str, message: &str) {
    record(Level::Error, scope, message);
}

/// Snapshot of the recorded lines, oldest first
pub fn history_lines() -> Vec<String> {
    HISTORY
        .get()
        .and_then(|history| history.lock().ok().map(|h| h.lines.iter().cloned().collect()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_recorded_with_scope() {
        debug("trace-test", "marker-4711");
        let lines = history_lines();
        assert!(lines
            .iter()
            .any(|l| l.starts_with("[trace-test]") && l.ends_with("D marker-4711")));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.push(format!("line {}", i));
        }
        let lines: Vec<_> = history.lines.iter().cloned().collect();
        assert_eq!(lines, vec!["line 2", "line 3", "line 4"]);
    }
}
