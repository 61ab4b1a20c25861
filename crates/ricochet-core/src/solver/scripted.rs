use super::{CancelToken, SolveFailure, SolverBackend};
use crate::types::Move;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// How often a delayed answer checks its cancel flag
const CANCEL_POLL: Duration = Duration::from_millis(5);

/// Canned solver answer for one board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedAnswer {
    /// Optimal moves; empty means the search found nothing
    #[serde(default)]
    pub moves: Vec<Move>,
    /// Simulated search time
    #[serde(default)]
    pub delay_ms: u64,
    /// Backend failure reported instead of a result
    #[serde(default)]
    pub error: Option<String>,
}

impl ScriptedAnswer {
    pub fn solved(moves: Vec<Move>, delay_ms: u64) -> Self {
        Self {
            moves,
            delay_ms,
            error: None,
        }
    }

    pub fn failed(reason: &str, delay_ms: u64) -> Self {
        Self {
            moves: Vec::new(),
            delay_ms,
            error: Some(reason.to_string()),
        }
    }
}

/// Solver backend answering from a table of canned results.
///
/// Each answer is delivered after its simulated delay unless the request is
/// cancelled first. Unknown boards fail.
#[derive(Debug, Clone)]
pub struct ScriptedSolver<B> {
    answers: HashMap<B, ScriptedAnswer>,
}

impl<B: Eq + Hash> Default for ScriptedSolver<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Eq + Hash> ScriptedSolver<B> {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
        }
    }

    pub fn insert(&mut self, board: B, answer: ScriptedAnswer) {
        self.answers.insert(board, answer);
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl<B: Eq + Hash> FromIterator<(B, ScriptedAnswer)> for ScriptedSolver<B> {
    fn from_iter<I: IntoIterator<Item = (B, ScriptedAnswer)>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

impl<B: Eq + Hash + Send + Sync> SolverBackend<B> for ScriptedSolver<B> {
    fn solve(&self, board: &B, cancel: &CancelToken) -> Result<Vec<Move>, SolveFailure> {
        let answer = self
            .answers
            .get(board)
            .ok_or_else(|| SolveFailure::Backend("no scripted answer for board".to_string()))?;

        let deadline = Instant::now() + Duration::from_millis(answer.delay_ms);
        loop {
            if cancel.is_cancelled() {
                return Err(SolveFailure::Cancelled);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(CANCEL_POLL));
        }

        match &answer.error {
            Some(reason) => Err(SolveFailure::Backend(reason.clone())),
            None => Ok(answer.moves.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    #[test]
    fn test_answers_known_board() {
        let solver: ScriptedSolver<&str> = [(
            "start",
            ScriptedAnswer::solved(vec![Move::new(0, Direction::North)], 0),
        )]
        .into_iter()
        .collect();
        let moves = solver.solve(&"start", &CancelToken::new()).unwrap();
        assert_eq!(moves, vec![Move::new(0, Direction::North)]);
        assert!(matches!(
            solver.solve(&"other", &CancelToken::new()),
            Err(SolveFailure::Backend(_))
        ));
    }

    #[test]
    fn test_cancelled_before_delay() {
        let mut solver = ScriptedSolver::new();
        solver.insert(1u8, ScriptedAnswer::solved(Vec::new(), 10_000));
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(solver.solve(&1, &cancel), Err(SolveFailure::Cancelled));
    }

    #[test]
    fn test_answer_json() {
        let json = r#"{"moves":[{"agent":2,"direction":"South"}],"delay_ms":40}"#;
        let answer: ScriptedAnswer = serde_json::from_str(json).unwrap();
        assert_eq!(answer.moves.len(), 1);
        assert_eq!(answer.delay_ms, 40);
        assert_eq!(answer.error, None);
    }
}
