use crate::types::AgentId;
use serde::{Deserialize, Serialize};

/// One disclosure step shown to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum HintStage {
    /// The solver has not delivered a solution yet
    AwaitingSolution,
    /// The solver finished without a usable solution
    NoSolution,
    /// "Fewer than `solution length + remaining` moves"
    RegressingPreHint { remaining: usize },
    /// Exact optimal solution length
    ExactLengthPreHint { length: usize },
    /// Robots that move in the solution, in first-seen order
    InvolvedAgentsPreHint { agents: Vec<AgentId> },
    /// Robot making the first move
    FirstMoveAgentPreHint { agent: AgentId },
    /// Concrete move `index` of the solution
    RealMoveHint { index: usize },
}

impl HintStage {
    pub fn is_pre_hint(&self) -> bool {
        matches!(
            self,
            HintStage::RegressingPreHint { .. }
                | HintStage::ExactLengthPreHint { .. }
                | HintStage::InvolvedAgentsPreHint { .. }
                | HintStage::FirstMoveAgentPreHint { .. }
        )
    }

    /// Index into the solution for real hints
    pub fn real_index(&self) -> Option<usize> {
        match self {
            HintStage::RealMoveHint { index } => Some(*index),
            _ => None,
        }
    }

    /// Upper bound a regressing pre-hint displays for a given solution length
    pub fn regressing_bound(&self, solution_len: usize) -> Option<usize> {
        match self {
            HintStage::RegressingPreHint { remaining } => Some(solution_len + remaining),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        assert!(HintStage::RegressingPreHint { remaining: 2 }.is_pre_hint());
        assert!(HintStage::FirstMoveAgentPreHint { agent: 1 }.is_pre_hint());
        assert!(!HintStage::RealMoveHint { index: 0 }.is_pre_hint());
        assert!(!HintStage::AwaitingSolution.is_pre_hint());
        assert_eq!(HintStage::RealMoveHint { index: 3 }.real_index(), Some(3));
        assert_eq!(HintStage::NoSolution.real_index(), None);
    }

    #[test]
    fn test_regressing_bound() {
        let stage = HintStage::RegressingPreHint { remaining: 3 };
        assert_eq!(stage.regressing_bound(6), Some(9));
        assert_eq!(HintStage::ExactLengthPreHint { length: 6 }.regressing_bound(6), None);
    }

    #[test]
    fn test_tagged_json() {
        let json = serde_json::to_string(&HintStage::RealMoveHint { index: 2 }).unwrap();
        assert_eq!(json, r#"{"kind":"RealMoveHint","index":2}"#);
    }
}
