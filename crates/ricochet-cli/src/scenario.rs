//! Scripted sessions.
//!
//! A scenario names the boards the session will see, the canned solver
//! answer for each of them, and a timeline of player actions.

use ricochet_core::{
    AgentId, Direction, HintNavigation, ScriptedAnswer, ScriptedSolver, SessionEvent, Toggle,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Step {step} refers to unknown board '{board}'")]
    UnknownBoard { step: usize, board: String },
    #[error("Step {step} is scheduled before the step preceding it")]
    OutOfOrder { step: usize },
}

/// Player action at one point of the timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Action {
    Reset {
        #[serde(default)]
        level_id: i32,
        board: String,
    },
    Move {
        agent: AgentId,
        direction: Direction,
        board: String,
    },
    Hints {
        on: bool,
    },
    Live {
        on: bool,
    },
    Next,
    Previous,
    Restart,
}

impl Action {
    pub fn board(&self) -> Option<&str> {
        match self {
            Action::Reset { board, .. } | Action::Move { board, .. } => Some(board),
            _ => None,
        }
    }

    pub fn to_event(&self) -> SessionEvent<String> {
        match self {
            Action::Reset { level_id, board } => SessionEvent::SessionReset {
                level_id: *level_id,
                board: board.clone(),
            },
            Action::Move {
                agent,
                direction,
                board,
            } => SessionEvent::MoveCommitted {
                agent: *agent,
                direction: *direction,
                board: board.clone(),
            },
            Action::Hints { on } => SessionEvent::ToggleChanged(Toggle::Hints(*on)),
            Action::Live { on } => SessionEvent::ToggleChanged(Toggle::LiveDeviation(*on)),
            Action::Next => SessionEvent::HintNavigation(HintNavigation::Next),
            Action::Previous => SessionEvent::HintNavigation(HintNavigation::Previous),
            Action::Restart => SessionEvent::HintNavigation(HintNavigation::Restart),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Reset { level_id, board } => write!(f, "reset level {} on {}", level_id, board),
            Action::Move {
                agent,
                direction,
                board,
            } => write!(f, "move robot {} {} -> {}", agent, direction, board),
            Action::Hints { on } => write!(f, "hints {}", if *on { "on" } else { "off" }),
            Action::Live { on } => write!(f, "live {}", if *on { "on" } else { "off" }),
            Action::Next => write!(f, "next hint"),
            Action::Previous => write!(f, "previous hint"),
            Action::Restart => write!(f, "restart hints"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Offset from the start of the run
    pub at_ms: u64,
    pub action: Action,
}

fn default_settle_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub level_id: i32,
    /// Board the first session starts on
    pub start: String,
    pub boards: HashMap<String, ScriptedAnswer>,
    #[serde(default)]
    pub script: Vec<Step>,
    /// How long to keep ticking after the last step
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Scenario {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.boards.contains_key(&self.start) {
            return Err(ScenarioError::UnknownBoard {
                step: 0,
                board: self.start.clone(),
            });
        }
        let mut previous = 0;
        for (i, step) in self.script.iter().enumerate() {
            let number = i + 1;
            if step.at_ms < previous {
                return Err(ScenarioError::OutOfOrder { step: number });
            }
            previous = step.at_ms;
            if let Some(board) = step.action.board() {
                if !self.boards.contains_key(board) {
                    return Err(ScenarioError::UnknownBoard {
                        step: number,
                        board: board.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn solver(&self) -> ScriptedSolver<String> {
        self.boards
            .iter()
            .map(|(board, answer)| (board.clone(), answer.clone()))
            .collect()
    }

    /// Time of the last scripted step plus the settle window
    pub fn duration_ms(&self) -> u64 {
        self.script.last().map(|s| s.at_ms).unwrap_or(0) + self.settle_ms
    }
}
