//! Display texts for hint stages and solver status.

use crate::config::HintConfig;
use crate::hints::{HintStage, HintState};
use crate::live::DeviationReading;
use crate::session::{SolveProblem, SolverStatus};
use crate::solver::Consumer;
use crate::types::{AgentId, Move};

/// Display name of a robot, lower case
pub fn agent_name(agent: AgentId) -> String {
    match agent {
        0 => "red".to_string(),
        1 => "green".to_string(),
        2 => "blue".to_string(),
        3 => "yellow".to_string(),
        4 => "silver".to_string(),
        n => format!("robot {}", n),
    }
}

/// Robot name as it starts a hint line
pub fn agent_title(agent: AgentId) -> String {
    let name = agent_name(agent);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

/// One-letter robot tag used in the move history
pub fn agent_abbreviation(agent: AgentId) -> String {
    match agent {
        0..=4 => agent_title(agent).chars().take(1).collect(),
        n => format!("#{}", n),
    }
}

/// Text shown for a stage plus what gets announced to screen readers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintText {
    pub payload: String,
    pub announcement: Option<String>,
}

impl HintText {
    fn announced(payload: String) -> Self {
        Self {
            announcement: Some(payload.clone()),
            payload,
        }
    }
}

/// Builds hint and status texts from the session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintFormatter {
    history_len: usize,
    restart_notice_threshold: u32,
}

impl HintFormatter {
    pub fn new(config: &HintConfig) -> Self {
        Self {
            history_len: config.hint_history_len,
            restart_notice_threshold: config.restart_notice_threshold,
        }
    }

    /// Text for `stage`, read against the sequencer state it came from
    pub fn stage_text(
        &self,
        stage: &HintStage,
        state: &HintState,
        status: &SolverStatus,
    ) -> HintText {
        let solution = state.solution();
        let len = solution.map(|s| s.len()).unwrap_or(0);
        match stage {
            HintStage::AwaitingSolution => HintText {
                payload: self.calculating_text(status.restart_count, status.last_minimal_moves),
                announcement: None,
            },
            HintStage::NoSolution => HintText::announced(no_solution_text()),
            HintStage::RegressingPreHint { remaining } => {
                HintText::announced(format!("Fewer than {} moves", len + remaining))
            }
            HintStage::ExactLengthPreHint { length } => {
                HintText::announced(format!("The optimal solution takes {} moves", length))
            }
            HintStage::InvolvedAgentsPreHint { agents } => {
                let total = state.total_possible_hints().unwrap_or(0);
                HintText::announced(format!(
                    "{}/{}: Involved robots: {}",
                    state.current_step() + 1,
                    total,
                    involved_list(agents)
                ))
            }
            HintStage::FirstMoveAgentPreHint { agent } => {
                HintText::announced(format!("Move the {} robot first", agent_name(*agent)))
            }
            HintStage::RealMoveHint { index } => match solution {
                Some(solution) => self.real_hint_text(solution.moves(), *index),
                None => HintText::announced(no_solution_text()),
            },
        }
    }

    /// Real hint `index` with the abbreviated history of the moves before it
    pub fn real_hint_text(&self, moves: &[Move], index: usize) -> HintText {
        let Some(current) = moves.get(index) else {
            return HintText::announced(no_solution_text());
        };
        let number = index + 1;
        let announcement = format!(
            "{}. {} {}",
            number,
            agent_title(current.agent),
            current.direction.spoken()
        );

        let mut payload = format!("{}. ", number);
        if index > 0 {
            let start = index.saturating_sub(self.history_len);
            if start > 0 {
                payload.push_str("...,");
            }
            let mut last_agent = None;
            let history: Vec<String> = moves[start..index]
                .iter()
                .map(|mv| {
                    let mut entry = String::new();
                    if last_agent != Some(mv.agent) {
                        entry.push_str(&agent_abbreviation(mv.agent));
                    }
                    entry.push(mv.direction.arrow());
                    last_agent = Some(mv.agent);
                    entry
                })
                .collect();
            payload.push_str(&history.join(","));
            payload.push_str(", ");
        }
        payload.push_str(&agent_title(current.agent));
        payload.push(' ');
        payload.push(current.direction.arrow());

        HintText {
            payload,
            announcement: Some(announcement),
        }
    }

    /// Status line while the hint solver runs. Counters appear only after
    /// repeated restarts.
    ///
    /// A session requests its hint solve once and session boundaries zero the
    /// counters, so inside `HintSession` the hint line never carries them; the
    /// suffix shows for owners that re-request the hint solve themselves.
    pub fn calculating_text(&self, restart_count: u32, last_minimal_moves: Option<u32>) -> String {
        let mut text = "AI is calculating...".to_string();
        if restart_count > self.restart_notice_threshold {
            text.push_str(&format!(" ({}", restart_count));
            if let Some(moves) = last_minimal_moves.filter(|m| *m > 0) {
                text.push_str(&format!("/{}", moves));
            }
            text.push(')');
        }
        text
    }
}

impl Default for HintFormatter {
    fn default() -> Self {
        Self::new(&HintConfig::default())
    }
}

pub fn no_solution_text() -> String {
    "No solution found".to_string()
}

/// "red, green and blue robots"
fn involved_list(agents: &[AgentId]) -> String {
    let names: Vec<String> = agents.iter().map(|a| agent_name(*a)).collect();
    match names.as_slice() {
        [] => String::new(),
        [only] => format!("{} robot", only),
        [rest @ .., last] => format!("{} and {} robots", rest.join(", "), last),
    }
}

#[allow(dead_code)]
fn stars_notice(stars: u32) -> String {
    // shown nowhere; the completion screen renders stars itself
    format!("Not enough stars: this level is worth {} stars", stars)
}

/// Receives outward notifications from a session
pub trait Presenter {
    fn stage_changed(&mut self, stage: &HintStage, payload: &str, announcement: Option<&str>);

    fn hint_availability_changed(&mut self, available: bool);

    fn deviation_changed(&mut self, reading: Option<&DeviationReading>);

    fn solver_status(&mut self, status: &SolverStatus);

    fn solve_failed(&mut self, consumer: Consumer, problem: &SolveProblem);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::hints::{HintPolicy, HintSequencer};
    use crate::types::{Direction, Solution};
    use std::sync::Arc;

    fn idle() -> SolverStatus {
        SolverStatus {
            consumer: Consumer::Hints,
            calculating: false,
            restart_count: 0,
            last_minimal_moves: None,
            message: None,
        }
    }

    fn moves(pairs: &[(AgentId, Direction)]) -> Vec<Move> {
        pairs.iter().map(|(a, d)| Move::new(*a, *d)).collect()
    }

    #[test]
    fn test_agent_names() {
        assert_eq!(agent_name(0), "red");
        assert_eq!(agent_title(3), "Yellow");
        assert_eq!(agent_abbreviation(4), "S");
        assert_eq!(agent_name(9), "robot 9");
        assert_eq!(agent_abbreviation(9), "#9");
    }

    #[test]
    fn test_first_real_hint() {
        let formatter = HintFormatter::default();
        let text = formatter.real_hint_text(&moves(&[(0, Direction::North)]), 0);
        assert_eq!(text.payload, "1. Red ↑");
        assert_eq!(text.announcement.as_deref(), Some("1. Red up"));
    }

    #[test]
    fn test_real_hint_history_skips_repeated_robot() {
        let formatter = HintFormatter::default();
        let solution = moves(&[
            (0, Direction::North),
            (0, Direction::East),
            (1, Direction::South),
            (2, Direction::West),
        ]);
        let text = formatter.real_hint_text(&solution, 3);
        assert_eq!(text.payload, "4. R↑,→,G↓, Blue ←");
        assert_eq!(text.announcement.as_deref(), Some("4. Blue left"));
    }

    #[test]
    fn test_real_hint_history_truncated() {
        let formatter = HintFormatter::default();
        let solution: Vec<Move> = (0..9)
            .map(|i| Move::new((i % 2) as u32, Direction::North))
            .collect();
        let text = formatter.real_hint_text(&solution, 8);
        assert_eq!(text.payload, "9. ...,R↑,G↑,R↑,G↑,R↑,G↑, Red ↑");
    }

    #[test]
    fn test_calculating_text_counters() {
        let formatter = HintFormatter::default();
        assert_eq!(formatter.calculating_text(3, Some(7)), "AI is calculating...");
        assert_eq!(formatter.calculating_text(4, None), "AI is calculating... (4)");
        assert_eq!(formatter.calculating_text(5, Some(7)), "AI is calculating... (5/7)");
    }

    #[test]
    fn test_involved_list() {
        assert_eq!(involved_list(&[1]), "green robot");
        assert_eq!(involved_list(&[1, 0]), "green and red robots");
        assert_eq!(involved_list(&[0, 1, 2]), "red, green and blue robots");
    }

    #[test]
    fn test_pre_hint_texts() {
        let config = HintConfig::default();
        let session = SessionConfig::with_pre_hints(0, 2, &config);
        let mut seq = HintSequencer::new(&session, HintPolicy::new(&config));
        seq.offer_solution(Arc::new(Solution::new(
            1,
            moves(&[(2, Direction::East), (0, Direction::South), (2, Direction::North)]),
        )));
        let formatter = HintFormatter::new(&config);
        let status = idle();
        let mut payloads = vec![formatter
            .stage_text(&seq.current_stage(), seq.state(), &status)
            .payload];
        for _ in 0..4 {
            let stage = seq.advance();
            payloads.push(formatter.stage_text(&stage, seq.state(), &status).payload);
        }
        assert_eq!(
            payloads,
            vec![
                "Fewer than 5 moves",
                "Fewer than 4 moves",
                "The optimal solution takes 3 moves",
                "4/8: Involved robots: blue and red robots",
                "Move the blue robot first",
            ]
        );
    }

    #[test]
    fn test_awaiting_is_not_announced() {
        let config = HintConfig::default();
        let session = SessionConfig::with_pre_hints(0, 2, &config);
        let seq = HintSequencer::new(&session, HintPolicy::new(&config));
        let formatter = HintFormatter::new(&config);
        let text = formatter.stage_text(&HintStage::AwaitingSolution, seq.state(), &idle());
        assert_eq!(text.payload, "AI is calculating...");
        assert_eq!(text.announcement, None);
    }
}
