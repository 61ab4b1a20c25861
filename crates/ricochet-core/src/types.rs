use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Identifier of a movable robot on the board
pub type AgentId = u32;

/// Monotonically increasing tag assigned to every solve request
pub type Generation = u64;

/// Direction a robot slides in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four directions in clockwise order
    pub fn all() -> &'static [Direction] {
        &[
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Arrow glyph used in visual hint text
    pub fn arrow(&self) -> char {
        match self {
            Direction::North => '↑',
            Direction::East => '→',
            Direction::South => '↓',
            Direction::West => '←',
        }
    }

    /// Spoken name used for accessibility announcements
    pub fn spoken(&self) -> &'static str {
        match self {
            Direction::North => "up",
            Direction::East => "right",
            Direction::South => "down",
            Direction::West => "left",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::North => write!(f, "North"),
            Direction::East => write!(f, "East"),
            Direction::South => write!(f, "South"),
            Direction::West => write!(f, "West"),
        }
    }
}

/// A single robot move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub agent: AgentId,
    pub direction: Direction,
}

impl Move {
    pub fn new(agent: AgentId, direction: Direction) -> Self {
        Self { agent, direction }
    }
}

/// An optimal move sequence produced by the solver for one board snapshot.
///
/// Immutable once produced. Consumers share it through `Arc<Solution>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    generation: Generation,
    moves: Vec<Move>,
}

impl Solution {
    pub fn new(generation: Generation, moves: Vec<Move>) -> Self {
        Self { generation, moves }
    }

    /// Generation of the request that produced this solution
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Move> {
        self.moves.get(index).copied()
    }

    /// Agents taking part in the solution, in the order they first move
    pub fn involved_agents(&self) -> Vec<AgentId> {
        let mut agents = Vec::new();
        for mv in &self.moves {
            if !agents.contains(&mv.agent) {
                agents.push(mv.agent);
            }
        }
        agents
    }
}

/// One committed player action
#[derive(Debug, Clone, Copy)]
pub struct PlayerMove {
    pub agent: AgentId,
    pub direction: Direction,
    pub at: Instant,
}

impl PlayerMove {
    pub fn as_move(&self) -> Move {
        Move::new(self.agent, self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involved_agents_first_seen_order() {
        let solution = Solution::new(
            1,
            vec![
                Move::new(2, Direction::North),
                Move::new(0, Direction::East),
                Move::new(2, Direction::South),
                Move::new(3, Direction::West),
                Move::new(0, Direction::North),
            ],
        );
        assert_eq!(solution.involved_agents(), vec![2, 0, 3]);
    }

    #[test]
    fn test_empty_solution() {
        let solution = Solution::new(7, Vec::new());
        assert!(solution.is_empty());
        assert_eq!(solution.generation(), 7);
        assert!(solution.involved_agents().is_empty());
        assert_eq!(solution.get(0), None);
    }

    #[test]
    fn test_direction_serde_names() {
        let json = serde_json::to_string(&Move::new(1, Direction::West)).unwrap();
        assert_eq!(json, r#"{"agent":1,"direction":"West"}"#);
    }
}
