//! Hint configuration.
//!
//! `HintConfig` holds the tunables that apply to every session and can be
//! loaded from JSON. `SessionConfig` is derived from it exactly once when a
//! session starts and stays fixed until the next session boundary.

use crate::hints::policy::HintTier;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Number of pre-hints that always follow the regressing ones
/// (exact length, involved robots, first robot)
pub const FIXED_PRE_HINT_COUNT: usize = 3;

/// Accepted range for the randomized regressing pre-hint count
pub const PRE_HINT_RANGE: std::ops::RangeInclusive<usize> = 2..=4;

/// Environment variable overriding `auto_advance_delay_ms`
pub const AUTO_ADVANCE_ENV: &str = "RICOCHET_AUTO_ADVANCE_MS";

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables shared by all sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintConfig {
    /// Lower bound of the randomized regressing pre-hint count
    pub min_pre_hints: usize,
    /// Upper bound (inclusive) of the randomized regressing pre-hint count
    pub max_pre_hints: usize,
    /// Real hint cap for levels up to `low_tier_threshold`
    pub max_real_hints_low_tier: usize,
    /// Highest level id that still belongs to the low tier
    pub low_tier_threshold: i32,
    /// Delay before a followed hint advances on its own
    pub auto_advance_delay_ms: u64,
    /// How many previous moves a real hint repeats in abbreviated form
    pub hint_history_len: usize,
    /// Restart count above which the calculating message shows counters
    pub restart_notice_threshold: u32,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            min_pre_hints: 2,
            max_pre_hints: 4,
            max_real_hints_low_tier: 4,
            low_tier_threshold: 10,
            auto_advance_delay_ms: 1000,
            hint_history_len: 6,
            restart_notice_threshold: 3,
        }
    }
}

impl HintConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HintConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("min_pre_hints", self.min_pre_hints),
            ("max_pre_hints", self.max_pre_hints),
        ] {
            if !PRE_HINT_RANGE.contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within {}..={}, got {}",
                    name,
                    PRE_HINT_RANGE.start(),
                    PRE_HINT_RANGE.end(),
                    value
                )));
            }
        }
        if self.min_pre_hints > self.max_pre_hints {
            return Err(ConfigError::Invalid(format!(
                "min_pre_hints ({}) exceeds max_pre_hints ({})",
                self.min_pre_hints, self.max_pre_hints
            )));
        }
        if self.max_real_hints_low_tier == 0 {
            return Err(ConfigError::Invalid(
                "max_real_hints_low_tier must be at least 1".to_string(),
            ));
        }
        if self.low_tier_threshold < 1 {
            return Err(ConfigError::Invalid(format!(
                "low_tier_threshold must be positive, got {}",
                self.low_tier_threshold
            )));
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = std::env::var(AUTO_ADVANCE_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.auto_advance_delay_ms = ms;
        }
        self
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }
}

/// Per-session configuration, generated once at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 0 (or negative) for a random map, otherwise the level number
    pub level_id: i32,
    pub tier: HintTier,
    /// Regressing pre-hints shown before the fixed ones
    pub num_pre_hints: usize,
    pub fixed_pre_hint_count: usize,
}

impl SessionConfig {
    /// Build the configuration for a new session.
    ///
    /// Random maps draw the regressing pre-hint count from
    /// `min_pre_hints..=max_pre_hints`; level sessions have none.
    pub fn new<R: Rng>(level_id: i32, config: &HintConfig, rng: &mut R) -> Self {
        let tier = HintTier::for_level(level_id, config.low_tier_threshold);
        let num_pre_hints = if level_id > 0 {
            0
        } else {
            rng.gen_range(config.min_pre_hints..=config.max_pre_hints)
        };
        Self {
            level_id,
            tier,
            num_pre_hints,
            fixed_pre_hint_count: FIXED_PRE_HINT_COUNT,
        }
    }

    /// Fixed configuration, mainly for tests and replays
    pub fn with_pre_hints(level_id: i32, num_pre_hints: usize, config: &HintConfig) -> Self {
        Self {
            level_id,
            tier: HintTier::for_level(level_id, config.low_tier_threshold),
            num_pre_hints,
            fixed_pre_hint_count: FIXED_PRE_HINT_COUNT,
        }
    }

    pub fn is_level_session(&self) -> bool {
        self.level_id > 0
    }

    /// Number of stages before the first real hint
    pub fn pre_hint_total(&self) -> usize {
        self.num_pre_hints + self.fixed_pre_hint_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_defaults() {
        let config = HintConfig::default();
        assert_eq!(config.min_pre_hints, 2);
        assert_eq!(config.max_pre_hints, 4);
        assert_eq!(config.max_real_hints_low_tier, 4);
        assert_eq!(config.low_tier_threshold, 10);
        assert_eq!(config.auto_advance_delay(), Duration::from_millis(1000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = HintConfig::from_json(r#"{"auto_advance_delay_ms": 250}"#).unwrap();
        assert_eq!(config.auto_advance_delay_ms, 250);
        assert_eq!(config.max_pre_hints, 4);
    }

    #[test]
    fn test_invalid_range_rejected() {
        let err = HintConfig::from_json(r#"{"min_pre_hints": 4, "max_pre_hints": 3}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_pre_hints_outside_two_to_four_rejected() {
        for json in [
            r#"{"min_pre_hints": 0, "max_pre_hints": 10}"#,
            r#"{"min_pre_hints": 1}"#,
            r#"{"max_pre_hints": 5}"#,
        ] {
            match HintConfig::from_json(json) {
                Err(ConfigError::Invalid(msg)) => assert!(msg.contains("pre_hints")),
                other => panic!("{} accepted: {:?}", json, other),
            }
        }
        assert!(HintConfig::from_json(r#"{"min_pre_hints": 3, "max_pre_hints": 3}"#).is_ok());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = HintConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_random_session_pre_hints_in_range() {
        let config = HintConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let session = SessionConfig::new(0, &config, &mut rng);
            assert!((2..=4).contains(&session.num_pre_hints));
            assert_eq!(session.tier, HintTier::None);
            assert_eq!(session.pre_hint_total(), session.num_pre_hints + 3);
        }
    }

    #[test]
    fn test_level_session_has_no_regressing_pre_hints() {
        let config = HintConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let low = SessionConfig::new(5, &config, &mut rng);
        assert_eq!(low.num_pre_hints, 0);
        assert_eq!(low.tier, HintTier::Low);
        assert!(low.is_level_session());

        let high = SessionConfig::new(15, &config, &mut rng);
        assert_eq!(high.num_pre_hints, 0);
        assert_eq!(high.tier, HintTier::High);
    }
}
