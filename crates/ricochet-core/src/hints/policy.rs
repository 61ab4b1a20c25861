use super::sequencer::HintState;
use crate::config::HintConfig;
use serde::{Deserialize, Serialize};

/// Level-difficulty bucket that gates hint availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HintTier {
    /// Random map, no level attached
    None,
    /// Early levels: a few real hints
    Low,
    /// Later levels: no hints at all
    High,
}

impl HintTier {
    pub fn for_level(level_id: i32, low_tier_threshold: i32) -> Self {
        if level_id <= 0 {
            HintTier::None
        } else if level_id <= low_tier_threshold {
            HintTier::Low
        } else {
            HintTier::High
        }
    }

    /// Whether the hint control is offered at all
    pub fn hints_available(&self) -> bool {
        !matches!(self, HintTier::High)
    }
}

impl std::fmt::Display for HintTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HintTier::None => write!(f, "None"),
            HintTier::Low => write!(f, "Low"),
            HintTier::High => write!(f, "High"),
        }
    }
}

/// Rules deciding whether the sequencer may move forward.
///
/// Random maps and levels follow separate rules: random maps get the
/// regressing pre-hints and every real hint, levels get no regressing
/// pre-hints and a tier-dependent real hint cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintPolicy {
    low_tier_threshold: i32,
    low_tier_cap: usize,
}

impl Default for HintPolicy {
    fn default() -> Self {
        Self::new(&HintConfig::default())
    }
}

impl HintPolicy {
    pub fn new(config: &HintConfig) -> Self {
        Self {
            low_tier_threshold: config.low_tier_threshold,
            low_tier_cap: config.max_real_hints_low_tier,
        }
    }

    pub fn with_cap(low_tier_threshold: i32, low_tier_cap: usize) -> Self {
        Self {
            low_tier_threshold,
            low_tier_cap,
        }
    }

    pub fn tier(&self, level_id: i32) -> HintTier {
        HintTier::for_level(level_id, self.low_tier_threshold)
    }

    /// Real hint cap for a tier, `None` meaning bounded only by the solution
    pub fn max_real_hints(&self, tier: HintTier) -> Option<usize> {
        match tier {
            HintTier::High => Some(0),
            HintTier::Low => Some(self.low_tier_cap),
            HintTier::None => None,
        }
    }

    /// Pure predicate over a state snapshot.
    ///
    /// The low tier cap counts real hints reached, not the step index: with a
    /// cap of 4 real hints 0..=3 can be reached and the fifth is refused.
    pub fn can_advance(&self, state: &HintState) -> bool {
        match state.tier() {
            HintTier::High => false,
            HintTier::Low => {
                let cap = self.max_real_hints(HintTier::Low).unwrap_or(0);
                state.real_hints_shown() < cap
            }
            HintTier::None => true,
        }
    }
}
