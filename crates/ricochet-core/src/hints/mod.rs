//! Staged hint disclosure: the sequencer, the level policy gating it, and
//! the matcher that advances it when the player follows a hint.

pub mod matcher;
pub mod policy;
pub mod sequencer;
pub mod stage;

pub use matcher::{MatchOutcome, MoveMatcher};
pub use policy::{HintPolicy, HintTier};
pub use sequencer::{HintSequencer, HintSnapshot, HintState};
pub use stage::HintStage;
