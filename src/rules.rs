//! Builtin matching rules
//!
//! - [`RiseRunRule`]: some run of consecutive rises is at least `min_run` long
//!   (4 for a small spike, 3 for a big spike)
//! - [`AllFallsRule`]: every step is a fall
//! - [`IncompleteRule`]: some step touches a missing reading
//!
//! Rules only answer "does this signal match"; priority comes from the order
//! the [`Classifier`](crate::Classifier) holds them in.

use crate::signal::ChangeSignal;
use crate::{AnalyzerError, Pattern, PatternRule, Result};

/// Rise run that marks a small spike
pub const SPIKE_SMALL_RUN: usize = 4;
/// Rise run that marks a big spike
pub const SPIKE_BIG_RUN: usize = 3;

// ============================================================
// SPIKES
// ============================================================

/// Matches when the signal holds `min_run` consecutive rises anywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiseRunRule {
    pub min_run: usize,
    pub pattern: Pattern,
}

impl RiseRunRule {
    pub const fn new(min_run: usize, pattern: Pattern) -> Self {
        Self { min_run, pattern }
    }

    pub const fn spike_small() -> Self {
        Self::new(SPIKE_SMALL_RUN, Pattern::SpikeSmall)
    }

    pub const fn spike_big() -> Self {
        Self::new(SPIKE_BIG_RUN, Pattern::SpikeBig)
    }
}

impl PatternRule for RiseRunRule {
    fn pattern(&self) -> Pattern {
        self.pattern
    }

    fn matches(&self, signal: &ChangeSignal) -> bool {
        signal.has_rise_run(self.min_run)
    }

    fn validate_config(&self) -> Result<()> {
        if self.min_run == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "rise run length must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// DECREASING
// ============================================================

/// Matches when every step falls. An empty signal matches too, so a series
/// with a single reading reports [`Pattern::Decreasing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllFallsRule;

impl PatternRule for AllFallsRule {
    fn pattern(&self) -> Pattern {
        Pattern::Decreasing
    }

    fn matches(&self, signal: &ChangeSignal) -> bool {
        signal.is_all_falls()
    }
}

// ============================================================
// INCOMPLETE DATA
// ============================================================

/// Matches when any step is unknown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncompleteRule;

impl PatternRule for IncompleteRule {
    fn pattern(&self) -> Pattern {
        Pattern::Unknown
    }

    fn matches(&self, signal: &ChangeSignal) -> bool {
        signal.has_unknown()
    }
}
