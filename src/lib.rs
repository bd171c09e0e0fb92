//! # stalk-analyzer
//!
//! Classifies a week of sampled prices (morning and evening readings over six
//! days) into a trend pattern, and keeps the readings around between sessions.
//!
//! ## Quick Start
//!
//! ```rust
//! use stalk_analyzer::prelude::*;
//!
//! // Raw field values, in slot order (day1am, day1pm, day2am, ...)
//! let fields = ["90", "95", "100", "105", "97"];
//!
//! let series = normalize(&fields);
//! assert_eq!(classify(&series), Pattern::SpikeBig);
//!
//! // Or keep the comparison signal around too
//! let analysis = analyze(&series);
//! assert_eq!(analysis.signal.to_string(), "1110");
//! ```

use std::fmt;
use std::str::FromStr;

pub mod codec;
pub mod config;
pub mod normalizer;
pub mod rules;
pub mod session;
pub mod signal;
pub mod store;

pub mod prelude {
    pub use crate::{
        // Pure core
        analyze,
        classify,
        classify_signal,
        codec::{parse, parse_slots, serialize},
        normalizer::{normalize, normalize_value},
        // Rules
        rules::*,
        signal::{Change, ChangeSignal},
        // Session
        config::SessionConfig,
        session::{Clock, Debouncer, ManualClock, Session, SystemClock, Ticket, View},
        store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError},
        // Types
        Analysis,
        // Errors
        AnalyzerError,
        // Engine
        BuiltinRule,
        Classifier,
        ClassifierBuilder,
        Half,
        Pattern,
        PatternRule,
        Price,
        PriceSample,
        Result,
        Slot,
        SLOT_COUNT,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors raised by validated constructors and configuration loading.
///
/// Normalizing and classifying never fail; bad input becomes an unset sample.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} is below the minimum of {min}")]
    BelowMinimum {
        field: &'static str,
        value: f64,
        min: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown slot: {0:?} (expected day1am..day6pm)")]
    UnknownSlot(String),

    #[error("Invalid signal symbol {0:?} (expected '1', '0' or '-')")]
    InvalidSignal(char),

    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// A price reading: finite and at least 1
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    /// Smallest accepted price
    pub const MIN: f64 = 1.0;

    /// Create a new Price, validating the value is finite and >= 1
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalyzerError::InvalidValue(
                "Price cannot be NaN or infinite",
            ));
        }
        if value < Self::MIN {
            return Err(AnalyzerError::BelowMinimum {
                field: "Price",
                value,
                min: Self::MIN,
            });
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl serde::Serialize for Price {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.0, s)
    }
}

impl<'de> serde::Deserialize<'de> for Price {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = <f64 as serde::Deserialize>::deserialize(d)?;
        Price::new(value).map_err(serde::de::Error::custom)
    }
}

/// One reading, or `None` when the field is empty or invalid
pub type PriceSample = Option<Price>;

// ============================================================
// SLOTS
// ============================================================

/// Number of readings in a full week (6 days, morning and evening)
pub const SLOT_COUNT: usize = 12;

/// Morning or evening reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Half {
    Am,
    Pm,
}

impl Half {
    pub fn as_str(self) -> &'static str {
        match self {
            Half::Am => "am",
            Half::Pm => "pm",
        }
    }
}

/// A fixed position in the week, `day1am` through `day6pm`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(usize);

impl Slot {
    /// Create a Slot from its chronological index (0..12)
    pub fn new(index: usize) -> Result<Self> {
        if index >= SLOT_COUNT {
            return Err(AnalyzerError::UnknownSlot(index.to_string()));
        }
        Ok(Self(index))
    }

    /// All slots in chronological order
    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOT_COUNT).map(Slot)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// Day number, 1-based
    #[inline]
    pub fn day(self) -> usize {
        self.0 / 2 + 1
    }

    #[inline]
    pub fn half(self) -> Half {
        if self.0 % 2 == 0 {
            Half::Am
        } else {
            Half::Pm
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day{}{}", self.day(), self.half().as_str())
    }
}

impl FromStr for Slot {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || AnalyzerError::UnknownSlot(s.to_string());
        let lower = s.trim().to_ascii_lowercase();
        let rest = lower.strip_prefix("day").ok_or_else(unknown)?;
        let (day, half) = if let Some(day) = rest.strip_suffix("am") {
            (day, Half::Am)
        } else if let Some(day) = rest.strip_suffix("pm") {
            (day, Half::Pm)
        } else {
            return Err(unknown());
        };
        let day: usize = day.parse().map_err(|_| unknown())?;
        if !(1..=SLOT_COUNT / 2).contains(&day) {
            return Err(unknown());
        }
        let offset = match half {
            Half::Am => 0,
            Half::Pm => 1,
        };
        Ok(Self((day - 1) * 2 + offset))
    }
}

// ============================================================
// PATTERNS
// ============================================================

/// Trend pattern of a week of prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pattern {
    SpikeSmall,
    SpikeBig,
    Decreasing,
    Unknown,
    Random,
}

impl Pattern {
    pub const ALL: [Pattern; 5] = [
        Pattern::SpikeSmall,
        Pattern::SpikeBig,
        Pattern::Decreasing,
        Pattern::Unknown,
        Pattern::Random,
    ];

    /// Stable identifier, matches the serde form
    pub fn id(self) -> &'static str {
        match self {
            Pattern::SpikeSmall => "spikeSmall",
            Pattern::SpikeBig => "spikeBig",
            Pattern::Decreasing => "decreasing",
            Pattern::Unknown => "unknown",
            Pattern::Random => "random",
        }
    }

    /// Text shown to the user
    pub fn label(self) -> &'static str {
        match self {
            Pattern::SpikeSmall => "Small Spike Pattern",
            Pattern::SpikeBig => "Big Spike Pattern",
            Pattern::Decreasing => "Decreasing Pattern",
            Pattern::Unknown => "???",
            Pattern::Random => "Random Pattern",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of analyzing a series: the comparison signal and the pattern it matched
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Analysis {
    pub signal: signal::ChangeSignal,
    pub pattern: Pattern,
}

// ============================================================
// PATTERN RULE TRAIT
// ============================================================

/// A single matching rule. The classifier evaluates rules in order and the
/// first one that matches decides the pattern.
pub trait PatternRule: Send + Sync {
    fn pattern(&self) -> Pattern;
    fn matches(&self, signal: &signal::ChangeSignal) -> bool;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// BUILTIN RULES - generated via macro
// ============================================================

use rules::*;
use signal::ChangeSignal;

macro_rules! define_builtin_rules {
    (
        $(
            $variant:ident($rule:ty)
        ),* $(,)?
    ) => {
        /// All builtin rules - enum dispatch
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum BuiltinRule {
            $($variant($rule)),*
        }

        impl BuiltinRule {
            #[inline]
            pub fn pattern(&self) -> Pattern {
                match self {
                    $(Self::$variant(r) => PatternRule::pattern(r)),*
                }
            }

            #[inline]
            pub fn matches(&self, signal: &ChangeSignal) -> bool {
                match self {
                    $(Self::$variant(r) => PatternRule::matches(r, signal)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(r) => PatternRule::validate_config(r)),*
                }
            }
        }
    };
}

define_builtin_rules! {
    RiseRun(RiseRunRule),
    AllFalls(AllFallsRule),
    Incomplete(IncompleteRule),
}

/// Standard priority order: small spike, big spike, decreasing, unknown.
/// Anything left over is [`Pattern::Random`].
pub const DEFAULT_RULES: [BuiltinRule; 4] = [
    BuiltinRule::RiseRun(RiseRunRule::spike_small()),
    BuiltinRule::RiseRun(RiseRunRule::spike_big()),
    BuiltinRule::AllFalls(AllFallsRule),
    BuiltinRule::Incomplete(IncompleteRule),
];

/// Pattern reported when no rule matches
pub const FALLBACK_PATTERN: Pattern = Pattern::Random;

fn first_match(rules: &[BuiltinRule], signal: &ChangeSignal) -> Option<Pattern> {
    rules
        .iter()
        .find(|rule| rule.matches(signal))
        .map(BuiltinRule::pattern)
}

// ============================================================
// CLASSIFIER
// ============================================================

/// Ordered rule list with a fallback pattern
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<BuiltinRule>,
    fallback: Pattern,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
            fallback: FALLBACK_PATTERN,
        }
    }
}

impl Classifier {
    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::new()
    }

    /// Classify a normalized series
    pub fn classify(&self, series: &[PriceSample]) -> Pattern {
        self.classify_signal(&ChangeSignal::from_series(series))
    }

    /// Classify an already-built signal
    pub fn classify_signal(&self, signal: &ChangeSignal) -> Pattern {
        first_match(&self.rules, signal).unwrap_or(self.fallback)
    }

    /// Classify and keep the signal
    pub fn analyze(&self, series: &[PriceSample]) -> Analysis {
        let signal = ChangeSignal::from_series(series);
        let pattern = self.classify_signal(&signal);
        Analysis { signal, pattern }
    }

    pub fn rules(&self) -> &[BuiltinRule] {
        &self.rules
    }

    pub fn fallback(&self) -> Pattern {
        self.fallback
    }
}

/// Builder for creating Classifier instances
#[derive(Debug, Clone)]
pub struct ClassifierBuilder {
    rules: Vec<BuiltinRule>,
    fallback: Pattern,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Empty builder: no rules, falls back to Random
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: FALLBACK_PATTERN,
        }
    }

    /// Add the standard rules in priority order
    pub fn with_defaults(mut self) -> Self {
        self.rules.extend(DEFAULT_RULES);
        self
    }

    /// Append a rule; it is checked after every rule added before it
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, rule: BuiltinRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append with config validation
    pub fn add_checked(mut self, rule: BuiltinRule) -> Result<Self> {
        rule.validate_config()?;
        self.rules.push(rule);
        Ok(self)
    }

    /// Pattern returned when no rule matches
    pub fn fallback(mut self, pattern: Pattern) -> Self {
        self.fallback = pattern;
        self
    }

    /// Build the classifier
    pub fn build(self) -> Result<Classifier> {
        for rule in &self.rules {
            rule.validate_config()?;
        }
        Ok(Classifier {
            rules: self.rules,
            fallback: self.fallback,
        })
    }
}

// ============================================================
// PURE ENTRY POINTS
// ============================================================

/// Classify a normalized series with the standard rules.
///
/// The first sample is only a baseline. A series with fewer than two samples
/// has an empty signal, which reports [`Pattern::Decreasing`].
pub fn classify(series: &[PriceSample]) -> Pattern {
    classify_signal(&ChangeSignal::from_series(series))
}

/// Classify a signal with the standard rules
pub fn classify_signal(signal: &ChangeSignal) -> Pattern {
    first_match(&DEFAULT_RULES, signal).unwrap_or(FALLBACK_PATTERN)
}

/// Classify with the standard rules and keep the signal
pub fn analyze(series: &[PriceSample]) -> Analysis {
    let signal = ChangeSignal::from_series(series);
    let pattern = classify_signal(&signal);
    Analysis { signal, pattern }
}

// ============================================================
// TESTS
// ============================================================
