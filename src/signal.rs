//! Change signal between consecutive readings
//!
//! Each pair of neighbouring samples yields one symbol: RISE, FALL, or UNKNOWN
//! when either side is missing. The first sample only acts as the baseline, so
//! a series of `n` samples produces `n - 1` symbols.
//!
//! The compact text form uses `1` for RISE, `0` for FALL and `-` for UNKNOWN.

use std::fmt;
use std::str::FromStr;

use crate::{AnalyzerError, PriceSample, Result};

/// Direction of one step in the series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Rise,
    Fall,
    Unknown,
}

impl Change {
    /// Compare a sample with the one immediately before it.
    /// Equal prices count as a fall.
    #[inline]
    pub fn between(previous: PriceSample, current: PriceSample) -> Self {
        match (previous, current) {
            (Some(prev), Some(cur)) if cur > prev => Change::Rise,
            (Some(_), Some(_)) => Change::Fall,
            _ => Change::Unknown,
        }
    }

    #[inline]
    pub fn symbol(self) -> char {
        match self {
            Change::Rise => '1',
            Change::Fall => '0',
            Change::Unknown => '-',
        }
    }

    pub fn from_symbol(symbol: char) -> Result<Self> {
        match symbol {
            '1' => Ok(Change::Rise),
            '0' => Ok(Change::Fall),
            '-' => Ok(Change::Unknown),
            other => Err(AnalyzerError::InvalidSignal(other)),
        }
    }
}

/// Ordered sequence of changes, one per consecutive pair of samples
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChangeSignal(Vec<Change>);

impl ChangeSignal {
    /// Build the signal for a normalized series.
    ///
    /// Every step compares against the raw previous sample, so a missing
    /// reading makes both the step into it and the step out of it UNKNOWN.
    pub fn from_series(series: &[PriceSample]) -> Self {
        Self(
            series
                .windows(2)
                .map(|pair| Change::between(pair[0], pair[1]))
                .collect(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.0.iter()
    }

    /// Length of the longest run of consecutive rises
    pub fn longest_rise_run(&self) -> usize {
        let mut longest = 0;
        let mut current = 0;
        for change in &self.0 {
            if *change == Change::Rise {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 0;
            }
        }
        longest
    }

    /// True if some run of consecutive rises is at least `len` long
    #[inline]
    pub fn has_rise_run(&self, len: usize) -> bool {
        self.longest_rise_run() >= len
    }

    /// True if every symbol is FALL. Vacuously true for an empty signal.
    pub fn is_all_falls(&self) -> bool {
        self.0.iter().all(|c| *c == Change::Fall)
    }

    /// True if any step touches a missing reading
    pub fn has_unknown(&self) -> bool {
        self.0.contains(&Change::Unknown)
    }

    pub fn count(&self, change: Change) -> usize {
        self.0.iter().filter(|c| **c == change).count()
    }
}

impl FromIterator<Change> for ChangeSignal {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ChangeSignal {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ChangeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for change in &self.0 {
            write!(f, "{}", change.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for ChangeSignal {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        s.chars().map(Change::from_symbol).collect()
    }
}

impl serde::Serialize for ChangeSignal {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ChangeSignal {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(d)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
