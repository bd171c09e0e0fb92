//! Persisted form of a series
//!
//! Samples are joined with a comma; an unset sample is an empty field, so a
//! week with only Monday morning filled in is `"90,,,,,,,,,,,"`. Parsing
//! applies the same rules as the [normalizer](crate::normalizer).

use crate::normalizer::normalize_value;
use crate::{PriceSample, SLOT_COUNT};

pub const DELIMITER: char = ',';

/// Encode a series
pub fn serialize(series: &[PriceSample]) -> String {
    series
        .iter()
        .map(|sample| sample.map(|price| price.to_string()).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(DELIMITER.to_string().as_str())
}

/// Decode a series, one sample per field
pub fn parse(encoded: &str) -> Vec<PriceSample> {
    encoded.split(DELIMITER).map(normalize_value).collect()
}

/// Decode into a full week. Missing trailing fields are unset and fields past
/// the last slot are dropped.
pub fn parse_slots(encoded: &str) -> Vec<PriceSample> {
    let mut series: Vec<PriceSample> = encoded
        .split(DELIMITER)
        .take(SLOT_COUNT)
        .map(normalize_value)
        .collect();
    series.resize(SLOT_COUNT, None);
    series
}
