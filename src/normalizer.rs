//! Raw field values to price samples
//!
//! Anything that is not a finite number of at least 1 becomes an unset
//! sample. Normalizing never fails and always keeps the input length.

use crate::{Price, PriceSample};

/// Normalize one raw field. Surrounding whitespace is ignored.
///
/// Only decimal notation is read: hex literals such as `0x1F` and the
/// spellings `Infinity`, `inf` and `NaN` all come back unset, unlike a
/// JavaScript `Number()` coercion.
#[inline]
pub fn normalize_value(raw: &str) -> PriceSample {
    let value: f64 = raw.trim().parse().ok()?;
    Price::new(value).ok()
}

/// Normalize a sequence of raw fields, preserving length and order
pub fn normalize<S: AsRef<str>>(raw: &[S]) -> Vec<PriceSample> {
    raw.iter().map(|field| normalize_value(field.as_ref())).collect()
}
