//! Percentage arithmetic used by the progress aggregator.

use crate::types::{Percent, Seconds};

/// `round(100 * done / total)`, or 0 when there is nothing to do.
///
/// Integer arithmetic, half-way values round up: 1 of 8 gives 13 and
/// 23 of 40 gives 58. `done` beyond `total` counts as 100.
pub fn rounded_percent(done: usize, total: usize) -> Percent {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((200 * done + total) / (2 * total)) as Percent
}

/// `floor(100 * part / whole)` capped at 100, or 0 for an empty whole.
pub fn floor_percent(part: Seconds, whole: Seconds) -> Percent {
    if !(whole.is_finite() && whole > 0.0) || !part.is_finite() {
        return 0;
    }
    let pct = (part / whole * 100.0).floor();
    pct.clamp(0.0, 100.0) as Percent
}

/// Clamp a caller-supplied percentage into `0..=100`.
pub fn clamp_percent(value: f64) -> Percent {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as Percent
}
