//! Common thresholds and comparison helpers for divergence detection
//!
//! Every constant the classifier and the scorers use lives here, so the rule set
//! can be read in one place.

use std::cmp::Ordering;

// ============================================================
// DEFAULT CONFIGURATION
// ============================================================

/// Candles compared on each side of a candidate extremum
pub const DEFAULT_EXTREMA_WINDOW: usize = 10;
/// Maximum candle distance between two paired extrema
pub const DEFAULT_MAX_LOOKBACK: usize = 20;
/// Minimum absolute price change (percent) for the rich rule set
pub const DEFAULT_MIN_PRICE_CHANGE_PCT: f64 = 0.5;
/// Minimum absolute price change (percent) for the reference rule set
pub const REFERENCE_MIN_PRICE_CHANGE_PCT: f64 = 1.0;
/// Minimum absolute oscillator change (points)
pub const DEFAULT_MIN_OSCILLATOR_CHANGE: f64 = 2.0;
/// Results at or below this confidence are discarded by the rich rule set
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.65;

// ============================================================
// WEIGHTED SCORER
// ============================================================

pub const BASE_CONFIDENCE: f64 = 0.5;

/// Bullish zone bands (oscillator upper bounds, exclusive) and their bonuses.
/// Bearish bands mirror these around 50.
pub const ZONE_EXTREME: f64 = 30.0;
pub const ZONE_STRONG: f64 = 40.0;
pub const ZONE_MILD: f64 = 50.0;
pub const ZONE_EXTREME_BONUS: f64 = 0.15;
pub const ZONE_STRONG_BONUS: f64 = 0.10;
pub const ZONE_MILD_BONUS: f64 = 0.05;

pub const OSC_CHANGE_LARGE: f64 = 5.0;
pub const OSC_CHANGE_MEDIUM: f64 = 3.0;
pub const OSC_CHANGE_SMALL: f64 = 2.0;
pub const OSC_CHANGE_LARGE_BONUS: f64 = 0.10;
pub const OSC_CHANGE_MEDIUM_BONUS: f64 = 0.05;
pub const OSC_CHANGE_SMALL_BONUS: f64 = 0.02;

/// Price bonus interpolates linearly between these two percentages
pub const PRICE_BONUS_FLOOR_PCT: f64 = 0.5;
pub const PRICE_BONUS_CAP_PCT: f64 = 2.0;
pub const PRICE_BONUS_MAX: f64 = 0.15;

pub const GAP_SHORT: usize = 10;
pub const GAP_MEDIUM: usize = 15;
pub const GAP_SHORT_BONUS: f64 = 0.10;
pub const GAP_MEDIUM_BONUS: f64 = 0.05;

// ============================================================
// REFERENCE SCORER
// ============================================================

/// Oversold level for bullish patterns; overbought is `100 - REFERENCE_ZONE`
pub const REFERENCE_ZONE: f64 = 35.0;
pub const REFERENCE_ZONE_BONUS: f64 = 0.3;
pub const REFERENCE_OSC_CHANGE: f64 = 5.0;
pub const REFERENCE_PRICE_CHANGE_PCT: f64 = 5.0;
pub const REFERENCE_STRENGTH_BONUS: f64 = 0.1;

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// Strict direction of `later` relative to `earlier`.
/// Returns `None` when the values are equal or not comparable.
#[inline]
pub fn direction(earlier: f64, later: f64) -> Option<Ordering> {
    match later.partial_cmp(&earlier)? {
        Ordering::Equal => None,
        ord => Some(ord),
    }
}

/// Signed percentage change from `earlier` to `later`.
/// Returns `None` when `earlier` is zero.
#[inline]
pub fn pct_change(earlier: f64, later: f64) -> Option<f64> {
    if earlier.abs() <= f64::EPSILON {
        return None;
    }
    Some((later - earlier) / earlier.abs() * 100.0)
}

/// Minimum of an iterator of values (`+inf` when empty)
#[inline]
pub fn window_min(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, f64::min)
}

/// Maximum of an iterator of values (`-inf` when empty)
#[inline]
pub fn window_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}
