//! Pattern classifier
//!
//! Pairs consecutive extrema of the same kind and labels each pair with one of
//! the four divergence patterns:
//!
//! | Pair kind | Price       | Oscillator  | Pattern         |
//! |-----------|-------------|-------------|-----------------|
//! | low-low   | lower low   | higher low  | regular-bullish |
//! | low-low   | higher low  | lower low   | hidden-bullish  |
//! | high-high | higher high | lower high  | regular-bearish |
//! | high-high | lower high  | higher high | hidden-bearish  |
//!
//! Rejection is the normal control path: pairs that match no row, pairs with an
//! unchanged price or oscillator, and pairs below the magnitude gates simply
//! produce nothing.

use std::cmp::Ordering;

use super::helpers::direction;
use crate::{DivergenceCandidate, Extremum, ExtremumKind, PatternType};

/// Pair each extremum with its predecessor in the same-kind sequence.
///
/// `extrema` must hold a single kind in ascending index order (as produced by
/// the extrema finder). Pairs further apart than `max_lookback` candles are
/// dropped.
pub fn pair_candidates(extrema: &[Extremum], max_lookback: usize) -> Vec<DivergenceCandidate> {
    extrema
        .windows(2)
        .filter_map(|pair| {
            let (earlier, later) = (pair[0], pair[1]);
            if earlier.kind != later.kind || later.series_index <= earlier.series_index {
                return None;
            }
            let index_gap = later.series_index - earlier.series_index;
            (index_gap <= max_lookback).then_some(DivergenceCandidate {
                earlier,
                later,
                index_gap,
            })
        })
        .collect()
}

/// Label a candidate pair, or `None` when it is not a divergence.
pub fn classify(candidate: &DivergenceCandidate) -> Option<PatternType> {
    let price = direction(candidate.earlier.price, candidate.later.price)?;
    let oscillator = direction(
        candidate.earlier.oscillator_value,
        candidate.later.oscillator_value,
    )?;

    match (candidate.earlier.kind, price, oscillator) {
        (ExtremumKind::Low, Ordering::Less, Ordering::Greater) => Some(PatternType::RegularBullish),
        (ExtremumKind::Low, Ordering::Greater, Ordering::Less) => Some(PatternType::HiddenBullish),
        (ExtremumKind::High, Ordering::Greater, Ordering::Less) => {
            Some(PatternType::RegularBearish)
        }
        (ExtremumKind::High, Ordering::Less, Ordering::Greater) => Some(PatternType::HiddenBearish),
        _ => None,
    }
}

/// Minimum-magnitude gate: both the absolute price change (percent) and the
/// absolute oscillator change must reach their floors.
///
/// A pair whose earlier price is zero has no defined percentage change and
/// never passes.
pub fn passes_magnitude_gate(
    candidate: &DivergenceCandidate,
    min_price_change_pct: f64,
    min_oscillator_change: f64,
) -> bool {
    let Some(price_pct) = candidate.price_change_pct() else {
        return false;
    };
    price_pct.abs() >= min_price_change_pct
        && candidate.oscillator_change().abs() >= min_oscillator_change
}
