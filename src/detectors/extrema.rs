//! Local extrema finder
//!
//! An index is a local low when its `low` is strictly below every `low` in the
//! `window` candles on each side, and a local high when its `high` is strictly
//! above every `high` on each side. Equal values never qualify, so flat
//! plateaus produce no turning points.

use super::helpers::{window_max, window_min};
use crate::{Candle, CandleExt, ExtremaSet, Extremum, ExtremumKind};

/// Find local lows and highs using a symmetric window of `window` candles.
///
/// Indices closer than `window` to either end of the series are never
/// evaluated, and candles without an oscillator value are skipped. A series
/// shorter than `2 * window + 1` yields an empty set, including windows too
/// large for that length to be representable.
pub fn find_extrema<T: Candle>(candles: &[T], window: usize) -> ExtremaSet {
    let mut set = ExtremaSet::default();
    let len = candles.len();
    if window == 0 || len <= window || len - window <= window {
        return set;
    }

    for i in window..len - window {
        let candle = &candles[i];
        let Some(oscillator) = candle.oscillator_value() else {
            continue;
        };

        let left = &candles[i - window..i];
        let right = &candles[i + 1..=i + window];

        let low = candle.low();
        if low < window_min(left.iter().map(Candle::low))
            && low < window_min(right.iter().map(Candle::low))
        {
            set.lows.push(Extremum {
                series_index: i,
                kind: ExtremumKind::Low,
                price: low,
                oscillator_value: oscillator,
            });
        }

        let high = candle.high();
        if high > window_max(left.iter().map(Candle::high))
            && high > window_max(right.iter().map(Candle::high))
        {
            set.highs.push(Extremum {
                series_index: i,
                kind: ExtremumKind::High,
                price: high,
                oscillator_value: oscillator,
            });
        }
    }

    set
}
