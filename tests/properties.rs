//! Property-based tests for the extrema finder and the full pipeline.

use std::collections::HashSet;

use divscan::prelude::*;
use proptest::prelude::*;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Random walk-free series: each candle draws its own low, span and oscillator.
fn candle_series(max_len: usize) -> impl Strategy<Value = Vec<CandleRecord>> {
    prop::collection::vec(
        (
            50.0f64..150.0,
            0.0f64..10.0,
            prop::option::weighted(0.9, 0.0f64..100.0),
        ),
        0..max_len,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (low, span, rsi))| {
                let high = low + span;
                let mid = low + span / 2.0;
                CandleRecord::new(i as i64 * HOUR_MS, mid, high, low, mid, rsi)
            })
            .collect()
    })
}

fn config_strategy() -> impl Strategy<Value = (usize, usize, Option<f64>)> {
    (
        1usize..8,
        1usize..30,
        prop::option::of(0.0f64..=1.0),
    )
}

proptest! {
    #[test]
    fn extrema_never_touch_the_edges(candles in candle_series(120), window in 1usize..12) {
        let set = divscan::detectors::find_extrema(&candles, window);
        for e in set.lows.iter().chain(&set.highs) {
            prop_assert!(e.series_index >= window);
            prop_assert!(e.series_index + window < candles.len());
        }
    }

    #[test]
    fn flagged_extrema_dominate_both_windows(candles in candle_series(120), window in 1usize..12) {
        let set = divscan::detectors::find_extrema(&candles, window);
        for e in &set.lows {
            let i = e.series_index;
            for j in (i - window)..=(i + window) {
                if j != i {
                    prop_assert!(e.price < candles[j].low);
                }
            }
        }
        for e in &set.highs {
            let i = e.series_index;
            for j in (i - window)..=(i + window) {
                if j != i {
                    prop_assert!(e.price > candles[j].high);
                }
            }
        }
    }

    #[test]
    fn extrema_are_ascending_and_have_oscillator(candles in candle_series(120), window in 1usize..12) {
        let set = divscan::detectors::find_extrema(&candles, window);
        for list in [&set.lows, &set.highs] {
            prop_assert!(list.windows(2).all(|w| w[0].series_index < w[1].series_index));
            for e in list.iter() {
                prop_assert!(candles[e.series_index].oscillator.is_some());
            }
        }
    }

    #[test]
    fn report_is_bounded_and_unique(
        candles in candle_series(200),
        (window, lookback, threshold) in config_strategy(),
    ) {
        let mut builder = EngineBuilder::new().extrema_window(window).max_lookback(lookback);
        builder = match threshold {
            Some(t) => builder.confidence_threshold(t),
            None => builder.no_threshold(),
        };
        let engine = builder.build().unwrap();
        let report = engine.scan(&candles).unwrap();

        let mut seen = HashSet::new();
        for d in report.iter() {
            prop_assert!((0.0..=1.0).contains(&d.confidence));
            prop_assert!(d.timeframe_candles > 0 && d.timeframe_candles <= lookback);
            prop_assert_eq!(d.end_index - d.start_index, d.timeframe_candles);
            prop_assert!(seen.insert((d.start_index, d.end_index, d.pattern_type)));
            if let Some(t) = threshold {
                prop_assert!(d.confidence > t);
            }
        }

        prop_assert!(report.bullish_divergences.iter().all(|d| d.direction().is_bullish()));
        prop_assert!(report.bearish_divergences.iter().all(|d| d.direction().is_bearish()));
        prop_assert!(report.bullish_divergences.windows(2).all(|w| w[0].end_index <= w[1].end_index));
        prop_assert!(report.bearish_divergences.windows(2).all(|w| w[0].end_index <= w[1].end_index));
    }

    #[test]
    fn scan_is_idempotent(candles in candle_series(200), window in 1usize..8) {
        let engine = EngineBuilder::new().extrema_window(window).no_threshold().build().unwrap();
        let first = engine.scan(&candles).unwrap();
        let second = engine.scan(&candles).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_result_passes_the_gates(candles in candle_series(200), window in 1usize..8) {
        let engine = EngineBuilder::new().extrema_window(window).no_threshold().build().unwrap();
        let report = engine.scan(&candles).unwrap();
        for d in report.iter() {
            prop_assert!(d.price_change_pct.abs() >= 0.5);
            prop_assert!(d.oscillator_change.abs() >= 2.0);
        }
    }
}
