//! Consumer-side report helpers
//!
//! The engine emits index-based records. Renderers also want wall-clock
//! fields, so [`annotate`] attaches `startDate`/`endDate` (readable UTC) and
//! `startTime`/`endTime` (epoch seconds) looked up from the candle series.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Candle, Divergence, DivergenceError, DivergenceReport, PatternType, Result};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

// ============================================================
// SUMMARY
// ============================================================

/// Counts-only reduction of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub bullish: usize,
    pub bearish: usize,
    pub regular_bullish: usize,
    pub hidden_bullish: usize,
    pub regular_bearish: usize,
    pub hidden_bearish: usize,
}

impl DivergenceReport {
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.len(),
            bullish: self.bullish_divergences.len(),
            bearish: self.bearish_divergences.len(),
            ..ReportSummary::default()
        };
        for d in self.iter() {
            match d.pattern_type {
                PatternType::RegularBullish => summary.regular_bullish += 1,
                PatternType::HiddenBullish => summary.hidden_bullish += 1,
                PatternType::RegularBearish => summary.regular_bearish += 1,
                PatternType::HiddenBearish => summary.hidden_bearish += 1,
            }
        }
        summary
    }
}

// ============================================================
// CHART REPORT
// ============================================================

/// A divergence with display timestamps attached
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDivergence {
    #[serde(flatten)]
    pub divergence: Divergence,
    pub start_date: String,
    pub end_date: String,
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartReport {
    pub bullish_divergences: Vec<ChartDivergence>,
    pub bearish_divergences: Vec<ChartDivergence>,
}

impl ChartReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DivergenceError::Serialization(e.to_string()))
    }
}

/// Attach display timestamps from `candles` (the series the report was built from).
pub fn annotate<T: Candle>(report: &DivergenceReport, candles: &[T]) -> Result<ChartReport> {
    let convert = |list: &[Divergence]| -> Result<Vec<ChartDivergence>> {
        list.iter().map(|d| annotate_one(d, candles)).collect()
    };
    Ok(ChartReport {
        bullish_divergences: convert(&report.bullish_divergences)?,
        bearish_divergences: convert(&report.bearish_divergences)?,
    })
}

fn annotate_one<T: Candle>(divergence: &Divergence, candles: &[T]) -> Result<ChartDivergence> {
    let start = datetime_at(candles, divergence.start_index)?;
    let end = datetime_at(candles, divergence.end_index)?;
    Ok(ChartDivergence {
        divergence: *divergence,
        start_date: start.format(DATE_FORMAT).to_string(),
        end_date: end.format(DATE_FORMAT).to_string(),
        start_time: start.timestamp(),
        end_time: end.timestamp(),
    })
}

fn datetime_at<T: Candle>(candles: &[T], index: usize) -> Result<DateTime<Utc>> {
    let candle = candles.get(index).ok_or(DivergenceError::MalformedInput {
        index,
        reason: "divergence index outside the candle series",
    })?;
    DateTime::from_timestamp_millis(candle.timestamp()).ok_or(DivergenceError::MalformedInput {
        index,
        reason: "timestamp out of range",
    })
}
