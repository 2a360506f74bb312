//! # divscan - price/oscillator divergence detection
//!
//! Detects regular and hidden divergences between price and a momentum
//! oscillator (typically RSI) over a complete, already-computed candle series.
//!
//! ## Quick Start
//!
//! ```rust
//! use divscan::prelude::*;
//!
//! // Candles come with a precomputed oscillator value (absent during warm-up)
//! let candles: Vec<CandleRecord> = (0..50)
//!     .map(|i| {
//!         let ts = i as i64 * 14_400_000;
//!         CandleRecord::new(ts, 100.0, 101.0, 99.0, 100.5, (i >= 14).then_some(50.0))
//!     })
//!     .collect();
//!
//! // Rich rule set: 0.5% price floor, 0.65 confidence threshold
//! let engine = EngineBuilder::new().build().unwrap();
//!
//! let report = engine.scan(&candles).unwrap();
//! assert!(report.is_empty());
//! ```

pub mod detectors;
pub mod params;
pub mod report;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

pub mod prelude {
    pub use crate::{
        // Stages
        detectors::*,
        // Parameters
        params::{get_percent, get_period, get_points, ParamMeta, ParamType},
        // Reporting
        report::{annotate, ChartDivergence, ChartReport, ReportSummary},
        // Parallel
        scan_parallel,
        // Input
        Candle,
        CandleExt,
        CandleRecord,
        // Types
        Confidence,
        DefaultEngine,
        Direction,
        Divergence,
        DivergenceCandidate,
        // Engine
        DivergenceEngine,
        // Errors
        DivergenceError,
        DivergenceReport,
        EngineBuilder,
        EngineConfig,
        ExtremaSet,
        Extremum,
        ExtremumKind,
        PatternType,
        Period,
        Result,
        ScanError,
        ScanResult,
    };
}

use detectors::{ConfidenceScorer, ReferenceScorer, WeightedScorer};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, DivergenceError>;

/// Errors that can occur during divergence detection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DivergenceError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Missing/non-finite prices, `high < low`, or a timestamp not after its predecessor
    #[error("Malformed candle at index {index}: {reason}")]
    MalformedInput { index: usize, reason: &'static str },

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Confidence level in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    /// Create a new Confidence, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(DivergenceError::InvalidValue(
                "Confidence cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(DivergenceError::OutOfRange {
                field: "Confidence",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Confidence from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Serialize for Confidence {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Confidence::new(value).map_err(serde::de::Error::custom)
    }
}

/// Candle count (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(DivergenceError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// CANDLE TRAITS
// ============================================================

/// A time-bucketed OHLCV observation with its oscillator value
pub trait Candle {
    /// Ordering key, Unix epoch milliseconds
    fn timestamp(&self) -> i64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    fn volume(&self) -> f64 {
        0.0
    }

    /// Oscillator value, `None` during the warm-up period
    fn oscillator(&self) -> Option<f64>;
}

/// Extension trait with derived accessors and validation
pub trait CandleExt: Candle {
    /// Usable oscillator value. Non-finite values count as absent, never as zero.
    #[inline]
    fn oscillator_value(&self) -> Option<f64> {
        self.oscillator().filter(|v| v.is_finite())
    }

    /// Validate the fields the detector reads
    fn validate(&self) -> Result<()> {
        let (high, low, close) = (self.high(), self.low(), self.close());
        if high.is_nan() || low.is_nan() || close.is_nan() {
            return Err(DivergenceError::MalformedInput {
                index: 0,
                reason: "NaN in high/low/close",
            });
        }
        if high.is_infinite() || low.is_infinite() || close.is_infinite() {
            return Err(DivergenceError::MalformedInput {
                index: 0,
                reason: "Infinite value in high/low/close",
            });
        }
        if high < low {
            return Err(DivergenceError::MalformedInput {
                index: 0,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl<T: Candle + ?Sized> CandleExt for T {}

/// Plain candle record as delivered by the data-acquisition side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleRecord {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub oscillator: Option<f64>,
}

impl CandleRecord {
    pub fn new(
        timestamp: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        oscillator: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0.0,
            oscillator,
        }
    }
}

impl Candle for CandleRecord {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn oscillator(&self) -> Option<f64> {
        self.oscillator
    }
}

// ============================================================
// EXTREMA
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumKind {
    Low,
    High,
}

/// A detected local turning point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extremum {
    pub series_index: usize,
    pub kind: ExtremumKind,
    /// The low (for lows) or high (for highs) at `series_index`
    pub price: f64,
    pub oscillator_value: f64,
}

/// Output of the extrema finder, one ascending list per kind.
///
/// An outside bar can be both a low and a high; it then appears once in each
/// list and never twice in the same list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtremaSet {
    pub lows: Vec<Extremum>,
    pub highs: Vec<Extremum>,
}

impl ExtremaSet {
    pub fn len(&self) -> usize {
        self.lows.len() + self.highs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lows.is_empty() && self.highs.is_empty()
    }

    /// All extrema ordered by series index (lows before highs on ties)
    pub fn merged(&self) -> Vec<Extremum> {
        let mut all: Vec<Extremum> = self.lows.iter().chain(&self.highs).copied().collect();
        all.sort_by_key(|e| (e.series_index, e.kind == ExtremumKind::High));
        all
    }
}

/// Ordered pair of same-kind extrema considered for classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergenceCandidate {
    pub earlier: Extremum,
    pub later: Extremum,
    pub index_gap: usize,
}

impl DivergenceCandidate {
    #[inline]
    pub fn kind(&self) -> ExtremumKind {
        self.earlier.kind
    }

    /// Signed price change in percent, `None` when the earlier price is zero
    #[inline]
    pub fn price_change_pct(&self) -> Option<f64> {
        detectors::helpers::pct_change(self.earlier.price, self.later.price)
    }

    /// Signed oscillator change in points
    #[inline]
    pub fn oscillator_change(&self) -> f64 {
        self.later.oscillator_value - self.earlier.oscillator_value
    }
}

// ============================================================
// PATTERNS
// ============================================================

/// Directional bias of a divergence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// The four divergence patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    /// Lower low in price, higher low in the oscillator
    RegularBullish,
    /// Higher low in price, lower low in the oscillator
    HiddenBullish,
    /// Higher high in price, lower high in the oscillator
    RegularBearish,
    /// Lower high in price, higher high in the oscillator
    HiddenBearish,
}

impl PatternType {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternType::RegularBullish => "regular-bullish",
            PatternType::HiddenBullish => "hidden-bullish",
            PatternType::RegularBearish => "regular-bearish",
            PatternType::HiddenBearish => "hidden-bearish",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            PatternType::RegularBullish | PatternType::HiddenBullish => Direction::Bullish,
            PatternType::RegularBearish | PatternType::HiddenBearish => Direction::Bearish,
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, scored divergence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Divergence {
    pub pattern_type: PatternType,
    pub start_index: usize,
    pub end_index: usize,
    pub start_price: f64,
    pub end_price: f64,
    pub start_oscillator: f64,
    pub end_oscillator: f64,
    pub price_change_pct: f64,
    pub oscillator_change: f64,
    pub timeframe_candles: usize,
    /// Quality/confidence score 0.0..=1.0
    pub confidence: f64,
}

impl Divergence {
    fn new(
        candidate: &DivergenceCandidate,
        pattern_type: PatternType,
        price_change_pct: f64,
        confidence: f64,
    ) -> Self {
        Self {
            pattern_type,
            start_index: candidate.earlier.series_index,
            end_index: candidate.later.series_index,
            start_price: candidate.earlier.price,
            end_price: candidate.later.price,
            start_oscillator: candidate.earlier.oscillator_value,
            end_oscillator: candidate.later.oscillator_value,
            price_change_pct,
            oscillator_change: candidate.oscillator_change(),
            timeframe_candles: candidate.index_gap,
            confidence,
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.pattern_type.direction()
    }
}

/// Engine output, partitioned by bias and ordered by `end_index`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergenceReport {
    pub bullish_divergences: Vec<Divergence>,
    pub bearish_divergences: Vec<Divergence>,
}

impl DivergenceReport {
    pub fn len(&self) -> usize {
        self.bullish_divergences.len() + self.bearish_divergences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullish_divergences.is_empty() && self.bearish_divergences.is_empty()
    }

    /// Bullish entries first, then bearish
    pub fn iter(&self) -> impl Iterator<Item = &Divergence> {
        self.bullish_divergences
            .iter()
            .chain(&self.bearish_divergences)
    }
}

// ============================================================
// ENGINE CONFIGURATION
// ============================================================

/// Engine configuration
///
/// The default is the rich rule set. [`EngineConfig::reference`] reproduces the
/// simplified bullish-only pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub extrema_window: Period,
    pub max_lookback: Period,
    pub min_price_change_pct: f64,
    pub min_oscillator_change: f64,
    /// `None` disables the threshold (every scored result is emitted)
    pub confidence_threshold: Option<Confidence>,
    pub pattern_filter: Option<Vec<PatternType>>,
    pub validate_data: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        use detectors::helpers::*;
        Self {
            extrema_window: Period::new_const(DEFAULT_EXTREMA_WINDOW),
            max_lookback: Period::new_const(DEFAULT_MAX_LOOKBACK),
            min_price_change_pct: DEFAULT_MIN_PRICE_CHANGE_PCT,
            min_oscillator_change: DEFAULT_MIN_OSCILLATOR_CHANGE,
            confidence_threshold: Some(Confidence::new_const(DEFAULT_CONFIDENCE_THRESHOLD)),
            pattern_filter: None,
            validate_data: true,
        }
    }
}

impl EngineConfig {
    /// Simplified reference rules: 1% price floor, no threshold, regular-bullish only
    pub fn reference() -> Self {
        Self {
            min_price_change_pct: detectors::helpers::REFERENCE_MIN_PRICE_CHANGE_PCT,
            confidence_threshold: None,
            pattern_filter: Some(vec![PatternType::RegularBullish]),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extrema_window.get() == 0 {
            return Err(DivergenceError::InvalidConfig(
                "extremaWindow must be > 0".into(),
            ));
        }
        if self.max_lookback.get() == 0 {
            return Err(DivergenceError::InvalidConfig(
                "maxLookback must be > 0".into(),
            ));
        }
        for (name, value) in [
            ("minPriceChangePct", self.min_price_change_pct),
            ("minOscillatorChange", self.min_oscillator_change),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DivergenceError::InvalidConfig(format!(
                    "{name} must be a finite value >= 0, got {value}"
                )));
            }
        }
        if let Some(threshold) = self.confidence_threshold {
            Confidence::new(threshold.get())?;
        }
        if self.pattern_filter.as_ref().is_some_and(|f| f.is_empty()) {
            return Err(DivergenceError::InvalidConfig(
                "patternFilter must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn allows(&self, pattern: PatternType) -> bool {
        self.pattern_filter
            .as_ref()
            .map_or(true, |filter| filter.contains(&pattern))
    }
}

// ============================================================
// DIVERGENCE ENGINE
// ============================================================

/// Main divergence detection engine
///
/// Pure and synchronous: a scan depends only on its input series and the
/// configuration, so one engine can serve concurrent scans.
#[derive(Debug, Clone)]
pub struct DivergenceEngine<S: ConfidenceScorer = WeightedScorer> {
    scorer: S,
    config: EngineConfig,
}

impl<S: ConfidenceScorer> DivergenceEngine<S> {
    pub fn new(scorer: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { scorer, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    // ===========================================
    // STAGES
    // ===========================================

    /// Local lows and highs with the configured window
    pub fn find_extrema<T: Candle>(&self, candles: &[T]) -> ExtremaSet {
        detectors::find_extrema(candles, self.config.extrema_window.get())
    }

    /// Consecutive same-kind pairs within the lookback bound (lows, then highs)
    pub fn pair_candidates(&self, extrema: &ExtremaSet) -> Vec<DivergenceCandidate> {
        let lookback = self.config.max_lookback.get();
        let mut candidates = detectors::pair_candidates(&extrema.lows, lookback);
        candidates.extend(detectors::pair_candidates(&extrema.highs, lookback));
        candidates
    }

    /// Label a candidate and apply the pattern filter and magnitude gates
    pub fn classify(&self, candidate: &DivergenceCandidate) -> Option<PatternType> {
        let Some(pattern) = detectors::classify(candidate) else {
            trace!(
                start = candidate.earlier.series_index,
                end = candidate.later.series_index,
                "pair is not a divergence"
            );
            return None;
        };
        if !self.config.allows(pattern) {
            return None;
        }
        if !detectors::passes_magnitude_gate(
            candidate,
            self.config.min_price_change_pct,
            self.config.min_oscillator_change,
        ) {
            trace!(
                pattern = pattern.as_str(),
                start = candidate.earlier.series_index,
                end = candidate.later.series_index,
                "below magnitude gate"
            );
            return None;
        }
        Some(pattern)
    }

    /// Score an accepted candidate; `None` when at or below the threshold
    pub fn score(&self, candidate: &DivergenceCandidate, pattern: PatternType) -> Option<Divergence> {
        let price_change_pct = candidate.price_change_pct()?;
        let raw = self.scorer.score(candidate, pattern);
        let confidence = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };

        if let Some(threshold) = self.config.confidence_threshold {
            if confidence <= threshold.get() {
                trace!(
                    pattern = pattern.as_str(),
                    end = candidate.later.series_index,
                    confidence,
                    "below confidence threshold"
                );
                return None;
            }
        }

        Some(Divergence::new(candidate, pattern, price_change_pct, confidence))
    }

    // ===========================================
    // PIPELINE
    // ===========================================

    /// Validate the series and run every stage.
    ///
    /// A series too short for the extrema window yields an empty report.
    pub fn scan<T: Candle>(&self, candles: &[T]) -> Result<DivergenceReport> {
        if self.config.validate_data {
            self.validate_candles(candles).inspect_err(|e| {
                warn!(error = %e, "rejecting candle series");
            })?;
        }

        let extrema = self.find_extrema(candles);
        debug!(
            candles = candles.len(),
            lows = extrema.lows.len(),
            highs = extrema.highs.len(),
            "extrema located"
        );

        let mut report = DivergenceReport::default();
        for candidate in self.pair_candidates(&extrema) {
            let Some(pattern) = self.classify(&candidate) else {
                continue;
            };
            let Some(divergence) = self.score(&candidate, pattern) else {
                continue;
            };
            match pattern.direction() {
                Direction::Bullish => report.bullish_divergences.push(divergence),
                Direction::Bearish => report.bearish_divergences.push(divergence),
            }
        }

        report.bullish_divergences.sort_by_key(|d| d.end_index);
        report.bearish_divergences.sort_by_key(|d| d.end_index);

        debug!(
            bullish = report.bullish_divergences.len(),
            bearish = report.bearish_divergences.len(),
            "divergence scan complete"
        );
        Ok(report)
    }

    fn validate_candles<T: Candle>(&self, candles: &[T]) -> Result<()> {
        let mut previous: Option<i64> = None;
        for (i, candle) in candles.iter().enumerate() {
            candle.validate().map_err(|e| match e {
                DivergenceError::MalformedInput { reason, .. } => {
                    DivergenceError::MalformedInput { index: i, reason }
                }
                other => other,
            })?;

            let current = candle.timestamp();
            if let Some(previous) = previous {
                if current <= previous {
                    return Err(DivergenceError::MalformedInput {
                        index: i,
                        reason: "timestamp not after the previous candle",
                    });
                }
            }
            previous = Some(current);
        }
        Ok(())
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating DivergenceEngine instances
#[derive(Debug, Clone)]
pub struct EngineBuilder<S: ConfidenceScorer = WeightedScorer> {
    scorer: S,
    config: EngineConfig,
}

impl Default for EngineBuilder<WeightedScorer> {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder<WeightedScorer> {
    /// Rich rule set with the weighted scorer
    pub fn new() -> Self {
        Self {
            scorer: WeightedScorer,
            config: EngineConfig::default(),
        }
    }
}

impl EngineBuilder<ReferenceScorer> {
    /// Simplified reference pipeline with its own scorer
    pub fn reference() -> Self {
        Self {
            scorer: ReferenceScorer,
            config: EngineConfig::reference(),
        }
    }
}

impl<S: ConfidenceScorer> EngineBuilder<S> {
    /// Change scorer
    pub fn scorer<S2: ConfidenceScorer>(self, scorer: S2) -> EngineBuilder<S2> {
        EngineBuilder {
            scorer,
            config: self.config,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn extrema_window(mut self, window: usize) -> Self {
        self.config.extrema_window = Period::new_const(window);
        self
    }

    pub fn max_lookback(mut self, lookback: usize) -> Self {
        self.config.max_lookback = Period::new_const(lookback);
        self
    }

    pub fn min_price_change_pct(mut self, pct: f64) -> Self {
        self.config.min_price_change_pct = pct;
        self
    }

    pub fn min_oscillator_change(mut self, points: f64) -> Self {
        self.config.min_oscillator_change = points;
        self
    }

    /// Discard results with confidence at or below `threshold`
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.config.confidence_threshold = Some(Confidence::new_const(threshold));
        self
    }

    /// Emit every scored result
    pub fn no_threshold(mut self) -> Self {
        self.config.confidence_threshold = None;
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, patterns: impl IntoIterator<Item = PatternType>) -> Self {
        self.config.pattern_filter = Some(patterns.into_iter().collect());
        self
    }

    /// Enable/disable input validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<DivergenceEngine<S>> {
        DivergenceEngine::new(self.scorer, self.config)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single series
#[derive(Debug)]
pub struct ScanResult {
    pub label: String,
    pub report: DivergenceReport,
}

/// Error from scanning a single series
#[derive(Debug)]
pub struct ScanError {
    pub label: String,
    pub error: DivergenceError,
}

/// Parallel scanning of independent series (e.g. one per timeframe)
pub fn scan_parallel<'a, T, I, S>(
    engine: &DivergenceEngine<S>,
    series: I,
) -> (Vec<ScanResult>, Vec<ScanError>)
where
    T: Candle + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
    S: ConfidenceScorer,
{
    let results: Vec<_> = series
        .into_par_iter()
        .map(|(label, candles)| {
            engine
                .scan(candles)
                .map(|report| ScanResult {
                    label: label.to_string(),
                    report,
                })
                .map_err(|error| ScanError {
                    label: label.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TYPE ALIASES
// ============================================================

/// Default engine with the weighted scorer
pub type DefaultEngine = DivergenceEngine<WeightedScorer>;

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR_HOURS_MS: i64 = 4 * 60 * 60 * 1000;

    /// Flat series: lows 110, highs 115, oscillator 50
    fn flat(n: usize) -> Vec<CandleRecord> {
        (0..n)
            .map(|i| {
                CandleRecord::new(i as i64 * FOUR_HOURS_MS, 112.0, 115.0, 110.0, 112.0, Some(50.0))
            })
            .collect()
    }

    fn with_low(mut candles: Vec<CandleRecord>, index: usize, low: f64, osc: f64) -> Vec<CandleRecord> {
        candles[index].low = low;
        candles[index].oscillator = Some(osc);
        candles
    }

    fn with_high(mut candles: Vec<CandleRecord>, index: usize, high: f64, osc: f64) -> Vec<CandleRecord> {
        candles[index].high = high;
        candles[index].oscillator = Some(osc);
        candles
    }

    #[test]
    fn test_confidence_validation() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(0.65).is_ok());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::new(f64::NAN).is_err());
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(20).is_ok());
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn test_candle_validation() {
        let ok = CandleRecord::new(0, 1.0, 2.0, 0.5, 1.5, None);
        assert!(ok.validate().is_ok());

        let inverted = CandleRecord::new(0, 1.0, 0.5, 2.0, 1.5, None);
        assert!(inverted.validate().is_err());

        let nan = CandleRecord::new(0, 1.0, 2.0, f64::NAN, 1.5, None);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.extrema_window.get(), 10);
        assert_eq!(config.max_lookback.get(), 20);
        assert_eq!(config.min_price_change_pct, 0.5);
        assert_eq!(config.min_oscillator_change, 2.0);
        assert_eq!(config.confidence_threshold, Some(Confidence::new_const(0.65)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reference_config() {
        let config = EngineConfig::reference();
        assert_eq!(config.min_price_change_pct, 1.0);
        assert!(config.confidence_threshold.is_none());
        assert_eq!(config.pattern_filter, Some(vec![PatternType::RegularBullish]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "extremaWindow": 5, "minPriceChangePct": 1.0, "confidenceThreshold": null }"#,
        )
        .unwrap();
        assert_eq!(config.extrema_window.get(), 5);
        assert_eq!(config.max_lookback.get(), 20);
        assert_eq!(config.min_price_change_pct, 1.0);
        assert!(config.confidence_threshold.is_none());

        assert!(serde_json::from_str::<EngineConfig>(r#"{ "extremaWindow": 0 }"#).is_err());
        assert!(serde_json::from_str::<EngineConfig>(r#"{ "confidenceThreshold": 1.5 }"#).is_err());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        assert!(EngineBuilder::new().extrema_window(0).build().is_err());
        assert!(EngineBuilder::new().max_lookback(0).build().is_err());
        assert!(EngineBuilder::new().min_price_change_pct(-1.0).build().is_err());
        assert!(EngineBuilder::new().min_oscillator_change(f64::NAN).build().is_err());
        assert!(EngineBuilder::new().confidence_threshold(2.0).build().is_err());
        assert!(EngineBuilder::new().only_patterns([]).build().is_err());
        assert!(EngineBuilder::new().build().is_ok());
    }

    #[test]
    fn test_empty_scan() {
        let engine = EngineBuilder::new().build().unwrap();
        let candles: Vec<CandleRecord> = vec![];
        let report = engine.scan(&candles).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_short_series_is_empty_not_error() {
        let engine = EngineBuilder::new().build().unwrap();
        let report = engine.scan(&flat(20)).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_huge_window_from_config_scans_empty() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "extremaWindow": 18446744073709551615 }"#).unwrap();
        let engine = EngineBuilder::new().config(config).build().unwrap();
        let candles = with_low(with_low(flat(30), 10, 100.0, 28.0), 18, 95.0, 34.0);
        assert!(engine.scan(&candles).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_input_rejected() {
        let engine = EngineBuilder::new().build().unwrap();

        let mut candles = flat(30);
        candles[7].close = f64::INFINITY;
        assert_eq!(
            engine.scan(&candles),
            Err(DivergenceError::MalformedInput {
                index: 7,
                reason: "Infinite value in high/low/close",
            })
        );

        let mut candles = flat(30);
        candles[12].timestamp = candles[11].timestamp;
        assert_eq!(
            engine.scan(&candles),
            Err(DivergenceError::MalformedInput {
                index: 12,
                reason: "timestamp not after the previous candle",
            })
        );
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let engine = EngineBuilder::new().validate_data(false).build().unwrap();
        let mut candles = flat(30);
        candles[12].timestamp = candles[11].timestamp;
        assert!(engine.scan(&candles).is_ok());
    }

    #[test]
    fn test_regular_bullish_pipeline() {
        let candles = with_low(with_low(flat(30), 10, 100.0, 28.0), 18, 95.0, 34.0);
        let engine = EngineBuilder::new().extrema_window(5).build().unwrap();

        let report = engine.scan(&candles).unwrap();
        assert_eq!(report.bullish_divergences.len(), 1);
        assert!(report.bearish_divergences.is_empty());

        let d = report.bullish_divergences[0];
        assert_eq!(d.pattern_type, PatternType::RegularBullish);
        assert_eq!((d.start_index, d.end_index), (10, 18));
        assert_eq!(d.timeframe_candles, 8);
        assert!((d.price_change_pct + 5.0).abs() < 1e-9);
        assert!((d.oscillator_change - 6.0).abs() < 1e-9);
        assert!((d.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_regular_bearish_pipeline() {
        let candles = with_high(with_high(flat(30), 10, 120.0, 72.0), 18, 126.0, 66.0);
        let engine = EngineBuilder::new().extrema_window(5).build().unwrap();

        let report = engine.scan(&candles).unwrap();
        assert!(report.bullish_divergences.is_empty());
        assert_eq!(report.bearish_divergences.len(), 1);
        assert_eq!(
            report.bearish_divergences[0].pattern_type,
            PatternType::RegularBearish
        );
    }

    #[test]
    fn test_pattern_filter() {
        let candles = with_high(with_high(flat(30), 10, 120.0, 72.0), 18, 126.0, 66.0);
        let engine = EngineBuilder::new()
            .extrema_window(5)
            .only_patterns([PatternType::RegularBullish])
            .build()
            .unwrap();

        assert!(engine.scan(&candles).unwrap().is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let candles = with_low(with_low(flat(30), 10, 100.0, 28.0), 18, 95.0, 34.0);
        let engine = EngineBuilder::new()
            .extrema_window(5)
            .confidence_threshold(1.0)
            .build()
            .unwrap();

        assert!(engine.scan(&candles).unwrap().is_empty());
    }

    #[test]
    fn test_reference_engine() {
        let candles = with_low(with_low(flat(30), 10, 100.0, 28.0), 18, 92.0, 34.0);
        let engine = EngineBuilder::reference().extrema_window(5).build().unwrap();

        let report = engine.scan(&candles).unwrap();
        assert_eq!(report.bullish_divergences.len(), 1);
        assert!((report.bullish_divergences[0].confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_scan() {
        let engine = EngineBuilder::new().extrema_window(5).build().unwrap();

        let four_hour = with_low(with_low(flat(30), 10, 100.0, 28.0), 18, 95.0, 34.0);
        let mut daily = flat(30);
        daily[3].timestamp = 0;

        let series: Vec<(&str, &[CandleRecord])> = vec![("4h", &four_hour), ("1d", &daily)];

        let (results, errors) = scan_parallel(&engine, series);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "4h");
        assert_eq!(results[0].report.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].label, "1d");
    }

    #[test]
    fn test_extrema_set_merged_order() {
        let candles = with_high(with_low(flat(30), 18, 95.0, 34.0), 10, 120.0, 72.0);
        let engine = EngineBuilder::new().extrema_window(5).build().unwrap();
        let merged = engine.find_extrema(&candles).merged();
        let indices: Vec<usize> = merged.iter().map(|e| e.series_index).collect();
        assert_eq!(indices, vec![10, 18]);
        assert_eq!(merged[0].kind, ExtremumKind::High);
    }
}
