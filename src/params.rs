//! Parameter metadata for the engine configuration
//!
//! This module describes every configuration parameter, enabling:
//! - Parameter documentation
//! - Building a configuration from a flat key/value map (CLI flags, env, UI)
//! - Range validation with readable errors
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use divscan::prelude::*;
//!
//! for param in EngineConfig::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut params = HashMap::new();
//! params.insert("extremaWindow", 5.0);
//! params.insert("confidenceThreshold", 0.0);
//! let config = EngineConfig::with_params(&params).unwrap();
//! assert_eq!(config.extrema_window.get(), 5);
//! assert!(config.confidence_threshold.is_none());
//! ```

use std::collections::HashMap;

use crate::detectors::helpers::{
  DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_EXTREMA_WINDOW, DEFAULT_MAX_LOOKBACK,
  DEFAULT_MIN_OSCILLATOR_CHANGE, DEFAULT_MIN_PRICE_CHANGE_PCT,
};
use crate::{Confidence, DivergenceError, EngineConfig, Period, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Candle count (positive integer)
  Period,
  /// Price change in percent
  Percent,
  /// Oscillator change in points
  Points,
  /// Confidence level in 0.0..=1.0; 0.0 disables the threshold
  Confidence,
}

/// Metadata for a single configuration parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name as used in serialized configs (e.g., "maxLookback")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Accepted range: (min, max)
  pub range: (f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn new(
    name: &'static str,
    param_type: ParamType,
    default: f64,
    range: (f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type, default, range, description }
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    if !value.is_finite() {
      return Err(DivergenceError::InvalidValue("Parameter cannot be NaN or infinite"));
    }
    let (min, max) = self.range;
    if value < min || value > max {
      return Err(DivergenceError::OutOfRange { field: self.name, value, min, max });
    }
    if self.param_type == ParamType::Period && (value < 1.0 || value.fract() != 0.0) {
      return Err(DivergenceError::InvalidValue("Period must be a positive integer"));
    }
    Ok(())
  }
}

const ENGINE_PARAMS: &[ParamMeta] = &[
  ParamMeta::new(
    "extremaWindow",
    ParamType::Period,
    DEFAULT_EXTREMA_WINDOW as f64,
    (1.0, 100.0),
    "Candles compared on each side of a local low/high",
  ),
  ParamMeta::new(
    "maxLookback",
    ParamType::Period,
    DEFAULT_MAX_LOOKBACK as f64,
    (1.0, 500.0),
    "Maximum candle distance between two paired extrema",
  ),
  ParamMeta::new(
    "minPriceChangePct",
    ParamType::Percent,
    DEFAULT_MIN_PRICE_CHANGE_PCT,
    (0.0, 100.0),
    "Minimum absolute price change between the pair, in percent",
  ),
  ParamMeta::new(
    "minOscillatorChange",
    ParamType::Points,
    DEFAULT_MIN_OSCILLATOR_CHANGE,
    (0.0, 100.0),
    "Minimum absolute oscillator change between the pair, in points",
  ),
  ParamMeta::new(
    "confidenceThreshold",
    ParamType::Confidence,
    DEFAULT_CONFIDENCE_THRESHOLD,
    (0.0, 1.0),
    "Results at or below this confidence are dropped; 0 disables the filter",
  ),
];

fn meta(name: &str) -> Option<&'static ParamMeta> {
  ENGINE_PARAMS.iter().find(|m| m.name == name)
}

fn get_checked(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
  let value = params.get(key).copied().unwrap_or(default);
  if let Some(meta) = meta(key) {
    meta.validate(value)?;
  }
  Ok(value)
}

// ============================================================
// ENGINE CONFIG
// ============================================================

impl EngineConfig {
  /// Returns metadata for all configurable numeric parameters
  pub fn param_meta() -> &'static [ParamMeta] {
    ENGINE_PARAMS
  }

  /// Creates a configuration from a flat key/value map.
  ///
  /// Missing parameters use their default values; unknown keys are rejected.
  /// A `confidenceThreshold` of 0 disables the threshold.
  pub fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    if let Some(unknown) = params.keys().find(|k| meta(k).is_none()) {
      return Err(DivergenceError::InvalidConfig(format!("unknown parameter `{unknown}`")));
    }

    let threshold = get_checked(params, "confidenceThreshold", DEFAULT_CONFIDENCE_THRESHOLD)?;
    let config = Self {
      extrema_window: get_period(params, "extremaWindow", DEFAULT_EXTREMA_WINDOW)?,
      max_lookback: get_period(params, "maxLookback", DEFAULT_MAX_LOOKBACK)?,
      min_price_change_pct: get_percent(params, "minPriceChangePct", DEFAULT_MIN_PRICE_CHANGE_PCT)?,
      min_oscillator_change: get_points(
        params,
        "minOscillatorChange",
        DEFAULT_MIN_OSCILLATOR_CHANGE,
      )?,
      confidence_threshold: if threshold > 0.0 { Some(Confidence::new(threshold)?) } else { None },
      ..Self::default()
    };
    config.validate()?;
    Ok(config)
  }
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = get_checked(params, key, default as f64)?;
  Period::new(value as usize)
}

/// Helper to get a percentage from params with default fallback
pub fn get_percent(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
  get_checked(params, key, default)
}

/// Helper to get an oscillator point value from params with default fallback
pub fn get_points(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
  get_checked(params, key, default)
}

// ============================================================
// TESTS
// ============================================================
