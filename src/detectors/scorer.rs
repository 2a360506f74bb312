//! Confidence scorers
//!
//! A scorer turns an accepted candidate into a confidence in `[0, 1]`. The
//! engine applies the acceptance threshold afterwards, so scorers only rank.

use super::helpers::*;
use crate::{DivergenceCandidate, PatternType};

/// Scoring model the engine is generic over
pub trait ConfidenceScorer: Send + Sync {
    /// Confidence for a candidate already classified as `pattern`.
    /// Implementations should return a value in `[0, 1]`; the engine clamps.
    fn score(&self, candidate: &DivergenceCandidate, pattern: PatternType) -> f64;
}

// ============================================================
// WEIGHTED SCORER
// ============================================================

/// Additive model: base 0.5 plus independent bonuses for oscillator zone,
/// oscillator change, price change and elapsed candles, clamped to 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer;

impl WeightedScorer {
    /// Bonus for how deep into the favourable zone the pair reaches.
    ///
    /// Bullish patterns look at the lower oscillator value of the pair,
    /// bearish at the higher one.
    pub fn zone_bonus(&self, candidate: &DivergenceCandidate, pattern: PatternType) -> f64 {
        let earlier = candidate.earlier.oscillator_value;
        let later = candidate.later.oscillator_value;

        // Bearish bands mirror the bullish ones around 50.
        let depth = if pattern.direction().is_bullish() {
            earlier.min(later)
        } else {
            100.0 - earlier.max(later)
        };

        match depth {
            d if d < ZONE_EXTREME => ZONE_EXTREME_BONUS,
            d if d < ZONE_STRONG => ZONE_STRONG_BONUS,
            d if d < ZONE_MILD => ZONE_MILD_BONUS,
            _ => 0.0,
        }
    }

    pub fn oscillator_change_bonus(&self, candidate: &DivergenceCandidate) -> f64 {
        match candidate.oscillator_change().abs() {
            c if c > OSC_CHANGE_LARGE => OSC_CHANGE_LARGE_BONUS,
            c if c >= OSC_CHANGE_MEDIUM => OSC_CHANGE_MEDIUM_BONUS,
            c if c >= OSC_CHANGE_SMALL => OSC_CHANGE_SMALL_BONUS,
            _ => 0.0,
        }
    }

    /// Linear between the 0.5% floor and the 2% cap
    pub fn price_change_bonus(&self, candidate: &DivergenceCandidate) -> f64 {
        let Some(pct) = candidate.price_change_pct() else {
            return 0.0;
        };
        let t = (pct.abs() - PRICE_BONUS_FLOOR_PCT) / (PRICE_BONUS_CAP_PCT - PRICE_BONUS_FLOOR_PCT);
        PRICE_BONUS_MAX * t.clamp(0.0, 1.0)
    }

    pub fn elapsed_bonus(&self, candidate: &DivergenceCandidate) -> f64 {
        match candidate.index_gap {
            g if g < GAP_SHORT => GAP_SHORT_BONUS,
            g if g < GAP_MEDIUM => GAP_MEDIUM_BONUS,
            _ => 0.0,
        }
    }
}

impl ConfidenceScorer for WeightedScorer {
    fn score(&self, candidate: &DivergenceCandidate, pattern: PatternType) -> f64 {
        let total = BASE_CONFIDENCE
            + self.zone_bonus(candidate, pattern)
            + self.oscillator_change_bonus(candidate)
            + self.price_change_bonus(candidate)
            + self.elapsed_bonus(candidate);
        total.min(1.0)
    }
}

// ============================================================
// REFERENCE SCORER
// ============================================================

/// Coarse model of the simplified reference pipeline: a large bonus when the
/// later oscillator value sits in the oversold (bullish) or overbought
/// (bearish) zone, plus flat bonuses for strong oscillator and price moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceScorer;

impl ConfidenceScorer for ReferenceScorer {
    fn score(&self, candidate: &DivergenceCandidate, pattern: PatternType) -> f64 {
        let oscillator = candidate.later.oscillator_value;
        let mut confidence = BASE_CONFIDENCE;

        let in_zone = if pattern.direction().is_bullish() {
            oscillator < REFERENCE_ZONE
        } else {
            oscillator > 100.0 - REFERENCE_ZONE
        };
        if in_zone {
            confidence += REFERENCE_ZONE_BONUS;
        }
        if candidate.oscillator_change().abs() > REFERENCE_OSC_CHANGE {
            confidence += REFERENCE_STRENGTH_BONUS;
        }
        if candidate
            .price_change_pct()
            .is_some_and(|pct| pct.abs() > REFERENCE_PRICE_CHANGE_PCT)
        {
            confidence += REFERENCE_STRENGTH_BONUS;
        }

        confidence.min(1.0)
    }
}
