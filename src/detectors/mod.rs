//! Divergence detection stages
//!
//! Data flows one way through three stages, each producing a new value:
//!
//! - **Extrema finder**: local lows and highs over a symmetric window.
//! - **Classifier**: consecutive same-kind pairs labelled regular/hidden,
//!   bullish/bearish, then gated on minimum price and oscillator change.
//! - **Scorer**: bounded confidence for every accepted pair.

pub mod classifier;
pub mod extrema;
pub mod helpers;
pub mod scorer;

pub use classifier::{classify, pair_candidates, passes_magnitude_gate};
pub use extrema::find_extrema;
pub use scorer::{ConfidenceScorer, ReferenceScorer, WeightedScorer};
