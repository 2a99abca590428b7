//! Crash multiplier derivation.
//!
//! The first 13 hex characters of the round digest give a 52-bit sample
//! `num`, so `r = num / 2^52` lies in `[0, 1)`. The multiplier is the
//! inverse-uniform transform `keep / (1 - r)` floored to hundredths, where
//! `keep = 1 - house_edge`, then clamped to `[1.00, max_point]`. Everything
//! is computed in integers:
//!
//! ```text
//! cents = floor(keep_bps * 100 * 2^52 / (10000 * (2^52 - num)))
//! ```
//!
//! so generation and verification agree bit-for-bit on every platform. For
//! any `x >= 1`, `P(point >= x) ~= keep / x`; roughly `house_edge` of all
//! rounds bust instantly at 1.00x. A zero edge reproduces the legacy
//! `floor(100 / (1 - r)) / 100` values exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{CrashConfig, HouseEdge};
use crate::error::{EngineError, Result};
use crate::rng::DigestStream;
use crate::seed::SeedPair;

/// Granularity of a crash point: 100 = two decimal places.
pub const CRASH_BASE: u64 = 100;
pub const SAMPLE_HEX_CHARS: usize = 13;
const SAMPLE_SPACE: u128 = 1 << 52;

/// A multiplier in hundredths (`320` is 3.20x).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CrashPoint(u64);

impl CrashPoint {
    pub const MIN: CrashPoint = CrashPoint(CRASH_BASE);
    pub const DEFAULT_MAX: CrashPoint = CrashPoint(1_000_000 * CRASH_BASE);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> u64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / CRASH_BASE as f64
    }

    /// Parses a displayed multiplier, rounding to the nearest hundredth.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 1.0 {
            return Err(EngineError::invalid(format!(
                "multiplier must be a finite number >= 1, got {value}"
            )));
        }
        let cents = (value * CRASH_BASE as f64).round();
        if cents >= u64::MAX as f64 {
            return Err(EngineError::invalid(format!("multiplier {value} is too large")));
        }
        Ok(Self(cents as u64))
    }
}

impl fmt::Display for CrashPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}x", self.0 / CRASH_BASE, self.0 % CRASH_BASE)
    }
}

impl TryFrom<f64> for CrashPoint {
    type Error = EngineError;

    fn try_from(value: f64) -> Result<Self> {
        Self::from_f64(value)
    }
}

impl From<CrashPoint> for f64 {
    fn from(point: CrashPoint) -> f64 {
        point.as_f64()
    }
}

/// Maps a 52-bit sample to a crash point. Samples at or above `2^52` are
/// treated as the largest representable one.
pub fn point_from_sample(sample: u64, edge: HouseEdge, max_point: CrashPoint) -> CrashPoint {
    let sample = u128::from(sample).min(SAMPLE_SPACE - 1);
    let keep = u128::from(HouseEdge::SCALE - edge.bps());
    let numerator = keep * u128::from(CRASH_BASE) * SAMPLE_SPACE;
    let denominator = u128::from(HouseEdge::SCALE) * (SAMPLE_SPACE - sample);
    let cents = u64::try_from(numerator / denominator).unwrap_or(u64::MAX);
    let ceiling = max_point.cents().max(CRASH_BASE);
    CrashPoint(cents.clamp(CRASH_BASE, ceiling))
}

pub fn crash_point(seeds: &SeedPair, config: &CrashConfig) -> Result<CrashPoint> {
    config.validate()?;
    let mut stream = DigestStream::new(seeds);
    // A fresh SHA-256 hex digest always holds 13 characters.
    let sample = stream
        .next_bits(SAMPLE_HEX_CHARS)
        .ok_or(EngineError::DerivationExhaustion { rounds: 0 })?;
    Ok(point_from_sample(sample, config.house_edge, config.max_point))
}
