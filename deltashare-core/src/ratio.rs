use crate::error::SharingError;
use serde::{Deserialize, Serialize};

/// Fraction of the flat vector selected for transmission each round.
///
/// Always in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CompressionRatio(f64);

impl CompressionRatio {
    /// Full sharing: every element, every round.
    pub const FULL: Self = Self(1.0);

    pub fn new(alpha: f64) -> Result<Self, SharingError> {
        if alpha.is_finite() && alpha > 0.0 && alpha <= 1.0 {
            Ok(Self(alpha))
        } else {
            Err(SharingError::UnsupportedConfig(format!(
                "compression ratio must lie in (0, 1], got {alpha}"
            )))
        }
    }

    pub fn alpha(self) -> f64 {
        self.0
    }

    /// Selection size `k = round(alpha * n)`.
    ///
    /// Halves round to even (`0.5 * 1 -> 0`, `0.5 * 3 -> 2`), so peers
    /// computing k independently always agree.
    pub fn select_count(self, n: usize) -> usize {
        let k = (self.0 * n as f64).round_ties_even() as usize;
        k.min(n)
    }
}

impl Default for CompressionRatio {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<f64> for CompressionRatio {
    type Error = SharingError;

    fn try_from(alpha: f64) -> Result<Self, Self::Error> {
        Self::new(alpha)
    }
}

impl From<CompressionRatio> for f64 {
    fn from(ratio: CompressionRatio) -> Self {
        ratio.0
    }
}
