use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;

/// Confidence score clamped to [0.0, 1.0].
/// Shared by entities, relationships, mentions, and reasoning paths.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    /// High confidence threshold.
    pub const HIGH: f64 = 0.8;
    /// Medium confidence threshold.
    pub const MEDIUM: f64 = 0.5;
    /// Low confidence threshold.
    pub const LOW: f64 = 0.3;

    pub const ZERO: Confidence = Confidence(0.0);
    pub const ONE: Confidence = Confidence(1.0);

    /// Create a new Confidence, clamping to [0.0, 1.0]. NaN becomes 0.0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw f64 value.
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_high(self) -> bool {
        self.0 >= Self::HIGH
    }

    /// Whether the stored value is inside [0, 1]. Only false for values
    /// that bypassed `new` (e.g. hand-written JSON).
    pub fn in_range(self) -> bool {
        (0.0..=1.0).contains(&self.0)
    }

    /// Weighted average of `(confidence, weight)` pairs. Zero total weight yields 0.
    pub fn weighted_average(parts: &[(Confidence, f64)]) -> Self {
        let total: f64 = parts.iter().map(|(_, w)| w.max(0.0)).sum();
        if total <= f64::EPSILON {
            return Self::ZERO;
        }
        let sum: f64 = parts.iter().map(|(c, w)| c.0 * w.max(0.0)).sum();
        Self::new(sum / total)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self(1.0)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

/// Chaining two confidences never increases either of them.
impl Mul for Confidence {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.0 * rhs.0)
    }
}

impl Mul<f64> for Confidence {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.0 * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(Confidence::new(1.7).value(), 1.0);
        assert_eq!(Confidence::new(-0.2).value(), 0.0);
        assert_eq!(Confidence::new(f64::NAN).value(), 0.0);
    }

    #[test]
    fn weighted_average_uses_weights() {
        let avg = Confidence::weighted_average(&[
            (Confidence::new(0.9), 3.0),
            (Confidence::new(0.5), 1.0),
        ]);
        assert!((avg.value() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn product_is_non_increasing() {
        let a = Confidence::new(0.9);
        let b = Confidence::new(0.8);
        let p = a * b;
        assert!(p <= a && p <= b);
    }
}
