//! # Confidence Module
//!
//! Fixed-point confidence values for insight and evolution scoring.
//!
//! - Stored as an integer in thousandths (0-1000)
//! - No floating-point arithmetic: conversions go through decimal text
//! - Serialized as a plain JSON number (`0.75`), so clients see fractions

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Upper bound in thousandths.
const SCALE: u16 = 1000;

/// A confidence (or strength) between 0.0 and 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Confidence(u16);

impl Confidence {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(SCALE);

    /// Create from thousandths, clamped to 1000.
    #[must_use]
    pub const fn from_permille(permille: u16) -> Self {
        if permille > SCALE {
            Self(SCALE)
        } else {
            Self(permille)
        }
    }

    #[must_use]
    pub const fn permille(self) -> u16 {
        self.0
    }

    /// Parse from a float, rounding to thousandths.
    ///
    /// Returns `None` for negative or non-finite input; values above 1.0
    /// clamp to 1.0.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value.is_sign_negative() {
            return None;
        }
        let text = format!("{value:.3}");
        let (whole, frac) = text.split_once('.')?;
        let whole: u64 = whole.parse().ok()?;
        let frac: u16 = frac.parse().ok()?;
        if whole >= 1 {
            return Some(Self::MAX);
        }
        Some(Self::from_permille(frac))
    }

    #[must_use]
    pub fn to_f64(self) -> f64 {
        format!("{}.{:03}", self.0 / SCALE, self.0 % SCALE)
            .parse()
            .unwrap_or_default()
    }

    /// Add, clamping at 1.0.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self::from_permille(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / SCALE, self.0 % SCALE)
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value)
            .ok_or_else(|| D::Error::custom(format!("confidence out of range: {value}")))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_one() {
        assert_eq!(Confidence::from_permille(1500), Confidence::MAX);
        assert_eq!(
            Confidence::from_permille(950).saturating_add(Confidence::from_permille(100)),
            Confidence::MAX
        );
    }

    #[test]
    fn float_conversions() {
        assert_eq!(Confidence::from_f64(0.75), Some(Confidence::from_permille(750)));
        assert_eq!(Confidence::from_f64(0.1234), Some(Confidence::from_permille(123)));
        assert_eq!(Confidence::from_f64(2.0), Some(Confidence::MAX));
        assert_eq!(Confidence::from_f64(-0.5), None);
        assert_eq!(Confidence::from_f64(f64::NAN), None);
        assert_eq!(Confidence::from_permille(850).to_f64().to_string(), "0.85");
    }

    #[test]
    fn json_is_a_plain_number() {
        let json = serde_json::to_string(&Confidence::from_permille(800)).expect("serialize");
        assert_eq!(json, "0.8");
        let back: Confidence = serde_json::from_str("0.8").expect("deserialize");
        assert_eq!(back, Confidence::from_permille(800));
        assert!(serde_json::from_str::<Confidence>("-1").is_err());
    }

    #[test]
    fn ordering_follows_value() {
        assert!(Confidence::from_permille(799) < Confidence::from_permille(800));
        assert_eq!(Confidence::from_permille(65).to_string(), "0.065");
    }
}
