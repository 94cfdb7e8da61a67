//! Exact rational arithmetic for rates, play speeds and time conversion.
//!
//! Frame rates, sample rates and play speeds are all kept as reduced
//! fractions so that long playback never accumulates floating-point drift.
//! Time on the presentation timeline is measured in integer nanoseconds.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Mul, Neg};

use crate::error::{Result, SpliceError};

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A reduced fraction with a strictly positive denominator.
///
/// The sign is always carried by the numerator. A play speed of `0/1` means
/// stopped, a negative numerator means reverse playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rational {
    value: Rational64,
}

impl Rational {
    /// Zero (also the "stopped" play speed).
    pub const ZERO: Self = Self {
        value: Rational64::new_raw(0, 1),
    };

    /// One (normal forward play speed).
    pub const ONE: Self = Self {
        value: Rational64::new_raw(1, 1),
    };

    /// Create a rational `numerator / denominator`, reduced.
    ///
    /// # Panics
    ///
    /// Panics if `denominator` is zero. Use [`Rational::try_new`] for
    /// untrusted input.
    #[inline]
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            value: Rational64::new(numerator, denominator),
        }
    }

    /// Create a rational, rejecting a zero denominator.
    pub fn try_new(numerator: i64, denominator: i64) -> Result<Self> {
        if denominator == 0 {
            return Err(SpliceError::InvalidParameter(format!(
                "rational {numerator}/0 has a zero denominator"
            )));
        }
        Ok(Self::new(numerator, denominator))
    }

    /// Create a whole-number rational.
    #[inline]
    pub const fn from_integer(n: i64) -> Self {
        Self {
            value: Rational64::new_raw(n, 1),
        }
    }

    /// Numerator (carries the sign).
    #[inline]
    pub fn numer(self) -> i64 {
        *self.value.numer()
    }

    /// Denominator (always positive).
    #[inline]
    pub fn denom(self) -> i64 {
        *self.value.denom()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.numer() == 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.numer() < 0
    }

    #[inline]
    pub fn is_one(self) -> bool {
        self.numer() == 1 && self.denom() == 1
    }

    /// Absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        if self.is_negative() {
            -self
        } else {
            self
        }
    }

    /// Approximate value as `f64`, for display and diagnostics only.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.numer() as f64 / self.denom() as f64
    }

    /// `x * self`, truncated toward zero, computed without intermediate overflow.
    #[inline]
    pub fn scale(self, x: i64) -> i64 {
        let scaled = x as i128 * self.numer() as i128;
        let d = self.denom() as i128;
        if d == 1 {
            scaled as i64
        } else {
            (scaled / d) as i64
        }
    }

    /// `x * self`, rounded toward negative infinity.
    #[inline]
    pub fn scale_floor(self, x: i64) -> i64 {
        floor_div(x as i128 * self.numer() as i128, self.denom() as i128)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Neg for Rational {
    type Output = Self;
    fn neg(self) -> Self {
        Self { value: -self.value }
    }
}

impl Mul for Rational {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            value: self.value * rhs.value,
        }
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Self::from_integer(n)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer(), self.denom())
    }
}

#[inline]
fn floor_div(a: i128, b: i128) -> i64 {
    a.div_euclid(b) as i64
}

/// Presentation time (ns) at which `frame` starts for the given `rate`.
///
/// Returns one nanosecond past the exact boundary, so that
/// `ns_to_frame(rate, frame_to_ns(rate, f)) == f` holds for every `f`
/// despite integer truncation.
pub fn frame_to_ns(rate: Rational, frame: i64) -> i64 {
    let numer = frame as i128 * NANOS_PER_SECOND as i128 * rate.denom() as i128;
    floor_div(numer, rate.numer() as i128) + 1
}

/// Frame (or sample) index that is showing at presentation time `ns`.
pub fn ns_to_frame(rate: Rational, ns: i64) -> i64 {
    let numer = ns as i128 * rate.numer() as i128;
    floor_div(numer, NANOS_PER_SECOND as i128 * rate.denom() as i128)
}
