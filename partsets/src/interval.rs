//! Closed real intervals and their arithmetic.

use crate::error::{Error, Result};
use crate::round::{float_round, is_close, ABS_DIGITS};
use crate::union::IntervalUnion;
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Closed real interval `[lo, hi]`.
///
/// The lower bound may be `-inf` and the upper bound `+inf`, but never the
/// reversed infinity. Bounds are rounded to [`ABS_DIGITS`] fractional
/// digits on construction. Values are immutable; every operation returns a
/// fresh interval.
///
/// # Examples
///
/// ```rust
/// use partsets::interval::Interval;
///
/// let a = Interval::new(1.0, 2.0)?;
/// let b = Interval::new(3.0, 4.0)?;
/// assert_eq!(a * b, Interval::new(3.0, 8.0)?);
/// # Ok::<(), partsets::error::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(into = "IntervalRepr", try_from = "IntervalRepr")]
pub struct Interval {
    lo: f64,
    hi: f64,
}

/// Wire form of an interval; `None` stands for the infinity of the
/// matching sign.
#[derive(Deserialize, Serialize)]
struct IntervalRepr {
    min: Option<f64>,
    max: Option<f64>,
}

impl From<Interval> for IntervalRepr {
    fn from(interval: Interval) -> Self {
        Self {
            min: interval.lo.is_finite().then_some(interval.lo),
            max: interval.hi.is_finite().then_some(interval.hi),
        }
    }
}

impl TryFrom<IntervalRepr> for Interval {
    type Error = Error;

    fn try_from(repr: IntervalRepr) -> Result<Self> {
        Self::new(
            repr.min.unwrap_or(f64::NEG_INFINITY),
            repr.max.unwrap_or(f64::INFINITY),
        )
    }
}

impl Interval {
    /// Constructor; rejects reversed or mis-signed infinite bounds. NaN
    /// bounds fail the `lo <= hi` check.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBounds`] when `lo > hi`, `lo = +inf`, or `hi = -inf`.
    pub fn new(lo: f64, hi: f64) -> Result<Self> {
        if !(lo <= hi) || lo == f64::INFINITY || hi == f64::NEG_INFINITY {
            return Err(Error::InvalidBounds { lo, hi });
        }
        Ok(Self::raw(lo, hi))
    }

    /// Singleton `[value, value]`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBounds`] for non-finite values.
    pub fn singleton(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::InvalidBounds {
                lo: value,
                hi: value,
            });
        }
        Ok(Self::raw(value, value))
    }

    /// The whole real line.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            lo: f64::NEG_INFINITY,
            hi: f64::INFINITY,
        }
    }

    // Bounds already validated by the caller; rounding is order-preserving.
    fn raw(lo: f64, hi: f64) -> Self {
        let lo = float_round(lo, ABS_DIGITS);
        let hi = float_round(hi, ABS_DIGITS);
        debug_assert!(lo <= hi && lo != f64::INFINITY && hi != f64::NEG_INFINITY);
        Self { lo, hi }
    }

    /// Lower bound.
    #[must_use]
    pub const fn min_elem(&self) -> f64 {
        self.lo
    }

    /// Upper bound.
    #[must_use]
    pub const fn max_elem(&self) -> f64 {
        self.hi
    }

    /// True when the interval holds a single value.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.lo == self.hi
    }

    /// True when both bounds are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite()
    }

    /// True when the interval spans the whole real line.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.lo == f64::NEG_INFINITY && self.hi == f64::INFINITY
    }

    /// True when both bounds are integral values.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.lo.fract() == 0.0 && self.hi.fract() == 0.0
    }

    /// Centre-relative view `(center, rel)` with
    /// `rel = (hi - lo) / (2 |center|)`; a zero centre falls back to the
    /// half-width and a singleton has `rel = 0`.
    #[must_use]
    pub fn as_center_rel(&self) -> (f64, f64) {
        if self.is_singleton() {
            return (self.lo, 0.0);
        }
        let center = (self.lo + self.hi) / 2.0;
        let rel = if center == 0.0 {
            (self.hi - self.lo) / 2.0
        } else {
            (self.hi - self.lo) / 2.0 / center.abs()
        };
        (center, rel)
    }

    /// Reciprocal `1 / [lo, hi]` as a disjoint union. Zero-crossing
    /// operands split into two unbounded pieces; the zero singleton has no
    /// reciprocal at all.
    #[must_use]
    pub fn invert(self) -> IntervalUnion {
        if self.lo == 0.0 && self.hi == 0.0 {
            return IntervalUnion::empty();
        }
        if self.lo < 0.0 && 0.0 < self.hi {
            return IntervalUnion::new([
                Self::raw(f64::NEG_INFINITY, self.lo.recip()),
                Self::raw(self.hi.recip(), f64::INFINITY),
            ]);
        }
        if self.lo < 0.0 && self.hi == 0.0 {
            return Self::raw(f64::NEG_INFINITY, self.lo.recip()).into();
        }
        if self.lo == 0.0 && 0.0 < self.hi {
            return Self::raw(self.hi.recip(), f64::INFINITY).into();
        }
        Self::raw(self.hi.recip(), self.lo.recip()).into()
    }

    /// Interval power `[a, b] ^ [c, d]` as a disjoint union. Negative
    /// exponent ranges are computed over the negated exponent and
    /// reciprocated; overflow saturates at the signed infinity.
    ///
    /// # Errors
    ///
    /// Exponent intervals crossing zero and fractional exponents over
    /// negative bases are unsupported.
    pub fn pow(self, other: Self) -> Result<IntervalUnion> {
        if other.hi < 0.0 {
            return Ok(self.pow(-other)?.invert());
        }
        if other.lo < 0.0 {
            return Err(Error::ExponentAcrossZero {
                lo: other.lo,
                hi: other.hi,
            });
        }
        if self.hi < 0.0 && other.lo.fract() != 0.0 {
            return Err(Error::FractionalPowOfNegative {
                lo: self.lo,
                hi: self.hi,
            });
        }
        if !other.is_integer() && self.lo < 0.0 {
            return Err(Error::FractionalPowOfNegative {
                lo: self.lo,
                hi: self.hi,
            });
        }

        let (a, b) = (self.lo, self.hi);
        let (c, d) = (other.lo, other.hi);

        let mut values: ArrayVec<f64, 7> = ArrayVec::new();
        values.extend([a.powf(c), a.powf(d), b.powf(c), b.powf(d)]);
        if a < 0.0 && 0.0 < b {
            values.extend([0.0_f64.powf(c), 0.0_f64.powf(d)]);
            // the largest odd exponent below d keeps the sign of a
            // negative base
            if d.rem_euclid(2.0) == 1.0 && d - 1.0 > c {
                values.push(a.powf(d - 1.0));
            }
        }

        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self::new(lo, hi)?.into())
    }

    /// Absolute value by case analysis on the bound signs. A
    /// zero-crossing operand clamps at zero and keeps its upper bound.
    #[must_use]
    pub fn abs(self) -> Self {
        if self.lo < 0.0 && 0.0 < self.hi {
            return Self::raw(0.0, self.hi);
        }
        if self.hi <= 0.0 {
            return -self;
        }
        self
    }

    /// Natural logarithm of both bounds.
    ///
    /// # Errors
    ///
    /// The operand must lie strictly in the positive reals.
    pub fn log(self) -> Result<Self> {
        if self.lo <= 0.0 {
            return Err(Error::LogNonPositive {
                lo: self.lo,
                hi: self.hi,
            });
        }
        Ok(Self::raw(self.lo.ln(), self.hi.ln()))
    }

    /// Sine over the interval.
    ///
    /// # Errors
    ///
    /// Only full-period spans and singletons are supported.
    pub fn sin(self) -> Result<Self> {
        if self.hi - self.lo >= std::f64::consts::TAU {
            return Ok(Self::raw(-1.0, 1.0));
        }
        if self.is_singleton() {
            return Ok(Self::raw(self.lo.sin(), self.hi.sin()));
        }
        Err(Error::PartialSin {
            lo: self.lo,
            hi: self.hi,
        })
    }

    /// Round both bounds to `digits` fractional digits.
    #[must_use]
    pub fn round(self, digits: i32) -> Self {
        Self::raw(float_round(self.lo, digits), float_round(self.hi, digits))
    }

    /// Intersection of two intervals. Bounds that cross by no more than
    /// the relative tolerance still produce the degenerate singleton.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        if lo <= hi {
            return Some(Self::raw(lo, hi));
        }
        if is_close(lo, hi) {
            return Some(Self::raw(lo, lo));
        }
        None
    }

    /// Set difference `self \ other` as zero, one, or two intervals.
    #[must_use]
    pub fn difference(self, other: Self) -> ArrayVec<Self, 2> {
        let mut pieces = ArrayVec::new();
        if self.hi < other.lo || self.lo > other.hi {
            // disjoint
            pieces.push(self);
        } else if other.lo <= self.lo && other.hi >= self.hi {
            // fully covered
        } else if self.lo < other.lo && self.hi > other.hi {
            // subtrahend sits strictly inside
            pieces.push(Self::raw(self.lo, other.lo));
            pieces.push(Self::raw(other.hi, self.hi));
        } else if self.lo < other.lo {
            pieces.push(Self::raw(self.lo, other.lo));
        } else {
            pieces.push(Self::raw(other.hi, self.hi));
        }
        pieces
    }

    /// Merge two intervals into one when the right one starts inside the
    /// left one (inclusive under tolerance), otherwise return both ordered
    /// by lower bound.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use partsets::interval::Interval;
    ///
    /// let merged = Interval::new(1.0, 5.0)?.maybe_merge(Interval::new(3.0, 7.0)?);
    /// assert_eq!(merged.as_slice(), [Interval::new(1.0, 7.0)?]);
    ///
    /// let apart = Interval::new(1.0, 2.0)?.maybe_merge(Interval::new(4.0, 5.0)?);
    /// assert_eq!(apart.len(), 2);
    /// # Ok::<(), partsets::error::Error>(())
    /// ```
    #[must_use]
    pub fn maybe_merge(self, other: Self) -> ArrayVec<Self, 2> {
        let (left, right) = if self.lo <= other.lo {
            (self, other)
        } else {
            (other, self)
        };
        let mut pieces = ArrayVec::new();
        if left.contains(right.lo) {
            pieces.push(Self::raw(left.lo, left.hi.max(right.hi)));
        } else {
            pieces.push(left);
            pieces.push(right);
        }
        pieces
    }

    /// True when `self` is contained in `other`, bounds compared under
    /// tolerance.
    #[must_use]
    pub fn is_subset_of(self, other: Self) -> bool {
        (self.lo >= other.lo || is_close(self.lo, other.lo))
            && (self.hi <= other.hi || is_close(self.hi, other.hi))
    }

    /// True when `value` lies in the interval or within tolerance of a
    /// bound.
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        (self.lo <= value && value <= self.hi)
            || is_close(self.lo, value)
            || is_close(self.hi, value)
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        is_close(self.lo, other.lo) && is_close(self.hi, other.hi)
    }
}

// Hashes the exact bit patterns; values equal only under tolerance may
// land in different buckets.
impl Hash for Interval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lo.to_bits().hash(state);
        self.hi.to_bits().hash(state);
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_singleton() {
            return write!(f, "[{}]", self.lo);
        }
        let (center, rel) = self.as_center_rel();
        if rel < 1.0 {
            write!(f, "{center} ± {}%", rel * 100.0)
        } else {
            write!(f, "[{}, {}]", self.lo, self.hi)
        }
    }
}

impl Add for Interval {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::raw(self.lo + rhs.lo, self.hi + rhs.hi)
    }
}

impl Neg for Interval {
    type Output = Self;

    fn neg(self) -> Self {
        Self::raw(-self.hi, -self.lo)
    }
}

impl Sub for Interval {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + -rhs
    }
}

impl Mul for Interval {
    type Output = Self;

    /// Envelope of the four corner products; `0 * ±inf` collapses to `0`
    /// (the exclusive policy, keeping multiplication by the zero singleton
    /// exact).
    fn mul(self, rhs: Self) -> Self {
        fn guarded_mul(a: f64, b: f64) -> f64 {
            if a == 0.0 || b == 0.0 {
                return 0.0;
            }
            let prod = a * b;
            debug_assert!(!prod.is_nan());
            prod
        }

        let corners = [
            guarded_mul(self.lo, rhs.lo),
            guarded_mul(self.lo, rhs.hi),
            guarded_mul(self.hi, rhs.lo),
            guarded_mul(self.hi, rhs.hi),
        ];
        let lo = corners.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self::raw(lo, hi)
    }
}

impl Div for Interval {
    type Output = IntervalUnion;

    /// Product with the reciprocal of the divisor; a zero-crossing divisor
    /// yields two unbounded pieces.
    fn div(self, rhs: Self) -> IntervalUnion {
        IntervalUnion::new(rhs.invert().iter().map(|piece| self * piece))
    }
}
