//! Disjoint unions of closed intervals.

use crate::boolset::BoolSet;
use crate::error::Result;
use crate::interval::Interval;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Ordered set of pairwise-disjoint, non-adjacent closed intervals.
///
/// The empty union is the empty set. Construction normalises any bag of
/// intervals: sort ascending by lower bound, then merge every pair of
/// neighbours that overlap or touch under tolerance, so that
/// `prev.max_elem() < next.min_elem()` holds strictly afterwards.
///
/// # Examples
///
/// ```rust
/// use partsets::interval::Interval;
/// use partsets::union::IntervalUnion;
///
/// let set = IntervalUnion::new([
///     Interval::new(4.0, 5.0)?,
///     Interval::new(1.0, 2.0)?,
///     Interval::new(1.5, 3.0)?,
/// ]);
/// assert_eq!(
///     set.intervals(),
///     [Interval::new(1.0, 3.0)?, Interval::new(4.0, 5.0)?]
/// );
/// # Ok::<(), partsets::error::Error>(())
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(from = "UnionRepr")]
pub struct IntervalUnion {
    intervals: Vec<Interval>,
}

#[derive(Deserialize)]
struct UnionRepr {
    intervals: Vec<Interval>,
}

impl From<UnionRepr> for IntervalUnion {
    fn from(repr: UnionRepr) -> Self {
        Self::new(repr.intervals)
    }
}

impl From<Interval> for IntervalUnion {
    fn from(interval: Interval) -> Self {
        Self {
            intervals: vec![interval],
        }
    }
}

impl IntervalUnion {
    /// Normalising constructor over any bag of intervals.
    #[must_use]
    pub fn new(intervals: impl IntoIterator<Item = Interval>) -> Self {
        let mut sorted: Vec<Interval> = intervals.into_iter().collect();
        sorted.sort_by(|a, b| a.min_elem().partial_cmp(&b.min_elem()).unwrap());

        let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
        for interval in sorted {
            let Some(last) = merged.last_mut() else {
                merged.push(interval);
                continue;
            };
            let pieces = last.maybe_merge(interval);
            *last = pieces[0];
            merged.extend(pieces.get(1).copied());
        }

        Self { intervals: merged }
    }

    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            intervals: Vec::new(),
        }
    }

    /// Concatenation of several unions, renormalised.
    #[must_use]
    pub fn from_unions(unions: impl IntoIterator<Item = Self>) -> Self {
        Self::new(unions.into_iter().flat_map(|union| union.intervals))
    }

    /// True for the empty set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Number of constituent intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Constituents, sorted and disjoint.
    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Iterator over the constituents.
    pub fn iter(&self) -> impl Iterator<Item = Interval> + Clone + '_ {
        self.intervals.iter().copied()
    }

    /// Smallest element, `None` for the empty set.
    #[must_use]
    pub fn min_elem(&self) -> Option<f64> {
        self.intervals.first().map(Interval::min_elem)
    }

    /// Largest element, `None` for the empty set.
    #[must_use]
    pub fn max_elem(&self) -> Option<f64> {
        self.intervals.last().map(Interval::max_elem)
    }

    /// True when the set is the whole real line.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.intervals.first().is_some_and(|r| r.is_unbounded())
    }

    /// True when every element is finite; the empty set is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min_elem().is_none_or(f64::is_finite)
            && self.max_elem().is_none_or(f64::is_finite)
    }

    /// True when the set holds exactly one value.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        !self.is_empty() && self.min_elem() == self.max_elem()
    }

    /// Membership test with tolerance at constituent bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        let index = self.intervals.partition_point(|r| r.min_elem() <= value);
        index > 0 && self.intervals[index - 1].contains(value)
    }

    /// The element of the set closest to `target`, `None` for the empty
    /// set. Candidates are the bounds of the two constituents bracketing
    /// `target`; `target` itself wins when it lies inside a constituent.
    #[must_use]
    pub fn closest_elem(&self, target: f64) -> Option<f64> {
        let index = self.intervals.partition_point(|r| r.min_elem() <= target);
        let left = index.checked_sub(1).map(|i| self.intervals[i]);
        if left.is_some_and(|r| r.contains(target)) {
            return Some(target);
        }
        let left_bound = left.map(|r| r.max_elem());
        let right_bound = self.intervals.get(index).map(|r| r.min_elem());
        match (left_bound, right_bound) {
            (Some(lhs), Some(rhs)) => {
                if target - lhs < rhs - target {
                    Some(lhs)
                } else {
                    Some(rhs)
                }
            }
            (bound, None) | (None, bound) => bound,
        }
    }

    /// Intersection with a single interval.
    #[must_use]
    pub fn intersect_interval(&self, other: Interval) -> Self {
        Self::new(self.iter().filter_map(|r| r.intersect(other)))
    }

    /// Intersection of two unions via a two-pointer sweep; the pointer on
    /// whichever constituent ends first advances, approximate ties advance
    /// both.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let mut result = Vec::new();
        let (mut s, mut o) = (0, 0);
        while s < self.intervals.len() && o < other.intervals.len() {
            let rs = self.intervals[s];
            let ro = other.intervals[o];
            if let Some(piece) = rs.intersect(ro) {
                result.push(piece);
            }

            if rs.max_elem() < ro.min_elem() {
                // nothing left in `other` can reach rs
                s += 1;
            } else if ro.max_elem() < rs.min_elem() {
                o += 1;
            } else if rs.max_elem() < ro.max_elem() {
                s += 1;
            } else if ro.max_elem() < rs.max_elem() {
                o += 1;
            } else {
                // both end on the same number
                s += 1;
                o += 1;
            }
        }
        Self::new(result)
    }

    /// Set union.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.iter().chain(other.iter()))
    }

    /// Difference by a single interval.
    #[must_use]
    pub fn difference_interval(&self, other: Interval) -> Self {
        Self::new(self.iter().flat_map(|r| r.difference(other)))
    }

    /// Difference by a union, folding over the subtrahend's constituents.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        other
            .iter()
            .fold(self.clone(), |acc, o| acc.difference_interval(o))
    }

    /// Symmetric difference `(A ∪ B) \ (A ∩ B)`.
    #[must_use]
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.union(other).difference(&self.intersect(other))
    }

    /// True when every element of `self` lies in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        other.is_superset_of(self)
    }

    /// True when every element of `other` lies in `self`.
    #[must_use]
    pub fn is_superset_of(&self, other: &Self) -> bool {
        *other == other.intersect(self)
    }

    /// Reciprocal of every constituent; zero-crossing constituents split
    /// in two.
    #[must_use]
    pub fn invert(&self) -> Self {
        Self::from_unions(self.iter().map(Interval::invert))
    }

    /// Negation.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self::new(self.iter().map(|r| -r))
    }

    /// Absolute value of every constituent.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self::new(self.iter().map(Interval::abs))
    }

    /// Power over the Cartesian product of base and exponent constituents.
    ///
    /// # Errors
    ///
    /// Fails on the unsupported shapes of [`Interval::pow`].
    pub fn pow(&self, other: &Self) -> Result<Self> {
        let pieces: Vec<Self> = self
            .iter()
            .cartesian_product(other.iter())
            .map(|(base, exponent)| base.pow(exponent))
            .collect::<Result<_>>()?;
        Ok(Self::from_unions(pieces))
    }

    /// Natural logarithm of every constituent.
    ///
    /// # Errors
    ///
    /// Every constituent must lie strictly in the positive reals.
    pub fn log(&self) -> Result<Self> {
        Ok(Self::new(
            self.iter().map(Interval::log).collect::<Result<Vec<_>>>()?,
        ))
    }

    /// Sine of every constituent.
    ///
    /// # Errors
    ///
    /// Fails on the unsupported shapes of [`Interval::sin`].
    pub fn sin(&self) -> Result<Self> {
        Ok(Self::new(
            self.iter().map(Interval::sin).collect::<Result<Vec<_>>>()?,
        ))
    }

    /// Round every bound to `digits` fractional digits.
    #[must_use]
    pub fn round(&self, digits: i32) -> Self {
        Self::new(self.iter().map(|r| r.round(digits)))
    }

    fn lift(&self, other: &Self, op: impl Fn(Interval, Interval) -> Interval) -> Self {
        Self::new(
            self.iter()
                .cartesian_product(other.iter())
                .map(|(a, b)| op(a, b)),
        )
    }

    fn extremes(&self, other: &Self) -> Option<(f64, f64, f64, f64)> {
        Some((
            self.min_elem()?,
            self.max_elem()?,
            other.min_elem()?,
            other.max_elem()?,
        ))
    }

    /// Set-valued `>=`: `{true}` when every element of `self` is at least
    /// every element of `other`, `{false}` when none is, both otherwise;
    /// empty operands give the empty truth set.
    #[must_use]
    pub fn ge(&self, other: &Self) -> BoolSet {
        let Some((smin, smax, omin, omax)) = self.extremes(other) else {
            return BoolSet::empty();
        };
        if smin >= omax {
            return BoolSet::TRUE;
        }
        if smax < omin {
            return BoolSet::FALSE;
        }
        BoolSet::all()
    }

    /// Set-valued `>`.
    #[must_use]
    pub fn gt(&self, other: &Self) -> BoolSet {
        let Some((smin, smax, omin, omax)) = self.extremes(other) else {
            return BoolSet::empty();
        };
        if smin > omax {
            return BoolSet::TRUE;
        }
        if smax <= omin {
            return BoolSet::FALSE;
        }
        BoolSet::all()
    }

    /// Set-valued `<=`.
    #[must_use]
    pub fn le(&self, other: &Self) -> BoolSet {
        let Some((smin, smax, omin, omax)) = self.extremes(other) else {
            return BoolSet::empty();
        };
        if smax <= omin {
            return BoolSet::TRUE;
        }
        if smin > omax {
            return BoolSet::FALSE;
        }
        BoolSet::all()
    }

    /// Set-valued `<`.
    #[must_use]
    pub fn lt(&self, other: &Self) -> BoolSet {
        let Some((smin, smax, omin, omax)) = self.extremes(other) else {
            return BoolSet::empty();
        };
        if smax < omin {
            return BoolSet::TRUE;
        }
        if smin >= omax {
            return BoolSet::FALSE;
        }
        BoolSet::all()
    }
}

impl PartialEq for IntervalUnion {
    fn eq(&self, other: &Self) -> bool {
        self.intervals.len() == other.intervals.len()
            && self
                .intervals
                .iter()
                .zip(&other.intervals)
                .all(|(lhs, rhs)| lhs == rhs)
    }
}

impl Hash for IntervalUnion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for interval in &self.intervals {
            interval.hash(state);
        }
    }
}

impl fmt::Display for IntervalUnion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, interval) in self.intervals.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{interval}")?;
        }
        write!(f, "}}")
    }
}

impl Add for IntervalUnion {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.lift(&rhs, |a, b| a + b)
    }
}

impl Neg for IntervalUnion {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

impl Sub for IntervalUnion {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + -rhs
    }
}

impl Mul for IntervalUnion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.lift(&rhs, |a, b| a * b)
    }
}

impl Div for IntervalUnion {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let inverted = rhs.invert();
        self * inverted
    }
}
