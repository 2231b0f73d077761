//! Polymorphic set literals accepted by picker predicates.

use crate::boolset::BoolSet;
use crate::discrete::DiscreteSet;
use crate::interval::Interval;
use crate::union::IntervalUnion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A set-shaped literal: a bare scalar or any of the set types. Candidate
/// part parameters are literals of this kind and are dispatched by pattern
/// match, never by downcasting.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum SetLiteral {
    /// Single number.
    Scalar(f64),
    /// Closed interval.
    Interval(Interval),
    /// Disjoint union of intervals.
    Union(IntervalUnion),
    /// Discrete value set.
    Discrete(DiscreteSet),
    /// Truth set.
    Bool(BoolSet),
}

impl SetLiteral {
    /// Numeric view of the literal; `None` for truth sets and non-finite
    /// scalars.
    #[must_use]
    pub fn to_number_set(&self) -> Option<IntervalUnion> {
        match self {
            Self::Scalar(value) => Interval::singleton(*value).ok().map(IntervalUnion::from),
            Self::Interval(interval) => Some(IntervalUnion::from(*interval)),
            Self::Union(union) => Some(union.clone()),
            Self::Discrete(discrete) => Some(discrete.as_union().clone()),
            Self::Bool(_) => None,
        }
    }
}

impl From<f64> for SetLiteral {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Interval> for SetLiteral {
    fn from(interval: Interval) -> Self {
        Self::Interval(interval)
    }
}

impl From<IntervalUnion> for SetLiteral {
    fn from(union: IntervalUnion) -> Self {
        Self::Union(union)
    }
}

impl From<DiscreteSet> for SetLiteral {
    fn from(discrete: DiscreteSet) -> Self {
        Self::Discrete(discrete)
    }
}

impl From<BoolSet> for SetLiteral {
    fn from(set: BoolSet) -> Self {
        Self::Bool(set)
    }
}

impl fmt::Display for SetLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Interval(interval) => write!(f, "{interval}"),
            Self::Union(union) => write!(f, "{union}"),
            Self::Discrete(discrete) => write!(f, "{discrete}"),
            Self::Bool(set) => write!(f, "{set}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn numeric_views() {
        let scalar = SetLiteral::from(2.5);
        assert!(scalar.to_number_set().unwrap().contains(2.5));

        let interval = SetLiteral::from(Interval::new(1.0, 2.0).unwrap());
        assert!(interval.to_number_set().unwrap().contains(1.5));

        let discrete = SetLiteral::from(DiscreteSet::new([1.0, 4.0]).unwrap());
        assert_eq!(discrete.to_number_set().unwrap().len(), 2);

        assert!(SetLiteral::from(BoolSet::TRUE).to_number_set().is_none());
        assert!(SetLiteral::Scalar(f64::NAN).to_number_set().is_none());
    }
}
