//! Discrete numeric sets.

use crate::error::Result;
use crate::interval::Interval;
use crate::union::IntervalUnion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Set of single numeric values, stored as singleton intervals inside a
/// [`IntervalUnion`]; duplicates and values closer than the tolerance
/// coalesce.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiscreteSet(IntervalUnion);

impl DiscreteSet {
    /// Build from any bag of values.
    ///
    /// # Errors
    ///
    /// Every value must be finite.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Result<Self> {
        let singletons: Vec<Interval> = values
            .into_iter()
            .map(Interval::singleton)
            .collect::<Result<_>>()?;
        Ok(Self(IntervalUnion::new(singletons)))
    }

    /// Values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|r| r.min_elem())
    }

    /// View as a disjoint interval union.
    #[must_use]
    pub const fn as_union(&self) -> &IntervalUnion {
        &self.0
    }

    /// True for the empty set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<DiscreteSet> for IntervalUnion {
    fn from(discrete: DiscreteSet) -> Self {
        discrete.0
    }
}

impl fmt::Display for DiscreteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn values_come_back_sorted() {
        let discrete = DiscreteSet::new([3.0, 1.0, 2.0]).unwrap();
        assert_eq!(discrete.values().collect::<Vec<f64>>(), [1.0, 2.0, 3.0]);
        assert_eq!(discrete.len(), 3);
    }

    #[test]
    fn duplicates_coalesce() {
        let discrete = DiscreteSet::new([1.0, 1.0, 2.0]).unwrap();
        assert_eq!(discrete.len(), 2);
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(DiscreteSet::new([f64::INFINITY]).is_err());
        assert!(DiscreteSet::new([f64::NAN]).is_err());
    }

    #[test]
    fn behaves_as_union_of_singletons() {
        let discrete = DiscreteSet::new([1.0, 5.0]).unwrap();
        assert!(discrete.as_union().contains(5.0));
        assert!(!discrete.as_union().contains(3.0));
        assert_eq!(
            discrete.as_union().intervals(),
            [
                Interval::new(1.0, 1.0).unwrap(),
                Interval::new(5.0, 5.0).unwrap()
            ]
        );
    }

    #[test]
    fn serializes_as_a_union_of_singletons() {
        let discrete = DiscreteSet::new([1.0]).unwrap();
        let yaml = serde_yaml::to_string(&discrete).unwrap();
        assert_eq!(yaml, "intervals:\n- min: 1.0\n  max: 1.0\n");
        let back: DiscreteSet = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, discrete);
    }
}
