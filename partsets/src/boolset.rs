//! Three-valued truth sets returned by set-valued comparisons.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Subset of `{true, false}`.
    ///
    /// Four inhabitants: the empty set (no information, e.g. a comparison
    /// against the empty numeric set), `{true}`, `{false}`, and
    /// `{true, false}` (the relation holds for some element pairs only).
    #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct BoolSet: u8 {
        /// The comparison can hold.
        const TRUE = 1;
        /// The comparison can fail.
        const FALSE = 1 << 1;
    }
}

impl BoolSet {
    /// True when `value` is a member of the set.
    #[must_use]
    pub const fn contains_value(self, value: bool) -> bool {
        if value {
            self.contains(Self::TRUE)
        } else {
            self.contains(Self::FALSE)
        }
    }

    /// True when the set pins the comparison to a single outcome.
    #[must_use]
    pub const fn is_certain(self) -> bool {
        self.bits() == Self::TRUE.bits() || self.bits() == Self::FALSE.bits()
    }
}

impl From<bool> for BoolSet {
    fn from(value: bool) -> Self {
        if value { Self::TRUE } else { Self::FALSE }
    }
}

impl fmt::Display for BoolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = match (self.contains_value(true), self.contains_value(false)) {
            (true, true) => "true, false",
            (true, false) => "true",
            (false, true) => "false",
            (false, false) => "",
        };
        write!(f, "{{{members}}}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn four_inhabitants() {
        let all: Vec<BoolSet> = vec![
            BoolSet::empty(),
            BoolSet::TRUE,
            BoolSet::FALSE,
            BoolSet::all(),
        ];
        for (i, lhs) in all.iter().enumerate() {
            for (j, rhs) in all.iter().enumerate() {
                assert_eq!(lhs == rhs, i == j);
            }
        }
    }

    #[test]
    fn union_and_membership() {
        let both = BoolSet::TRUE | BoolSet::FALSE;
        assert_eq!(both, BoolSet::all());
        assert!(both.contains_value(true));
        assert!(both.contains_value(false));
        assert!(!BoolSet::TRUE.contains_value(false));
        assert!(!BoolSet::empty().contains_value(true));
        assert_eq!(BoolSet::from(true), BoolSet::TRUE);
    }

    #[test]
    fn display() {
        assert_eq!(BoolSet::empty().to_string(), "{}");
        assert_eq!(BoolSet::TRUE.to_string(), "{true}");
        assert_eq!(BoolSet::all().to_string(), "{true, false}");
    }
}
