//! Error types for the numeric-set algebra.

use thiserror::Error;

/// Errors produced by the set algebra and its rounding helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// Interval constructor rejected its bounds.
    #[error("invalid interval bounds [{lo}, {hi}]")]
    InvalidBounds {
        /// Offending lower bound.
        lo: f64,
        /// Offending upper bound.
        hi: f64,
    },
    /// Significant-digit rounding needs a non-negative digit count.
    #[error("digit count must be non-negative, got {digits}")]
    NegativeDigits {
        /// Offending digit count.
        digits: i32,
    },
    /// Logarithm over an interval reaching into the non-positive reals.
    #[error("logarithm of [{lo}, {hi}] with non-positive lower bound")]
    LogNonPositive {
        /// Lower bound of the operand.
        lo: f64,
        /// Upper bound of the operand.
        hi: f64,
    },
    /// Sine over a non-singleton span shorter than a full period.
    #[error("sine of [{lo}, {hi}] spanning less than a full period")]
    PartialSin {
        /// Lower bound of the operand.
        lo: f64,
        /// Upper bound of the operand.
        hi: f64,
    },
    /// Power with an exponent interval crossing zero.
    #[error("exponent interval [{lo}, {hi}] crosses zero")]
    ExponentAcrossZero {
        /// Lower bound of the exponent.
        lo: f64,
        /// Upper bound of the exponent.
        hi: f64,
    },
    /// Power of a negative base with a fractional exponent.
    #[error("negative base [{lo}, {hi}] with fractional exponent")]
    FractionalPowOfNegative {
        /// Lower bound of the base.
        lo: f64,
        /// Upper bound of the base.
        hi: f64,
    },
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// True for operation shapes the algebra deliberately leaves
    /// unimplemented, as opposed to domain violations.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::PartialSin { .. }
                | Self::ExponentAcrossZero { .. }
                | Self::FractionalPowOfNegative { .. }
        )
    }
}

/// Shorthand for results of set-algebra operations.
pub type Result<T> = std::result::Result<T, Error>;
