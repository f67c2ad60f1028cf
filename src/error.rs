//! Error taxonomy of the resampling core.

use thiserror::Error;

/// Fatal failure of a core sampling or statistic operation.
///
/// All variants abort the experiment that raised them; there is no retry
/// and no default substitution.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Without-replacement draw larger than the population.
    #[error("sample size {size} exceeds population size {population} for sampling without replacement")]
    InvalidSize { size: usize, population: usize },

    /// A population must hold at least one observation.
    #[error("population is empty")]
    EmptyPopulation,

    /// Populations only hold cleaned, finite values.
    #[error("population value at index {index} is not finite")]
    NonFinite { index: usize },

    /// Statistic requested on a zero-length sample.
    #[error("cannot compute {0} of an empty sample")]
    EmptyInput(&'static str),

    /// Statistic needing a spread estimate requested on too few values.
    #[error("{statistic} needs at least {expected} values, got {actual}")]
    InsufficientData {
        statistic: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Confidence level outside the open interval (0, 1).
    #[error("confidence level must lie strictly between 0 and 1, got {0}")]
    InvalidLevel(f64),

    /// Numerical failure inside a statistic.
    #[error("computation failed: {0}")]
    Computation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
