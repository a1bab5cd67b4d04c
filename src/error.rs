use thiserror::Error;

/// Coarse classification of [`Error`] values.
///
/// Every failure in this crate is a caller input problem; the kind tells the
/// caller whether to fix the points, the parameters, or the metric choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The point set itself is unusable.
    InvalidInput,
    /// A parameter is out of range or unknown.
    InvalidConfig,
    /// The metric cannot be served by the requested spatial index.
    UnsupportedMetric,
}

/// Errors returned by the spatial index and the clustering algorithms.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Points carry no coordinates at all.
    #[error("points must have at least one coordinate")]
    ZeroDimension,

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch at point {index}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Index of the first offending point.
        index: usize,
        /// Dimensionality of point 0.
        expected: usize,
        /// Dimensionality of the offending point.
        found: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("point {index} has a non-finite coordinate on axis {axis}")]
    NonFiniteCoordinate {
        /// Index of the offending point.
        index: usize,
        /// Axis holding the bad value.
        axis: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// A metric or index algorithm name that this crate does not know.
    #[error("unknown {what} name {name:?}")]
    UnknownName {
        /// What was being named (`"metric"` or `"algorithm"`).
        what: &'static str,
        /// The name as given by the caller.
        name: String,
    },

    /// The metric is known, but the spatial index cannot serve it.
    #[error("metric {metric} is not supported here: {reason}")]
    UnsupportedMetric {
        /// Metric name.
        metric: &'static str,
        /// Why the index refused it.
        reason: &'static str,
    },
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyInput
            | Error::ZeroDimension
            | Error::DimensionMismatch { .. }
            | Error::NonFiniteCoordinate { .. } => ErrorKind::InvalidInput,
            Error::InvalidParameter { .. } | Error::UnknownName { .. } => ErrorKind::InvalidConfig,
            Error::UnsupportedMetric { .. } => ErrorKind::UnsupportedMetric,
        }
    }

    pub(crate) fn invalid(name: &'static str, message: &'static str) -> Self {
        Error::InvalidParameter { name, message }
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
