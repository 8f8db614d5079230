//! Error types for the zephyr-grid crate.

use std::fmt;

use crate::axis::AxisKind;

/// Classification shared by every error type in the workspace.
///
/// Each crate keeps its own error enum; `kind()` maps a variant onto one of
/// these categories so callers can react to the category without matching
/// on crate-specific variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid kernel, threshold, or other processing parameters.
    Configuration,
    /// Malformed, non-finite, or out-of-range input data.
    DataValidation,
    /// Fields combined in one operation have incompatible axes.
    AxisMismatch,
    /// A calibration reference is too degenerate to build a table from.
    InsufficientReferenceData,
    /// Blend weights are negative, non-finite, or sum to zero.
    InvalidWeight,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::DataValidation => "data validation error",
            ErrorKind::AxisMismatch => "axis mismatch error",
            ErrorKind::InsufficientReferenceData => "insufficient reference data error",
            ErrorKind::InvalidWeight => "invalid weight error",
        };
        f.write_str(s)
    }
}

/// Error type for all fallible operations in the zephyr-grid crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Returned when an axis has no coordinate points.
    #[error("axis '{kind}' has no points")]
    EmptyAxis {
        /// The offending axis.
        kind: AxisKind,
    },

    /// Returned when an axis coordinate is NaN or infinite.
    #[error("axis '{kind}' has a non-finite point at index {index}")]
    NonFiniteCoordinate {
        /// The offending axis.
        kind: AxisKind,
        /// Position of the bad coordinate.
        index: usize,
    },

    /// Returned when a coordinate axis is not strictly monotonic.
    #[error("axis '{kind}' points must be strictly monotonic")]
    NonMonotonicAxis {
        /// The offending axis.
        kind: AxisKind,
    },

    /// Returned when an axis kind appears more than once.
    #[error("axis '{kind}' appears more than once")]
    DuplicateAxis {
        /// The repeated axis.
        kind: AxisKind,
    },

    /// Returned when the field does not end with the y and x axes.
    #[error("the last two axes must be 'y' then 'x', got {found:?}")]
    SpatialAxesNotLast {
        /// Axis kinds in the order given.
        found: Vec<AxisKind>,
    },

    /// Returned when an operation needs an axis the field does not have.
    #[error("field has no '{kind}' axis")]
    MissingAxis {
        /// The required axis.
        kind: AxisKind,
    },

    /// Returned when a data or mask array does not match the axis lengths.
    #[error("{what} shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Which array was wrong ("values" or "mask").
        what: String,
        /// Shape implied by the axes.
        expected: Vec<usize>,
        /// Shape actually supplied.
        got: Vec<usize>,
    },

    /// Returned when an unmasked cell holds NaN or infinity.
    #[error("unmasked non-finite value {value} at flat index {index}")]
    NonFiniteValue {
        /// Row-major index of the cell.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when a probability field holds a value outside [0, 1].
    #[error("probability {value} at flat index {index} is outside [0, 1]")]
    ProbabilityOutOfRange {
        /// Row-major index of the cell.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when grid spacing is requested on irregular coordinates.
    #[error("axis '{kind}' is not uniformly spaced")]
    NonUniformSpacing {
        /// The offending axis.
        kind: AxisKind,
    },

    /// Returned when two fields that must be combined are not aligned.
    #[error("axis mismatch: {reason}")]
    AxisMismatch {
        /// Description of the first difference found.
        reason: String,
    },

    /// Returned when a threshold value is NaN or infinite.
    #[error("threshold value must be finite, got {value}")]
    InvalidThreshold {
        /// The offending value.
        value: f64,
    },
}

impl GridError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GridError::MissingAxis { .. } | GridError::InvalidThreshold { .. } => {
                ErrorKind::Configuration
            }
            GridError::AxisMismatch { .. } => ErrorKind::AxisMismatch,
            _ => ErrorKind::DataValidation,
        }
    }
}
