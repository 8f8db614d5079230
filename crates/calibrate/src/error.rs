//! Error types for the zephyr-calibrate crate.

use zephyr_grid::{ErrorKind, GridError};

/// Error type for all fallible operations in the zephyr-calibrate crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrateError {
    /// Returned when the input field is malformed or lacks a required axis.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Returned when a reference sample or point list cannot define a table.
    #[error("insufficient reference data: {reason}")]
    InsufficientReferenceData {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when table points are malformed.
    #[error("invalid calibration table: {reason}")]
    InvalidTable {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a quantile to look up is NaN.
    #[error("quantile must not be NaN")]
    NanQuantile,

    /// Returned when a value to calibrate is not finite.
    #[error("value to calibrate must be finite, got {value}")]
    NonFiniteValue {
        /// The rejected value.
        value: f64,
    },

    /// Returned when an ensemble has no valid members.
    #[error("ensemble has no valid members")]
    NoMembers,

    /// Returned when a configuration parameter is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a distribution cannot be constructed.
    ///
    /// The `message` field is a `String` because statrs errors do not
    /// implement `Clone`.
    #[error("{distribution} construction failed: {message}")]
    DistributionConstruction {
        /// Distribution family.
        distribution: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// Returned when values and months slices differ in length.
    #[error("length mismatch: values has {values_len} elements, months has {months_len}")]
    LengthMismatch {
        /// Length of the values slice.
        values_len: usize,
        /// Length of the months slice.
        months_len: usize,
    },

    /// Returned when a month value is outside 1..=12.
    #[error("invalid month: {month} (must be 1..=12)")]
    InvalidMonth {
        /// The invalid month value.
        month: u8,
    },

    /// Returned when no month had enough reference data.
    #[error("no month had sufficient reference data (skipped: {skipped_months:?})")]
    NoCalibratableMonths {
        /// Calendar months (1-indexed) that were skipped.
        skipped_months: Vec<u8>,
    },

    /// Returned when a per-cell calibration set does not cover the grid.
    #[error("calibration set has {got} cell tables, grid has {expected} cells")]
    CellCountMismatch {
        /// Number of `(y, x)` cells in the field.
        expected: usize,
        /// Number of tables in the set.
        got: usize,
    },
}

impl CalibrateError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalibrateError::Grid(e) => e.kind(),
            CalibrateError::InsufficientReferenceData { .. }
            | CalibrateError::NoCalibratableMonths { .. } => ErrorKind::InsufficientReferenceData,
            CalibrateError::InvalidTable { .. }
            | CalibrateError::NanQuantile
            | CalibrateError::NonFiniteValue { .. }
            | CalibrateError::NoMembers
            | CalibrateError::LengthMismatch { .. }
            | CalibrateError::InvalidMonth { .. } => ErrorKind::DataValidation,
            CalibrateError::InvalidConfig { .. }
            | CalibrateError::DistributionConstruction { .. } => ErrorKind::Configuration,
            CalibrateError::CellCountMismatch { .. } => ErrorKind::AxisMismatch,
        }
    }
}
