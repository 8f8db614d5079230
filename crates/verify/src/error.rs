//! Verification error types.

use zephyr_grid::{ErrorKind, GridError};

/// Errors that can occur while scoring forecasts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerifyError {
    /// Returned when an input field is malformed or lacks a required axis.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Returned when forecast and observation grids differ.
    #[error("forecast and observation are not aligned: {reason}")]
    Misaligned {
        /// Description of the first difference found.
        reason: String,
    },

    /// Returned when a binary observation is neither 0 nor 1.
    #[error("binary observation must be 0 or 1, got {value} at flat index {index}")]
    NonBinaryObservation {
        /// Flat index of the offending cell.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when no cell is valid in both forecast and observation.
    #[error("forecast and observation have no valid cells in common")]
    NoOverlap,

    /// Returned when a probability score is given observations without a
    /// threshold or binary coding.
    #[error("probability scores need binary observations or a threshold")]
    NoEventDefinition,

    /// Returned when a reliability table is requested with zero bins.
    #[error("reliability needs at least 1 bin, got {bins}")]
    InvalidBins {
        /// The rejected bin count.
        bins: usize,
    },

    /// Returned when JSON serialization fails.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}

impl VerifyError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::Grid(e) => e.kind(),
            VerifyError::InvalidBins { .. } | VerifyError::NoEventDefinition => {
                ErrorKind::Configuration
            }
            _ => ErrorKind::DataValidation,
        }
    }

    /// Maps an axis mismatch onto [`VerifyError::Misaligned`].
    pub(crate) fn misaligned(e: GridError) -> Self {
        match e {
            GridError::AxisMismatch { reason } => VerifyError::Misaligned { reason },
            other => VerifyError::Grid(other),
        }
    }
}
