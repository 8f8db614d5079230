//! Error types for the zephyr-blend crate.

use zephyr_grid::{ErrorKind, GridError};

/// Error type for all fallible operations in the zephyr-blend crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlendError {
    /// Returned when an input field is malformed or fields are misaligned.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Returned when fewer than two sources are blended.
    #[error("blending needs at least 2 sources, got {n_sources}")]
    TooFewSources {
        /// Number of sources supplied.
        n_sources: usize,
    },

    /// Returned when the weight count differs from the source count.
    #[error("expected {expected} weights, got {got}")]
    WeightCountMismatch {
        /// Number of sources (or axis length).
        expected: usize,
        /// Number of weights supplied.
        got: usize,
    },

    /// Returned when a weight entry is negative or not finite.
    #[error("weight for source {source_index} must be finite and >= 0, got {value}")]
    InvalidWeight {
        /// Position of the source whose weight is bad.
        source_index: usize,
        /// The rejected entry.
        value: f64,
    },

    /// Returned when a spatial or cellwise weight does not match the grid.
    #[error("weight for source {source_index} has shape {got:?}, expected {expected:?}")]
    WeightShapeMismatch {
        /// Position of the source whose weight is bad.
        source_index: usize,
        /// Shape required by the fields.
        expected: Vec<usize>,
        /// Shape of the weight array.
        got: Vec<usize>,
    },

    /// Returned when every unmasked source at a cell has zero weight.
    #[error("weights of the unmasked sources sum to zero at cell {cell:?}")]
    ZeroWeightSum {
        /// Multi-index of the cell.
        cell: Vec<usize>,
    },

    /// Returned when linear weight knots are malformed.
    #[error("invalid weight knots: {reason}")]
    InvalidKnots {
        /// Description of the problem.
        reason: String,
    },
}

impl BlendError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BlendError::Grid(e) => e.kind(),
            BlendError::TooFewSources { .. }
            | BlendError::WeightCountMismatch { .. }
            | BlendError::InvalidKnots { .. } => ErrorKind::Configuration,
            BlendError::InvalidWeight { .. }
            | BlendError::WeightShapeMismatch { .. }
            | BlendError::ZeroWeightSum { .. } => ErrorKind::InvalidWeight,
        }
    }
}
