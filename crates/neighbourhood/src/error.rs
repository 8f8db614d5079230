//! Error types for the zephyr-neighbourhood crate.

use zephyr_grid::{ErrorKind, GridError};

/// Error type for all fallible operations in the zephyr-neighbourhood crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeighbourhoodError {
    /// Returned when the input field is malformed or lacks a required axis.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Returned when a kernel radius is zero, negative, or not finite.
    #[error("kernel radius must be finite and positive, got {radius}")]
    InvalidRadius {
        /// The rejected radius.
        radius: f64,
    },

    /// Returned when the kernel would smooth over more than half the grid.
    #[error(
        "kernel radius of {radius} cells exceeds half the smaller grid dimension ({ny} x {nx})"
    )]
    RadiusTooLarge {
        /// Radius in grid cells.
        radius: usize,
        /// Number of rows.
        ny: usize,
        /// Number of columns.
        nx: usize,
    },

    /// Returned when a distance radius is used on a grid with unequal spacing.
    #[error("distance radius needs equal y and x spacing, got dy={dy}, dx={dx}")]
    AnisotropicGrid {
        /// Row spacing.
        dy: f64,
        /// Column spacing.
        dx: f64,
    },

    /// Returned when no thresholds are supplied.
    #[error("at least one threshold is required")]
    NoThresholds,

    /// Returned when multiple thresholds are not strictly monotonic.
    #[error("threshold values must be strictly monotonic, got {values:?}")]
    NonMonotonicThresholds {
        /// The supplied threshold values.
        values: Vec<f64>,
    },

    /// Returned when a chunked computation is asked for empty chunks.
    #[error("chunk_rows must be >= 1, got {chunk_rows}")]
    InvalidChunkRows {
        /// The rejected chunk size.
        chunk_rows: usize,
    },
}

impl NeighbourhoodError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NeighbourhoodError::Grid(e) => e.kind(),
            _ => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_radius_too_large() {
        let e = NeighbourhoodError::RadiusTooLarge {
            radius: 4,
            ny: 5,
            nx: 7,
        };
        assert_eq!(
            e.to_string(),
            "kernel radius of 4 cells exceeds half the smaller grid dimension (5 x 7)"
        );
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn error_grid_kind_passes_through() {
        let e: NeighbourhoodError = GridError::NonFiniteValue {
            index: 0,
            value: f64::NAN,
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::DataValidation);
        assert_eq!(e.to_string(), "unmasked non-finite value NaN at flat index 0");
    }

    #[test]
    fn error_invalid_radius() {
        let e = NeighbourhoodError::InvalidRadius { radius: -2.0 };
        assert_eq!(
            e.to_string(),
            "kernel radius must be finite and positive, got -2"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<NeighbourhoodError>();
    }
}
