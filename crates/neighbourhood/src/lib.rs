//! Neighbourhood processing for ensemble grids.
//!
//! Turns an ensemble of gridded forecasts into the probability that a
//! threshold is exceeded somewhere near each grid point. The probability
//! is the fraction of valid ensemble values, over all members and every
//! cell inside a circular or square kernel, that satisfy the threshold.
//!
//! # Algorithm
//!
//! Member indicator counts are summed first, then windowed:
//!
//! - **Square** kernels use a summed-area table (four lookups per point).
//! - **Circular** kernels use row prefix sums (one segment per kernel row).
//!
//! Counts are small integers held in `f64`, so the fast path agrees exactly
//! with [`brute_force_probability`]. Planes are processed in parallel with
//! rayon.
//!
//! # Example
//!
//! ```
//! use zephyr_grid::{Axis, AxisKind, GriddedField, Threshold};
//! use zephyr_neighbourhood::{Kernel, neighbourhood_probability};
//!
//! let axes = vec![
//!     Axis::realizations(1).unwrap(),
//!     Axis::regular(AxisKind::Y, 0.0, 2000.0, 3, "m").unwrap(),
//!     Axis::regular(AxisKind::X, 0.0, 2000.0, 3, "m").unwrap(),
//! ];
//! let mut values = vec![0.0; 9];
//! values[4] = 5.0;
//! let rain = GriddedField::new("rainfall_rate", "mm h-1", axes, values).unwrap();
//!
//! let p = neighbourhood_probability(
//!     &rain,
//!     &Kernel::square(1).unwrap(),
//!     Threshold::above(1.0).unwrap(),
//! )
//! .unwrap();
//! assert_eq!(p.shape(), &[3, 3]);
//! assert!((p.values()[4] - 1.0 / 9.0).abs() < 1e-12);
//! ```

mod error;
mod kernel;
mod naive;
mod probability;
mod window;

pub use error::NeighbourhoodError;
pub use kernel::{Kernel, KernelFootprint, KernelShape, Radius};
pub use naive::brute_force_probability;
pub use probability::{
    neighbourhood_probabilities, neighbourhood_probability, neighbourhood_probability_chunked,
    smooth_probabilities,
};
