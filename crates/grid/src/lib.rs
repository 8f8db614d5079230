//! Gridded ensemble fields for the Zephyr post-processing engine.
//!
//! A [`GriddedField`] is a row-major array over named [`Axis`] values drawn
//! from {realization, time, threshold, y, x}. The spatial axes `y` and `x`
//! are always the last two, so every field is a stack of contiguous `(y, x)`
//! planes. Missing data is an explicit validity bit per cell, never a
//! sentinel value.
//!
//! # Quick Start
//!
//! ```
//! use zephyr_grid::{Axis, AxisKind, GriddedField, Threshold};
//!
//! let axes = vec![
//!     Axis::realizations(2).unwrap(),
//!     Axis::regular(AxisKind::Y, 0.0, 2000.0, 2, "m").unwrap(),
//!     Axis::regular(AxisKind::X, 0.0, 2000.0, 2, "m").unwrap(),
//! ];
//! let field = GriddedField::new(
//!     "precipitation_rate",
//!     "mm h-1",
//!     axes,
//!     vec![0.0, 1.5, 2.0, 0.1, 0.3, 0.0, 4.0, 1.1],
//! )
//! .unwrap();
//!
//! let wet = Threshold::above(1.0).unwrap();
//! assert_eq!(field.values().iter().filter(|&&v| wet.test(v)).count(), 4);
//! assert_eq!(field.grid_spacing().unwrap(), (2000.0, 2000.0));
//! ```

mod axis;
mod error;
mod field;
mod threshold;

pub use axis::{Axis, AxisKind};
pub use error::{ErrorKind, GridError};
pub use field::{AxisStack, GriddedField};
pub use threshold::{Comparator, Threshold};
