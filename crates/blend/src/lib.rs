//! Weighted blending of gridded fields.
//!
//! Combines fields from several sources (models, lead times, members) into
//! one field with per-source weights that may be scalar, vary over the
//! `(y, x)` grid, or vary per cell. Weights are renormalised at every cell
//! over the sources that are not masked there, so a missing source never
//! drags the blend towards zero.
//!
//! # Example
//!
//! ```
//! use zephyr_blend::{BlendKind, Weight, blend};
//! use zephyr_grid::{Axis, AxisKind, GriddedField};
//!
//! let axes = || {
//!     vec![
//!         Axis::regular(AxisKind::Y, 0.0, 1.0, 1, "m").unwrap(),
//!         Axis::regular(AxisKind::X, 0.0, 1.0, 2, "m").unwrap(),
//!     ]
//! };
//! let a = GriddedField::new("p", "1", axes(), vec![0.2, 0.8]).unwrap();
//! let b = GriddedField::new("p", "1", axes(), vec![0.6, 0.4]).unwrap();
//!
//! let out = blend(&[a, b], &[Weight::Scalar(1.0), Weight::Scalar(1.0)], BlendKind::Probability)
//!     .unwrap();
//! assert!((out.values()[0] - 0.4).abs() < 1e-12);
//! assert!((out.values()[1] - 0.6).abs() < 1e-12);
//! ```

mod blend;
mod error;
mod weights;

pub use blend::{BlendKind, blend, blend_along_axis};
pub use error::BlendError;
pub use weights::{LinearWeights, Weight};
