//! Source weights and weight curves.

use ndarray::{Array2, ArrayD};
use zephyr_grid::GriddedField;
use zephyr_stats::interp_linear;

use crate::error::BlendError;

/// Weight of one blend source.
#[derive(Debug, Clone, PartialEq)]
pub enum Weight {
    /// The same weight everywhere.
    Scalar(f64),
    /// One weight per `(y, x)` cell, repeated over all other axes.
    Spatial(Array2<f64>),
    /// One weight per cell, same shape as the fields.
    Cellwise(ArrayD<f64>),
}

/// A weight flattened to row-major order and checked against a field.
#[derive(Debug, Clone)]
pub(crate) enum ResolvedWeight {
    Scalar(f64),
    Plane(Vec<f64>),
    Full(Vec<f64>),
}

impl ResolvedWeight {
    /// Weight at flat cell index `i` of a field with `plane_len` cells per
    /// `(y, x)` plane.
    #[inline]
    pub(crate) fn at(&self, i: usize, plane_len: usize) -> f64 {
        match self {
            ResolvedWeight::Scalar(w) => *w,
            ResolvedWeight::Plane(w) => w[i % plane_len],
            ResolvedWeight::Full(w) => w[i],
        }
    }
}

impl Weight {
    /// Checks entries and shape against `field`, flattening the weight.
    pub(crate) fn resolve(
        &self,
        field: &GriddedField,
        source_index: usize,
    ) -> Result<ResolvedWeight, BlendError> {
        let (shape, entries): (Vec<usize>, Vec<f64>) = match self {
            Weight::Scalar(w) => (Vec::new(), vec![*w]),
            Weight::Spatial(w) => (w.shape().to_vec(), w.iter().copied().collect()),
            Weight::Cellwise(w) => (w.shape().to_vec(), w.iter().copied().collect()),
        };
        if let Some(&value) = entries.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(BlendError::InvalidWeight {
                source_index,
                value,
            });
        }
        let expected = match self {
            Weight::Scalar(_) => return Ok(ResolvedWeight::Scalar(entries[0])),
            Weight::Spatial(_) => vec![field.n_y(), field.n_x()],
            Weight::Cellwise(_) => field.shape().to_vec(),
        };
        if shape != expected {
            return Err(BlendError::WeightShapeMismatch {
                source_index,
                expected,
                got: shape,
            });
        }
        Ok(match self {
            Weight::Spatial(_) => ResolvedWeight::Plane(entries),
            _ => ResolvedWeight::Full(entries),
        })
    }
}

impl From<f64> for Weight {
    fn from(w: f64) -> Self {
        Weight::Scalar(w)
    }
}

/// A piecewise-linear weight curve over a coordinate such as lead time.
///
/// Between knots the weight is interpolated linearly; outside them the
/// nearest knot's weight is used.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearWeights {
    coords: Vec<f64>,
    weights: Vec<f64>,
}

impl LinearWeights {
    /// Builds a curve from `(coordinate, weight)` knots.
    ///
    /// # Errors
    ///
    /// Knots must be non-empty, coordinates finite and strictly increasing,
    /// and weights finite and non-negative.
    pub fn new(knots: &[(f64, f64)]) -> Result<Self, BlendError> {
        if knots.is_empty() {
            return Err(BlendError::InvalidKnots {
                reason: "at least one knot is required".to_string(),
            });
        }
        let (coords, weights): (Vec<f64>, Vec<f64>) = knots.iter().copied().unzip();
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(BlendError::InvalidKnots {
                reason: "knot coordinates must be finite".to_string(),
            });
        }
        if let Some(i) = coords.windows(2).position(|w| w[1] <= w[0]) {
            return Err(BlendError::InvalidKnots {
                reason: format!("knot coordinates must be strictly increasing at knot {}", i + 1),
            });
        }
        if let Some(&w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(BlendError::InvalidKnots {
                reason: format!("knot weights must be finite and >= 0, got {w}"),
            });
        }
        Ok(Self { coords, weights })
    }

    /// Weight at coordinate `x`.
    pub fn weight_at(&self, x: f64) -> f64 {
        interp_linear(x, &self.coords, &self.weights)
    }

    /// Scalar weights at each of `coords`.
    pub fn weights_for(&self, coords: &[f64]) -> Vec<Weight> {
        coords
            .iter()
            .map(|&x| Weight::Scalar(self.weight_at(x)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::IxDyn;
    use zephyr_grid::{Axis, AxisKind};

    fn field() -> GriddedField {
        let axes = vec![
            Axis::regular(AxisKind::Time, 0.0, 1.0, 2, "h").unwrap(),
            Axis::regular(AxisKind::Y, 0.0, 1.0, 2, "m").unwrap(),
            Axis::regular(AxisKind::X, 0.0, 1.0, 3, "m").unwrap(),
        ];
        GriddedField::new("p", "1", axes, vec![0.0; 12]).unwrap()
    }

    #[test]
    fn spatial_weight_repeats_over_planes() {
        let w = Weight::Spatial(Array2::from_shape_fn((2, 3), |(y, x)| (y * 3 + x) as f64));
        let r = w.resolve(&field(), 0).unwrap();
        assert_eq!(r.at(4, 6), 4.0);
        assert_eq!(r.at(10, 6), 4.0);
    }

    #[test]
    fn cellwise_weight_needs_full_shape() {
        let w = Weight::Cellwise(ArrayD::from_elem(IxDyn(&[2, 3]), 1.0));
        assert!(matches!(
            w.resolve(&field(), 1),
            Err(BlendError::WeightShapeMismatch { source_index: 1, .. })
        ));
        let w = Weight::Cellwise(ArrayD::from_elem(IxDyn(&[2, 2, 3]), 1.0));
        assert_eq!(w.resolve(&field(), 1).unwrap().at(11, 6), 1.0);
    }

    #[test]
    fn negative_and_nan_weights_rejected() {
        for bad in [-0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Weight::Scalar(bad).resolve(&field(), 2),
                Err(BlendError::InvalidWeight { source_index: 2, .. })
            ));
        }
    }

    #[test]
    fn linear_weights_interpolate_and_hold_ends() {
        let lw = LinearWeights::new(&[(0.0, 1.0), (6.0, 0.0)]).unwrap();
        assert_relative_eq!(lw.weight_at(3.0), 0.5);
        assert_relative_eq!(lw.weight_at(-5.0), 1.0);
        assert_relative_eq!(lw.weight_at(12.0), 0.0);
        assert_eq!(
            lw.weights_for(&[0.0, 3.0]),
            vec![Weight::Scalar(1.0), Weight::Scalar(0.5)]
        );
    }

    #[test]
    fn linear_weights_validation() {
        assert!(LinearWeights::new(&[]).is_err());
        assert!(LinearWeights::new(&[(1.0, 1.0), (1.0, 2.0)]).is_err());
        assert!(LinearWeights::new(&[(0.0, -1.0)]).is_err());
    }
}
