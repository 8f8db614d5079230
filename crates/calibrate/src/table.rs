//! Calibration tables: monotone maps from quantile to calibrated value.

use statrs::distribution::ContinuousCDF;
use tracing::warn;
use zephyr_stats::{interp_linear, quantile_type7};

use crate::distribution::{GammaParams, TruncatedNormal};
use crate::error::CalibrateError;

/// Probability clip applied to parametric tables so end points stay finite.
const END_PROBABILITY: f64 = 1e-6;

/// Result of one table lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibrated {
    /// Calibrated value.
    pub value: f64,
    /// Whether the input quantile lay outside `[0, 1]` and was clamped.
    pub clamped: bool,
}

/// A piecewise-linear inverse CDF over `[0, 1]`.
///
/// Quantiles are strictly increasing from exactly 0 to exactly 1 and values
/// are finite and non-decreasing, so lookups are monotone and defined for
/// every quantile.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    quantiles: Vec<f64>,
    values: Vec<f64>,
}

/// Evenly spaced probabilities `0, 1/(n-1), ..., 1`.
fn even_probabilities(n_points: usize) -> Result<Vec<f64>, CalibrateError> {
    if n_points < 2 {
        return Err(CalibrateError::InvalidConfig {
            reason: format!("n_points must be >= 2, got {n_points}"),
        });
    }
    let last = (n_points - 1) as f64;
    Ok((0..n_points).map(|i| i as f64 / last).collect())
}

impl CalibrationTable {
    /// Builds a table from `(quantile, value)` points.
    ///
    /// # Errors
    ///
    /// - [`CalibrateError::InsufficientReferenceData`] for fewer than two
    ///   distinct quantiles.
    /// - [`CalibrateError::InvalidTable`] for non-finite entries, quantiles
    ///   that are not strictly increasing from 0 to 1, or decreasing values.
    pub fn from_points(points: &[(f64, f64)]) -> Result<Self, CalibrateError> {
        if points.len() < 2 {
            return Err(CalibrateError::InsufficientReferenceData {
                reason: format!("a table needs at least 2 points, got {}", points.len()),
            });
        }
        if let Some(i) = points
            .iter()
            .position(|(q, v)| !q.is_finite() || !v.is_finite())
        {
            return Err(CalibrateError::InvalidTable {
                reason: format!("point {i} is not finite"),
            });
        }
        let (quantiles, values): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();

        let mut distinct = quantiles.clone();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(CalibrateError::InsufficientReferenceData {
                reason: format!(
                    "a table needs at least 2 distinct quantiles, got {}",
                    distinct.len()
                ),
            });
        }
        if quantiles[0] != 0.0 || quantiles[quantiles.len() - 1] != 1.0 {
            return Err(CalibrateError::InvalidTable {
                reason: format!(
                    "quantiles must span [0, 1], got [{}, {}]",
                    quantiles[0],
                    quantiles[quantiles.len() - 1]
                ),
            });
        }
        if let Some(i) = quantiles.windows(2).position(|w| w[1] <= w[0]) {
            return Err(CalibrateError::InvalidTable {
                reason: format!("quantiles must be strictly increasing at point {}", i + 1),
            });
        }
        if let Some(i) = values.windows(2).position(|w| w[1] < w[0]) {
            return Err(CalibrateError::InvalidTable {
                reason: format!("values must be non-decreasing at point {}", i + 1),
            });
        }
        Ok(Self { quantiles, values })
    }

    /// Empirical table from a climatological sample.
    ///
    /// Values are type-7 sample quantiles at `n_points` evenly spaced
    /// probabilities, so the table runs from the sample minimum to its
    /// maximum. Non-finite sample values are ignored.
    ///
    /// # Errors
    ///
    /// [`CalibrateError::InsufficientReferenceData`] when fewer than two
    /// finite values remain or all of them are equal.
    pub fn from_sample(reference: &[f64], n_points: usize) -> Result<Self, CalibrateError> {
        let probabilities = even_probabilities(n_points)?;
        let mut sorted: Vec<f64> = reference.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.len() < 2 {
            return Err(CalibrateError::InsufficientReferenceData {
                reason: format!("sample has {} finite values, need at least 2", sorted.len()),
            });
        }
        sorted.sort_by(f64::total_cmp);
        if sorted[0] == sorted[sorted.len() - 1] {
            return Err(CalibrateError::InsufficientReferenceData {
                reason: format!("sample is constant ({})", sorted[0]),
            });
        }
        let values = probabilities
            .iter()
            .map(|&p| quantile_type7(&sorted, p))
            .collect();
        Ok(Self {
            quantiles: probabilities,
            values,
        })
    }

    /// Table sampled from a Gamma inverse CDF at `n_points` quantiles.
    ///
    /// The end probabilities are clipped to `[1e-6, 1 - 1e-6]` before
    /// inversion; the table's quantile axis still runs from 0 to 1.
    pub fn from_gamma(params: GammaParams, n_points: usize) -> Result<Self, CalibrateError> {
        let dist = params.dist()?;
        Self::from_inverse_cdf(n_points, |p| Ok(dist.inverse_cdf(p)))
    }

    /// Table sampled from a truncated-normal inverse CDF; end probabilities
    /// are clipped as in [`CalibrationTable::from_gamma`].
    pub fn from_truncated_normal(
        dist: TruncatedNormal,
        n_points: usize,
    ) -> Result<Self, CalibrateError> {
        Self::from_inverse_cdf(n_points, |p| dist.inverse_cdf(p))
    }

    fn from_inverse_cdf(
        n_points: usize,
        inverse: impl Fn(f64) -> Result<f64, CalibrateError>,
    ) -> Result<Self, CalibrateError> {
        let quantiles = even_probabilities(n_points)?;
        let mut values = Vec::with_capacity(n_points);
        for &q in &quantiles {
            let v = inverse(q.clamp(END_PROBABILITY, 1.0 - END_PROBABILITY))?;
            if !v.is_finite() {
                return Err(CalibrateError::InvalidTable {
                    reason: format!("inverse cdf at {q} is not finite"),
                });
            }
            // Root-finding inverses can wobble by an ulp between close points.
            let floor = values.last().copied().unwrap_or(f64::NEG_INFINITY);
            values.push(v.max(floor));
        }
        Ok(Self { quantiles, values })
    }

    /// Quantile knots, from 0 to 1.
    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }

    /// Calibrated values at each knot.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.quantiles.len()
    }

    /// Always `false`: a table holds at least two knots.
    pub fn is_empty(&self) -> bool {
        self.quantiles.is_empty()
    }

    /// Smallest and largest calibrated value.
    pub fn value_range(&self) -> (f64, f64) {
        (self.values[0], self.values[self.values.len() - 1])
    }

    /// Looks up the calibrated value at quantile `q` by linear interpolation.
    ///
    /// A quantile outside `[0, 1]` is clamped, logged at warn level and
    /// flagged in the result.
    ///
    /// # Errors
    ///
    /// [`CalibrateError::NanQuantile`] when `q` is NaN.
    pub fn calibrate(&self, q: f64) -> Result<Calibrated, CalibrateError> {
        if q.is_nan() {
            return Err(CalibrateError::NanQuantile);
        }
        let clamped = !(0.0..=1.0).contains(&q);
        if clamped {
            warn!(quantile = q, "quantile outside [0, 1] clamped before lookup");
        }
        let value = interp_linear(q.clamp(0.0, 1.0), &self.quantiles, &self.values);
        Ok(Calibrated { value, clamped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use zephyr_grid::ErrorKind;

    fn linear() -> CalibrationTable {
        CalibrationTable::from_points(&[(0.0, 0.0), (0.5, 10.0), (1.0, 20.0)]).unwrap()
    }

    #[test]
    fn lookup_at_knot_and_between() {
        let t = linear();
        assert_eq!(t.calibrate(0.5).unwrap().value, 10.0);
        assert_relative_eq!(t.calibrate(0.75).unwrap().value, 15.0);
        assert!(!t.calibrate(0.75).unwrap().clamped);
    }

    #[test]
    fn out_of_range_quantile_is_clamped() {
        let t = linear();
        let lo = t.calibrate(-0.2).unwrap();
        assert_eq!(lo.value, 0.0);
        assert!(lo.clamped);
        let hi = t.calibrate(f64::INFINITY).unwrap();
        assert_eq!(hi.value, 20.0);
        assert!(hi.clamped);
    }

    #[test]
    fn nan_quantile_is_rejected() {
        let err = linear().calibrate(f64::NAN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataValidation);
    }

    #[test]
    fn single_point_is_insufficient() {
        let err = CalibrationTable::from_points(&[(0.0, 1.0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientReferenceData);
    }

    #[test]
    fn repeated_quantile_is_insufficient() {
        let err = CalibrationTable::from_points(&[(0.5, 1.0), (0.5, 2.0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientReferenceData);
        let err = CalibrationTable::from_points(&[(1.0, 1.0), (1.0, 1.0), (1.0, 3.0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientReferenceData);
    }

    #[test]
    fn malformed_points_rejected() {
        for points in [
            vec![(0.0, 0.0), (0.5, 1.0)],
            vec![(0.1, 0.0), (1.0, 1.0)],
            vec![(0.0, 0.0), (0.5, 1.0), (0.5, 2.0), (1.0, 3.0)],
            vec![(0.0, 5.0), (0.5, 4.0), (1.0, 6.0)],
            vec![(0.0, f64::NAN), (1.0, 1.0)],
        ] {
            assert!(
                matches!(
                    CalibrationTable::from_points(&points),
                    Err(CalibrateError::InvalidTable { .. })
                ),
                "{points:?}"
            );
        }
    }

    #[test]
    fn flat_segments_allowed() {
        let t = CalibrationTable::from_points(&[(0.0, 0.0), (0.3, 0.0), (1.0, 4.0)]).unwrap();
        assert_eq!(t.calibrate(0.2).unwrap().value, 0.0);
    }

    #[test]
    fn from_sample_spans_min_to_max() {
        let sample = [3.0, 1.0, 2.0, 5.0, 4.0, f64::NAN];
        let t = CalibrationTable::from_sample(&sample, 5).unwrap();
        assert_eq!(t.quantiles(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(t.values(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn from_sample_degenerate() {
        for sample in [vec![], vec![1.0], vec![2.0, 2.0, 2.0]] {
            let err = CalibrationTable::from_sample(&sample, 5).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InsufficientReferenceData);
        }
        assert!(matches!(
            CalibrationTable::from_sample(&[1.0, 2.0], 1),
            Err(CalibrateError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn gamma_table_is_monotone_and_finite() {
        let t = CalibrationTable::from_gamma(GammaParams::new(0.8, 4.0).unwrap(), 51).unwrap();
        assert_eq!(t.len(), 51);
        assert!(t.values().windows(2).all(|w| w[1] >= w[0]));
        let (lo, hi) = t.value_range();
        assert!(lo >= 0.0 && hi.is_finite());
    }

    #[test]
    fn truncated_normal_table_median() {
        let dist = TruncatedNormal::untruncated(10.0, 2.0).unwrap();
        let t = CalibrationTable::from_truncated_normal(dist, 21).unwrap();
        assert_relative_eq!(t.calibrate(0.5).unwrap().value, 10.0, epsilon = 1e-9);
    }
}
