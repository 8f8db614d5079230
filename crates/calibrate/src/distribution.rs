//! Parametric reference distributions and their statrs bridges.

use statrs::distribution::{ContinuousCDF, Gamma, Normal};

use crate::error::CalibrateError;

/// Validated parameters for a Gamma distribution (shape/scale convention).
///
/// Both `shape` (k) and `scale` (theta) must be finite and positive.
/// Suited to non-negative, right-skewed quantities such as accumulations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaParams {
    shape: f64,
    scale: f64,
}

impl GammaParams {
    /// Creates gamma parameters after validating that both `shape` and
    /// `scale` are finite and strictly positive.
    pub fn new(shape: f64, scale: f64) -> Option<Self> {
        if shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0 {
            Some(Self { shape, scale })
        } else {
            None
        }
    }

    /// Method-of-moments estimate: `shape = mean² / var`, `scale = var / mean`.
    ///
    /// Returns `None` unless `mean` and `var` are finite and positive.
    pub fn from_moments(mean: f64, var: f64) -> Option<Self> {
        if !mean.is_finite() || mean <= 0.0 || !var.is_finite() || var <= 0.0 {
            return None;
        }
        Self::new((mean * mean) / var, var / mean)
    }

    /// Method-of-moments fit to the finite values of `sample`.
    ///
    /// Returns `None` for fewer than two finite values or a sample whose
    /// variance is effectively zero.
    pub fn from_sample(sample: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.len() < 2 {
            return None;
        }
        let var = zephyr_stats::variance(&finite);
        if var <= 1e-10 {
            return None;
        }
        Self::from_moments(zephyr_stats::mean(&finite), var)
    }

    /// Shape parameter (k).
    pub fn shape(&self) -> f64 {
        self.shape
    }

    /// Scale parameter (theta).
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Distribution mean (shape * scale).
    pub fn mean(&self) -> f64 {
        self.shape * self.scale
    }

    /// Distribution variance (shape * scale²).
    pub fn var(&self) -> f64 {
        self.shape * self.scale * self.scale
    }

    /// statrs parameterises Gamma by `(shape, rate)` with `rate = 1 / scale`.
    pub(crate) fn dist(&self) -> Result<Gamma, CalibrateError> {
        Gamma::new(self.shape, 1.0 / self.scale).map_err(|e| {
            CalibrateError::DistributionConstruction {
                distribution: "gamma",
                message: e.to_string(),
            }
        })
    }
}

/// A normal distribution truncated to `[lower, upper]`.
///
/// Either bound may be infinite. Suited to bounded quantities such as
/// temperature with a physical floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruncatedNormal {
    mean: f64,
    sd: f64,
    lower: f64,
    upper: f64,
}

impl TruncatedNormal {
    /// Creates a truncated normal.
    ///
    /// Returns `None` unless `mean` is finite, `sd` is finite and positive,
    /// `lower < upper`, and the interval holds non-negligible mass.
    pub fn new(mean: f64, sd: f64, lower: f64, upper: f64) -> Option<Self> {
        if !mean.is_finite() || !sd.is_finite() || sd <= 0.0 {
            return None;
        }
        if lower.is_nan() || upper.is_nan() || lower >= upper {
            return None;
        }
        let t = Self {
            mean,
            sd,
            lower,
            upper,
        };
        let (a, b) = t.bound_probabilities().ok()?;
        (b - a > 1e-12).then_some(t)
    }

    /// Untruncated normal with the given mean and standard deviation.
    pub fn untruncated(mean: f64, sd: f64) -> Option<Self> {
        Self::new(mean, sd, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Mean of the parent normal.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation of the parent normal.
    pub fn sd(&self) -> f64 {
        self.sd
    }

    /// Lower truncation bound.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper truncation bound.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    fn dist(&self) -> Result<Normal, CalibrateError> {
        Normal::new(self.mean, self.sd).map_err(|e| CalibrateError::DistributionConstruction {
            distribution: "normal",
            message: e.to_string(),
        })
    }

    /// Parent CDF at the two bounds.
    fn bound_probabilities(&self) -> Result<(f64, f64), CalibrateError> {
        let normal = self.dist()?;
        Ok((normal.cdf(self.lower), normal.cdf(self.upper)))
    }

    /// Inverse CDF of the truncated distribution.
    pub(crate) fn inverse_cdf(&self, p: f64) -> Result<f64, CalibrateError> {
        let normal = self.dist()?;
        let (a, b) = self.bound_probabilities()?;
        let x = normal.inverse_cdf(a + p * (b - a));
        Ok(x.clamp(self.lower, self.upper))
    }
}
