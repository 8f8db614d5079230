//! Configuration for ensemble calibration.

use crate::error::CalibrateError;
use crate::plotting::PlottingPosition;

/// Configuration for mapping ensemble members through a calibration table.
///
/// # Example
///
/// ```
/// use zephyr_calibrate::{CalibrationConfig, PlottingPosition};
///
/// let config = CalibrationConfig::new()
///     .with_plotting_position(PlottingPosition::Hazen)
///     .with_min_members(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationConfig {
    plotting_position: PlottingPosition,
    min_members: usize,
}

impl CalibrationConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `plotting_position = Weibull`, `min_members = 1`.
    pub fn new() -> Self {
        Self {
            plotting_position: PlottingPosition::Weibull,
            min_members: 1,
        }
    }

    /// Sets the rank-to-quantile formula.
    pub fn with_plotting_position(mut self, p: PlottingPosition) -> Self {
        self.plotting_position = p;
        self
    }

    /// Sets the number of valid members a column needs to be calibrated.
    /// Columns with fewer valid members are masked.
    pub fn with_min_members(mut self, n: usize) -> Self {
        self.min_members = n;
        self
    }

    /// Returns the rank-to-quantile formula.
    pub fn plotting_position(&self) -> PlottingPosition {
        self.plotting_position
    }

    /// Returns the minimum number of valid members per column.
    pub fn min_members(&self) -> usize {
        self.min_members
    }

    /// Validates this configuration.
    ///
    /// Checks that `min_members` is at least 1.
    pub fn validate(&self) -> Result<(), CalibrateError> {
        if self.min_members < 1 {
            return Err(CalibrateError::InvalidConfig {
                reason: format!("min_members must be >= 1, got {}", self.min_members),
            });
        }
        Ok(())
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = CalibrationConfig::default();
        assert_eq!(c.plotting_position(), PlottingPosition::Weibull);
        assert_eq!(c.min_members(), 1);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_min_members_rejected() {
        let err = CalibrationConfig::new()
            .with_min_members(0)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: min_members must be >= 1, got 0"
        );
    }
}
