//! Quantile calibration of ensemble forecasts.
//!
//! Each ensemble member is ranked within its ensemble, the rank is turned
//! into a quantile with a configurable [`PlottingPosition`], and the
//! quantile is looked up in a [`CalibrationTable`]: a monotone inverse CDF
//! built from explicit points, a climatological sample, or a parametric
//! distribution (Gamma or truncated normal via `statrs`).
//!
//! Because ranks and tables are both monotone, a larger member never maps
//! to a smaller calibrated value.
//!
//! # Example
//!
//! ```
//! use zephyr_calibrate::{CalibrationConfig, CalibrationTable, calibrate};
//!
//! let table = CalibrationTable::from_points(&[(0.0, 0.0), (0.5, 10.0), (1.0, 20.0)]).unwrap();
//! assert_eq!(table.calibrate(0.75).unwrap().value, 15.0);
//!
//! // The middle of three members sits at quantile 2 / 4 = 0.5.
//! let c = calibrate(4.0, &[1.0, 4.0, 7.0], &table, &CalibrationConfig::new()).unwrap();
//! assert_eq!(c.value, 10.0);
//! ```

mod config;
mod distribution;
mod ensemble;
mod error;
mod monthly;
mod plotting;
mod set;
mod table;

pub use config::CalibrationConfig;
pub use distribution::{GammaParams, TruncatedNormal};
pub use ensemble::{
    CalibratedField, calibrate, calibrate_ensemble, calibrate_field, ensemble_quantile,
};
pub use error::CalibrateError;
pub use monthly::{MonthlyTables, build_monthly};
pub use plotting::PlottingPosition;
pub use set::CalibrationSet;
pub use table::{Calibrated, CalibrationTable};
