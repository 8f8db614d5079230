//! Month-by-month calibration tables from a dated reference archive.

use std::sync::Arc;

use tracing::debug;

use crate::error::CalibrateError;
use crate::table::CalibrationTable;

/// One optional empirical table per calendar month.
#[derive(Debug, Clone)]
pub struct MonthlyTables {
    tables: [Option<Arc<CalibrationTable>>; 12],
    skipped_months: Vec<u8>,
    n_degenerate: usize,
}

impl MonthlyTables {
    /// Returns the table for a 1-indexed calendar month, if one was built.
    ///
    /// # Panics
    ///
    /// Panics if `month` is 0 or greater than 12.
    pub fn table_for_month(&self, month: u8) -> Option<Arc<CalibrationTable>> {
        assert!(
            (1..=12).contains(&month),
            "month must be in 1..=12, got {month}"
        );
        self.tables[(month - 1) as usize].clone()
    }

    /// Returns 1-indexed months that have a table.
    pub fn built_months(&self) -> Vec<u8> {
        self.tables
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_ref().map(|_| (i + 1) as u8))
            .collect()
    }

    /// Returns the 1-indexed months without a table.
    pub fn skipped_months(&self) -> &[u8] {
        &self.skipped_months
    }

    /// Returns the number of months with enough samples that were still
    /// rejected because every sample was equal.
    pub fn n_degenerate(&self) -> usize {
        self.n_degenerate
    }
}

/// Builds one empirical table per calendar month.
///
/// `values[i]` was observed in month `months[i]` (1..=12). Non-finite
/// values are ignored. Months with fewer than `min_samples` finite values,
/// or whose values are all equal, are skipped and recorded.
///
/// # Errors
///
/// Fails on mismatched slice lengths, a month outside 1..=12, or when no
/// month produced a table.
pub fn build_monthly(
    values: &[f64],
    months: &[u8],
    n_points: usize,
    min_samples: usize,
) -> Result<MonthlyTables, CalibrateError> {
    if values.len() != months.len() {
        return Err(CalibrateError::LengthMismatch {
            values_len: values.len(),
            months_len: months.len(),
        });
    }
    if let Some(&month) = months.iter().find(|m| !(1..=12).contains(*m)) {
        return Err(CalibrateError::InvalidMonth { month });
    }

    let mut tables: [Option<Arc<CalibrationTable>>; 12] = Default::default();
    let mut skipped_months = Vec::new();
    let mut n_degenerate = 0usize;

    for m in 1u8..=12 {
        let sample: Vec<f64> = values
            .iter()
            .zip(months)
            .filter(|&(v, &mo)| mo == m && v.is_finite())
            .map(|(&v, _)| v)
            .collect();

        if sample.len() < min_samples.max(2) {
            skipped_months.push(m);
            continue;
        }
        match CalibrationTable::from_sample(&sample, n_points) {
            Ok(table) => tables[(m - 1) as usize] = Some(Arc::new(table)),
            Err(CalibrateError::InsufficientReferenceData { .. }) => {
                n_degenerate += 1;
                skipped_months.push(m);
            }
            Err(e) => return Err(e),
        }
    }

    if tables.iter().all(Option::is_none) {
        return Err(CalibrateError::NoCalibratableMonths { skipped_months });
    }
    debug!(
        skipped = ?skipped_months,
        n_degenerate,
        "monthly calibration tables built"
    );
    Ok(MonthlyTables {
        tables,
        skipped_months,
        n_degenerate,
    })
}
