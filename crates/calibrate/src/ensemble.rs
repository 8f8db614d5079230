//! Rank-based calibration of ensemble members.

use rayon::prelude::*;
use tracing::debug;
use zephyr_grid::{AxisKind, GriddedField};
use zephyr_stats::{average_rank, average_ranks};

use crate::config::CalibrationConfig;
use crate::error::CalibrateError;
use crate::plotting::PlottingPosition;
use crate::set::CalibrationSet;
use crate::table::{Calibrated, CalibrationTable};

/// Quantile of `value` within `members`.
///
/// The rank is `#less + (#equal + 1) / 2`, so members with equal values
/// share one quantile, then `plotting_position` maps the rank to `(0, 1)`.
///
/// # Errors
///
/// Fails when `members` is empty or `value` or any member is not finite.
pub fn ensemble_quantile(
    value: f64,
    members: &[f64],
    plotting_position: PlottingPosition,
) -> Result<f64, CalibrateError> {
    if members.is_empty() {
        return Err(CalibrateError::NoMembers);
    }
    if let Some(&bad) = std::iter::once(&value)
        .chain(members)
        .find(|v| !v.is_finite())
    {
        return Err(CalibrateError::NonFiniteValue { value: bad });
    }
    Ok(plotting_position.probability(average_rank(value, members), members.len()))
}

/// Calibrates `value` as a draw from the ensemble `members`.
///
/// The value's quantile within the ensemble is looked up in `table`.
pub fn calibrate(
    value: f64,
    members: &[f64],
    table: &CalibrationTable,
    config: &CalibrationConfig,
) -> Result<Calibrated, CalibrateError> {
    let q = ensemble_quantile(value, members, config.plotting_position())?;
    table.calibrate(q)
}

/// Calibrates every member of one ensemble.
///
/// Output is in member order. Larger members never map to smaller values.
pub fn calibrate_ensemble(
    members: &[f64],
    table: &CalibrationTable,
    config: &CalibrationConfig,
) -> Result<Vec<f64>, CalibrateError> {
    if members.is_empty() {
        return Err(CalibrateError::NoMembers);
    }
    if let Some(&value) = members.iter().find(|v| !v.is_finite()) {
        return Err(CalibrateError::NonFiniteValue { value });
    }
    let pp = config.plotting_position();
    average_ranks(members)
        .into_iter()
        .map(|rank| {
            table
                .calibrate(pp.probability(rank, members.len()))
                .map(|c| c.value)
        })
        .collect()
}

/// A calibrated field plus lookup diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedField {
    field: GriddedField,
    n_clamped: usize,
    n_short_columns: usize,
}

impl CalibratedField {
    /// The calibrated field, with the input's axes and masking.
    pub fn field(&self) -> &GriddedField {
        &self.field
    }

    /// Consumes the result, returning the field.
    pub fn into_field(self) -> GriddedField {
        self.field
    }

    /// Number of lookups whose quantile had to be clamped into `[0, 1]`.
    pub fn n_clamped(&self) -> usize {
        self.n_clamped
    }

    /// Number of columns masked for having fewer than
    /// [`CalibrationConfig::min_members`] valid members.
    pub fn n_short_columns(&self) -> usize {
        self.n_short_columns
    }
}

/// Calibrated values for one column, indexed by member.
struct Column {
    values: Vec<(usize, f64)>,
    n_clamped: usize,
    short: bool,
}

/// Calibrates every member of every `(other axes, y, x)` column of `field`.
///
/// Within a column only valid members are ranked; masked members stay
/// masked. The realization axis and every other axis keep their order.
///
/// # Errors
///
/// Fails for an invalid config, a field without a realization axis, or a
/// per-cell set that does not match the grid.
#[tracing::instrument(skip(field, set, config), fields(field = field.name()))]
pub fn calibrate_field(
    field: &GriddedField,
    set: &CalibrationSet,
    config: &CalibrationConfig,
) -> Result<CalibratedField, CalibrateError> {
    config.validate()?;
    let stack = field.split_axis(AxisKind::Realization)?;
    let plane_len = stack.plane_len();
    if let Some(got) = set.n_cells()
        && got != plane_len
    {
        return Err(CalibrateError::CellCountMismatch {
            expected: plane_len,
            got,
        });
    }

    let pp = config.plotting_position();
    let columns: Vec<Column> = (0..stack.n_columns())
        .into_par_iter()
        .map(|c| -> Result<Column, CalibrateError> {
            let (idx, members): (Vec<usize>, Vec<f64>) = (0..stack.n_lead())
                .filter_map(|m| {
                    let (v, ok) = stack.get(m, c);
                    ok.then_some((m, v))
                })
                .unzip();
            if members.len() < config.min_members() {
                return Ok(Column {
                    values: Vec::new(),
                    n_clamped: 0,
                    short: true,
                });
            }
            let table = set.table_for(c % plane_len);
            let mut n_clamped = 0;
            let mut values = Vec::with_capacity(members.len());
            for (m, rank) in idx.into_iter().zip(average_ranks(&members)) {
                let out = table.calibrate(pp.probability(rank, members.len()))?;
                n_clamped += usize::from(out.clamped);
                values.push((m, out.value));
            }
            Ok(Column {
                values,
                n_clamped,
                short: false,
            })
        })
        .collect::<Result<_, _>>()?;

    let n_columns = stack.n_columns();
    let mut values = vec![0.0; stack.n_lead() * n_columns];
    let mut valid = vec![false; values.len()];
    let mut n_clamped = 0;
    let mut n_short_columns = 0;
    for (c, column) in columns.into_iter().enumerate() {
        n_clamped += column.n_clamped;
        n_short_columns += usize::from(column.short);
        for (m, v) in column.values {
            values[m * n_columns + c] = v;
            valid[m * n_columns + c] = true;
        }
    }

    debug!(n_columns, n_clamped, n_short_columns, "ensemble field calibrated");
    let field = stack.restore(field.name(), field.units(), values, valid)?;
    Ok(CalibratedField {
        field,
        n_clamped,
        n_short_columns,
    })
}
