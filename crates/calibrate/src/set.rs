//! Calibration tables attached to a grid.

use std::sync::Arc;

use crate::table::CalibrationTable;

/// The tables used to calibrate a field: one for every cell, or one per
/// `(y, x)` cell in row-major order.
///
/// Tables are shared read-only across worker threads.
#[derive(Debug, Clone)]
pub enum CalibrationSet {
    /// One table for the whole grid.
    Shared(Arc<CalibrationTable>),
    /// One table per `(y, x)` cell, row-major.
    PerCell(Arc<[CalibrationTable]>),
}

impl CalibrationSet {
    /// A set using `table` everywhere.
    pub fn shared(table: CalibrationTable) -> Self {
        CalibrationSet::Shared(Arc::new(table))
    }

    /// A set with one table per `(y, x)` cell.
    pub fn per_cell(tables: Vec<CalibrationTable>) -> Self {
        CalibrationSet::PerCell(tables.into())
    }

    /// Number of cell tables, or `None` for a shared table.
    pub fn n_cells(&self) -> Option<usize> {
        match self {
            CalibrationSet::Shared(_) => None,
            CalibrationSet::PerCell(tables) => Some(tables.len()),
        }
    }

    /// Table for `(y, x)` cell `cell` (row-major index within a plane).
    ///
    /// # Panics
    ///
    /// Panics if a per-cell set has no table at `cell`.
    pub fn table_for(&self, cell: usize) -> &CalibrationTable {
        match self {
            CalibrationSet::Shared(table) => table.as_ref(),
            CalibrationSet::PerCell(tables) => &tables[cell],
        }
    }
}

impl From<CalibrationTable> for CalibrationSet {
    fn from(table: CalibrationTable) -> Self {
        CalibrationSet::shared(table)
    }
}
