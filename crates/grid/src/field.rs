//! Gridded fields with a parallel validity mask.

use ndarray::{ArrayViewD, IxDyn};

use crate::axis::{Axis, AxisKind};
use crate::error::GridError;

/// An n-dimensional field over named axes, ending in `y` then `x`.
///
/// Values are stored row-major. Each value has a validity bit; a cleared
/// bit marks missing data and the stored value is normalised to `0.0` so it
/// can never leak into arithmetic. Every valid value is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    name: String,
    units: String,
    axes: Vec<Axis>,
    shape: Vec<usize>,
    values: Vec<f64>,
    valid: Vec<bool>,
}

/// Checks axis uniqueness and the trailing `y`, `x` convention, returning
/// the implied shape.
fn validate_axes(axes: &[Axis]) -> Result<Vec<usize>, GridError> {
    for (i, a) in axes.iter().enumerate() {
        if axes[..i].iter().any(|b| b.kind() == a.kind()) {
            return Err(GridError::DuplicateAxis { kind: a.kind() });
        }
    }
    let kinds: Vec<AxisKind> = axes.iter().map(Axis::kind).collect();
    if kinds.len() < 2 || kinds[kinds.len() - 2..] != [AxisKind::Y, AxisKind::X] {
        return Err(GridError::SpatialAxesNotLast { found: kinds });
    }
    Ok(axes.iter().map(Axis::len).collect())
}

/// Reorders a row-major array so that axis `order[i]` becomes axis `i`.
fn permute<T: Copy>(values: &[T], shape: &[usize], order: &[usize]) -> Result<Vec<T>, GridError> {
    let view = ArrayViewD::from_shape(IxDyn(shape), values).map_err(|_| {
        GridError::ShapeMismatch {
            what: "values".to_string(),
            expected: shape.to_vec(),
            got: vec![values.len()],
        }
    })?;
    Ok(view.permuted_axes(IxDyn(order)).iter().copied().collect())
}

impl GriddedField {
    /// Creates a field where every cell is valid.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        axes: Vec<Axis>,
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        let valid = vec![true; values.len()];
        Self::with_mask(name, units, axes, values, valid)
    }

    /// Creates a field with an explicit validity mask (`true` = present).
    ///
    /// # Errors
    ///
    /// Fails when the axes are malformed, when `values` or `valid` do not
    /// match the axis lengths, or when a valid cell is not finite.
    pub fn with_mask(
        name: impl Into<String>,
        units: impl Into<String>,
        axes: Vec<Axis>,
        mut values: Vec<f64>,
        valid: Vec<bool>,
    ) -> Result<Self, GridError> {
        let shape = validate_axes(&axes)?;
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(GridError::ShapeMismatch {
                what: "values".to_string(),
                expected: shape,
                got: vec![values.len()],
            });
        }
        if valid.len() != expected {
            return Err(GridError::ShapeMismatch {
                what: "mask".to_string(),
                expected: shape,
                got: vec![valid.len()],
            });
        }

        for (index, (v, &ok)) in values.iter_mut().zip(&valid).enumerate() {
            if !ok {
                *v = 0.0;
            } else if !v.is_finite() {
                return Err(GridError::NonFiniteValue { index, value: *v });
            }
        }

        Ok(Self {
            name: name.into(),
            units: units.into(),
            axes,
            shape,
            values,
            valid,
        })
    }

    /// Creates a field treating NaN cells as missing.
    ///
    /// Infinite values are still rejected: only NaN carries the meaning of
    /// "no data" in upstream encodings.
    pub fn from_nan_masked(
        name: impl Into<String>,
        units: impl Into<String>,
        axes: Vec<Axis>,
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        let valid = values.iter().map(|v| !v.is_nan()).collect();
        Self::with_mask(name, units, axes, values, valid)
    }

    /// Returns a copy of this field's metadata holding new data.
    pub fn with_values(&self, values: Vec<f64>, valid: Vec<bool>) -> Result<Self, GridError> {
        Self::with_mask(
            self.name.clone(),
            self.units.clone(),
            self.axes.clone(),
            values,
            valid,
        )
    }

    /// Returns the field renamed.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the field with a new unit string.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    // --- Accessors ---

    /// Returns the variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unit of the values.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Returns the axes in storage order.
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Returns the array shape (one length per axis).
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns all values row-major; masked cells read as `0.0`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the validity mask row-major.
    pub fn valid(&self) -> &[bool] {
        &self.valid
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; fields have at least one cell.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of valid cells.
    pub fn n_valid(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// Number of rows.
    pub fn n_y(&self) -> usize {
        self.shape[self.shape.len() - 2]
    }

    /// Number of columns.
    pub fn n_x(&self) -> usize {
        self.shape[self.shape.len() - 1]
    }

    /// Number of cells in one `(y, x)` plane.
    pub fn plane_len(&self) -> usize {
        self.n_y() * self.n_x()
    }

    /// Number of `(y, x)` planes.
    pub fn n_planes(&self) -> usize {
        self.values.len() / self.plane_len()
    }

    /// Iterates over `(values, valid)` of each `(y, x)` plane.
    pub fn planes(&self) -> impl Iterator<Item = (&[f64], &[bool])> {
        let n = self.plane_len();
        self.values.chunks(n).zip(self.valid.chunks(n))
    }

    /// Position of the axis of `kind`, if present.
    pub fn axis_index(&self, kind: AxisKind) -> Option<usize> {
        self.axes.iter().position(|a| a.kind() == kind)
    }

    /// The axis of `kind`, if present.
    pub fn axis(&self, kind: AxisKind) -> Option<&Axis> {
        self.axes.iter().find(|a| a.kind() == kind)
    }

    /// Position of the axis of `kind`, or [`GridError::MissingAxis`].
    pub fn require_axis(&self, kind: AxisKind) -> Result<usize, GridError> {
        self.axis_index(kind).ok_or(GridError::MissingAxis { kind })
    }

    /// Row-major flat index of a multi-index, or `None` when out of bounds.
    pub fn flat_index(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (&i, &n) in index.iter().zip(&self.shape) {
            if i >= n {
                return None;
            }
            flat = flat * n + i;
        }
        Some(flat)
    }

    /// Multi-index of a row-major flat index.
    pub fn unravel_index(&self, mut flat: usize) -> Vec<usize> {
        let mut index = vec![0; self.shape.len()];
        for (slot, &n) in index.iter_mut().zip(&self.shape).rev() {
            *slot = flat % n;
            flat /= n;
        }
        index
    }

    /// Value at a multi-index; `None` when masked or out of bounds.
    pub fn value_at(&self, index: &[usize]) -> Option<f64> {
        let flat = self.flat_index(index)?;
        self.valid[flat].then_some(self.values[flat])
    }

    /// Whether the cell at a multi-index is valid.
    pub fn is_valid_at(&self, index: &[usize]) -> bool {
        self.flat_index(index).is_some_and(|flat| self.valid[flat])
    }

    /// Uniform `(dy, dx)` grid spacing in the spatial axis units.
    pub fn grid_spacing(&self) -> Result<(f64, f64), GridError> {
        let n = self.axes.len();
        Ok((self.axes[n - 2].spacing()?, self.axes[n - 1].spacing()?))
    }

    /// Fails unless `other` has identical axes (kinds, order, coordinates).
    ///
    /// Never broadcasts: every axis must match exactly.
    pub fn check_aligned(&self, other: &GriddedField) -> Result<(), GridError> {
        if self.axes.len() != other.axes.len() {
            return Err(GridError::AxisMismatch {
                reason: format!(
                    "'{}' has {} axes, '{}' has {}",
                    self.name,
                    self.axes.len(),
                    other.name,
                    other.axes.len()
                ),
            });
        }
        for (a, b) in self.axes.iter().zip(&other.axes) {
            if let Some(diff) = a.difference(b) {
                return Err(GridError::AxisMismatch {
                    reason: format!("'{}' vs '{}': {diff}", self.name, other.name),
                });
            }
        }
        Ok(())
    }

    /// Fails if any valid value lies outside `[0, 1]`.
    pub fn check_probabilities(&self) -> Result<(), GridError> {
        let bad = self
            .values
            .iter()
            .zip(&self.valid)
            .position(|(&v, &ok)| ok && !(0.0..=1.0).contains(&v));
        match bad {
            Some(index) => Err(GridError::ProbabilityOutOfRange {
                index,
                value: self.values[index],
            }),
            None => Ok(()),
        }
    }

    /// Moves the axis of `kind` to the front and flattens the rest into
    /// `(y, x)` planes.
    ///
    /// The axis must not be spatial.
    pub fn split_axis(&self, kind: AxisKind) -> Result<AxisStack, GridError> {
        if matches!(kind, AxisKind::Y | AxisKind::X) {
            return Err(GridError::SpatialAxesNotLast {
                found: vec![kind],
            });
        }
        let lead = self.require_axis(kind)?;
        let mut order = Vec::with_capacity(self.axes.len());
        order.push(lead);
        order.extend((0..self.axes.len()).filter(|&i| i != lead));

        let values = permute(&self.values, &self.shape, &order)?;
        let valid = permute(&self.valid, &self.shape, &order)?;
        let rest: Vec<Axis> = order[1..].iter().map(|&i| self.axes[i].clone()).collect();

        let n_lead = self.shape[lead];
        let plane_len = self.plane_len();
        Ok(AxisStack {
            axis: self.axes[lead].clone(),
            rest,
            n_planes: self.values.len() / n_lead / plane_len,
            plane_len,
            values,
            valid,
            order,
        })
    }
}

/// A field rearranged as `(lead, plane, y·x)` with one axis split off.
///
/// Produced by [`GriddedField::split_axis`]; stages read members or lead
/// times as contiguous planes and rebuild output with
/// [`AxisStack::reduce`] or [`AxisStack::restore`].
#[derive(Debug, Clone)]
pub struct AxisStack {
    axis: Axis,
    rest: Vec<Axis>,
    n_planes: usize,
    plane_len: usize,
    values: Vec<f64>,
    valid: Vec<bool>,
    order: Vec<usize>,
}

impl AxisStack {
    /// The axis that was split off.
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Remaining axes in their original relative order.
    pub fn rest_axes(&self) -> &[Axis] {
        &self.rest
    }

    /// Length of the split axis.
    pub fn n_lead(&self) -> usize {
        self.axis.len()
    }

    /// Number of `(y, x)` planes per lead index.
    pub fn n_planes(&self) -> usize {
        self.n_planes
    }

    /// Number of cells per plane.
    pub fn plane_len(&self) -> usize {
        self.plane_len
    }

    /// Number of `(lead)` columns: one per cell of the reduced field.
    pub fn n_columns(&self) -> usize {
        self.n_planes * self.plane_len
    }

    /// Values and mask of plane `plane` at lead index `lead`.
    pub fn plane(&self, lead: usize, plane: usize) -> (&[f64], &[bool]) {
        let start = (lead * self.n_planes + plane) * self.plane_len;
        let end = start + self.plane_len;
        (&self.values[start..end], &self.valid[start..end])
    }

    /// Value and validity of reduced-field cell `column` at lead `lead`.
    #[inline]
    pub fn get(&self, lead: usize, column: usize) -> (f64, bool) {
        let i = lead * self.n_columns() + column;
        (self.values[i], self.valid[i])
    }

    /// Builds a field over the remaining axes from one value per column.
    pub fn reduce(
        &self,
        name: impl Into<String>,
        units: impl Into<String>,
        values: Vec<f64>,
        valid: Vec<bool>,
    ) -> Result<GriddedField, GridError> {
        GriddedField::with_mask(name, units, self.rest.clone(), values, valid)
    }

    /// Builds a field with the original axis order from data laid out in
    /// stacked `(lead, column)` order.
    pub fn restore(
        &self,
        name: impl Into<String>,
        units: impl Into<String>,
        values: Vec<f64>,
        valid: Vec<bool>,
    ) -> Result<GriddedField, GridError> {
        let stacked_shape: Vec<usize> = std::iter::once(self.axis.len())
            .chain(self.rest.iter().map(Axis::len))
            .collect();
        let mut inverse = vec![0; self.order.len()];
        for (i, &o) in self.order.iter().enumerate() {
            inverse[o] = i;
        }
        let values = permute(&values, &stacked_shape, &inverse)?;
        let valid = permute(&valid, &stacked_shape, &inverse)?;

        let mut axes = vec![self.axis.clone(); self.order.len()];
        for (i, &o) in self.order.iter().enumerate().skip(1) {
            axes[o] = self.rest[i - 1].clone();
        }
        GriddedField::with_mask(name, units, axes, values, valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(ny: usize, nx: usize) -> Vec<Axis> {
        vec![
            Axis::regular(AxisKind::Y, 0.0, 1.0, ny, "m").unwrap(),
            Axis::regular(AxisKind::X, 0.0, 1.0, nx, "m").unwrap(),
        ]
    }

    #[test]
    fn masked_values_normalised() {
        let f = GriddedField::with_mask(
            "t",
            "K",
            axes(1, 3),
            vec![1.0, f64::NAN, 3.0],
            vec![true, false, true],
        )
        .unwrap();
        assert_eq!(f.values(), &[1.0, 0.0, 3.0]);
        assert_eq!(f.n_valid(), 2);
        assert_eq!(f.value_at(&[0, 1]), None);
        assert_eq!(f.value_at(&[0, 2]), Some(3.0));
    }

    #[test]
    fn unmasked_nan_rejected() {
        let e = GriddedField::new("t", "K", axes(1, 2), vec![1.0, f64::NAN]).unwrap_err();
        assert!(matches!(e, GridError::NonFiniteValue { index: 1, .. }));
    }

    #[test]
    fn nan_masked_constructor() {
        let f =
            GriddedField::from_nan_masked("t", "K", axes(1, 2), vec![f64::NAN, 2.0]).unwrap();
        assert_eq!(f.valid(), &[false, true]);
        assert!(
            GriddedField::from_nan_masked("t", "K", axes(1, 2), vec![f64::INFINITY, 2.0])
                .is_err()
        );
    }

    #[test]
    fn spatial_axes_must_be_last() {
        let mut a = axes(2, 2);
        a.push(Axis::realizations(2).unwrap());
        let e = GriddedField::new("t", "K", a, vec![0.0; 8]).unwrap_err();
        assert!(matches!(e, GridError::SpatialAxesNotLast { .. }));
    }

    #[test]
    fn duplicate_axis_rejected() {
        let mut a = vec![Axis::realizations(1).unwrap(), Axis::realizations(1).unwrap()];
        a.extend(axes(1, 1));
        let e = GriddedField::new("t", "K", a, vec![0.0]).unwrap_err();
        assert!(matches!(
            e,
            GridError::DuplicateAxis {
                kind: AxisKind::Realization
            }
        ));
    }

    #[test]
    fn shape_mismatch_rejected() {
        let e = GriddedField::new("t", "K", axes(2, 2), vec![0.0; 3]).unwrap_err();
        assert!(matches!(e, GridError::ShapeMismatch { .. }));
    }

    #[test]
    fn flat_index_round_trip() {
        let mut a = vec![Axis::realizations(2).unwrap()];
        a.extend(axes(3, 4));
        let f = GriddedField::new("t", "K", a, vec![0.0; 24]).unwrap();
        for flat in 0..24 {
            let idx = f.unravel_index(flat);
            assert_eq!(f.flat_index(&idx), Some(flat));
        }
        assert_eq!(f.flat_index(&[2, 0, 0]), None);
    }

    #[test]
    fn split_and_restore_middle_axis() {
        // time(2) x realization(3) x y(1) x x(2)
        let mut a = vec![
            Axis::new(AxisKind::Time, vec![0.0, 3600.0], "s").unwrap(),
            Axis::realizations(3).unwrap(),
        ];
        a.extend(axes(1, 2));
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let f = GriddedField::new("t", "K", a, values.clone()).unwrap();

        let stack = f.split_axis(AxisKind::Realization).unwrap();
        assert_eq!(stack.n_lead(), 3);
        assert_eq!(stack.n_planes(), 2);
        assert_eq!(stack.rest_axes()[0].kind(), AxisKind::Time);
        // member 1, time 1 -> original [1, 1, 0, :] = 8, 9
        assert_eq!(stack.plane(1, 1).0, &[8.0, 9.0]);
        assert_eq!(stack.get(2, 1), (5.0, true));

        let (v, m): (Vec<f64>, Vec<bool>) = (0..stack.n_lead())
            .flat_map(|l| (0..stack.n_columns()).map(move |c| (l, c)))
            .map(|(l, c)| stack.get(l, c))
            .unzip();
        let back = stack.restore("t", "K", v, m).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn split_spatial_axis_rejected() {
        let f = GriddedField::new("t", "K", axes(1, 1), vec![0.0]).unwrap();
        assert!(f.split_axis(AxisKind::Y).is_err());
        assert!(matches!(
            f.split_axis(AxisKind::Time),
            Err(GridError::MissingAxis {
                kind: AxisKind::Time
            })
        ));
    }

    #[test]
    fn probabilities_checked() {
        let f = GriddedField::new("p", "1", axes(1, 2), vec![0.5, 1.2]).unwrap();
        assert!(matches!(
            f.check_probabilities(),
            Err(GridError::ProbabilityOutOfRange { index: 1, .. })
        ));
    }
}
