//! Neighbourhood exceedance probabilities and neighbourhood smoothing.

use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;
use zephyr_grid::{Axis, AxisKind, AxisStack, Comparator, GriddedField, Threshold};

use crate::error::NeighbourhoodError;
use crate::kernel::{Kernel, KernelFootprint};
use crate::window::window_sums;

/// Output variable name, e.g. `probability_of_rainfall_rate_above_threshold`.
pub(crate) fn probability_name(name: &str, comparator: Comparator) -> String {
    let side = match comparator {
        Comparator::GreaterThan | Comparator::GreaterEqual => "above",
        Comparator::LessThan | Comparator::LessEqual => "below",
    };
    format!("probability_of_{name}_{side}_threshold")
}

/// Per-cell sums over all realizations of one plane, restricted to `rows`:
/// the number of valid members satisfying `threshold` and the number of
/// valid members.
pub(crate) fn member_sums(
    stack: &AxisStack,
    plane: usize,
    rows: Range<usize>,
    nx: usize,
    threshold: &Threshold,
) -> (Vec<f64>, Vec<f64>) {
    let cells = rows.start * nx..rows.end * nx;
    let n = cells.len();
    let mut hits = vec![0.0; n];
    let mut counts = vec![0.0; n];
    for member in 0..stack.n_lead() {
        let (values, valid) = stack.plane(member, plane);
        let values = &values[cells.clone()];
        let valid = &valid[cells.clone()];
        for c in 0..n {
            if valid[c] {
                counts[c] += 1.0;
                if threshold.test(values[c]) {
                    hits[c] += 1.0;
                }
            }
        }
    }
    (hits, counts)
}

/// Divides window sums; cells whose footprint held no valid data are masked.
pub(crate) fn ratio(num: &[f64], den: &[f64]) -> (Vec<f64>, Vec<bool>) {
    num.iter()
        .zip(den)
        .map(|(&n, &d)| {
            if d > 0.0 {
                ((n / d).clamp(0.0, 1.0), true)
            } else {
                (0.0, false)
            }
        })
        .unzip()
}

fn validate_thresholds(thresholds: &[Threshold]) -> Result<(), NeighbourhoodError> {
    if thresholds.is_empty() {
        return Err(NeighbourhoodError::NoThresholds);
    }
    let values: Vec<f64> = thresholds.iter().map(Threshold::value).collect();
    let increasing = values.windows(2).all(|w| w[1] > w[0]);
    let decreasing = values.windows(2).all(|w| w[1] < w[0]);
    if !increasing && !decreasing {
        return Err(NeighbourhoodError::NonMonotonicThresholds { values });
    }
    Ok(())
}

/// Probability planes for every threshold of one realization-stacked plane.
fn plane_probabilities(
    stack: &AxisStack,
    plane: usize,
    ny: usize,
    nx: usize,
    footprint: &KernelFootprint,
    thresholds: &[Threshold],
) -> Vec<(Vec<f64>, Vec<bool>)> {
    let mut counts_sum: Option<Vec<f64>> = None;
    thresholds
        .iter()
        .map(|threshold| {
            let (hits, counts) = member_sums(stack, plane, 0..ny, nx, threshold);
            let den = counts_sum.get_or_insert_with(|| window_sums(&counts, ny, nx, footprint));
            let num = window_sums(&hits, ny, nx, footprint);
            ratio(&num, den)
        })
        .collect()
}

/// Neighbourhood probability of exceeding `threshold`.
///
/// For every output cell, the result is the fraction of valid
/// (member, in-kernel cell) pairs whose value satisfies `threshold`. The
/// realization axis is collapsed; all other axes are kept in order.
///
/// Kernels are clipped at the grid edge, so cells near the boundary use
/// fewer samples. Masked cells count in neither numerator nor
/// denominator; a footprint with no valid cell gives a masked result.
///
/// # Errors
///
/// Fails when the field has no realization axis, or the kernel cannot be
/// resolved on this grid (see [`Kernel::footprint`]).
#[tracing::instrument(skip(field, kernel), fields(field = field.name()))]
pub fn neighbourhood_probability(
    field: &GriddedField,
    kernel: &Kernel,
    threshold: Threshold,
) -> Result<GriddedField, NeighbourhoodError> {
    let stack = field.split_axis(AxisKind::Realization)?;
    let footprint = kernel.footprint(field)?;
    let (ny, nx) = (field.n_y(), field.n_x());

    let planes: Vec<(Vec<f64>, Vec<bool>)> = (0..stack.n_planes())
        .into_par_iter()
        .map(|p| {
            let mut per_threshold =
                plane_probabilities(&stack, p, ny, nx, &footprint, &[threshold]);
            per_threshold.swap_remove(0)
        })
        .collect();

    let (values, valid): (Vec<f64>, Vec<bool>) = planes
        .into_iter()
        .flat_map(|(v, m)| v.into_iter().zip(m))
        .unzip();

    debug!(
        n_planes = stack.n_planes(),
        radius = footprint.radius(),
        members = stack.n_lead(),
        "neighbourhood probability computed"
    );
    Ok(stack.reduce(
        probability_name(field.name(), threshold.comparator()),
        "1",
        values,
        valid,
    )?)
}

/// Neighbourhood probabilities for several thresholds at once.
///
/// The output gains a leading threshold axis whose points are the
/// threshold values, in the order given. The comparator of the first
/// threshold names the output.
///
/// # Errors
///
/// Fails on an empty or non-monotonic threshold list, and for the same
/// reasons as [`neighbourhood_probability`].
#[tracing::instrument(skip(field, kernel, thresholds), fields(field = field.name(), n_thresholds = thresholds.len()))]
pub fn neighbourhood_probabilities(
    field: &GriddedField,
    kernel: &Kernel,
    thresholds: &[Threshold],
) -> Result<GriddedField, NeighbourhoodError> {
    validate_thresholds(thresholds)?;
    let stack = field.split_axis(AxisKind::Realization)?;
    let footprint = kernel.footprint(field)?;
    let (ny, nx) = (field.n_y(), field.n_x());

    let per_plane: Vec<Vec<(Vec<f64>, Vec<bool>)>> = (0..stack.n_planes())
        .into_par_iter()
        .map(|p| plane_probabilities(&stack, p, ny, nx, &footprint, thresholds))
        .collect();

    // Reorder (plane, threshold) into threshold-major layout.
    let total = thresholds.len() * stack.n_columns();
    let mut values = Vec::with_capacity(total);
    let mut valid = Vec::with_capacity(total);
    for t in 0..thresholds.len() {
        for plane in &per_plane {
            values.extend_from_slice(&plane[t].0);
            valid.extend_from_slice(&plane[t].1);
        }
    }

    let threshold_axis = Axis::new(
        AxisKind::Threshold,
        thresholds.iter().map(Threshold::value).collect(),
        field.units(),
    )?;
    let mut axes = vec![threshold_axis];
    axes.extend(stack.rest_axes().iter().cloned());

    debug!(
        n_planes = stack.n_planes(),
        radius = footprint.radius(),
        "neighbourhood probabilities computed"
    );
    Ok(GriddedField::with_mask(
        probability_name(field.name(), thresholds[0].comparator()),
        "1",
        axes,
        values,
        valid,
    )?)
}

/// Same result as [`neighbourhood_probability`], computed in bands of
/// `chunk_rows` rows.
///
/// Each band is processed with a halo of `r` rows on either side, which is
/// exactly the reach of the kernel, so the result does not depend on
/// `chunk_rows`. Peak working memory scales with the band height rather
/// than the grid height.
#[tracing::instrument(skip(field, kernel), fields(field = field.name()))]
pub fn neighbourhood_probability_chunked(
    field: &GriddedField,
    kernel: &Kernel,
    threshold: Threshold,
    chunk_rows: usize,
) -> Result<GriddedField, NeighbourhoodError> {
    if chunk_rows == 0 {
        return Err(NeighbourhoodError::InvalidChunkRows { chunk_rows });
    }
    let stack = field.split_axis(AxisKind::Realization)?;
    let footprint = kernel.footprint(field)?;
    let (ny, nx) = (field.n_y(), field.n_x());
    let r = footprint.radius();

    let tasks: Vec<(usize, usize, usize)> = (0..stack.n_planes())
        .flat_map(|p| {
            (0..ny)
                .step_by(chunk_rows)
                .map(move |y0| (p, y0, (y0 + chunk_rows).min(ny)))
        })
        .collect();

    let pieces: Vec<(Vec<f64>, Vec<bool>)> = tasks
        .par_iter()
        .map(|&(p, y0, y1)| {
            let h0 = y0.saturating_sub(r);
            let h1 = (y1 + r).min(ny);
            let rows = h1 - h0;
            let (hits, counts) = member_sums(&stack, p, h0..h1, nx, &threshold);
            let num = window_sums(&hits, rows, nx, &footprint);
            let den = window_sums(&counts, rows, nx, &footprint);
            let keep = (y0 - h0) * nx..(y1 - h0) * nx;
            ratio(&num[keep.clone()], &den[keep])
        })
        .collect();

    let (values, valid): (Vec<f64>, Vec<bool>) = pieces
        .into_iter()
        .flat_map(|(v, m)| v.into_iter().zip(m))
        .unzip();

    debug!(
        n_tasks = tasks.len(),
        chunk_rows,
        radius = r,
        "chunked neighbourhood probability computed"
    );
    Ok(stack.reduce(
        probability_name(field.name(), threshold.comparator()),
        "1",
        values,
        valid,
    )?)
}

/// Neighbourhood mean of an existing probability field.
///
/// Every `(y, x)` plane is smoothed independently with the same edge and
/// masking rules as [`neighbourhood_probability`]. All axes are kept.
///
/// # Errors
///
/// Fails when a valid value lies outside `[0, 1]` or the kernel cannot be
/// resolved on this grid.
#[tracing::instrument(skip(field, kernel), fields(field = field.name()))]
pub fn smooth_probabilities(
    field: &GriddedField,
    kernel: &Kernel,
) -> Result<GriddedField, NeighbourhoodError> {
    field.check_probabilities()?;
    let footprint = kernel.footprint(field)?;
    let (ny, nx) = (field.n_y(), field.n_x());

    let planes: Vec<(Vec<f64>, Vec<bool>)> = field
        .planes()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(values, valid)| {
            let weighted: Vec<f64> = values
                .iter()
                .zip(valid)
                .map(|(&v, &ok)| if ok { v } else { 0.0 })
                .collect();
            let counts: Vec<f64> = valid.iter().map(|&ok| f64::from(u8::from(ok))).collect();
            let num = window_sums(&weighted, ny, nx, &footprint);
            let den = window_sums(&counts, ny, nx, &footprint);
            ratio(&num, &den)
        })
        .collect();

    let (values, valid): (Vec<f64>, Vec<bool>) = planes
        .into_iter()
        .flat_map(|(v, m)| v.into_iter().zip(m))
        .unzip();

    debug!(radius = footprint.radius(), "probabilities smoothed");
    Ok(field.with_values(values, valid)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ensemble(members: usize, ny: usize, nx: usize, values: Vec<f64>) -> GriddedField {
        let axes = vec![
            Axis::realizations(members).unwrap(),
            Axis::regular(AxisKind::Y, 0.0, 1.0, ny, "m").unwrap(),
            Axis::regular(AxisKind::X, 0.0, 1.0, nx, "m").unwrap(),
        ];
        GriddedField::new("rain", "mm", axes, values).unwrap()
    }

    #[test]
    fn output_name_and_units() {
        let f = ensemble(1, 3, 3, vec![0.0; 9]);
        let out = neighbourhood_probability(
            &f,
            &Kernel::square(1).unwrap(),
            Threshold::above(0.5).unwrap(),
        )
        .unwrap();
        assert_eq!(out.name(), "probability_of_rain_above_threshold");
        assert_eq!(out.units(), "1");
        assert_eq!(out.shape(), &[3, 3]);
    }

    #[test]
    fn single_member_single_wet_cell() {
        let mut values = vec![0.0; 9];
        values[4] = 2.0;
        let f = ensemble(1, 3, 3, values);
        let out = neighbourhood_probability(
            &f,
            &Kernel::square(1).unwrap(),
            Threshold::above(1.0).unwrap(),
        )
        .unwrap();
        // Corner cell sees 2x2 = 4 cells, one wet.
        assert_relative_eq!(out.values()[0], 0.25);
        // Edge cell sees 2x3 = 6.
        assert_relative_eq!(out.values()[1], 1.0 / 6.0);
        assert_relative_eq!(out.values()[4], 1.0 / 9.0);
    }

    #[test]
    fn all_masked_footprint_is_masked() {
        let axes = vec![
            Axis::realizations(1).unwrap(),
            Axis::regular(AxisKind::Y, 0.0, 1.0, 2, "m").unwrap(),
            Axis::regular(AxisKind::X, 0.0, 1.0, 6, "m").unwrap(),
        ];
        let valid = vec![
            false, false, false, true, true, true, //
            false, false, false, true, true, true,
        ];
        let f = GriddedField::with_mask("rain", "mm", axes, vec![1.0; 12], valid).unwrap();
        let out = neighbourhood_probability(
            &f,
            &Kernel::square(1).unwrap(),
            Threshold::above(0.0).unwrap(),
        )
        .unwrap();
        assert!(!out.valid()[0]);
        assert!(!out.valid()[1]);
        // Column 2 reaches column 3, which is valid.
        assert!(out.valid()[2]);
        assert_relative_eq!(out.values()[2], 1.0);
    }

    #[test]
    fn thresholds_must_be_monotonic() {
        let f = ensemble(1, 3, 3, vec![0.0; 9]);
        let ts = [
            Threshold::above(1.0).unwrap(),
            Threshold::above(3.0).unwrap(),
            Threshold::above(2.0).unwrap(),
        ];
        assert!(matches!(
            neighbourhood_probabilities(&f, &Kernel::square(1).unwrap(), &ts),
            Err(NeighbourhoodError::NonMonotonicThresholds { .. })
        ));
        assert!(matches!(
            neighbourhood_probabilities(&f, &Kernel::square(1).unwrap(), &[]),
            Err(NeighbourhoodError::NoThresholds)
        ));
    }

    #[test]
    fn multi_threshold_layout() {
        let values: Vec<f64> = (0..9).map(|i| i as f64).collect();
        let f = ensemble(1, 3, 3, values);
        let ts = [Threshold::above(2.5).unwrap(), Threshold::above(6.5).unwrap()];
        let k = Kernel::square(1).unwrap();
        let out = neighbourhood_probabilities(&f, &k, &ts).unwrap();
        assert_eq!(out.shape(), &[2, 3, 3]);
        assert_eq!(out.axes()[0].kind(), AxisKind::Threshold);
        assert_eq!(out.axes()[0].points(), &[2.5, 6.5]);

        for (t, threshold) in ts.iter().enumerate() {
            let single = neighbourhood_probability(&f, &k, *threshold).unwrap();
            assert_eq!(&out.values()[t * 9..(t + 1) * 9], single.values());
        }
    }

    #[test]
    fn chunk_rows_zero_rejected() {
        let f = ensemble(1, 3, 3, vec![0.0; 9]);
        assert!(matches!(
            neighbourhood_probability_chunked(
                &f,
                &Kernel::square(1).unwrap(),
                Threshold::above(0.0).unwrap(),
                0
            ),
            Err(NeighbourhoodError::InvalidChunkRows { chunk_rows: 0 })
        ));
    }

    #[test]
    fn smoothing_constant_field_is_identity() {
        let axes = vec![
            Axis::regular(AxisKind::Y, 0.0, 1.0, 4, "m").unwrap(),
            Axis::regular(AxisKind::X, 0.0, 1.0, 4, "m").unwrap(),
        ];
        let f = GriddedField::new("p", "1", axes, vec![0.3; 16]).unwrap();
        let out = smooth_probabilities(&f, &Kernel::circular(2).unwrap()).unwrap();
        for &v in out.values() {
            assert_relative_eq!(v, 0.3, epsilon = 1e-12);
        }
    }

    #[test]
    fn smoothing_rejects_non_probabilities() {
        let axes = vec![
            Axis::regular(AxisKind::Y, 0.0, 1.0, 2, "m").unwrap(),
            Axis::regular(AxisKind::X, 0.0, 1.0, 2, "m").unwrap(),
        ];
        let f = GriddedField::new("p", "1", axes, vec![0.3, 0.2, 1.5, 0.0]).unwrap();
        assert!(smooth_probabilities(&f, &Kernel::square(1).unwrap()).is_err());
    }
}
