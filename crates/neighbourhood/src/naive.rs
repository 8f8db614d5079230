//! Direct neighbourhood probability used as a reference for the fast path.

use zephyr_grid::{AxisKind, GriddedField, Threshold};

use crate::error::NeighbourhoodError;
use crate::kernel::Kernel;
use crate::probability::probability_name;

/// Neighbourhood probability by visiting every kernel cell of every point.
///
/// Costs `O(cells * members * r^2)`; intended for tests and small grids.
/// Produces the same result as
/// [`neighbourhood_probability`](crate::neighbourhood_probability).
pub fn brute_force_probability(
    field: &GriddedField,
    kernel: &Kernel,
    threshold: Threshold,
) -> Result<GriddedField, NeighbourhoodError> {
    let stack = field.split_axis(AxisKind::Realization)?;
    let footprint = kernel.footprint(field)?;
    let (ny, nx) = (field.n_y() as isize, field.n_x() as isize);
    let r = footprint.radius() as isize;

    let mut values = Vec::with_capacity(stack.n_columns());
    let mut valid = Vec::with_capacity(stack.n_columns());
    for p in 0..stack.n_planes() {
        for y in 0..ny {
            for x in 0..nx {
                let mut hits = 0usize;
                let mut total = 0usize;
                for dy in -r..=r {
                    for dx in -r..=r {
                        let (yy, xx) = (y + dy, x + dx);
                        if !footprint.contains(dy, dx) || yy < 0 || yy >= ny || xx < 0 || xx >= nx
                        {
                            continue;
                        }
                        let cell = (yy * nx + xx) as usize;
                        for m in 0..stack.n_lead() {
                            let (plane_values, plane_valid) = stack.plane(m, p);
                            if plane_valid[cell] {
                                total += 1;
                                if threshold.test(plane_values[cell]) {
                                    hits += 1;
                                }
                            }
                        }
                    }
                }
                if total > 0 {
                    values.push(hits as f64 / total as f64);
                    valid.push(true);
                } else {
                    values.push(0.0);
                    valid.push(false);
                }
            }
        }
    }

    Ok(stack.reduce(
        probability_name(field.name(), threshold.comparator()),
        "1",
        values,
        valid,
    )?)
}
