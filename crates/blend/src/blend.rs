//! Weighted combination of aligned fields.

use rayon::prelude::*;
use tracing::debug;
use zephyr_grid::{AxisKind, GriddedField};

use crate::error::BlendError;
use crate::weights::{ResolvedWeight, Weight};

/// What the blended quantity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendKind {
    /// Probabilities: inputs must lie in `[0, 1]`; output is clamped to it.
    #[default]
    Probability,
    /// Any physical quantity.
    Value,
}

/// Outcome of combining the sources at one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CellMean {
    /// Every source is masked here.
    Masked,
    Mean(f64),
    /// Some source is valid but the valid weights sum to zero.
    ZeroWeights,
}

/// Weighted mean of the valid `(value, weight)` pairs at one cell.
///
/// Weights are divided by the largest valid weight before summing, so
/// finite weights near `f64::MAX` do not overflow the sum.
fn weighted_mean(
    pairs: impl Iterator<Item = (f64, bool, f64)> + Clone,
    kind: BlendKind,
) -> CellMean {
    let Some(max_weight) = pairs
        .clone()
        .filter(|&(_, ok, _)| ok)
        .map(|(_, _, w)| w)
        .reduce(f64::max)
    else {
        return CellMean::Masked;
    };
    if max_weight <= 0.0 {
        return CellMean::ZeroWeights;
    }
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (v, ok, w) in pairs {
        if ok {
            let w = w / max_weight;
            total += w * v;
            weight_sum += w;
        }
    }
    let mean = total / weight_sum;
    CellMean::Mean(match kind {
        BlendKind::Probability => mean.clamp(0.0, 1.0),
        BlendKind::Value => mean,
    })
}

/// Blends aligned fields cell by cell.
///
/// At every cell the masked sources are dropped and the remaining weights
/// are renormalised to sum to one. A cell where every source is masked is
/// masked in the output. Name and units come from the first field.
///
/// # Errors
///
/// - Fewer than two sources, or a weight count that differs from the
///   source count: [`BlendError::TooFewSources`],
///   [`BlendError::WeightCountMismatch`].
/// - Fields with differing axes: [`BlendError::Grid`] wrapping the axis
///   mismatch. Fields are never broadcast.
/// - Negative or non-finite weights: [`BlendError::InvalidWeight`]; weight
///   arrays of the wrong shape: [`BlendError::WeightShapeMismatch`].
/// - Unmasked sources whose weights all vanish at some cell:
///   [`BlendError::ZeroWeightSum`] names the cell.
/// - For [`BlendKind::Probability`], any valid input outside `[0, 1]`.
#[tracing::instrument(skip(fields, weights), fields(n_sources = fields.len()))]
pub fn blend(
    fields: &[GriddedField],
    weights: &[Weight],
    kind: BlendKind,
) -> Result<GriddedField, BlendError> {
    if fields.len() < 2 {
        return Err(BlendError::TooFewSources {
            n_sources: fields.len(),
        });
    }
    if weights.len() != fields.len() {
        return Err(BlendError::WeightCountMismatch {
            expected: fields.len(),
            got: weights.len(),
        });
    }
    let first = &fields[0];
    for field in &fields[1..] {
        first.check_aligned(field)?;
    }
    if kind == BlendKind::Probability {
        for field in fields {
            field.check_probabilities()?;
        }
    }
    let resolved: Vec<ResolvedWeight> = weights
        .iter()
        .enumerate()
        .map(|(i, w)| w.resolve(first, i))
        .collect::<Result<_, _>>()?;

    let plane_len = first.plane_len();
    let cells: Vec<Option<f64>> = (0..first.len())
        .into_par_iter()
        .map(|i| {
            let pairs = fields
                .iter()
                .zip(&resolved)
                .map(|(f, w)| (f.values()[i], f.valid()[i], w.at(i, plane_len)));
            match weighted_mean(pairs, kind) {
                CellMean::Masked => Ok(None),
                CellMean::Mean(m) => Ok(Some(m)),
                CellMean::ZeroWeights => Err(BlendError::ZeroWeightSum {
                    cell: first.unravel_index(i),
                }),
            }
        })
        .collect::<Result<_, _>>()?;

    let n_masked = cells.iter().filter(|c| c.is_none()).count();
    let (values, valid): (Vec<f64>, Vec<bool>) = cells
        .into_iter()
        .map(|c| (c.unwrap_or(0.0), c.is_some()))
        .unzip();
    debug!(n_cells = values.len(), n_masked, "fields blended");
    Ok(first.with_values(values, valid)?)
}

/// Collapses `axis` of `field` with one scalar weight per index.
///
/// Masking and renormalisation follow [`blend`]. The remaining axes keep
/// their order.
///
/// # Errors
///
/// Fails when `field` has no such axis or it is spatial, when the weight
/// count differs from the axis length, for invalid weights, and for
/// vanishing weight sums.
#[tracing::instrument(skip(field, weights), fields(field = field.name()))]
pub fn blend_along_axis(
    field: &GriddedField,
    axis: AxisKind,
    weights: &[f64],
    kind: BlendKind,
) -> Result<GriddedField, BlendError> {
    let stack = field.split_axis(axis)?;
    if weights.len() != stack.n_lead() {
        return Err(BlendError::WeightCountMismatch {
            expected: stack.n_lead(),
            got: weights.len(),
        });
    }
    if let Some((source_index, &value)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(BlendError::InvalidWeight {
            source_index,
            value,
        });
    }
    if kind == BlendKind::Probability {
        field.check_probabilities()?;
    }

    let reduced_shape: Vec<usize> = stack.rest_axes().iter().map(|a| a.len()).collect();
    let cells: Vec<Option<f64>> = (0..stack.n_columns())
        .into_par_iter()
        .map(|c| {
            let pairs = weights.iter().enumerate().map(|(m, &w)| {
                let (v, ok) = stack.get(m, c);
                (v, ok, w)
            });
            match weighted_mean(pairs, kind) {
                CellMean::Masked => Ok(None),
                CellMean::Mean(m) => Ok(Some(m)),
                CellMean::ZeroWeights => Err(BlendError::ZeroWeightSum {
                    cell: unravel(c, &reduced_shape),
                }),
            }
        })
        .collect::<Result<_, _>>()?;

    let (values, valid): (Vec<f64>, Vec<bool>) = cells
        .into_iter()
        .map(|c| (c.unwrap_or(0.0), c.is_some()))
        .unzip();
    debug!(axis = %axis, n_weights = weights.len(), "axis blended");
    Ok(stack.reduce(field.name(), field.units(), values, valid)?)
}

fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (slot, &len) in index.iter_mut().zip(shape).rev() {
        *slot = flat % len;
        flat /= len;
    }
    index
}
