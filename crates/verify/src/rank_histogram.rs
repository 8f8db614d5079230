//! Rank histogram (Talagrand diagram) of an ensemble against observations.

use serde::Serialize;
use zephyr_grid::{AxisKind, GriddedField};

use crate::error::VerifyError;

/// Counts of the observation's rank among the ensemble members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankHistogram {
    /// `counts[r]` is the weight of columns where `r` members lay below the
    /// observation. Length is members + 1. Ties make counts fractional.
    pub counts: Vec<f64>,
    /// `counts` divided by `total`.
    pub relative_frequency: Vec<f64>,
    /// Number of columns scored.
    pub total: usize,
    /// Columns skipped because a member or the observation was masked.
    pub skipped: usize,
}

/// Builds the rank histogram of `forecast` (with a realization axis)
/// against `observation` (the forecast's axes minus realization).
///
/// When the observation equals `k` members exactly, its rank is spread
/// evenly over the `k + 1` ranks it could take.
pub(crate) fn rank_histogram(
    forecast: &GriddedField,
    observation: &GriddedField,
) -> Result<RankHistogram, VerifyError> {
    let stack = forecast.split_axis(AxisKind::Realization)?;
    if observation.axes() != stack.rest_axes() {
        let reduced = stack.reduce(
            forecast.name(),
            forecast.units(),
            vec![0.0; stack.n_columns()],
            vec![true; stack.n_columns()],
        )?;
        reduced
            .check_aligned(observation)
            .map_err(VerifyError::misaligned)?;
    }

    let n_members = stack.n_lead();
    let mut counts = vec![0.0; n_members + 1];
    let mut total = 0usize;
    let mut skipped = 0usize;
    let obs_values = observation.values();
    let obs_valid = observation.valid();

    'columns: for c in 0..stack.n_columns() {
        if !obs_valid[c] {
            skipped += 1;
            continue;
        }
        let o = obs_values[c];
        let mut below = 0usize;
        let mut equal = 0usize;
        for m in 0..n_members {
            let (v, ok) = stack.get(m, c);
            if !ok {
                skipped += 1;
                continue 'columns;
            }
            if v < o {
                below += 1;
            } else if v == o {
                equal += 1;
            }
        }
        let share = 1.0 / (equal + 1) as f64;
        for count in &mut counts[below..=below + equal] {
            *count += share;
        }
        total += 1;
    }

    if total == 0 {
        return Err(VerifyError::NoOverlap);
    }
    let relative_frequency = counts.iter().map(|c| c / total as f64).collect();
    Ok(RankHistogram {
        counts,
        relative_frequency,
        total,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use zephyr_grid::Axis;

    fn spatial(nx: usize) -> Vec<Axis> {
        vec![
            Axis::regular(AxisKind::Y, 0.0, 1.0, 1, "m").unwrap(),
            Axis::regular(AxisKind::X, 0.0, 1.0, nx, "m").unwrap(),
        ]
    }

    fn ensemble(members: usize, values: Vec<f64>, valid: Vec<bool>) -> GriddedField {
        let nx = values.len() / members;
        let mut axes = vec![Axis::realizations(members).unwrap()];
        axes.extend(spatial(nx));
        GriddedField::with_mask("t", "K", axes, values, valid).unwrap()
    }

    #[test]
    fn ranks_without_ties() {
        // Two members, three columns: obs below, between, above.
        let f = ensemble(2, vec![1.0, 1.0, 1.0, 3.0, 3.0, 3.0], vec![true; 6]);
        let o = GriddedField::new("t", "K", spatial(3), vec![0.0, 2.0, 4.0]).unwrap();
        let h = rank_histogram(&f, &o).unwrap();
        assert_eq!(h.counts, vec![1.0, 1.0, 1.0]);
        assert_eq!(h.total, 3);
        assert_relative_eq!(h.relative_frequency[0], 1.0 / 3.0);
    }

    #[test]
    fn ties_spread_evenly() {
        // Observation equals both members: ranks 0, 1, 2 each get 1/3.
        let f = ensemble(2, vec![5.0, 5.0], vec![true; 2]);
        let o = GriddedField::new("t", "K", spatial(1), vec![5.0]).unwrap();
        let h = rank_histogram(&f, &o).unwrap();
        for c in &h.counts {
            assert_relative_eq!(*c, 1.0 / 3.0);
        }
        assert_relative_eq!(h.counts.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn masked_columns_skipped() {
        let f = ensemble(2, vec![1.0, 1.0, 3.0, 3.0], vec![true, false, true, true]);
        let o = GriddedField::with_mask("t", "K", spatial(2), vec![2.0, 2.0], vec![true, true])
            .unwrap();
        let h = rank_histogram(&f, &o).unwrap();
        assert_eq!(h.total, 1);
        assert_eq!(h.skipped, 1);
    }

    #[test]
    fn observation_axes_must_match() {
        let f = ensemble(2, vec![1.0; 4], vec![true; 4]);
        let o = GriddedField::new("t", "K", spatial(3), vec![0.0; 3]).unwrap();
        assert!(matches!(
            rank_histogram(&f, &o),
            Err(VerifyError::Misaligned { .. })
        ));
    }
}
