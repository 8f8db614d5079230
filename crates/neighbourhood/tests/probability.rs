//! Integration tests for neighbourhood probabilities.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zephyr_grid::{Axis, AxisKind, Comparator, ErrorKind, GriddedField, Threshold};
use zephyr_neighbourhood::{
    Kernel, KernelShape, NeighbourhoodError, Radius, brute_force_probability,
    neighbourhood_probabilities, neighbourhood_probability, neighbourhood_probability_chunked,
};

fn spatial(ny: usize, nx: usize, spacing: f64) -> Vec<Axis> {
    vec![
        Axis::regular(AxisKind::Y, 0.0, spacing, ny, "m").unwrap(),
        Axis::regular(AxisKind::X, 0.0, spacing, nx, "m").unwrap(),
    ]
}

/// Random ensemble of shape (time, realization, y, x) with ~10% masked cells.
fn random_ensemble(seed: u64, n_time: usize, members: usize, ny: usize, nx: usize) -> GriddedField {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = n_time * members * ny * nx;
    let values: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..10.0)).collect();
    let valid: Vec<bool> = (0..n).map(|_| rng.random::<f64>() > 0.1).collect();
    let mut axes = vec![
        Axis::regular(AxisKind::Time, 0.0, 3600.0, n_time, "s").unwrap(),
        Axis::realizations(members).unwrap(),
    ];
    axes.extend(spatial(ny, nx, 1000.0));
    GriddedField::with_mask("rainfall_rate", "mm h-1", axes, values, valid).unwrap()
}

/// 5x5 grid, three members all 1 except member 0 at the centre: the
/// centre 3x3 footprint holds 27 samples of which 26 exceed 0.5.
#[test]
fn hand_computed_centre_cell() {
    let members = 3;
    let mut values = vec![1.0; members * 25];
    values[12] = 0.0;
    let mut axes = vec![Axis::realizations(members).unwrap()];
    axes.extend(spatial(5, 5, 1.0));
    let field = GriddedField::new("rain", "mm", axes, values).unwrap();

    let p = neighbourhood_probability(
        &field,
        &Kernel::square(1).unwrap(),
        Threshold::above(0.5).unwrap(),
    )
    .unwrap();
    assert_eq!(p.values()[12], 26.0 / 27.0);
    // Corner (0, 0) footprint does not reach the centre.
    assert_eq!(p.values()[0], 1.0);
    // (1, 1) reaches the centre: 3 members x 9 cells, one miss.
    assert_eq!(p.values()[6], 26.0 / 27.0);
}

#[test]
fn fast_path_equals_brute_force() {
    let field = random_ensemble(7, 2, 4, 13, 17);
    for shape in [KernelShape::Square, KernelShape::Circular] {
        for r in 1..=4 {
            let kernel = Kernel::new(shape, Radius::Cells(r)).unwrap();
            for comparator in [Comparator::GreaterThan, Comparator::LessEqual] {
                let t = Threshold::new(4.2, comparator).unwrap();
                let fast = neighbourhood_probability(&field, &kernel, t).unwrap();
                let slow = brute_force_probability(&field, &kernel, t).unwrap();
                assert_eq!(fast.valid(), slow.valid(), "{shape:?} r={r}");
                assert_eq!(fast.values(), slow.values(), "{shape:?} r={r}");
            }
        }
    }
}

#[test]
fn realization_axis_is_collapsed() {
    let field = random_ensemble(1, 3, 5, 6, 8);
    let p = neighbourhood_probability(
        &field,
        &Kernel::circular(2).unwrap(),
        Threshold::above(5.0).unwrap(),
    )
    .unwrap();
    assert_eq!(p.shape(), &[3, 6, 8]);
    assert!(p.axis(AxisKind::Realization).is_none());
    assert_eq!(p.axes()[0].kind(), AxisKind::Time);
}

#[test]
fn probabilities_lie_in_unit_interval() {
    let field = random_ensemble(99, 1, 6, 20, 20);
    let p = neighbourhood_probability(
        &field,
        &Kernel::circular(3).unwrap(),
        Threshold::above(3.0).unwrap(),
    )
    .unwrap();
    for (&v, &ok) in p.values().iter().zip(p.valid()) {
        if ok {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}

#[test]
fn chunked_matches_unchunked() {
    let field = random_ensemble(3, 2, 3, 23, 11);
    let threshold = Threshold::above(6.0).unwrap();
    for kernel in [Kernel::square(2).unwrap(), Kernel::circular(3).unwrap()] {
        let whole = neighbourhood_probability(&field, &kernel, threshold).unwrap();
        for chunk_rows in [1, 2, 5, 8, 23, 100] {
            let chunked =
                neighbourhood_probability_chunked(&field, &kernel, threshold, chunk_rows).unwrap();
            assert_eq!(whole, chunked, "chunk_rows={chunk_rows}");
        }
    }
}

#[test]
fn distance_radius_resolves_with_grid_spacing() {
    let field = random_ensemble(5, 1, 2, 10, 10);
    let t = Threshold::above(5.0).unwrap();
    let by_distance = Kernel::new(KernelShape::Circular, Radius::Distance(2000.0)).unwrap();
    let by_cells = Kernel::circular(2).unwrap();
    assert_eq!(
        neighbourhood_probability(&field, &by_distance, t).unwrap(),
        neighbourhood_probability(&field, &by_cells, t).unwrap()
    );
}

#[test]
fn multi_threshold_probabilities_decrease_for_exceedance() {
    let field = random_ensemble(11, 1, 4, 9, 9);
    let ts: Vec<Threshold> = [2.0, 5.0, 8.0]
        .iter()
        .map(|&v| Threshold::above(v).unwrap())
        .collect();
    let p = neighbourhood_probabilities(&field, &Kernel::square(2).unwrap(), &ts).unwrap();
    assert_eq!(p.shape(), &[3, 9, 9]);
    assert_eq!(p.axes()[0].units(), "mm h-1");
    for cell in 0..81 {
        if p.valid()[cell] {
            assert!(p.values()[cell] >= p.values()[81 + cell]);
            assert!(p.values()[81 + cell] >= p.values()[162 + cell]);
        }
    }
}

#[test]
fn fully_masked_member_is_ignored() {
    let ny = 4;
    let nx = 4;
    let mut values = vec![2.0; 2 * ny * nx];
    let mut valid = vec![true; 2 * ny * nx];
    for i in ny * nx..2 * ny * nx {
        values[i] = 0.0;
        valid[i] = false;
    }
    let mut axes = vec![Axis::realizations(2).unwrap()];
    axes.extend(spatial(ny, nx, 1.0));
    let field = GriddedField::with_mask("t", "K", axes, values, valid).unwrap();
    let p = neighbourhood_probability(
        &field,
        &Kernel::square(1).unwrap(),
        Threshold::above(1.0).unwrap(),
    )
    .unwrap();
    for &v in p.values() {
        assert_relative_eq!(v, 1.0);
    }
}

#[test]
fn missing_realization_axis_is_configuration_error() {
    let field = GriddedField::new("t", "K", spatial(4, 4, 1.0), vec![0.0; 16]).unwrap();
    let err = neighbourhood_probability(
        &field,
        &Kernel::square(1).unwrap(),
        Threshold::above(0.0).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, NeighbourhoodError::Grid(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn oversized_radius_is_rejected() {
    let field = random_ensemble(2, 1, 2, 6, 30);
    let err = neighbourhood_probability(
        &field,
        &Kernel::square(4).unwrap(),
        Threshold::above(0.0).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        NeighbourhoodError::RadiusTooLarge {
            radius: 4,
            ny: 6,
            nx: 30
        }
    ));
}
