//! Statistical helper functions for the Zephyr post-processing crates.

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Sample variance with N-1 denominator (matching R's `var()`).
/// Returns 0.0 if fewer than 2 elements.
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = data.iter().sum::<f64>() / nf;
    data.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / (nf - 1.0)
}

/// R's default quantile algorithm (type=7).
///
/// **Expects pre-sorted input** (caller's responsibility).
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn quantile_type7(sorted: &[f64], p: f64) -> f64 {
    assert!(
        !sorted.is_empty(),
        "quantile_type7: input must not be empty"
    );
    let n = sorted.len();
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    sorted[lo] + (h - h.floor()) * (sorted[hi] - sorted[lo])
}

/// Average rank of `value` within `sample` (1-based, ties averaged).
///
/// Equals `#less + (#equal + 1) / 2`, so every member of a tied group gets
/// the same rank. For a value absent from the sample this is `#less + 0.5`,
/// halfway between its neighbours.
pub fn average_rank(value: f64, sample: &[f64]) -> f64 {
    let mut less = 0usize;
    let mut equal = 0usize;
    for &x in sample {
        if x < value {
            less += 1;
        } else if x == value {
            equal += 1;
        }
    }
    less as f64 + (equal as f64 + 1.0) / 2.0
}

/// Average ranks of every element (matching R's `rank(ties.method = "average")`).
///
/// Runs in O(n log n). Non-finite values are ranked by `f64::total_cmp`.
pub fn average_ranks(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && data[order[end]] == data[order[start]] {
            end += 1;
        }
        // Positions start..end (0-based) share ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// Piecewise-linear interpolation of `x` over knots `(xs, ys)`.
///
/// `xs` must be non-decreasing. Outside the knot range the end values are
/// returned. Repeated `xs` resolve to the first matching segment.
///
/// # Panics
///
/// Panics if `xs` is empty or the slices differ in length.
pub fn interp_linear(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    assert!(!xs.is_empty(), "interp_linear: knots must not be empty");
    assert_eq!(xs.len(), ys.len(), "interp_linear: knot length mismatch");
    let n = xs.len();
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }
    // First knot strictly greater than x; guaranteed in 1..n here.
    let hi = xs.partition_point(|&k| k <= x);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span <= 0.0 {
        return ys[lo];
    }
    let t = (x - xs[lo]) / span;
    ys[lo] + t * (ys[hi] - ys[lo])
}
