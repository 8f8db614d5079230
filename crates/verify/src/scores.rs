//! Brier score and reliability table over paired forecasts and outcomes.

use serde::Serialize;

/// Brier score with its sample-climatology reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrierScore {
    /// Mean squared difference between probability and outcome.
    pub brier: f64,
    /// Fraction of scored cells where the event occurred.
    pub base_rate: f64,
    /// `1 - brier / (base_rate * (1 - base_rate))`; `None` when the event
    /// always or never occurred.
    pub skill: Option<f64>,
    /// Number of scored cells.
    pub n: usize,
}

/// Brier score of `(probability, outcome)` pairs. `pairs` must be non-empty.
pub(crate) fn brier(pairs: &[(f64, f64)]) -> BrierScore {
    let n = pairs.len() as f64;
    let brier = pairs.iter().map(|(p, o)| (p - o) * (p - o)).sum::<f64>() / n;
    let base_rate = pairs.iter().map(|(_, o)| o).sum::<f64>() / n;
    let reference = base_rate * (1.0 - base_rate);
    let skill = (reference > 0.0).then(|| 1.0 - brier / reference);
    BrierScore {
        brier,
        base_rate,
        skill,
        n: pairs.len(),
    }
}

/// One bin of a reliability table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityBin {
    pub lower: f64,
    pub upper: f64,
    pub forecast_count: usize,
    pub forecast_sum: f64,
    pub observed_count: f64,
    /// `None` for empty bins.
    pub mean_forecast: Option<f64>,
    /// `None` for empty bins.
    pub observed_frequency: Option<f64>,
}

/// Reliability table: equal-width probability bins on `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityTable {
    pub bins: Vec<ReliabilityBin>,
    pub n: usize,
}

/// Bin `(probability, outcome)` pairs into `n_bins` equal-width bins. The
/// last bin is closed, so a probability of exactly 1 falls in it.
pub(crate) fn reliability(pairs: &[(f64, f64)], n_bins: usize) -> ReliabilityTable {
    let width = 1.0 / n_bins as f64;
    let mut bins: Vec<ReliabilityBin> = (0..n_bins)
        .map(|k| ReliabilityBin {
            lower: k as f64 * width,
            upper: if k + 1 == n_bins {
                1.0
            } else {
                (k + 1) as f64 * width
            },
            forecast_count: 0,
            forecast_sum: 0.0,
            observed_count: 0.0,
            mean_forecast: None,
            observed_frequency: None,
        })
        .collect();

    for &(p, o) in pairs {
        let k = ((p * n_bins as f64).floor() as usize).min(n_bins - 1);
        let bin = &mut bins[k];
        bin.forecast_count += 1;
        bin.forecast_sum += p;
        bin.observed_count += o;
    }
    for bin in &mut bins {
        if bin.forecast_count > 0 {
            let count = bin.forecast_count as f64;
            bin.mean_forecast = Some(bin.forecast_sum / count);
            bin.observed_frequency = Some(bin.observed_count / count);
        }
    }
    ReliabilityTable {
        bins,
        n: pairs.len(),
    }
}
