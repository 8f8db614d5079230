//! Plotting positions: the map from a rank within an ensemble to a
//! cumulative probability.

use std::fmt;

/// Formula turning a 1-based (possibly fractional) rank `r` among `n`
/// members into a quantile in `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlottingPosition {
    /// `r / (n + 1)`; unbiased exceedance probabilities for any parent
    /// distribution.
    #[default]
    Weibull,
    /// `(r - 0.5) / n`.
    Hazen,
    /// `(r - 0.44) / (n + 0.12)`; tuned for Gumbel-like extremes.
    Gringorten,
    /// `(r - 0.375) / (n + 0.25)`; tuned for normal parents.
    Blom,
}

impl PlottingPosition {
    /// Offsets `(a, b)` in `(r - a) / (n + b)`.
    fn offsets(self) -> (f64, f64) {
        match self {
            PlottingPosition::Weibull => (0.0, 1.0),
            PlottingPosition::Hazen => (0.5, 0.0),
            PlottingPosition::Gringorten => (0.44, 0.12),
            PlottingPosition::Blom => (0.375, 0.25),
        }
    }

    /// Quantile of rank `rank` among `n` members.
    pub fn probability(self, rank: f64, n: usize) -> f64 {
        let (a, b) = self.offsets();
        (rank - a) / (n as f64 + b)
    }

    /// Lower-case name as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            PlottingPosition::Weibull => "weibull",
            PlottingPosition::Hazen => "hazen",
            PlottingPosition::Gringorten => "gringorten",
            PlottingPosition::Blom => "blom",
        }
    }

    /// Inverse of [`PlottingPosition::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        [
            PlottingPosition::Weibull,
            PlottingPosition::Hazen,
            PlottingPosition::Gringorten,
            PlottingPosition::Blom,
        ]
        .into_iter()
        .find(|p| p.name() == name)
    }
}

impl fmt::Display for PlottingPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
