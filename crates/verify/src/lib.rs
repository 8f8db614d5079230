//! Zephyr verification: score probability and ensemble forecasts against
//! gridded observations.
//!
//! All scores are pure reductions over borrowed fields. Results derive
//! `serde::Serialize` and can be written with [`to_json`].

mod error;
mod rank_histogram;
mod scores;
mod truth;

use serde::Serialize;
use tracing::debug;
use zephyr_grid::GriddedField;

pub use error::VerifyError;
pub use rank_histogram::RankHistogram;
pub use scores::{BrierScore, ReliabilityBin, ReliabilityTable};
pub use truth::Truth;

/// Which score to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    /// Brier score of a probability forecast.
    Brier,
    /// Reliability table of a probability forecast with `bins` equal-width
    /// bins.
    Reliability {
        /// Number of bins on `[0, 1]`.
        bins: usize,
    },
    /// Rank histogram of an ensemble forecast against observed values.
    RankHistogram,
}

/// Output of [`score`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "score", rename_all = "snake_case")]
pub enum ScoreResult {
    Brier(BrierScore),
    Reliability(ReliabilityTable),
    RankHistogram(RankHistogram),
}

/// Scores `forecast` against `observation`.
///
/// For [`ScoreKind::Brier`] and [`ScoreKind::Reliability`], `forecast` is a
/// probability field aligned with the observation and only cells valid in
/// both are scored. For [`ScoreKind::RankHistogram`], `forecast` carries a
/// realization axis and the observation field has the remaining axes.
///
/// # Errors
///
/// - [`VerifyError::Misaligned`] when the grids differ.
/// - [`VerifyError::Grid`] for probabilities outside `[0, 1]` or a missing
///   realization axis.
/// - [`VerifyError::NonBinaryObservation`] for binary truth other than 0/1.
/// - [`VerifyError::NoOverlap`] when nothing can be scored.
/// - [`VerifyError::InvalidBins`] for zero reliability bins.
#[tracing::instrument(skip(forecast, observation), fields(forecast = forecast.name()))]
pub fn score(
    forecast: &GriddedField,
    observation: &Truth,
    kind: ScoreKind,
) -> Result<ScoreResult, VerifyError> {
    let result = match kind {
        ScoreKind::Brier => {
            let pairs = truth::paired(forecast, observation)?;
            ScoreResult::Brier(scores::brier(&pairs))
        }
        ScoreKind::Reliability { bins } => {
            if bins == 0 {
                return Err(VerifyError::InvalidBins { bins });
            }
            let pairs = truth::paired(forecast, observation)?;
            ScoreResult::Reliability(scores::reliability(&pairs, bins))
        }
        ScoreKind::RankHistogram => ScoreResult::RankHistogram(rank_histogram::rank_histogram(
            forecast,
            observation.field(),
        )?),
    };
    debug!(?kind, "score computed");
    Ok(result)
}

/// Serializes a score to pretty-printed JSON.
pub fn to_json(result: &ScoreResult) -> Result<String, VerifyError> {
    serde_json::to_string_pretty(result).map_err(|e| VerifyError::Serialization {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_tags_score() {
        let result = ScoreResult::Brier(BrierScore {
            brier: 0.1,
            base_rate: 0.5,
            skill: Some(0.6),
            n: 10,
        });
        let json = to_json(&result).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["score"], "brier");
        assert_eq!(value["n"], 10);
        assert_eq!(value["skill"], 0.6);
    }

    #[test]
    fn test_null_for_missing_skill() {
        let result = ScoreResult::Brier(BrierScore {
            brier: 0.1,
            base_rate: 0.0,
            skill: None,
            n: 3,
        });
        let value: serde_json::Value = serde_json::from_str(&to_json(&result).unwrap()).unwrap();
        assert!(value["skill"].is_null());
    }
}
