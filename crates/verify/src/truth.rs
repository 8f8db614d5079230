//! Observations and their binary outcomes.

use zephyr_grid::{GriddedField, Threshold};

use crate::error::VerifyError;

/// What happened, as used to score probability forecasts.
#[derive(Debug, Clone, PartialEq)]
pub enum Truth {
    /// Observed outcomes already coded as 0 or 1.
    Binary(GriddedField),
    /// Observed values; the event is `threshold.test(value)`.
    Continuous(GriddedField, Threshold),
    /// Observed values with no event definition. Only rank histograms
    /// accept it.
    Values(GriddedField),
}

impl Truth {
    /// The underlying observation field.
    pub fn field(&self) -> &GriddedField {
        match self {
            Truth::Binary(f) | Truth::Continuous(f, _) | Truth::Values(f) => f,
        }
    }

    /// Per-cell outcome (`0.0` or `1.0`); masked cells yield `None`.
    pub(crate) fn outcomes(&self) -> Result<Vec<Option<f64>>, VerifyError> {
        if let Truth::Values(_) = self {
            return Err(VerifyError::NoEventDefinition);
        }
        let field = self.field();
        field
            .values()
            .iter()
            .zip(field.valid())
            .enumerate()
            .map(|(index, (&v, &ok))| {
                if !ok {
                    return Ok(None);
                }
                match self {
                    Truth::Binary(_) if v == 0.0 || v == 1.0 => Ok(Some(v)),
                    Truth::Binary(_) => Err(VerifyError::NonBinaryObservation { index, value: v }),
                    Truth::Continuous(_, t) => Ok(Some(if t.test(v) { 1.0 } else { 0.0 })),
                    Truth::Values(_) => Err(VerifyError::NoEventDefinition),
                }
            })
            .collect()
    }
}

/// Forecast probabilities paired with outcomes at cells valid in both.
pub(crate) fn paired(
    forecast: &GriddedField,
    truth: &Truth,
) -> Result<Vec<(f64, f64)>, VerifyError> {
    forecast
        .check_aligned(truth.field())
        .map_err(VerifyError::misaligned)?;
    forecast.check_probabilities()?;
    let outcomes = truth.outcomes()?;
    let pairs: Vec<(f64, f64)> = forecast
        .values()
        .iter()
        .zip(forecast.valid())
        .zip(outcomes)
        .filter_map(|((&p, &ok), o)| if ok { o.map(|o| (p, o)) } else { None })
        .collect();
    if pairs.is_empty() {
        return Err(VerifyError::NoOverlap);
    }
    Ok(pairs)
}
