//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result, bail};

use crate::config::*;

use zephyr_blend::{BlendKind, LinearWeights, Weight};
use zephyr_calibrate::{
    CalibrationConfig, CalibrationTable, GammaParams, PlottingPosition, TruncatedNormal,
};
use zephyr_grid::{Comparator, Threshold};
use zephyr_neighbourhood::{Kernel, KernelShape, Radius};
use zephyr_verify::ScoreKind;

/// Parses a kernel shape name into the corresponding enum variant.
pub fn parse_shape(s: &str) -> Result<KernelShape> {
    match s.to_lowercase().as_str() {
        "square" => Ok(KernelShape::Square),
        "circular" | "circle" => Ok(KernelShape::Circular),
        other => bail!("unknown kernel shape: {other:?}"),
    }
}

/// Parses a comparator token (`gt`, `ge`, `lt`, `le`) or symbol.
pub fn parse_comparator(s: &str) -> Result<Comparator> {
    match Comparator::parse(&s.to_lowercase()) {
        Some(c) => Ok(c),
        None => bail!("unknown comparator: {s:?}"),
    }
}

/// Parses a plotting-position formula name.
pub fn parse_plotting_position(s: &str) -> Result<PlottingPosition> {
    match PlottingPosition::from_name(&s.to_lowercase()) {
        Some(p) => Ok(p),
        None => bail!("unknown plotting position: {s:?}"),
    }
}

/// Parses a blend kind name.
pub fn parse_blend_kind(s: &str) -> Result<BlendKind> {
    match s.to_lowercase().as_str() {
        "probability" => Ok(BlendKind::Probability),
        "value" => Ok(BlendKind::Value),
        other => bail!("unknown blend kind: {other:?}"),
    }
}

/// Parses a score name; `bins` is used by the reliability table only.
pub fn parse_score(s: &str, bins: usize) -> Result<ScoreKind> {
    match s.to_lowercase().replace('_', "-").as_str() {
        "brier" => Ok(ScoreKind::Brier),
        "reliability" => Ok(ScoreKind::Reliability { bins }),
        "rank-histogram" => Ok(ScoreKind::RankHistogram),
        other => bail!("unknown score: {other:?}"),
    }
}

/// Builds the neighbourhood [`Kernel`].
///
/// Exactly one of `radius_cells` or `radius_distance` must be set.
pub fn build_kernel(n: &NeighbourhoodToml) -> Result<Kernel> {
    let shape = parse_shape(&n.shape)?;
    let radius = match (n.radius_cells, n.radius_distance) {
        (Some(cells), None) => Radius::Cells(cells),
        (None, Some(d)) => Radius::Distance(d),
        (Some(_), Some(_)) => {
            bail!("neighbourhood must have exactly one of radius_cells or radius_distance, got both")
        }
        (None, None) => {
            bail!(
                "neighbourhood must have exactly one of radius_cells or radius_distance, got neither"
            )
        }
    };
    Kernel::new(shape, radius).context("invalid neighbourhood kernel")
}

/// Builds the event [`Threshold`] of the neighbourhood step.
pub fn build_threshold(n: &NeighbourhoodToml) -> Result<Threshold> {
    let comparator = parse_comparator(&n.comparator)?;
    Threshold::new(n.threshold, comparator).context("invalid neighbourhood threshold")
}

/// Builds a validated [`CalibrationConfig`].
pub fn build_calibration_config(c: &CalibrationToml) -> Result<CalibrationConfig> {
    let cfg = CalibrationConfig::new()
        .with_plotting_position(parse_plotting_position(&c.plotting_position)?)
        .with_min_members(c.min_members);
    cfg.validate().context("invalid calibration config")?;
    Ok(cfg)
}

/// Builds the shared [`CalibrationTable`].
///
/// Exactly one of `points`, `gamma` or `truncated_normal` must be set.
pub fn build_calibration_table(c: &CalibrationToml) -> Result<CalibrationTable> {
    match (&c.points, &c.gamma, &c.truncated_normal) {
        (Some(points), None, None) => {
            let pairs: Vec<(f64, f64)> = points.iter().map(|[q, v]| (*q, *v)).collect();
            CalibrationTable::from_points(&pairs).context("invalid calibration points")
        }
        (None, Some(g), None) => {
            let Some(params) = GammaParams::new(g.shape, g.scale) else {
                bail!(
                    "gamma parameters must be positive and finite, got shape={} scale={}",
                    g.shape,
                    g.scale
                );
            };
            CalibrationTable::from_gamma(params, c.n_points).context("invalid gamma table")
        }
        (None, None, Some(t)) => {
            let Some(dist) = TruncatedNormal::new(t.mean, t.sd, t.lower, t.upper) else {
                bail!(
                    "invalid truncated normal: mean={} sd={} bounds=[{}, {}]",
                    t.mean,
                    t.sd,
                    t.lower,
                    t.upper
                );
            };
            CalibrationTable::from_truncated_normal(dist, c.n_points)
                .context("invalid truncated normal table")
        }
        _ => bail!(
            "calibration must have exactly one of points, gamma or truncated_normal"
        ),
    }
}

/// Resolves one scalar weight per source.
///
/// A source's own `weight` wins; otherwise its `lead_time` is looked up on
/// the `[weights]` curve.
pub fn build_source_weights(
    sources: &[SourceToml],
    weights: Option<&WeightsToml>,
) -> Result<Vec<Weight>> {
    let curve = weights
        .map(|w| {
            let knots: Vec<(f64, f64)> = w.knots.iter().map(|[x, y]| (*x, *y)).collect();
            LinearWeights::new(&knots).context("invalid [weights] knots")
        })
        .transpose()?;

    sources
        .iter()
        .map(|s| match (s.weight, s.lead_time, &curve) {
            (Some(w), _, _) => Ok(Weight::Scalar(w)),
            (None, Some(t), Some(curve)) => Ok(Weight::Scalar(curve.weight_at(t))),
            (None, Some(_), None) => bail!(
                "source {} sets lead_time but no [weights] knots are configured",
                s.path.display()
            ),
            (None, None, _) => bail!(
                "source {} must set weight or lead_time",
                s.path.display()
            ),
        })
        .collect()
}
