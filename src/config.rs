use std::path::PathBuf;

use serde::Deserialize;

/// Top-level pipeline configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Neighbourhood processing settings.
    pub neighbourhood: NeighbourhoodToml,

    /// Quantile calibration of member values. Skipped when absent.
    #[serde(default)]
    pub calibration: Option<CalibrationToml>,

    /// Blend settings.
    #[serde(default)]
    pub blend: BlendToml,

    /// Forecast sources, one per `[[source]]` table.
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceToml>,

    /// Lead-time weight curve for sources without an explicit weight.
    #[serde(default)]
    pub weights: Option<WeightsToml>,

    /// Output settings.
    #[serde(default)]
    pub output: OutputToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NeighbourhoodToml {
    #[serde(default = "default_shape")]
    pub shape: String,
    #[serde(default)]
    pub radius_cells: Option<usize>,
    #[serde(default)]
    pub radius_distance: Option<f64>,
    pub threshold: f64,
    #[serde(default = "default_comparator")]
    pub comparator: String,
    /// Process the grid in bands of this many rows.
    #[serde(default)]
    pub chunk_rows: Option<usize>,
}

fn default_shape() -> String {
    "square".to_string()
}
fn default_comparator() -> String {
    "gt".to_string()
}

/// Calibration table source: exactly one of `points`, `gamma` or
/// `truncated_normal` must be set.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationToml {
    #[serde(default = "default_plotting_position")]
    pub plotting_position: String,
    #[serde(default = "default_min_members")]
    pub min_members: usize,
    #[serde(default)]
    pub points: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub gamma: Option<GammaToml>,
    #[serde(default)]
    pub truncated_normal: Option<TruncatedNormalToml>,
    #[serde(default = "default_n_points")]
    pub n_points: usize,
}

fn default_plotting_position() -> String {
    "weibull".to_string()
}
fn default_min_members() -> usize {
    1
}
fn default_n_points() -> usize {
    101
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GammaToml {
    pub shape: f64,
    pub scale: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TruncatedNormalToml {
    pub mean: f64,
    pub sd: f64,
    #[serde(default = "default_lower")]
    pub lower: f64,
    #[serde(default = "default_upper")]
    pub upper: f64,
}

fn default_lower() -> f64 {
    f64::NEG_INFINITY
}
fn default_upper() -> f64 {
    f64::INFINITY
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlendToml {
    #[serde(default = "default_blend_kind")]
    pub kind: String,
}

impl Default for BlendToml {
    fn default() -> Self {
        Self {
            kind: default_blend_kind(),
        }
    }
}

fn default_blend_kind() -> String {
    "probability".to_string()
}

/// One forecast source. Either `weight` or `lead_time` (with a
/// `[weights]` curve) decides its weight.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceToml {
    pub path: PathBuf,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub lead_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightsToml {
    /// `(coordinate, weight)` knots in increasing coordinate order.
    pub knots: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputToml {
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub name: Option<String>,
}
