//! JSON field documents: the on-disk form of a [`GriddedField`].
//!
//! ```json
//! { "name": "p", "units": "1",
//!   "axes": [{ "kind": "y", "points": [0, 1], "units": "m" }, ...],
//!   "values": [0.1, null, ...] }
//! ```
//!
//! Values are row-major over `axes`; `null` marks a masked cell.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use zephyr_grid::{Axis, AxisKind, GriddedField};

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDocument {
    pub name: String,
    #[serde(default)]
    pub units: String,
    pub axes: Vec<AxisDocument>,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisDocument {
    pub kind: String,
    pub points: Vec<f64>,
    #[serde(default)]
    pub units: String,
}

impl FieldDocument {
    /// Captures a field; masked cells become `null`.
    pub fn from_field(field: &GriddedField) -> Self {
        Self {
            name: field.name().to_string(),
            units: field.units().to_string(),
            axes: field
                .axes()
                .iter()
                .map(|a| AxisDocument {
                    kind: a.kind().name().to_string(),
                    points: a.points().to_vec(),
                    units: a.units().to_string(),
                })
                .collect(),
            values: field
                .values()
                .iter()
                .zip(field.valid())
                .map(|(&v, &ok)| ok.then_some(v))
                .collect(),
        }
    }

    /// Builds the field, validating axes and values.
    pub fn into_field(self) -> Result<GriddedField> {
        let axes = self
            .axes
            .into_iter()
            .map(|a| {
                let Some(kind) = AxisKind::from_name(&a.kind) else {
                    bail!("unknown axis kind: {:?}", a.kind);
                };
                Axis::new(kind, a.points, a.units)
                    .with_context(|| format!("invalid '{kind}' axis"))
            })
            .collect::<Result<Vec<_>>>()?;
        let valid: Vec<bool> = self.values.iter().map(Option::is_some).collect();
        let values: Vec<f64> = self.values.iter().map(|v| v.unwrap_or(0.0)).collect();
        GriddedField::with_mask(self.name, self.units, axes, values, valid)
            .context("invalid field document")
    }
}

/// Reads a field document from `path`.
pub fn read_field(path: &Path) -> Result<GriddedField> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read field document: {}", path.display()))?;
    let doc: FieldDocument = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse field document: {}", path.display()))?;
    let field = doc
        .into_field()
        .with_context(|| format!("failed to load field: {}", path.display()))?;
    debug!(
        path = %path.display(),
        name = field.name(),
        shape = ?field.shape(),
        n_valid = field.n_valid(),
        "field loaded"
    );
    Ok(field)
}

/// Writes `field` as a pretty-printed document to `path`.
pub fn write_field(path: &Path, field: &GriddedField) -> Result<()> {
    let json = serde_json::to_string_pretty(&FieldDocument::from_field(field))
        .context("failed to serialize field document")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write field document: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GriddedField {
        let axes = vec![
            Axis::realizations(2).unwrap(),
            Axis::regular(AxisKind::Y, 0.0, 1000.0, 1, "m").unwrap(),
            Axis::regular(AxisKind::X, 0.0, 1000.0, 2, "m").unwrap(),
        ];
        GriddedField::with_mask(
            "rain",
            "mm",
            axes,
            vec![1.0, 2.0, 3.0, 4.0],
            vec![true, false, true, true],
        )
        .unwrap()
    }

    #[test]
    fn test_masked_cells_written_as_null() {
        let doc = FieldDocument::from_field(&sample());
        assert_eq!(doc.values, vec![Some(1.0), None, Some(3.0), Some(4.0)]);
        assert_eq!(doc.axes[0].kind, "realization");
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["values"][1].is_null());
    }

    #[test]
    fn test_file_round_trip_keeps_mask_and_axes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rain.json");
        let field = sample();
        write_field(&path, &field).unwrap();
        let back = read_field(&path).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn test_unknown_axis_kind_rejected() {
        let json = r#"{"name":"p","axes":[{"kind":"z","points":[0]}],"values":[1.0]}"#;
        let doc: FieldDocument = serde_json::from_str(json).unwrap();
        let err = doc.into_field().unwrap_err();
        assert!(err.to_string().contains("unknown axis kind"));
    }

    #[test]
    fn test_value_count_checked() {
        let json = r#"{"name":"p","units":"1",
            "axes":[{"kind":"y","points":[0]},{"kind":"x","points":[0,1]}],
            "values":[0.5]}"#;
        let doc: FieldDocument = serde_json::from_str(json).unwrap();
        assert!(doc.into_field().is_err());
    }

    #[test]
    fn test_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_field(&dir.path().join("absent.json")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read field document"));
    }
}
