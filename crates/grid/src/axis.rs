//! Named coordinate axes.

use std::fmt;

use crate::error::GridError;

/// Absolute tolerance used when comparing coordinates of two fields.
pub(crate) const COORD_TOL: f64 = 1e-9;

/// The closed set of dimensions a gridded field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AxisKind {
    /// Ensemble member.
    Realization,
    /// Validity or lead time.
    Time,
    /// Threshold of a probability field.
    Threshold,
    /// Projection y coordinate (rows).
    Y,
    /// Projection x coordinate (columns).
    X,
}

impl AxisKind {
    /// Lower-case name used in messages and documents.
    pub fn name(self) -> &'static str {
        match self {
            AxisKind::Realization => "realization",
            AxisKind::Time => "time",
            AxisKind::Threshold => "threshold",
            AxisKind::Y => "y",
            AxisKind::X => "x",
        }
    }

    /// Parses the lower-case name produced by [`AxisKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "realization" => Some(AxisKind::Realization),
            "time" => Some(AxisKind::Time),
            "threshold" => Some(AxisKind::Threshold),
            "y" => Some(AxisKind::Y),
            "x" => Some(AxisKind::X),
            _ => None,
        }
    }
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One dimension of a field: its kind, ordered coordinates and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    kind: AxisKind,
    points: Vec<f64>,
    units: String,
}

impl Axis {
    /// Creates an axis after validating its coordinates.
    ///
    /// Points must be non-empty and finite. Realization points must be
    /// distinct; every other kind must be strictly increasing or strictly
    /// decreasing.
    pub fn new(
        kind: AxisKind,
        points: Vec<f64>,
        units: impl Into<String>,
    ) -> Result<Self, GridError> {
        if points.is_empty() {
            return Err(GridError::EmptyAxis { kind });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(GridError::NonFiniteCoordinate { kind, index });
        }

        if kind == AxisKind::Realization {
            let mut sorted = points.clone();
            sorted.sort_by(f64::total_cmp);
            if sorted.windows(2).any(|w| w[0] == w[1]) {
                return Err(GridError::NonMonotonicAxis { kind });
            }
        } else if points.len() > 1 {
            let increasing = points.windows(2).all(|w| w[1] > w[0]);
            let decreasing = points.windows(2).all(|w| w[1] < w[0]);
            if !increasing && !decreasing {
                return Err(GridError::NonMonotonicAxis { kind });
            }
        }

        Ok(Self {
            kind,
            points,
            units: units.into(),
        })
    }

    /// Realization axis numbered `0..n`.
    pub fn realizations(n: usize) -> Result<Self, GridError> {
        Self::new(AxisKind::Realization, (0..n).map(|i| i as f64).collect(), "1")
    }

    /// Evenly spaced spatial axis starting at `origin`.
    pub fn regular(
        kind: AxisKind,
        origin: f64,
        spacing: f64,
        n: usize,
        units: impl Into<String>,
    ) -> Result<Self, GridError> {
        Self::new(
            kind,
            (0..n).map(|i| origin + spacing * i as f64).collect(),
            units,
        )
    }

    /// Returns the axis kind.
    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    /// Returns the coordinate points.
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Returns the coordinate unit.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Number of points along the axis.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; axes are never empty once constructed.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Uniform absolute spacing between points.
    ///
    /// Fails for single-point axes and for spacings that differ by more
    /// than a relative tolerance of 1e-6.
    pub fn spacing(&self) -> Result<f64, GridError> {
        let kind = self.kind;
        if self.points.len() < 2 {
            return Err(GridError::NonUniformSpacing { kind });
        }
        let first = (self.points[1] - self.points[0]).abs();
        let uniform = self
            .points
            .windows(2)
            .all(|w| ((w[1] - w[0]).abs() - first).abs() <= 1e-6 * first);
        if uniform {
            Ok(first)
        } else {
            Err(GridError::NonUniformSpacing { kind })
        }
    }

    /// Describes the first difference to `other`, if any.
    pub(crate) fn difference(&self, other: &Axis) -> Option<String> {
        if self.kind != other.kind {
            return Some(format!("axis '{}' vs '{}'", self.kind, other.kind));
        }
        if self.points.len() != other.points.len() {
            return Some(format!(
                "axis '{}' has {} points vs {}",
                self.kind,
                self.points.len(),
                other.points.len()
            ));
        }
        if let Some(i) = self
            .points
            .iter()
            .zip(&other.points)
            .position(|(a, b)| (a - b).abs() > COORD_TOL)
        {
            return Some(format!(
                "axis '{}' point {} differs: {} vs {}",
                self.kind, i, self.points[i], other.points[i]
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn name_round_trip() {
        for kind in [
            AxisKind::Realization,
            AxisKind::Time,
            AxisKind::Threshold,
            AxisKind::Y,
            AxisKind::X,
        ] {
            assert_eq!(AxisKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(AxisKind::from_name("height"), None);
    }

    #[test]
    fn empty_axis_rejected() {
        let e = Axis::new(AxisKind::Y, vec![], "m").unwrap_err();
        assert!(matches!(e, GridError::EmptyAxis { kind: AxisKind::Y }));
    }

    #[test]
    fn non_finite_point_rejected() {
        let e = Axis::new(AxisKind::X, vec![0.0, f64::NAN], "m").unwrap_err();
        assert!(matches!(
            e,
            GridError::NonFiniteCoordinate {
                kind: AxisKind::X,
                index: 1
            }
        ));
    }

    #[test]
    fn decreasing_axis_allowed() {
        let axis = Axis::new(AxisKind::Y, vec![3.0, 2.0, 1.0], "m").unwrap();
        assert_eq!(axis.len(), 3);
        assert_relative_eq!(axis.spacing().unwrap(), 1.0);
    }

    #[test]
    fn non_monotonic_rejected() {
        assert!(Axis::new(AxisKind::Time, vec![1.0, 3.0, 2.0], "s").is_err());
    }

    #[test]
    fn realization_points_may_be_unordered_but_distinct() {
        assert!(Axis::new(AxisKind::Realization, vec![2.0, 0.0, 1.0], "1").is_ok());
        assert!(Axis::new(AxisKind::Realization, vec![0.0, 1.0, 0.0], "1").is_err());
    }

    #[test]
    fn regular_spacing() {
        let axis = Axis::regular(AxisKind::X, 100.0, 2000.0, 5, "m").unwrap();
        assert_relative_eq!(axis.points()[4], 8100.0);
        assert_relative_eq!(axis.spacing().unwrap(), 2000.0);
    }

    #[test]
    fn irregular_spacing_rejected() {
        let axis = Axis::new(AxisKind::X, vec![0.0, 1.0, 3.0], "m").unwrap();
        assert!(matches!(
            axis.spacing(),
            Err(GridError::NonUniformSpacing { kind: AxisKind::X })
        ));
    }

    #[test]
    fn difference_reports_point() {
        let a = Axis::new(AxisKind::X, vec![0.0, 1.0], "m").unwrap();
        let b = Axis::new(AxisKind::X, vec![0.0, 1.5], "m").unwrap();
        let msg = a.difference(&b).unwrap();
        assert!(msg.contains("point 1 differs"));
        assert!(a.difference(&a.clone()).is_none());
    }
}
