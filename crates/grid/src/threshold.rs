//! Threshold predicates applied to field values.

use std::fmt;

use crate::error::GridError;

/// Comparison used to decide whether a value satisfies a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Comparator {
    /// `value > threshold`
    #[default]
    GreaterThan,
    /// `value >= threshold`
    GreaterEqual,
    /// `value < threshold`
    LessThan,
    /// `value <= threshold`
    LessEqual,
}

impl Comparator {
    /// Short operator token: `gt`, `ge`, `lt` or `le`.
    pub fn token(self) -> &'static str {
        match self {
            Comparator::GreaterThan => "gt",
            Comparator::GreaterEqual => "ge",
            Comparator::LessThan => "lt",
            Comparator::LessEqual => "le",
        }
    }

    /// Parses either the short token or the symbol (`>`, `>=`, `<`, `<=`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gt" | ">" => Some(Comparator::GreaterThan),
            "ge" | ">=" => Some(Comparator::GreaterEqual),
            "lt" | "<" => Some(Comparator::LessThan),
            "le" | "<=" => Some(Comparator::LessEqual),
            _ => None,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparator::GreaterThan => ">",
            Comparator::GreaterEqual => ">=",
            Comparator::LessThan => "<",
            Comparator::LessEqual => "<=",
        };
        f.write_str(s)
    }
}

/// A finite threshold value paired with a comparator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    value: f64,
    comparator: Comparator,
}

impl Threshold {
    /// Creates a threshold; `value` must be finite.
    pub fn new(value: f64, comparator: Comparator) -> Result<Self, GridError> {
        if !value.is_finite() {
            return Err(GridError::InvalidThreshold { value });
        }
        Ok(Self { value, comparator })
    }

    /// Shorthand for a `>` threshold.
    pub fn above(value: f64) -> Result<Self, GridError> {
        Self::new(value, Comparator::GreaterThan)
    }

    /// Shorthand for a `<` threshold.
    pub fn below(value: f64) -> Result<Self, GridError> {
        Self::new(value, Comparator::LessThan)
    }

    /// Returns the threshold value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the comparator.
    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    /// Returns `true` when `v` satisfies the threshold.
    #[inline]
    pub fn test(&self, v: f64) -> bool {
        match self.comparator {
            Comparator::GreaterThan => v > self.value,
            Comparator::GreaterEqual => v >= self.value,
            Comparator::LessThan => v < self.value,
            Comparator::LessEqual => v <= self.value,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparator, self.value)
    }
}
