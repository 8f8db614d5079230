//! Kernel shapes and their resolved cell footprints.

use zephyr_grid::GriddedField;

use crate::error::NeighbourhoodError;

/// Outline of the neighbourhood around each grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelShape {
    /// Cells whose centres lie within Euclidean distance `r` of the point.
    Circular,
    /// Cells whose centres lie within Chebyshev distance `r` of the point.
    #[default]
    Square,
}

/// Kernel radius in grid cells or in the units of the spatial axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Radius {
    /// Whole grid cells.
    Cells(usize),
    /// Physical distance; converted with the grid spacing.
    Distance(f64),
}

/// A neighbourhood kernel: shape plus radius.
///
/// Windows always span `2r + 1` cells per side, so the centre cell is never
/// ambiguous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    shape: KernelShape,
    radius: Radius,
}

impl Kernel {
    /// Creates a kernel after checking the radius is positive.
    pub fn new(shape: KernelShape, radius: Radius) -> Result<Self, NeighbourhoodError> {
        match radius {
            Radius::Cells(0) => return Err(NeighbourhoodError::InvalidRadius { radius: 0.0 }),
            Radius::Distance(d) if !d.is_finite() || d <= 0.0 => {
                return Err(NeighbourhoodError::InvalidRadius { radius: d });
            }
            _ => {}
        }
        Ok(Self { shape, radius })
    }

    /// Square kernel with a radius in cells.
    pub fn square(cells: usize) -> Result<Self, NeighbourhoodError> {
        Self::new(KernelShape::Square, Radius::Cells(cells))
    }

    /// Circular kernel with a radius in cells.
    pub fn circular(cells: usize) -> Result<Self, NeighbourhoodError> {
        Self::new(KernelShape::Circular, Radius::Cells(cells))
    }

    /// Returns the kernel shape.
    pub fn shape(&self) -> KernelShape {
        self.shape
    }

    /// Returns the radius as configured.
    pub fn radius(&self) -> Radius {
        self.radius
    }

    /// Radius in whole cells for a grid with uniform spacing `spacing`.
    ///
    /// Distances are rounded to the nearest cell; a distance that rounds to
    /// zero cells is rejected.
    pub fn radius_in_cells(&self, spacing: f64) -> Result<usize, NeighbourhoodError> {
        match self.radius {
            Radius::Cells(n) => Ok(n),
            Radius::Distance(d) => {
                let cells = (d / spacing).round();
                if cells < 1.0 {
                    return Err(NeighbourhoodError::InvalidRadius { radius: cells });
                }
                Ok(cells as usize)
            }
        }
    }

    /// Resolves this kernel against `field`'s grid.
    ///
    /// # Errors
    ///
    /// Distance radii need uniformly and equally spaced `y` and `x` axes.
    /// The resolved radius may not exceed half the smaller grid dimension.
    pub fn footprint(&self, field: &GriddedField) -> Result<KernelFootprint, NeighbourhoodError> {
        let cells = match self.radius {
            Radius::Cells(n) => n,
            Radius::Distance(_) => {
                let (dy, dx) = field.grid_spacing()?;
                if (dy - dx).abs() > 1e-6 * dx.max(dy) {
                    return Err(NeighbourhoodError::AnisotropicGrid { dy, dx });
                }
                self.radius_in_cells(dx)?
            }
        };
        let (ny, nx) = (field.n_y(), field.n_x());
        if cells as f64 > ny.min(nx) as f64 / 2.0 {
            return Err(NeighbourhoodError::RadiusTooLarge {
                radius: cells,
                ny,
                nx,
            });
        }
        Ok(KernelFootprint::new(self.shape, cells))
    }
}

/// Integer square root: the largest `w` with `w * w <= m`.
fn isqrt(m: usize) -> usize {
    let mut w = (m as f64).sqrt() as usize;
    while w * w > m {
        w -= 1;
    }
    while (w + 1) * (w + 1) <= m {
        w += 1;
    }
    w
}

/// Kernel geometry in cells: for each row offset `dy` in `-r..=r`, the
/// half-width of the run of cells inside the kernel.
///
/// Immutable after construction and safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelFootprint {
    shape: KernelShape,
    radius: usize,
    half_widths: Vec<usize>,
}

impl KernelFootprint {
    /// Builds the footprint of `shape` with radius `radius` cells.
    ///
    /// Callers outside the crate go through [`Kernel::footprint`], which
    /// bounds `radius` by half the grid size.
    pub(crate) fn new(shape: KernelShape, radius: usize) -> Self {
        let r = radius as isize;
        let half_widths = (-r..=r)
            .map(|dy| match shape {
                KernelShape::Square => radius,
                KernelShape::Circular => isqrt(radius * radius - (dy * dy) as usize),
            })
            .collect();
        Self {
            shape,
            radius,
            half_widths,
        }
    }

    /// Returns the kernel shape.
    pub fn shape(&self) -> KernelShape {
        self.shape
    }

    /// Returns the radius in cells.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Half-width of the kernel row at offset `dy` (`|dy| <= radius`).
    pub fn half_width(&self, dy: isize) -> usize {
        self.half_widths[(dy + self.radius as isize) as usize]
    }

    /// Whether the cell at offset `(dy, dx)` lies inside the kernel.
    pub fn contains(&self, dy: isize, dx: isize) -> bool {
        let r = self.radius as isize;
        if dy.abs() > r || dx.abs() > r {
            return false;
        }
        match self.shape {
            KernelShape::Square => true,
            KernelShape::Circular => dy * dy + dx * dx <= r * r,
        }
    }

    /// Number of cells in the unclipped kernel.
    pub fn area(&self) -> usize {
        self.half_widths.iter().map(|w| 2 * w + 1).sum()
    }
}
