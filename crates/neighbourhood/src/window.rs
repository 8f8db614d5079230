//! Incremental window sums over a single `(y, x)` plane.
//!
//! Square kernels use a summed-area table, so every window sum costs four
//! lookups. Circular kernels use per-row prefix sums and add one row
//! segment per kernel row. Windows are clipped at the grid edge: cells
//! outside the grid contribute nothing.

use ndarray::Array2;

use crate::kernel::{KernelFootprint, KernelShape};

/// Window sums of `plane` (row-major `ny x nx`) under `footprint`.
pub(crate) fn window_sums(
    plane: &[f64],
    ny: usize,
    nx: usize,
    footprint: &KernelFootprint,
) -> Vec<f64> {
    match footprint.shape() {
        KernelShape::Square => square_sums(plane, ny, nx, footprint.radius()),
        KernelShape::Circular => row_decomposed_sums(plane, ny, nx, footprint),
    }
}

/// Summed-area table with a zero first row and column.
fn summed_area(plane: &[f64], ny: usize, nx: usize) -> Array2<f64> {
    let mut sat = Array2::<f64>::zeros((ny + 1, nx + 1));
    for y in 0..ny {
        let mut row_sum = 0.0;
        for x in 0..nx {
            row_sum += plane[y * nx + x];
            sat[[y + 1, x + 1]] = sat[[y, x + 1]] + row_sum;
        }
    }
    sat
}

fn square_sums(plane: &[f64], ny: usize, nx: usize, r: usize) -> Vec<f64> {
    let sat = summed_area(plane, ny, nx);
    let mut out = Vec::with_capacity(ny * nx);
    for y in 0..ny {
        let y0 = y.saturating_sub(r);
        let y1 = (y + r).min(ny - 1) + 1;
        for x in 0..nx {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r).min(nx - 1) + 1;
            out.push(sat[[y1, x1]] - sat[[y0, x1]] - sat[[y1, x0]] + sat[[y0, x0]]);
        }
    }
    out
}

/// Prefix sums along each row, with a zero first column.
fn row_prefix(plane: &[f64], ny: usize, nx: usize) -> Array2<f64> {
    let mut pre = Array2::<f64>::zeros((ny, nx + 1));
    for y in 0..ny {
        for x in 0..nx {
            pre[[y, x + 1]] = pre[[y, x]] + plane[y * nx + x];
        }
    }
    pre
}

fn row_decomposed_sums(
    plane: &[f64],
    ny: usize,
    nx: usize,
    footprint: &KernelFootprint,
) -> Vec<f64> {
    let pre = row_prefix(plane, ny, nx);
    let r = footprint.radius() as isize;
    let mut out = Vec::with_capacity(ny * nx);
    for y in 0..ny as isize {
        for x in 0..nx {
            let mut total = 0.0;
            for dy in -r..=r {
                let yy = y + dy;
                if yy < 0 || yy >= ny as isize {
                    continue;
                }
                let w = footprint.half_width(dy);
                let x0 = x.saturating_sub(w);
                let x1 = (x + w).min(nx - 1) + 1;
                let row = yy as usize;
                total += pre[[row, x1]] - pre[[row, x0]];
            }
            out.push(total);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute(plane: &[f64], ny: usize, nx: usize, fp: &KernelFootprint) -> Vec<f64> {
        let r = fp.radius() as isize;
        let mut out = vec![0.0; ny * nx];
        for y in 0..ny as isize {
            for x in 0..nx as isize {
                let mut s = 0.0;
                for dy in -r..=r {
                    for dx in -r..=r {
                        let (yy, xx) = (y + dy, x + dx);
                        if fp.contains(dy, dx)
                            && (0..ny as isize).contains(&yy)
                            && (0..nx as isize).contains(&xx)
                        {
                            s += plane[yy as usize * nx + xx as usize];
                        }
                    }
                }
                out[y as usize * nx + x as usize] = s;
            }
        }
        out
    }

    #[test]
    fn square_ones_counts_clipped_footprint() {
        let plane = vec![1.0; 16];
        let sums = window_sums(&plane, 4, 4, &KernelFootprint::new(KernelShape::Square, 1));
        // Corner sees 2x2, edge 2x3, interior 3x3.
        assert_eq!(sums[0], 4.0);
        assert_eq!(sums[1], 6.0);
        assert_eq!(sums[5], 9.0);
    }

    #[test]
    fn circular_ones_counts_clipped_footprint() {
        let plane = vec![1.0; 25];
        let fp = KernelFootprint::new(KernelShape::Circular, 2);
        let sums = window_sums(&plane, 5, 5, &fp);
        assert_eq!(sums[12], 13.0);
        // Corner (0, 0): offsets with dy, dx >= 0 and dy^2 + dx^2 <= 4.
        assert_eq!(sums[0], 6.0);
    }

    #[test]
    fn indicator_sums_equal_brute_force() {
        let (ny, nx) = (7, 9);
        let plane: Vec<f64> = (0..ny * nx).map(|i| ((i * 7 + 3) % 5 == 0) as u8 as f64).collect();
        for shape in [KernelShape::Square, KernelShape::Circular] {
            for r in 1..=3 {
                let fp = KernelFootprint::new(shape, r);
                assert_eq!(window_sums(&plane, ny, nx, &fp), brute(&plane, ny, nx, &fp));
            }
        }
    }
}
