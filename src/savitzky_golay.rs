// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Odd-window least-squares polynomial (Savitzky-Golay) smoothing of a
//! point sequence, with wrap or clamp boundary handling, plus a
//! constrained variant that can lock points or preserve corners exactly.

use crate::error::{Error, Result};

/// A precomputed Savitzky-Golay kernel for half-window radius `r` and
/// polynomial order `p`.
pub struct SgKernel {
    radius: usize,
    weights: Vec<f64>,
}

impl SgKernel {
    /// Builds the kernel by inverting the `(p+1) x (p+1)` normal-equation
    /// matrix `J[i][j] = sum_{k=-r..=r} k^(i+j)` and extracting the row
    /// that reproduces the constant (smoothed-value) term.
    pub fn new(radius: usize, order: usize) -> Result<Self> {
        if 2 * radius + 1 <= order {
            return Err(Error::invalid("2*radius+1 must exceed the polynomial order"));
        }

        let dim = order + 1;
        let mut j = vec![vec![0.0f64; dim]; dim];
        for row in 0..dim {
            for col in 0..dim {
                let mut sum = 0.0;
                for k in -(radius as i64)..=(radius as i64) {
                    sum += (k as f64).powi((row + col) as i32);
                }
                j[row][col] = sum;
            }
        }

        let inv = invert_matrix(&j).ok_or_else(|| Error::runtime("singular Savitzky-Golay normal matrix"))?;

        // weights[k + radius] = sum_col inv[0][col] * k^col
        let mut weights = vec![0.0f64; 2 * radius + 1];
        for (idx, w) in weights.iter_mut().enumerate() {
            let k = idx as i64 - radius as i64;
            let mut sum = 0.0;
            for col in 0..dim {
                sum += inv[0][col] * (k as f64).powi(col as i32);
            }
            *w = sum;
        }

        Ok(SgKernel { radius, weights })
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Smooths `points` (length `n >= 2*radius+1`) by symmetric
    /// convolution. `wrap = true` indexes modulo `n` for closed contours;
    /// `wrap = false` passes endpoint points within `radius` of either
    /// end through unmodified.
    pub fn smooth(&self, points: &[(f64, f64)], wrap: bool) -> Result<Vec<(f64, f64)>> {
        let n = points.len();
        if n < 2 * self.radius + 1 {
            return Err(Error::invalid("sequence shorter than the kernel window"));
        }

        let mut out = points.to_vec();
        let r = self.radius as i64;

        for i in 0..n {
            if !wrap && (i as i64) < r || (!wrap && (i as i64) >= n as i64 - r) {
                continue;
            }

            let (mut sx, mut sy) = (0.0, 0.0);
            for (wi, k) in (-r..=r).enumerate() {
                let idx = if wrap {
                    (((i as i64 + k) % n as i64) + n as i64) % n as i64
                } else {
                    i as i64 + k
                } as usize;
                let w = self.weights[wi];
                sx += w * points[idx].0;
                sy += w * points[idx].1;
            }
            out[i] = (sx, sy);
        }

        Ok(out)
    }

    /// Constrained variant: points whose `locked` flag is set are held
    /// exactly fixed (infinite weight); `corner` points are additionally
    /// preserved exactly and treated as segment boundaries that the
    /// window does not smooth across.
    pub fn smooth_constrained(
        &self,
        points: &[(f64, f64)],
        locked: &[bool],
        corner: &[bool],
    ) -> Result<Vec<(f64, f64)>> {
        let n = points.len();
        if locked.len() != n || corner.len() != n {
            return Err(Error::invalid("locked/corner flags must match points length"));
        }
        if n < 2 * self.radius + 1 {
            return Err(Error::invalid("sequence shorter than the kernel window"));
        }

        let r = self.radius as i64;
        let mut out = points.to_vec();

        for i in 0..n {
            if locked[i] || corner[i] {
                continue;
            }

            let mut sw = 0.0;
            let (mut sx, mut sy) = (0.0, 0.0);
            for k in -r..=r {
                let idx = i as i64 + k;
                if idx < 0 || idx >= n as i64 {
                    continue;
                }
                let idx = idx as usize;
                if corner[idx] && idx != i {
                    continue;
                }
                let w = self.weights[(k + r) as usize];
                let effective_w = if locked[idx] { w * 1.0e9 } else { w };
                sw += effective_w;
                sx += effective_w * points[idx].0;
                sy += effective_w * points[idx].1;
            }

            if sw.abs() > 1e-12 {
                out[i] = (sx / sw, sy / sw);
            }
        }

        Ok(out)
    }
}

/// Gauss-Jordan inversion of a small dense matrix. Returns `None` if the
/// matrix is singular to working precision.
fn invert_matrix(m: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = m.len();
    let mut a = m.to_vec();
    let mut inv = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        inv[i][i] = 1.0;
    }

    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_val = a[col][col].abs();
        for row in (col + 1)..n {
            if a[row][col].abs() > pivot_val {
                pivot_val = a[row][col].abs();
                pivot_row = row;
            }
        }
        if pivot_val < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let pivot = a[col][col];
        for v in a[col].iter_mut() {
            *v /= pivot;
        }
        for v in inv[col].iter_mut() {
            *v /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for c in 0..n {
                a[row][c] -= factor * a[col][c];
                inv[row][c] -= factor * inv[col][c];
            }
        }
    }

    Some(inv)
}
