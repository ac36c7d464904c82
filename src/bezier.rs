// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Recursive, error-driven quadratic-Bezier fitting of a pixel chain.

type Point = (f64, f64);

/// Three control points `(P0, P1, P2)` of a quadratic Bezier,
/// `B(t) = (1-t)^2 P0 + 2t(1-t) P1 + t^2 P2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadBezier {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
}

impl QuadBezier {
    #[inline]
    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt;
        let b = 2.0 * t * mt;
        let c = t * t;
        (
            a * self.p0.0 + b * self.p1.0 + c * self.p2.0,
            a * self.p0.1 + b * self.p1.1 + c * self.p2.1,
        )
    }
}

fn chord_length_params(points: &[Point]) -> Vec<f64> {
    let mut cum = vec![0.0; points.len()];
    for i in 1..points.len() {
        let d = (points[i].0 - points[i - 1].0, points[i].1 - points[i - 1].1);
        cum[i] = cum[i - 1] + (d.0 * d.0 + d.1 * d.1).sqrt();
    }
    let total = *cum.last().unwrap();
    if total > 0.0 {
        for v in &mut cum {
            *v /= total;
        }
    }
    cum
}

fn fit_control_point(points: &[Point], u: &[f64], p0: Point, p2: Point) -> Point {
    let mut num = (0.0, 0.0);
    let mut den = 0.0;
    for (i, &t) in u.iter().enumerate() {
        let a_i = 2.0 * t * (1.0 - t);
        let base_x = (1.0 - t).powi(2) * p0.0 + t * t * p2.0;
        let base_y = (1.0 - t).powi(2) * p0.1 + t * t * p2.1;
        num.0 += a_i * (points[i].0 - base_x);
        num.1 += a_i * (points[i].1 - base_y);
        den += a_i * a_i;
    }
    if den.abs() < 1e-12 {
        ((p0.0 + p2.0) / 2.0, (p0.1 + p2.1) / 2.0)
    } else {
        (num.0 / den, num.1 / den)
    }
}

/// Returns `(max squared error, index of the worst interior point)`.
fn max_error(points: &[Point], u: &[f64], curve: &QuadBezier) -> (f64, usize) {
    let mut max_err = 0.0;
    let mut max_idx = 0;
    for i in 1..points.len() - 1 {
        let p = curve.eval(u[i]);
        let d = (points[i].0 - p.0, points[i].1 - p.1);
        let err = d.0 * d.0 + d.1 * d.1;
        if err > max_err {
            max_err = err;
            max_idx = i;
        }
    }
    (max_err, max_idx)
}

fn fit_recursive(points: &[Point], tolerance: f64, out: &mut Vec<QuadBezier>) {
    if points.len() < 3 {
        let p0 = points[0];
        let p2 = *points.last().unwrap();
        let mid = ((p0.0 + p2.0) / 2.0, (p0.1 + p2.1) / 2.0);
        out.push(QuadBezier { p0, p1: mid, p2 });
        return;
    }

    let u = chord_length_params(points);
    let p0 = points[0];
    let p2 = *points.last().unwrap();
    let p1 = fit_control_point(points, &u, p0, p2);
    let curve = QuadBezier { p0, p1, p2 };

    let (max_err, split_idx) = max_error(points, &u, &curve);
    if max_err <= tolerance * tolerance {
        out.push(curve);
        return;
    }

    let split = if split_idx == 0 || split_idx == points.len() - 1 {
        points.len() / 2
    } else {
        split_idx
    };
    // A degenerate split (no progress) falls back to a plain bisection
    // so recursion always terminates.
    let split = split.clamp(1, points.len() - 2);

    fit_recursive(&points[..=split], tolerance, out);
    fit_recursive(&points[split..], tolerance, out);
}

/// Fits `chain` with a sequence of quadratic Beziers such that every
/// sample point lies within `tolerance` pixels of the concatenated
/// curve (measured perpendicular to chord-length parameterisation).
/// A chain of fewer than three points degenerates to a single curve
/// whose control point is the midpoint of its endpoints.
pub fn fit_chain(chain: &[Point], tolerance: f64) -> Vec<QuadBezier> {
    if chain.is_empty() {
        return Vec::new();
    }
    if chain.len() == 1 {
        return vec![QuadBezier { p0: chain[0], p1: chain[0], p2: chain[0] }];
    }
    let mut out = Vec::new();
    fit_recursive(chain, tolerance.max(1e-6), &mut out);
    out
}
