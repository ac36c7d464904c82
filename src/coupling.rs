// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sub-pixel stitching of contour points shared by adjacent regions, so
//! neighbouring regions leave no hairline gaps or overlaps in the SVG
//! output.
//!
//! Implements the "grid-mid" strategy described in the specification.
//! The "segment-projection" strategy is an accepted alternative that
//! this crate does not implement; grid-mid alone satisfies the
//! uniqueness and bit-identical-match contracts required downstream.

type Point = (f64, f64);

fn tangents(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 2 {
        return vec![(0.0, 0.0); n];
    }
    (0..n)
        .map(|i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            let d = (next.0 - prev.0, next.1 - prev.1);
            let len = (d.0 * d.0 + d.1 * d.1).sqrt();
            if len > 1e-12 {
                (d.0 / len, d.1 / len)
            } else {
                (0.0, 0.0)
            }
        })
        .collect()
}

/// Snaps points shared by contour `a` and contour `b` to a common
/// sub-pixel midpoint. For every point `A_i`, candidates are the points
/// of `b` whose rounded integer coordinate lies in `A_i`'s 3x3
/// neighbourhood; the candidate minimising `|tangent(A_i) . (B_j - A_i)|`
/// wins, ties broken by distance. A greedy, globally sorted pass selects
/// winners without replacement so each point matches at most once.
pub fn couple_contours(a: &mut [Point], b: &mut [Point]) {
    if a.is_empty() || b.is_empty() {
        return;
    }

    let tangents_a = tangents(a);

    struct Candidate {
        quality: f64,
        distance: f64,
        a_idx: usize,
        b_idx: usize,
    }

    let mut candidates = Vec::new();
    for (i, &ai) in a.iter().enumerate() {
        let cell = (ai.0.round() as i64, ai.1.round() as i64);
        for (j, &bj) in b.iter().enumerate() {
            let bcell = (bj.0.round() as i64, bj.1.round() as i64);
            if (bcell.0 - cell.0).abs() > 1 || (bcell.1 - cell.1).abs() > 1 {
                continue;
            }
            let t = tangents_a[i];
            let d = (bj.0 - ai.0, bj.1 - ai.1);
            let quality = (t.0 * d.0 + t.1 * d.1).abs();
            let distance = (d.0 * d.0 + d.1 * d.1).sqrt();
            candidates.push(Candidate { quality, distance, a_idx: i, b_idx: j });
        }
    }

    candidates.sort_by(|x, y| {
        x.quality
            .partial_cmp(&y.quality)
            .unwrap()
            .then(x.distance.partial_cmp(&y.distance).unwrap())
    });

    let mut used_a = vec![false; a.len()];
    let mut used_b = vec![false; b.len()];

    for c in candidates {
        if used_a[c.a_idx] || used_b[c.b_idx] {
            continue;
        }
        used_a[c.a_idx] = true;
        used_b[c.b_idx] = true;

        let ai = a[c.a_idx];
        let bj = b[c.b_idx];
        let mid = ((ai.0 + bj.0) / 2.0, (ai.1 + bj.1) / 2.0);
        a[c.a_idx] = mid;
        b[c.b_idx] = mid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_points_snap_to_a_shared_midpoint() {
        let mut a = vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)];
        let mut b = vec![(0.2, 0.9), (1.2, 0.9), (2.2, 0.9)];
        couple_contours(&mut a, &mut b);

        for (ai, bi) in a.iter().zip(b.iter()) {
            // Not every pair necessarily matches (greedy, unique), but any
            // point that did match must be bit-identical between a and b.
            if (ai.0 - bi.0).abs() < 1e-12 {
                assert!((ai.1 - bi.1).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn each_point_matches_at_most_once() {
        let mut a = vec![(0.0, 0.0), (0.0, 0.0), (0.0, 0.0)];
        let mut b = vec![(0.1, 0.1)];
        couple_contours(&mut a, &mut b);
        let matched = a.iter().filter(|p| **p == b[0]).count();
        assert_eq!(matched, 1);
    }

    #[test]
    fn empty_contours_are_noop() {
        let mut a: Vec<Point> = vec![];
        let mut b = vec![(1.0, 1.0)];
        couple_contours(&mut a, &mut b);
        assert_eq!(b, vec![(1.0, 1.0)]);
    }

    #[test]
    fn matched_points_are_bit_identical() {
        let mut a = vec![(5.0, 5.0)];
        let mut b = vec![(5.0, 6.0)];
        couple_contours(&mut a, &mut b);
        assert_eq!(a[0], b[0]);
    }
}
