// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Suzuki-Abe border following: traces every outer and hole border of a
//! binary image in one raster scan, producing ordered border-pixel
//! sequences together with their parent/hole hierarchy.

use std::collections::HashMap;

use crate::region::Region;

/// Clockwise neighbour offsets `(d_row, d_col)`, starting from east as
/// direction 0.
const DIRS: [(i32, i32); 8] = [
    (0, 1),   // E
    (1, 1),   // SE
    (1, 0),   // S
    (1, -1),  // SW
    (0, -1),  // W
    (-1, -1), // NW
    (-1, 0),  // N
    (-1, 1),  // NE
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderType {
    Outer,
    Hole,
}

/// One traced border: its type, its parent (by index into the returned
/// `Vec<Contour>`, `None` if it attaches directly to the picture frame),
/// and its ordered point sequence in the caller's coordinate space.
///
/// Points start on the integer pixel grid straight out of the tracer, but
/// the type is `f64` because this is also the type downstream stages
/// (Savitzky-Golay smoothing, border coupling) produce sub-pixel
/// coordinates into; rounding here would throw away exactly the precision
/// those stages exist to add.
#[derive(Clone, Debug)]
pub struct Contour {
    pub border_type: BorderType,
    pub parent: Option<usize>,
    pub points: Vec<(f64, f64)>,
}

impl Contour {
    pub fn is_hole(&self) -> bool {
        self.border_type == BorderType::Hole
    }
}

fn dir_index(from: (i32, i32), to: (i32, i32)) -> usize {
    let d = (to.0 - from.0, to.1 - from.1);
    DIRS.iter()
        .position(|&off| off == d)
        .expect("from/to must be 8-adjacent")
}

fn search_clockwise_opt(f: &[Vec<i32>], i: i32, j: i32, start_idx: usize) -> Option<(usize, i32, i32)> {
    for k in 0..8 {
        let idx = (start_idx + k) % 8;
        let (di, dj) = DIRS[idx];
        let (ni, nj) = (i + di, j + dj);
        if f[ni as usize][nj as usize] != 0 {
            return Some((idx, ni, nj));
        }
    }
    None
}

/// Like [`search_clockwise_opt`] but assumes a match always exists (true
/// once a border is already under way, since the pixel we arrived from
/// is itself a foreground neighbour). Also reports whether the pixel
/// immediately to the east was examined and found to be background,
/// which decides the sign used to mark the current pixel.
fn search_clockwise_tracking(f: &[Vec<i32>], i: i32, j: i32, start_idx: usize) -> (i32, i32, bool) {
    let mut east_examined_zero = false;
    for k in 0..8 {
        let idx = (start_idx + k) % 8;
        let (di, dj) = DIRS[idx];
        let (ni, nj) = (i + di, j + dj);
        let v = f[ni as usize][nj as usize];
        if idx == 0 && v == 0 {
            east_examined_zero = true;
        }
        if v != 0 {
            return (ni, nj, east_examined_zero);
        }
    }
    unreachable!("border-following invariant violated: no foreground neighbour found")
}

/// Follows one border starting at `(i, j)`, having arrived there because
/// `(i2, j2)` is its background-side starting neighbour. Marks visited
/// pixels with `+-nbd` in `f` and returns the ordered pixel sequence.
fn follow_border(f: &mut [Vec<i32>], i: i32, j: i32, i2: i32, j2: i32, nbd: i32) -> Vec<(i32, i32)> {
    let mut points = Vec::new();

    let first = search_clockwise_opt(f, i, j, dir_index((i, j), (i2, j2)));
    let Some((_, i1, j1)) = first else {
        f[i as usize][j as usize] = -nbd;
        points.push((i, j));
        return points;
    };

    let mut prev = (i1, j1);
    let mut cur = (i, j);

    loop {
        let start_idx = (dir_index(cur, prev) + 1) % 8;
        let (ni, nj, east_zero) = search_clockwise_tracking(f, cur.0, cur.1, start_idx);

        if east_zero {
            f[cur.0 as usize][cur.1 as usize] = -nbd;
        } else if f[cur.0 as usize][cur.1 as usize] == 1 {
            f[cur.0 as usize][cur.1 as usize] = nbd;
        }
        points.push(cur);

        if (ni, nj) == (i, j) && cur == (i1, j1) {
            break;
        }

        prev = cur;
        cur = (ni, nj);
    }

    points
}

fn border_type_of(borders: &HashMap<i32, (BorderType, i32)>, nbd: i32) -> BorderType {
    if nbd == 1 {
        // The picture frame (background) is the implicit root; treating
        // it as a hole border makes the first real outer border parent
        // to the frame itself, per Table 1 of the original algorithm.
        BorderType::Hole
    } else {
        borders[&nbd].0
    }
}

fn parent_of(borders: &HashMap<i32, (BorderType, i32)>, nbd: i32) -> i32 {
    if nbd == 1 {
        1
    } else {
        borders[&nbd].1
    }
}

/// Traces every outer and hole border of a padded binary mask
/// (`true` = foreground, with at least a one-pixel `false` frame on
/// every side, as produced by [`crate::region::Region::padded_mask`]).
/// Coordinates in the returned contours are in the mask's own space
/// (including the padding); the caller is expected to translate them
/// back using the offset returned alongside the mask.
pub fn trace_borders(mask: &[Vec<bool>]) -> Vec<Contour> {
    let height = mask.len() as i32;
    let width = if height > 0 { mask[0].len() as i32 } else { 0 };

    let mut f: Vec<Vec<i32>> = mask
        .iter()
        .map(|row| row.iter().map(|&b| i32::from(b)).collect())
        .collect();

    // borders[nbd] = (type, parent_nbd); nbd == 1 is the frame sentinel
    // and is never inserted (handled by border_type_of/parent_of above).
    let mut borders: HashMap<i32, (BorderType, i32)> = HashMap::new();
    let mut nbd = 1;
    let mut order: Vec<i32> = Vec::new();
    let mut point_lists: HashMap<i32, Vec<(i32, i32)>> = HashMap::new();

    for i in 0..height {
        let mut lnbd = 1;
        for j in 0..width {
            let cur = f[i as usize][j as usize];
            if cur == 0 {
                continue;
            }

            let is_outer_start = cur == 1 && f[i as usize][(j - 1) as usize] == 0;
            let is_hole_start = !is_outer_start && cur >= 1 && f[i as usize][(j + 1) as usize] == 0;

            if is_outer_start || is_hole_start {
                nbd += 1;
                let (border_type, from) = if is_outer_start {
                    (BorderType::Outer, (i, j - 1))
                } else {
                    if cur > 1 {
                        lnbd = cur;
                    }
                    (BorderType::Hole, (i, j + 1))
                };

                let lnbd_type = border_type_of(&borders, lnbd);
                let parent_nbd = match (border_type, lnbd_type) {
                    (BorderType::Outer, BorderType::Outer) => parent_of(&borders, lnbd),
                    (BorderType::Outer, BorderType::Hole) => lnbd,
                    (BorderType::Hole, BorderType::Outer) => lnbd,
                    (BorderType::Hole, BorderType::Hole) => parent_of(&borders, lnbd),
                };

                borders.insert(nbd, (border_type, parent_nbd));
                order.push(nbd);

                let points = follow_border(&mut f, i, j, from.0, from.1, nbd);
                point_lists.insert(nbd, points);
            }

            let v = f[i as usize][j as usize];
            if v != 1 {
                lnbd = v.abs();
            }
        }
    }

    let nbd_to_index: HashMap<i32, usize> = order.iter().enumerate().map(|(idx, &n)| (n, idx)).collect();

    order
        .into_iter()
        .map(|n| {
            let (border_type, parent_nbd) = borders[&n];
            let parent = if parent_nbd == 1 {
                None
            } else {
                nbd_to_index.get(&parent_nbd).copied()
            };
            let points = point_lists
                .remove(&n)
                .unwrap_or_default()
                .into_iter()
                .map(|(i, j)| (i as f64, j as f64))
                .collect();
            Contour { border_type, parent, points }
        })
        .collect()
}

/// Traces all borders of `region` and translates every point back from
/// the padded mask's coordinate space into original image coordinates.
pub fn trace_region_contours(region: &Region) -> Vec<Contour> {
    let (mask, offset_x, offset_y) = region.padded_mask();
    let mut contours = trace_borders(&mask);
    for c in &mut contours {
        for p in &mut c.points {
            p.0 += offset_y as f64;
            p.1 += offset_x as f64;
        }
    }
    // `(row, col)` internally; the rest of the pipeline works in `(x, y)`.
    for c in &mut contours {
        for p in &mut c.points {
            *p = (p.1, p.0);
        }
    }
    contours
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&str]) -> Vec<Vec<bool>> {
        rows.iter().map(|r| r.chars().map(|c| c == '#').collect()).collect()
    }

    #[test]
    fn single_pixel_region_yields_one_point() {
        let mask = mask_from_rows(&["000", "0#0", "000"]);
        let contours = trace_borders(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![(1.0, 1.0)]);
        assert_eq!(contours[0].border_type, BorderType::Outer);
    }

    #[test]
    fn filled_rectangle_has_one_outer_contour() {
        let mask = mask_from_rows(&[
            "000000",
            "0####0",
            "0####0",
            "0####0",
            "000000",
        ]);
        let contours = trace_borders(&mask);
        let outers: Vec<_> = contours.iter().filter(|c| c.border_type == BorderType::Outer).collect();
        assert_eq!(outers.len(), 1);
        // A 4x3 filled block's boundary ring has 2*(4+3)-4 = 10 cells.
        assert_eq!(outers[0].points.len(), 10);
    }

    #[test]
    fn ring_with_hole_produces_outer_and_hole_contours() {
        let rows = [
            "0000000",
            "0#####0",
            "0#000#0",
            "0#000#0",
            "0#####0",
            "0000000",
        ];
        let mask = mask_from_rows(&rows);
        let contours = trace_borders(&mask);
        let outer_count = contours.iter().filter(|c| c.border_type == BorderType::Outer).count();
        let hole_count = contours.iter().filter(|c| c.border_type == BorderType::Hole).count();
        assert_eq!(outer_count, 1);
        assert_eq!(hole_count, 1);
    }

    #[test]
    fn region_contours_translate_back_to_image_space() {
        use crate::flood_fill::flood_fill;
        use crate::image::Rgba8Image;
        use crate::region::RegionGraph;
        use rgb::RGBA8;

        let labels = vec![1, 1, 1, 1, 0, 1, 1, 1, 1];
        let img = Rgba8Image::filled(3, 3, RGBA8::new(0, 0, 0, 255)).unwrap();
        let (regions, region_label) = flood_fill(&img, &labels).unwrap();
        let graph = RegionGraph::build(&img, regions, &region_label).unwrap();

        let ring_region = graph.regions().iter().find(|r| r.area() == 8).unwrap();
        let contours = trace_region_contours(ring_region);
        assert!(contours.iter().any(|c| c.border_type == BorderType::Outer));

        for c in &contours {
            for &(x, y) in &c.points {
                assert!((0.0..3.0).contains(&x));
                assert!((0.0..3.0).contains(&y));
            }
        }
    }
}
