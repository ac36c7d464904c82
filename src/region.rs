// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The region adjacency graph: nodes are flat-colour regions produced by
//! [`crate::flood_fill`], edges are 8-connected adjacency. Implemented as
//! an arena (flat `Vec<Region>` keyed by id, neighbours stored as id
//! sets) rather than a cross-referenced pointer graph, per the crate's
//! design notes: merges zero out a region's area instead of deleting it,
//! and a compaction step rebuilds the arena afterwards.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::image::Rgba8Image;

/// One member pixel of a region: its original colour and integer
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub x: i32,
    pub y: i32,
}

/// A flat-colour region: a set of member pixels, a symmetric set of
/// neighbour ids, and cached summary statistics.
#[derive(Clone, Debug)]
pub struct Region {
    id: u32,
    pixels: Vec<Pixel>,
    neighbours: BTreeSet<u32>,
}

impl Region {
    pub fn new(id: u32, pixels: Vec<Pixel>) -> Self {
        Region { id, pixels, neighbours: BTreeSet::new() }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    #[inline]
    pub fn neighbours(&self) -> &BTreeSet<u32> {
        &self.neighbours
    }

    /// Area in pixels. A region with zero pixels is *dissolved*.
    #[inline]
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_dissolved(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Mean colour of the member pixels, rounded to the nearest 8-bit
    /// value. Panics-free on an empty region by returning black.
    pub fn mean_color(&self) -> (u8, u8, u8) {
        if self.pixels.is_empty() {
            return (0, 0, 0);
        }
        let n = self.pixels.len() as f64;
        let (mut r, mut g, mut b) = (0.0, 0.0, 0.0);
        for p in &self.pixels {
            r += p.r as f64;
            g += p.g as f64;
            b += p.b as f64;
        }
        (
            (r / n).round() as u8,
            (g / n).round() as u8,
            (b / n).round() as u8,
        )
    }

    /// Centroid of the member pixels in image coordinates.
    pub fn centroid(&self) -> (f64, f64) {
        if self.pixels.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.pixels.len() as f64;
        let (mut x, mut y) = (0.0, 0.0);
        for p in &self.pixels {
            x += p.x as f64;
            y += p.y as f64;
        }
        (x / n, y / n)
    }

    fn bounding_box(&self) -> (i32, i32, i32, i32) {
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;
        for p in &self.pixels {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        (min_x, min_y, max_x, max_y)
    }

    /// A binary mask (`true` = member) over this region's bounding box,
    /// padded by one pixel of `false` on every side. Used by the Suzuki-
    /// Abe tracer, which expects a one-pixel zero frame. Returns the mask
    /// together with the (x, y) offset of the mask's origin `(1, 1)`
    /// relative to image coordinates.
    pub fn padded_mask(&self) -> (Vec<Vec<bool>>, i32, i32) {
        if self.pixels.is_empty() {
            return (vec![vec![false; 1]], 0, 0);
        }
        let (min_x, min_y, max_x, max_y) = self.bounding_box();
        let w = (max_x - min_x + 1) as usize;
        let h = (max_y - min_y + 1) as usize;
        let mut mask = vec![vec![false; w + 2]; h + 2];
        for p in &self.pixels {
            let mx = (p.x - min_x) as usize + 1;
            let my = (p.y - min_y) as usize + 1;
            mask[my][mx] = true;
        }
        (mask, min_x - 1, min_y - 1)
    }
}

/// The region adjacency graph. Holds the arena of regions and exposes
/// merge operations that keep the `neighbours` sets symmetric and
/// self-loop free.
pub struct RegionGraph {
    regions: Vec<Region>,
}

impl RegionGraph {
    /// Builds the graph from flood-fill output: discovers 8-connected
    /// adjacency edges between distinct region ids.
    pub fn build(img: &Rgba8Image, mut regions: Vec<Region>, region_label: &[i32]) -> Result<Self> {
        let width = img.width() as i64;
        let height = img.height() as i64;
        if region_label.len() != (width * height) as usize {
            return Err(Error::invalid("region_label length does not match image size"));
        }

        let mut edges: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); regions.len()];

        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) as usize;
                let a = region_label[idx];
                if a < 0 {
                    continue;
                }
                for (dx, dy) in [
                    (-1, -1), (0, -1), (1, -1),
                    (-1, 0), (1, 0),
                    (-1, 1), (0, 1), (1, 1),
                ] {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || ny < 0 || nx >= width || ny >= height {
                        continue;
                    }
                    let b = region_label[(ny * width + nx) as usize];
                    if b >= 0 && b != a {
                        edges[a as usize].insert(b as u32);
                    }
                }
            }
        }

        for (region, nbrs) in regions.iter_mut().zip(edges.into_iter()) {
            region.neighbours = nbrs;
        }

        Ok(RegionGraph { regions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: u32) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        self.regions.iter().position(|r| r.id == id)
    }

    /// Merges every region with area `< min_area` into a neighbour,
    /// repeatedly, until every surviving region has area `>= min_area`
    /// (or only one region remains). Neighbours are ranked by
    /// `area + 10 * colour_distance_to_self` ascending, ties broken by
    /// lower id.
    pub fn merge_small_regions(&mut self, min_area: usize) {
        loop {
            let undersized: Vec<u32> = self
                .regions
                .iter()
                .filter(|r| !r.is_dissolved() && r.area() < min_area)
                .map(|r| r.id)
                .collect();

            if undersized.is_empty() || self.regions.iter().filter(|r| !r.is_dissolved()).count() <= 1 {
                break;
            }

            let mut any_merged = false;
            for id in undersized {
                let Some(idx) = self.index_of(id) else { continue };
                if self.regions[idx].is_dissolved() || self.regions[idx].area() >= min_area {
                    continue;
                }
                if let Some(target) = self.best_merge_target(idx) {
                    log::trace!(
                        "merging region {} (area {}) into {}",
                        self.regions[idx].id,
                        self.regions[idx].area(),
                        self.regions[target].id,
                    );
                    self.merge_into(idx, target);
                    any_merged = true;
                }
            }

            self.compact();

            if !any_merged {
                break;
            }
        }
    }

    fn best_merge_target(&self, idx: usize) -> Option<usize> {
        let region = &self.regions[idx];
        let own_color = region.mean_color();
        let own_color = (own_color.0 as f64, own_color.1 as f64, own_color.2 as f64);

        let mut best: Option<(f64, u32)> = None;
        for &nbr_id in region.neighbours() {
            let Some(nbr_idx) = self.index_of(nbr_id) else { continue };
            let nbr = &self.regions[nbr_idx];
            if nbr.is_dissolved() {
                continue;
            }
            let nbr_color = nbr.mean_color();
            let nbr_color = (nbr_color.0 as f64, nbr_color.1 as f64, nbr_color.2 as f64);
            let color_dist = crate::color::lab_distance_sq(own_color, nbr_color).sqrt();
            let score = nbr.area() as f64 + 10.0 * color_dist;

            best = Some(match best {
                Some((best_score, best_id))
                    if best_score < score || (best_score == score && best_id < nbr_id) =>
                {
                    (best_score, best_id)
                }
                _ => (score, nbr_id),
            });
        }

        best.and_then(|(_, id)| self.index_of(id))
    }

    /// Merges `src` into `dst`: transfers pixels, re-targets edges to
    /// point at `dst`, removes the `src <-> dst` edge, and leaves `src`
    /// dissolved (zero pixels, empty neighbour set).
    fn merge_into(&mut self, src: usize, dst: usize) {
        let src_id = self.regions[src].id;
        let dst_id = self.regions[dst].id;

        let moved_pixels = std::mem::take(&mut self.regions[src].pixels);
        self.regions[dst].pixels.extend(moved_pixels);

        let src_neighbours = std::mem::take(&mut self.regions[src].neighbours);
        for nbr_id in src_neighbours {
            if nbr_id == dst_id {
                continue;
            }
            if let Some(nbr_idx) = self.index_of(nbr_id) {
                self.regions[nbr_idx].neighbours.remove(&src_id);
                if nbr_idx != dst {
                    self.regions[nbr_idx].neighbours.insert(dst_id);
                    self.regions[dst].neighbours.insert(nbr_id);
                }
            }
        }
        self.regions[dst].neighbours.remove(&src_id);
        self.regions[src].neighbours.clear();
    }

    /// Drops dissolved (area-zero) regions from the arena.
    fn compact(&mut self) {
        self.regions.retain(|r| !r.is_dissolved());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flood_fill::flood_fill;
    use rgb::RGBA8;

    fn checkerboard(w: u32, h: u32) -> (Rgba8Image, Vec<i32>) {
        let mut img = Rgba8Image::filled(w, h, RGBA8::new(0, 0, 0, 255)).unwrap();
        let mut labels = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let l = ((x + y) % 2) as i32;
                labels.push(l);
                img.set(x, y, RGBA8::new(if l == 0 { 0 } else { 255 }, 0, 0, 255));
            }
        }
        (img, labels)
    }

    #[test]
    fn adjacency_is_symmetric() {
        let (img, labels) = checkerboard(4, 4);
        let (regions, region_label) = flood_fill(&img, &labels).unwrap();
        let graph = RegionGraph::build(&img, regions, &region_label).unwrap();

        for region in graph.regions() {
            for &nbr_id in region.neighbours() {
                let nbr = graph.region(nbr_id).unwrap();
                assert!(nbr.neighbours().contains(&region.id()), "asymmetric edge");
                assert_ne!(nbr_id, region.id(), "self-loop");
            }
        }
    }

    #[test]
    fn merge_small_regions_enforces_min_area() {
        let (img, labels) = checkerboard(6, 6);
        let (regions, region_label) = flood_fill(&img, &labels).unwrap();
        let mut graph = RegionGraph::build(&img, regions, &region_label).unwrap();

        graph.merge_small_regions(4);

        let surviving: Vec<_> = graph.regions().iter().filter(|r| !r.is_dissolved()).collect();
        assert!(surviving.len() == 1 || surviving.iter().all(|r| r.area() >= 4));
    }

    #[test]
    fn merge_preserves_total_pixel_count() {
        let (img, labels) = checkerboard(8, 8);
        let (regions, region_label) = flood_fill(&img, &labels).unwrap();
        let mut graph = RegionGraph::build(&img, regions, &region_label).unwrap();
        let total_before: usize = graph.regions().iter().map(|r| r.area()).sum();

        graph.merge_small_regions(5);

        let total_after: usize = graph.regions().iter().map(|r| r.area()).sum();
        assert_eq!(total_before, total_after);
    }
}
