// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! 4-connected flood-fill labelling over equal-label pixels.

use std::collections::VecDeque;

use crate::error::{try_vec_with_capacity, Error, Result};
use crate::image::Rgba8Image;
use crate::region::{Pixel, Region};

const UNASSIGNED: i32 = -1;

/// Scans `input_labels` (e.g. the output of [`crate::kmeans::kmeans`]) in
/// row-major order and groups 4-connected runs of pixels sharing the
/// same input label into regions, each with a fresh id in discovery
/// order. Returns the regions and a parallel `region_label` array.
pub fn flood_fill(img: &Rgba8Image, input_labels: &[i32]) -> Result<(Vec<Region>, Vec<i32>)> {
    let width = img.width() as i64;
    let height = img.height() as i64;
    let len = (width * height) as usize;

    if input_labels.len() != len {
        return Err(Error::invalid("input_labels length does not match image size"));
    }

    let mut region_label = try_vec_with_capacity(len, UNASSIGNED)?;
    let mut regions = Vec::new();

    for start in 0..len {
        if region_label[start] != UNASSIGNED {
            continue;
        }

        let region_id = regions.len() as u32;
        let target = input_labels[start];
        let mut members = Vec::new();

        let mut queue = VecDeque::new();
        queue.push_back(start);
        region_label[start] = region_id as i32;

        while let Some(idx) = queue.pop_front() {
            let x = (idx as i64) % width;
            let y = (idx as i64) / width;
            let p = img.get(x as u32, y as u32);
            members.push(Pixel { r: p.r, g: p.g, b: p.b, x: x as i32, y: y as i32 });

            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= width || ny >= height {
                    continue;
                }
                let nidx = (ny * width + nx) as usize;
                if region_label[nidx] == UNASSIGNED && input_labels[nidx] == target {
                    region_label[nidx] = region_id as i32;
                    queue.push_back(nidx);
                }
            }
        }

        regions.push(Region::new(region_id, members));
    }

    Ok((regions, region_label))
}
