// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! K-means++ colour quantiser, in CIELAB or RGB space.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rgb::RGBA8;

use crate::color::ColorSpace;
use crate::error::{try_vec_with_capacity, Error, Result};
use crate::image::Rgba8Image;

type Vec3 = (f64, f64, f64);

fn pixel_to_vec3(p: RGBA8, space: ColorSpace) -> Vec3 {
    match space {
        ColorSpace::Rgb => (p.r as f64, p.g as f64, p.b as f64),
        ColorSpace::Lab => {
            let (l, a, b) = crate::color::srgb8_to_lab(p.r, p.g, p.b);
            (l, a, b)
        }
    }
}

fn vec3_to_rgb(v: Vec3, space: ColorSpace) -> (u8, u8, u8) {
    match space {
        ColorSpace::Rgb => (
            v.0.round().clamp(0.0, 255.0) as u8,
            v.1.round().clamp(0.0, 255.0) as u8,
            v.2.round().clamp(0.0, 255.0) as u8,
        ),
        ColorSpace::Lab => crate::color::lab_to_srgb8(v.0, v.1, v.2),
    }
}

#[inline]
fn dist_sq(a: Vec3, b: Vec3) -> f64 {
    crate::color::lab_distance_sq(a, b)
}

/// K-means++ seeding: pick the first centroid uniformly, then repeatedly
/// draw a point with probability proportional to its squared distance to
/// the nearest already-chosen centroid.
fn kmeans_plus_plus_init(points: &[Vec3], k: usize, rng: &mut StdRng) -> Vec<Vec3> {
    let mut centroids = Vec::with_capacity(k);
    let first = rng.gen_range(0..points.len());
    centroids.push(points[first]);

    let mut min_dist: Vec<f64> = points.iter().map(|p| dist_sq(*p, centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = min_dist.iter().sum();
        let chosen = if total <= 0.0 {
            // Every remaining point coincides with an existing centroid;
            // fall back to a uniform pick so we still reach k centroids.
            rng.gen_range(0..points.len())
        } else {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            let mut idx = points.len() - 1;
            for (i, d) in min_dist.iter().enumerate() {
                acc += *d;
                if acc >= target {
                    idx = i;
                    break;
                }
            }
            idx
        };

        let new_centroid = points[chosen];
        for (i, p) in points.iter().enumerate() {
            let d = dist_sq(*p, new_centroid);
            if d < min_dist[i] {
                min_dist[i] = d;
            }
        }
        centroids.push(new_centroid);
    }

    centroids
}

/// Recolours `img` into `k` flat-colour clusters. Returns the recoloured
/// image and a parallel `labels[y*width+x] in [0, k)` array. Alpha is
/// passed through verbatim.
pub fn kmeans(
    img: &Rgba8Image,
    k: u32,
    max_iter: u32,
    space: ColorSpace,
    seed: u64,
) -> Result<(Rgba8Image, Vec<i32>)> {
    if k == 0 {
        return Err(Error::invalid("k must be > 0"));
    }
    if max_iter == 0 {
        return Err(Error::invalid("max_iter must be > 0"));
    }

    let k = k as usize;
    let n = img.pixels().len();
    if n == 0 {
        return Err(Error::invalid("image has no pixels"));
    }

    let points: Vec<Vec3> = img.pixels().iter().map(|p| pixel_to_vec3(*p, space)).collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = kmeans_plus_plus_init(&points, k, &mut rng);

    let mut labels = try_vec_with_capacity(n, 0i32)?;

    for _ in 0..max_iter {
        let mut changed = false;

        for (i, p) in points.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = f64::MAX;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = dist_sq(*p, *centroid);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            if labels[i] != best as i32 {
                labels[i] = best as i32;
                changed = true;
            }
        }

        let mut sums = vec![(0.0f64, 0.0f64, 0.0f64); k];
        let mut counts = vec![0u64; k];
        for (i, p) in points.iter().enumerate() {
            let c = labels[i] as usize;
            sums[c].0 += p.0;
            sums[c].1 += p.1;
            sums[c].2 += p.2;
            counts[c] += 1;
        }
        for c in 0..k {
            if counts[c] > 0 {
                let n = counts[c] as f64;
                centroids[c] = (sums[c].0 / n, sums[c].1 / n, sums[c].2 / n);
            }
            // Dead centroid policy: an empty cluster keeps its previous
            // centroid unchanged.
        }

        if !changed {
            break;
        }
    }

    let mut out = img.clone();
    for (i, p) in out.pixels_mut().iter_mut().enumerate() {
        let c = labels[i] as usize;
        let (r, g, b) = vec3_to_rgb(centroids[c], space);
        p.r = r;
        p.g = g;
        p.b = b;
    }

    Ok((out, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_k_and_iter() {
        let img = Rgba8Image::filled(2, 2, RGBA8::new(0, 0, 0, 255)).unwrap();
        assert!(kmeans(&img, 0, 10, ColorSpace::Rgb, 1).is_err());
        assert!(kmeans(&img, 2, 0, ColorSpace::Rgb, 1).is_err());
    }

    #[test]
    fn two_colour_image_converges_exactly() {
        let mut img = Rgba8Image::filled(2, 2, RGBA8::new(0, 0, 0, 255)).unwrap();
        img.set(1, 0, RGBA8::new(255, 255, 255, 255));
        img.set(0, 1, RGBA8::new(0, 0, 0, 255));
        img.set(1, 1, RGBA8::new(255, 255, 255, 255));

        for seed in 0..8u64 {
            let (out, labels) = kmeans(&img, 2, 50, ColorSpace::Rgb, seed).unwrap();
            assert_eq!(out.pixels(), img.pixels());
            assert!(labels.iter().all(|&l| l == 0 || l == 1));
            assert_ne!(labels[0], labels[1]);
        }
    }

    #[test]
    fn reruns_with_same_seed_are_identical() {
        let mut img = Rgba8Image::filled(4, 4, RGBA8::new(0, 0, 0, 255)).unwrap();
        for y in 0..4u32 {
            for x in 0..4u32 {
                img.set(x, y, RGBA8::new((x * 60) as u8, (y * 60) as u8, 128, 255));
            }
        }
        let (out1, labels1) = kmeans(&img, 3, 25, ColorSpace::Lab, 42).unwrap();
        let (out2, labels2) = kmeans(&img, 3, 25, ColorSpace::Lab, 42).unwrap();
        assert_eq!(out1.pixels(), out2.pixels());
        assert_eq!(labels1, labels2);
    }

    #[test]
    fn labels_are_bounded() {
        let mut img = Rgba8Image::filled(5, 5, RGBA8::new(0, 0, 0, 255)).unwrap();
        for y in 0..5u32 {
            for x in 0..5u32 {
                img.set(x, y, RGBA8::new((x * 40) as u8, (y * 40) as u8, 10, 255));
            }
        }
        let (_, labels) = kmeans(&img, 4, 20, ColorSpace::Rgb, 7).unwrap();
        assert!(labels.iter().all(|&l| (0..4).contains(&l)));
    }
}
