// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Edge-preserving bilateral smoothing, in either sRGB or CIELAB space.

use crate::color::ColorSpace;
use crate::image::Rgba8Image;

const MAX_RADIUS: i64 = 50;

/// Smooths `img` in place with spatial deviation `sigma_s` and range
/// deviation `sigma_r`. A no-op if either deviation is non-positive.
///
/// The RGB path's range weight is `exp(-sqrt(dist_sq) / (2 * sigma_r^2))`
/// — the *distance*, not the squared distance, in the exponent, mirroring
/// the spatial weight's form with a single sigma. This matches the
/// behaviour of the reference implementation this crate was distilled
/// from, not the more common `exp(-dist_sq / (2 * sigma_r^2))` form.
pub fn bilateral_filter(img: &mut Rgba8Image, sigma_s: f64, sigma_r: f64, space: ColorSpace) {
    if sigma_s <= 0.0 || sigma_r <= 0.0 {
        return;
    }

    let radius = ((3.0 * sigma_s).ceil() as i64).min(MAX_RADIUS).max(0);

    let diameter = (2 * radius + 1) as usize;
    let mut spatial = vec![0.0f64; diameter * diameter];
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let w = (-((dx * dx + dy * dy) as f64) / (2.0 * sigma_s * sigma_s)).exp();
            let idx = ((dy + radius) * diameter as i64 + (dx + radius)) as usize;
            spatial[idx] = w;
        }
    }

    match space {
        ColorSpace::Rgb => filter_rgb(img, radius, sigma_r, &spatial, diameter),
        ColorSpace::Lab => filter_lab(img, radius, sigma_r, &spatial, diameter),
    }
}

const RGB_MAX_DIST_SQ: usize = 195_075; // 255^2 * 3

fn range_lut_rgb(sigma_r: f64) -> Vec<f64> {
    (0..=RGB_MAX_DIST_SQ)
        .map(|d| (-(d as f64).sqrt() / (2.0 * sigma_r * sigma_r)).exp())
        .collect()
}

fn filter_rgb(img: &mut Rgba8Image, radius: i64, sigma_r: f64, spatial: &[f64], diameter: usize) {
    let width = img.width();
    let height = img.height();
    let lut = range_lut_rgb(sigma_r);
    let src = img.clone();

    for y in 0..height {
        for x in 0..width {
            let centre = src.get(x, y);
            let (mut sum_r, mut sum_g, mut sum_b, mut sum_w) = (0.0, 0.0, 0.0, 0.0);

            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let np = src.get_clamped(x as i64 + dx, y as i64 + dy);
                    let dr = centre.r as i32 - np.r as i32;
                    let dg = centre.g as i32 - np.g as i32;
                    let db = centre.b as i32 - np.b as i32;
                    let dist_sq = (dr * dr + dg * dg + db * db) as usize;

                    let sidx = ((dy + radius) * diameter as i64 + (dx + radius)) as usize;
                    let w = spatial[sidx] * lut[dist_sq];

                    sum_r += np.r as f64 * w;
                    sum_g += np.g as f64 * w;
                    sum_b += np.b as f64 * w;
                    sum_w += w;
                }
            }

            let out = if sum_w > 0.0 {
                rgb::RGBA8::new(
                    (sum_r / sum_w).round().clamp(0.0, 255.0) as u8,
                    (sum_g / sum_w).round().clamp(0.0, 255.0) as u8,
                    (sum_b / sum_w).round().clamp(0.0, 255.0) as u8,
                    centre.a,
                )
            } else {
                centre
            };
            img.set(x, y, out);
        }
    }
}

fn filter_lab(img: &mut Rgba8Image, radius: i64, sigma_r: f64, spatial: &[f64], diameter: usize) {
    let width = img.width();
    let height = img.height();
    let laba = img.to_laba();

    let get = |x: i64, y: i64| -> crate::image::Laba {
        let x = x.clamp(0, width as i64 - 1) as u32;
        let y = y.clamp(0, height as i64 - 1) as u32;
        laba[(y * width + x) as usize]
    };

    let mut out = laba.clone();

    for y in 0..height {
        for x in 0..width {
            let centre = get(x as i64, y as i64);
            let (mut sum_l, mut sum_a, mut sum_b, mut sum_w) = (0.0, 0.0, 0.0, 0.0);

            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let np = get(x as i64 + dx, y as i64 + dy);
                    let dist = crate::color::lab_distance_sq(
                        (centre.l, centre.a, centre.b),
                        (np.l, np.a, np.b),
                    )
                    .sqrt();
                    let range_w = (-dist / (2.0 * sigma_r * sigma_r)).exp();

                    let sidx = ((dy + radius) * diameter as i64 + (dx + radius)) as usize;
                    let w = spatial[sidx] * range_w;

                    sum_l += np.l * w;
                    sum_a += np.a * w;
                    sum_b += np.b * w;
                    sum_w += w;
                }
            }

            let idx = (y * width + x) as usize;
            if sum_w > 0.0 {
                out[idx] = crate::image::Laba {
                    l: sum_l / sum_w,
                    a: sum_a / sum_w,
                    b: sum_b / sum_w,
                    alpha: centre.alpha,
                };
            } else {
                out[idx] = centre;
            }
        }
    }

    if let Ok(converted) = crate::image::laba_buffer_to_rgba8(&out, width, height) {
        img.pixels_mut().copy_from_slice(converted.pixels());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGBA8;

    #[test]
    fn constant_image_is_idempotent_rgb() {
        let mut img = Rgba8Image::filled(6, 6, RGBA8::new(80, 140, 200, 255)).unwrap();
        let before = img.clone();
        bilateral_filter(&mut img, 2.0, 30.0, ColorSpace::Rgb);
        assert_eq!(before.pixels(), img.pixels());
    }

    #[test]
    fn constant_image_is_idempotent_lab() {
        let mut img = Rgba8Image::filled(6, 6, RGBA8::new(80, 140, 200, 255)).unwrap();
        let before = img.clone();
        bilateral_filter(&mut img, 2.0, 30.0, ColorSpace::Lab);
        for (a, b) in before.pixels().iter().zip(img.pixels().iter()) {
            assert!((a.r as i32 - b.r as i32).abs() <= 1);
            assert!((a.g as i32 - b.g as i32).abs() <= 1);
            assert!((a.b as i32 - b.b as i32).abs() <= 1);
        }
    }

    #[test]
    fn non_positive_params_are_noop() {
        let mut img = Rgba8Image::filled(4, 4, RGBA8::new(1, 2, 3, 255)).unwrap();
        let before = img.clone();
        bilateral_filter(&mut img, 0.0, 10.0, ColorSpace::Rgb);
        assert_eq!(before.pixels(), img.pixels());
        bilateral_filter(&mut img, 10.0, 0.0, ColorSpace::Rgb);
        assert_eq!(before.pixels(), img.pixels());
    }

    #[test]
    fn alpha_is_copied_from_centre() {
        let mut pixels = vec![RGBA8::new(0, 0, 0, 10); 9];
        pixels[4] = RGBA8::new(255, 255, 255, 99);
        let mut img = Rgba8Image::filled(3, 3, RGBA8::new(0, 0, 0, 10)).unwrap();
        img.pixels_mut().copy_from_slice(&pixels);
        bilateral_filter(&mut img, 1.0, 20.0, ColorSpace::Rgb);
        assert_eq!(img.get(1, 1).a, 99);
    }
}
