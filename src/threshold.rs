// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Intensity quantisers: fixed-bucket threshold, near-black threshold,
//! and the plain channel inversion named in the external interface table.

use crate::error::{Error, Result};
use crate::image::Rgba8Image;

#[inline]
fn quantise(v: u8, step: u32) -> u8 {
    if step == 0 {
        return v;
    }
    let bucket = v as u32 / step;
    let midpoint = bucket * step + step / 2;
    if midpoint > 255 {
        // Overflow into the 256th bucket: fall back to the previous
        // bucket's midpoint.
        let prev = bucket.saturating_sub(1);
        (prev * step + step / 2).min(255) as u8
    } else {
        midpoint as u8
    }
}

/// Maps each R/G/B channel through its bucket midpoint, with
/// `step = floor(255 / n)`. Alpha is untouched.
pub fn threshold_image(img: &mut Rgba8Image, n: u32) -> Result<()> {
    if n == 0 {
        return Err(Error::invalid("n must be > 0"));
    }
    let step = 255 / n;
    for p in img.pixels_mut() {
        p.r = quantise(p.r, step);
        p.g = quantise(p.g, step);
        p.b = quantise(p.b, step);
    }
    Ok(())
}

/// Sets any pixel whose R, G and B are all strictly less than `n` to
/// pure black, leaving all other pixels unchanged. Alpha is untouched.
pub fn black_threshold_image(img: &mut Rgba8Image, n: u32) -> Result<()> {
    if n == 0 {
        return Err(Error::invalid("n must be > 0"));
    }
    let n = n as i32;
    for p in img.pixels_mut() {
        if (p.r as i32) < n && (p.g as i32) < n && (p.b as i32) < n {
            p.r = 0;
            p.g = 0;
            p.b = 0;
        }
    }
    Ok(())
}

/// `c <- 255 - c` for R, G, B; alpha unchanged.
pub fn invert_image(img: &mut Rgba8Image) {
    for p in img.pixels_mut() {
        p.r = 255 - p.r;
        p.g = 255 - p.g;
        p.b = 255 - p.b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGBA8;

    #[test]
    fn threshold_matches_worked_example() {
        let mut img = Rgba8Image::filled(1, 1, RGBA8::new(10, 100, 200, 255)).unwrap();
        threshold_image(&mut img, 2).unwrap();
        let p = img.get(0, 0);
        assert_eq!((p.r, p.g, p.b, p.a), (63, 63, 190, 255));
    }

    #[test]
    fn threshold_rejects_zero_n() {
        let mut img = Rgba8Image::filled(1, 1, RGBA8::new(1, 2, 3, 255)).unwrap();
        assert!(threshold_image(&mut img, 0).is_err());
    }

    #[test]
    fn black_threshold_only_affects_dark_pixels() {
        let mut img = Rgba8Image::filled(1, 2, RGBA8::new(5, 5, 5, 255)).unwrap();
        img.set(0, 1, RGBA8::new(50, 5, 5, 200));
        black_threshold_image(&mut img, 10).unwrap();
        assert_eq!(img.get(0, 0), RGBA8::new(0, 0, 0, 255));
        assert_eq!(img.get(0, 1), RGBA8::new(50, 5, 5, 200));
    }

    #[test]
    fn invert_matches_worked_example() {
        let mut img = Rgba8Image::filled(1, 2, RGBA8::new(0, 0, 0, 255)).unwrap();
        img.set(0, 1, RGBA8::new(255, 255, 255, 0));
        invert_image(&mut img);
        assert_eq!(img.get(0, 0), RGBA8::new(255, 255, 255, 255));
        assert_eq!(img.get(0, 1), RGBA8::new(0, 0, 0, 0));
    }
}
