// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! sRGB <-> CIE L*a*b* (D65) conversion.

use crate::error::{Error, Result};

/// D65 reference white, normalised so `Yn == 1.0`.
const XN: f64 = 0.95047;
const YN: f64 = 1.0;
const ZN: f64 = 1.08883;

const DELTA: f64 = 6.0 / 29.0;

/// Which colour space a distance-based operation (bilateral filter,
/// k-means) should work in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Lab,
    Rgb,
}

impl ColorSpace {
    /// Decodes the wire-level colour-space code used by the external
    /// interfaces in the specification: `0 = CIELAB`, `1 = RGB`.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(ColorSpace::Lab),
            1 => Ok(ColorSpace::Rgb),
            other => Err(Error::invalid(format!("unknown colour-space code {other}"))),
        }
    }
}

#[inline]
fn inverse_gamma(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn gamma(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    let delta3 = DELTA * DELTA * DELTA;
    if t > delta3 {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(t: f64) -> f64 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 16.0 / 116.0)
    }
}

/// Converts one 8-bit sRGB pixel to `(L, a, b)`.
pub fn srgb8_to_lab(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = inverse_gamma((r as f64 / 255.0).clamp(0.0, 1.0));
    let g = inverse_gamma((g as f64 / 255.0).clamp(0.0, 1.0));
    let b = inverse_gamma((b as f64 / 255.0).clamp(0.0, 1.0));

    // sRGB -> XYZ, D65.
    let x = r * 0.4124564 + g * 0.3575761 + b * 0.1804375;
    let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
    let z = r * 0.0193339 + g * 0.1191920 + b * 0.9503041;

    let fx = lab_f(x / XN);
    let fy = lab_f(y / YN);
    let fz = lab_f(z / ZN);

    let l = (116.0 * fy - 16.0).clamp(0.0, 100.0);
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);
    (l, a, b)
}

/// Converts one `(L, a, b)` triple back to 8-bit sRGB, clamping
/// out-of-gamut results to `[0, 255]`.
pub fn lab_to_srgb8(l: f64, a: f64, b: f64) -> (u8, u8, u8) {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = XN * lab_f_inv(fx);
    let y = YN * lab_f_inv(fy);
    let z = ZN * lab_f_inv(fz);

    let r = x * 3.2404542 + y * -1.5371385 + z * -0.4985314;
    let g = x * -0.9692660 + y * 1.8760108 + z * 0.0415560;
    let b = x * 0.0556434 + y * -0.2040259 + z * 1.0572252;

    let to_u8 = |c: f64| (gamma(c.clamp(0.0, 1.0)) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}

/// Squared Euclidean distance between two `(L, a, b)` triples.
#[inline]
pub fn lab_distance_sq(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    let dl = a.0 - b.0;
    let da = a.1 - b.1;
    let db = a.2 - b.2;
    dl * dl + da * da + db * db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_within_one_lsb() {
        for r in (0..=255u16).step_by(17) {
            for g in (0..=255u16).step_by(17) {
                for b in (0..=255u16).step_by(17) {
                    let (l, a, bb) = srgb8_to_lab(r as u8, g as u8, b as u8);
                    let (r2, g2, b2) = lab_to_srgb8(l, a, bb);
                    assert!((r as i32 - r2 as i32).abs() <= 1, "r {} -> {}", r, r2);
                    assert!((g as i32 - g2 as i32).abs() <= 1, "g {} -> {}", g, g2);
                    assert!((b as i32 - b2 as i32).abs() <= 1, "b {} -> {}", b, b2);
                }
            }
        }
    }

    #[test]
    fn black_and_white_are_exact_landmarks() {
        use float_cmp::approx_eq;

        let (l, a, b) = srgb8_to_lab(0, 0, 0);
        assert!(approx_eq!(f64, l, 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, a, 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, b, 0.0, epsilon = 1e-6));

        let (l, _, _) = srgb8_to_lab(255, 255, 255);
        assert!(approx_eq!(f64, l, 100.0, epsilon = 1e-3));
    }

    #[test]
    fn l_is_clamped_to_0_100() {
        let (l, _, _) = srgb8_to_lab(255, 255, 255);
        assert!(l <= 100.0);
    }

    #[test]
    fn colorspace_code_decoding() {
        assert_eq!(ColorSpace::from_code(0).unwrap(), ColorSpace::Lab);
        assert_eq!(ColorSpace::from_code(1).unwrap(), ColorSpace::Rgb);
        assert!(ColorSpace::from_code(2).is_err());
    }
}
