// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Frequency-domain Gaussian blur: per-channel FFT, a Gaussian gain
//! applied in frequency, inverse FFT, clamp back to 8-bit.

use std::f64::consts::PI;

use crate::fft::Complex2D;
use crate::image::Rgba8Image;

/// Maps a frequency-domain index to its signed frequency using the
/// "DC at corner" convention: `f(k) = k/dim` for `k <= dim/2`, else
/// `(k - dim)/dim`.
#[inline]
fn frequency(k: usize, dim: usize) -> f64 {
    if k <= dim / 2 {
        k as f64 / dim as f64
    } else {
        (k as f64 - dim as f64) / dim as f64
    }
}

/// Blurs the R, G, B channels of `img` in place with standard deviation
/// `sigma` (in pixels). Alpha is untouched. A no-op if `sigma <= 0` or
/// either dimension is zero.
pub fn gaussian_blur_fft(img: &mut Rgba8Image, sigma: f64) {
    if sigma <= 0.0 || img.width() == 0 || img.height() == 0 {
        return;
    }

    let width = img.width() as usize;
    let height = img.height() as usize;

    for channel in 0..3 {
        let src: Vec<f64> = img
            .pixels()
            .iter()
            .map(|p| match channel {
                0 => p.r as f64,
                1 => p.g as f64,
                _ => p.b as f64,
            })
            .collect();

        let mut buf = Complex2D::from_real(&src, width, height);
        buf.fft2d();

        let two_pi_sq_sigma_sq = 2.0 * PI * PI * sigma * sigma;
        for y in 0..buf.height {
            let fy = frequency(y, buf.height);
            for x in 0..buf.width {
                let fx = frequency(x, buf.width);
                let gain = (-two_pi_sq_sigma_sq * (fx * fx + fy * fy)).exp();
                let idx = y * buf.width + x;
                buf.data[idx].re *= gain;
                buf.data[idx].im *= gain;
            }
        }

        buf.ifft2d();

        for y in 0..height {
            for x in 0..width {
                let value = buf.data[y * buf.width + x].re.round().clamp(0.0, 255.0) as u8;
                let p = &mut img.pixels_mut()[y * width + x];
                match channel {
                    0 => p.r = value,
                    1 => p.g = value,
                    _ => p.b = value,
                }
            }
        }
    }
}
