// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Iterative radix-2 Danielson-Lanczos FFT, used by the frequency-domain
//! Gaussian blur. Reimplemented rather than pulled from a crate because
//! the blur kernel needs to apply a gain directly on the frequency-domain
//! buffer between the forward and inverse passes.

use std::f64::consts::PI;

/// A double-precision complex number.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    #[inline]
    pub const fn new(re: f64, im: f64) -> Self {
        Complex64 { re, im }
    }

    #[inline]
    fn mul(self, rhs: Complex64) -> Complex64 {
        Complex64::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }

    #[inline]
    fn add(self, rhs: Complex64) -> Complex64 {
        Complex64::new(self.re + rhs.re, self.im + rhs.im)
    }

    #[inline]
    fn sub(self, rhs: Complex64) -> Complex64 {
        Complex64::new(self.re - rhs.re, self.im - rhs.im)
    }
}

#[inline]
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

#[inline]
pub fn next_power_of_two(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut p = 1usize;
    while p < n {
        p <<= 1;
    }
    p
}

/// In-place bit-reversal permutation of `buf`. `buf.len()` must be a
/// power of two.
fn bit_reverse_permute(buf: &mut [Complex64]) {
    let n = buf.len();
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = (i as u32).reverse_bits() >> (32 - bits);
        let j = j as usize;
        if j > i {
            buf.swap(i, j);
        }
    }
}

/// In-place iterative Danielson-Lanczos FFT. `sign` is `-1.0` for the
/// forward transform, `1.0` for the inverse (the inverse does **not**
/// divide by `n` here; see [`ifft`]).
fn fft_core(buf: &mut [Complex64], sign: f64) {
    let n = buf.len();
    if n <= 1 {
        return;
    }
    debug_assert!(is_power_of_two(n));

    bit_reverse_permute(buf);

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle_step = sign * 2.0 * PI / len as f64;
        for start in (0..n).step_by(len) {
            for j in 0..half {
                let w = Complex64::new((angle_step * j as f64).cos(), (angle_step * j as f64).sin());
                let u = buf[start + j];
                let v = buf[start + j + half].mul(w);
                buf[start + j] = u.add(v);
                buf[start + j + half] = u.sub(v);
            }
        }
        len <<= 1;
    }
}

/// Forward 1D FFT, in place. Length must be a power of two.
pub fn fft(buf: &mut [Complex64]) {
    fft_core(buf, -1.0);
}

/// Inverse 1D FFT, in place, including the `1/n` normalisation. Length
/// must be a power of two.
pub fn ifft(buf: &mut [Complex64]) {
    fft_core(buf, 1.0);
    let n = buf.len() as f64;
    for c in buf.iter_mut() {
        c.re /= n;
        c.im /= n;
    }
}

/// A zero-padded 2D complex buffer, row-major, both dimensions a power
/// of two.
pub struct Complex2D {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Complex64>,
}

impl Complex2D {
    /// Embeds `src` (row-major, `src_w * src_h` real samples) into a new
    /// buffer zero-padded up to the next power of two in each dimension,
    /// with the original content anchored at the origin.
    pub fn from_real(src: &[f64], src_w: usize, src_h: usize) -> Self {
        let width = next_power_of_two(src_w);
        let height = next_power_of_two(src_h);
        let mut data = vec![Complex64::default(); width * height];
        for y in 0..src_h {
            for x in 0..src_w {
                data[y * width + x] = Complex64::new(src[y * src_w + x], 0.0);
            }
        }
        Complex2D { width, height, data }
    }

    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [Complex64] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    fn column(&self, x: usize) -> Vec<Complex64> {
        (0..self.height).map(|y| self.data[y * self.width + x]).collect()
    }

    fn set_column(&mut self, x: usize, col: &[Complex64]) {
        for (y, c) in col.iter().enumerate() {
            self.data[y * self.width + x] = *c;
        }
    }

    /// Separable forward 2D FFT: every row, then every column.
    pub fn fft2d(&mut self) {
        for y in 0..self.height {
            fft(self.row_mut(y));
        }
        for x in 0..self.width {
            let mut col = self.column(x);
            fft(&mut col);
            self.set_column(x, &col);
        }
    }

    /// Separable inverse 2D FFT: every row, then every column, each
    /// normalised by its own length (matching the 1D `ifft` contract).
    pub fn ifft2d(&mut self) {
        for y in 0..self.height {
            ifft(self.row_mut(y));
        }
        for x in 0..self.width {
            let mut col = self.column(x);
            ifft(&mut col);
            self.set_column(x, &col);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_helpers() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(2));
        assert!(is_power_of_two(1024));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(3));
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(256), 256);
    }

    #[test]
    fn fft_ifft_round_trip_random_1d() {
        let mut rng_state = 0x2545F4914F6CDD1Du64;
        let mut next = || {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;
            (rng_state >> 11) as f64 / (1u64 << 53) as f64
        };

        let n = 64;
        let original: Vec<Complex64> = (0..n).map(|_| Complex64::new(next() * 2.0 - 1.0, 0.0)).collect();
        let mut buf = original.clone();
        fft(&mut buf);
        ifft(&mut buf);

        for (a, b) in original.iter().zip(buf.iter()) {
            assert!((a.re - b.re).abs() < 1e-9);
            assert!((a.im - b.im).abs() < 1e-9);
        }
    }

    #[test]
    fn fft2d_ifft2d_round_trip() {
        let w = 17;
        let h = 9;
        let src: Vec<f64> = (0..w * h).map(|i| (i as f64 * 0.37).sin()).collect();
        let mut buf = Complex2D::from_real(&src, w, h);
        buf.fft2d();
        buf.ifft2d();

        for y in 0..h {
            for x in 0..w {
                let c = buf.data[y * buf.width + x];
                let expected = src[y * w + x];
                assert!((c.re - expected).abs() < 1e-9, "mismatch at {x},{y}");
            }
        }
    }
}
