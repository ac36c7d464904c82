// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Row-major pixel buffers shared by every stage of the pipeline.

use rgb::RGBA8;

use crate::error::{Error, Result};

/// A single CIELAB pixel. `l` is `[0, 100]`, `a`/`b` are unbounded, `alpha`
/// is carried through unchanged from the source image's `[0, 255]` alpha.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Laba {
    pub l: f64,
    pub a: f64,
    pub b: f64,
    pub alpha: f64,
}

/// An owned, row-major 8-bit RGBA image.
#[derive(Clone, Debug)]
pub struct Rgba8Image {
    width: u32,
    height: u32,
    pixels: Vec<RGBA8>,
}

impl Rgba8Image {
    /// Builds an image from a flat `RGBA` byte slice, checking
    /// `len == width * height * 4`.
    pub fn from_bytes(data: &[u8], width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid("width and height must be positive"));
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(Error::invalid(format!(
                "buffer length {} does not match width*height*4 ({})",
                data.len(),
                expected
            )));
        }

        let pixels = data
            .chunks_exact(4)
            .map(|c| RGBA8::new(c[0], c[1], c[2], c[3]))
            .collect();

        Ok(Rgba8Image { width, height, pixels })
    }

    pub fn filled(width: u32, height: u32, fill: RGBA8) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid("width and height must be positive"));
        }
        Ok(Rgba8Image {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[RGBA8] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [RGBA8] {
        &mut self.pixels
    }

    /// Reads a pixel, clamping out-of-bounds coordinates to the edge.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> RGBA8 {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.pixels[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> RGBA8 {
        self.pixels[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, p: RGBA8) {
        let idx = (y * self.width + x) as usize;
        self.pixels[idx] = p;
    }

    /// Converts the whole image to a CIELAB buffer (D65), alpha carried
    /// through as `[0, 255]`.
    pub fn to_laba(&self) -> Vec<Laba> {
        self.pixels
            .iter()
            .map(|p| {
                let (l, a, b) = crate::color::srgb8_to_lab(p.r, p.g, p.b);
                Laba { l, a, b, alpha: p.a as f64 }
            })
            .collect()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            out.extend_from_slice(&[p.r, p.g, p.b, p.a]);
        }
        out
    }
}

/// Builds an `Rgba8Image` from a LABAf buffer, converting each pixel back
/// to sRGB. Used by the CIELAB branches of the bilateral filter and the
/// k-means quantiser.
pub fn laba_buffer_to_rgba8(buf: &[Laba], width: u32, height: u32) -> Result<Rgba8Image> {
    let mut img = Rgba8Image::filled(width, height, RGBA8::new(0, 0, 0, 0))?;
    for (p, laba) in img.pixels_mut().iter_mut().zip(buf.iter()) {
        let (r, g, b) = crate::color::lab_to_srgb8(laba.l, laba.a, laba.b);
        *p = RGBA8::new(r, g, b, laba.alpha.round().clamp(0.0, 255.0) as u8);
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer_length() {
        let err = Rgba8Image::from_bytes(&[0u8; 3], 1, 1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(Rgba8Image::from_bytes(&[0u8; 4], 0, 1).is_err());
        assert!(Rgba8Image::from_bytes(&[0u8; 4], 1, 0).is_err());
    }

    #[test]
    fn round_trips_bytes() {
        let data = [10, 20, 30, 255, 1, 2, 3, 4];
        let img = Rgba8Image::from_bytes(&data, 2, 1).unwrap();
        assert_eq!(img.to_bytes(), data);
    }

    #[test]
    fn clamped_access_replicates_edges() {
        let data = [10, 20, 30, 255, 1, 2, 3, 4];
        let img = Rgba8Image::from_bytes(&data, 2, 1).unwrap();
        assert_eq!(img.get_clamped(-5, 0), img.get(0, 0));
        assert_eq!(img.get_clamped(50, 50), img.get(1, 0));
    }
}
