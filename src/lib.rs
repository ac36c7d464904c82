// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Raster-to-vector "paint by numbers" conversion: quantises an RGBA
//! image into flat-colour regions and serialises them as a fitted-curve
//! SVG document.
//!
//! The pipeline, end to end: optional frequency-domain Gaussian blur or
//! bilateral pre-smoothing ([`blur`], [`bilateral`]), colour reduction
//! via k-means++ ([`kmeans`]), 4-connected region extraction
//! ([`flood_fill`], [`region`]), Suzuki-Abe border tracing ([`contour`]),
//! Savitzky-Golay contour smoothing ([`savitzky_golay`]), shared-border
//! coupling ([`coupling`]), quadratic-Bezier curve fitting ([`bezier`]),
//! and SVG serialisation ([`svg`]). [`pipeline::vectorize`] drives the
//! whole sequence starting from k-means; [`pipeline::labels_to_svg`]
//! drives region extraction through serialisation (C8-C14) over
//! externally supplied per-pixel labels, independent of how those labels
//! were produced. The individual stages remain public for callers who
//! want to compose their own pipeline or inspect intermediate results.

pub mod bezier;
pub mod bilateral;
pub mod blur;
pub mod color;
pub mod contour;
pub mod coupling;
pub mod error;
pub mod fft;
pub mod flood_fill;
pub mod image;
pub mod kmeans;
pub mod pipeline;
pub mod region;
pub mod savitzky_golay;
pub mod svg;
pub mod threshold;

pub use color::ColorSpace;
pub use error::{Error, ErrorKind, Result};
pub use image::Rgba8Image;
pub use pipeline::{labels_to_svg, vectorize, VectorizeOptions};
