// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Orchestrates the full pipeline: optional pre-smoothing, k-means
//! quantisation, region extraction, contour tracing/coupling/fitting,
//! and SVG serialisation. Corresponds to the data flow in the
//! specification's system overview.

use std::collections::HashMap;

use crate::bezier::{self, QuadBezier};
use crate::color::ColorSpace;
use crate::contour::{self, Contour};
use crate::error::{Error, Result};
use crate::image::Rgba8Image;
use crate::region::{Region, RegionGraph};
use crate::savitzky_golay::SgKernel;
use crate::svg::{serialize_svg, serialize_svg_c_string, SvgRegion, SvgSubpath};

/// Default Savitzky-Golay half-window radius used by [`labels_to_svg`],
/// which (per spec §6) takes no smoothing/fitting knobs of its own.
/// Mirrors [`VectorizeOptions::default`].
const DEFAULT_SG_RADIUS: usize = 4;
const DEFAULT_SG_ORDER: usize = 2;
const DEFAULT_BEZIER_TOLERANCE: f64 = 1.5;

/// Tuning knobs for [`vectorize`]. All stages but k-means and SVG
/// serialisation are optional or have sane defaults.
pub struct VectorizeOptions {
    /// Standard deviation of an optional frequency-domain pre-blur.
    /// `None` or `<= 0` skips the stage.
    pub pre_blur_sigma: Option<f64>,
    /// Spatial/range deviations of an optional bilateral pre-smooth.
    pub bilateral: Option<(f64, f64, ColorSpace)>,

    pub k: u32,
    pub max_iter: u32,
    pub color_space: ColorSpace,
    pub seed: u64,

    /// Minimum region area; smaller regions are merged into a neighbour.
    pub min_region_area: usize,

    /// Savitzky-Golay half-window radius and polynomial order used to
    /// smooth traced contours before curve fitting.
    pub sg_radius: usize,
    pub sg_order: usize,

    /// Maximum perpendicular error, in pixels, for the Bezier fitter.
    pub bezier_tolerance: f64,

    pub draw_contour_borders: bool,
}

impl Default for VectorizeOptions {
    fn default() -> Self {
        VectorizeOptions {
            pre_blur_sigma: None,
            bilateral: None,
            k: 8,
            max_iter: 50,
            color_space: ColorSpace::Lab,
            seed: 0,
            min_region_area: 16,
            sg_radius: DEFAULT_SG_RADIUS,
            sg_order: DEFAULT_SG_ORDER,
            bezier_tolerance: DEFAULT_BEZIER_TOLERANCE,
            draw_contour_borders: false,
        }
    }
}

struct RegionContours {
    fill: (u8, u8, u8),
    contours: Vec<Contour>,
}

/// Runs the whole raster-to-vector pipeline and returns a complete SVG
/// document as a string.
pub fn vectorize(img: &Rgba8Image, opts: &VectorizeOptions) -> Result<String> {
    let mut working = img.clone();

    if let Some(sigma) = opts.pre_blur_sigma {
        log::debug!("pre-blurring {}x{} image, sigma={sigma}", img.width(), img.height());
        crate::blur::gaussian_blur_fft(&mut working, sigma);
    }
    if let Some((sigma_s, sigma_r, space)) = opts.bilateral {
        log::debug!("bilateral pre-smooth, sigma_s={sigma_s}, sigma_r={sigma_r}, space={space:?}");
        crate::bilateral::bilateral_filter(&mut working, sigma_s, sigma_r, space);
    }

    let (_, kmeans_labels) = crate::kmeans::kmeans(&working, opts.k, opts.max_iter, opts.color_space, opts.seed)?;
    let (regions, region_label) = crate::flood_fill::flood_fill(&working, &kmeans_labels)?;
    log::debug!("flood-fill produced {} initial regions", regions.len());

    let svg_regions = build_svg_regions(
        &working,
        regions,
        &region_label,
        opts.min_region_area,
        opts.sg_radius,
        opts.sg_order,
        opts.bezier_tolerance,
    )?;

    log::debug!("serialising {} regions to SVG", svg_regions.len());
    Ok(serialize_svg(&svg_regions, img.width(), img.height(), opts.draw_contour_borders))
}

/// Runs C8 (flood-fill) through C14 (SVG serialisation) over externally
/// supplied per-pixel labels, independent of how those labels were
/// produced — the spec's `labels_to_svg` external interface (spec §6),
/// decoupled from k-means the way `img2num.h`'s `labels_to_svg` never
/// calls its own quantiser. Savitzky-Golay radius/order and the Bezier
/// tolerance are not part of this interface's signature, so sane fixed
/// defaults (matching [`VectorizeOptions::default`]) are used; callers
/// who need to tune those should drive the stages directly or go through
/// [`vectorize`].
pub fn labels_to_svg(img: &Rgba8Image, labels: &[i32], min_area: usize, draw_contour_borders: bool) -> Result<Vec<u8>> {
    let (regions, region_label) = crate::flood_fill::flood_fill(img, labels)?;
    log::debug!("flood-fill produced {} initial regions", regions.len());

    let svg_regions = build_svg_regions(
        img,
        regions,
        &region_label,
        min_area,
        DEFAULT_SG_RADIUS,
        DEFAULT_SG_ORDER,
        DEFAULT_BEZIER_TOLERANCE,
    )?;

    log::debug!("serialising {} regions to SVG", svg_regions.len());
    Ok(serialize_svg_c_string(&svg_regions, img.width(), img.height(), draw_contour_borders))
}

/// Shared C9-C13 core: region-graph construction and small-region merge,
/// per-region contour tracing, Savitzky-Golay smoothing, cross-region
/// coupling, and Bezier fitting. Returns the regions ready for either SVG
/// serialisation entry point.
fn build_svg_regions(
    img: &Rgba8Image,
    regions: Vec<Region>,
    region_label: &[i32],
    min_area: usize,
    sg_radius: usize,
    sg_order: usize,
    bezier_tolerance: f64,
) -> Result<Vec<SvgRegion>> {
    let mut graph = RegionGraph::build(img, regions, region_label)?;
    graph.merge_small_regions(min_area);
    let surviving = graph.regions().iter().filter(|r| !r.is_dissolved()).count();
    log::debug!("{surviving} regions survive after merging below area {min_area}");

    let sg = if 2 * sg_radius + 1 > sg_order {
        Some(SgKernel::new(sg_radius, sg_order)?)
    } else {
        None
    };

    let mut by_id: HashMap<u32, RegionContours> = HashMap::new();
    for region in graph.regions().iter().filter(|r| !r.is_dissolved()) {
        let mut contours = contour::trace_region_contours(region);
        log::trace!("region {} traced {} contours", region.id(), contours.len());
        if let Some(kernel) = &sg {
            for c in &mut contours {
                smooth_contour(c, kernel);
            }
        }
        by_id.insert(region.id(), RegionContours { fill: region.mean_color(), contours });
    }

    couple_adjacent_outer_contours(&graph, &mut by_id);

    let mut svg_regions = Vec::new();
    for region in graph.regions().iter().filter(|r| !r.is_dissolved()) {
        let Some(rc) = by_id.get(&region.id()) else { continue };
        let mut subpaths = Vec::new();
        for c in &rc.contours {
            let curves = fit_closed_contour(&c.points, bezier_tolerance);
            subpaths.push(SvgSubpath { curves, is_hole: c.is_hole() });
        }
        svg_regions.push(SvgRegion { fill: rc.fill, subpaths });
    }

    Ok(svg_regions)
}

/// Smooths a traced contour's points in place, in wrapped mode (the
/// contour is a closed loop). Left un-rounded: Savitzky-Golay exists to
/// correct sub-pixel staircase noise, and rounding its output back onto
/// the integer grid here would silently undo that.
fn smooth_contour(c: &mut Contour, kernel: &SgKernel) {
    if c.points.len() < 2 * kernel.radius() + 1 {
        return;
    }
    if let Ok(smoothed) = kernel.smooth(&c.points, true) {
        c.points = smoothed;
    }
}

fn fit_closed_contour(points: &[(f64, f64)], tolerance: f64) -> Vec<QuadBezier> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut chain = points.to_vec();
    chain.push(chain[0]);
    bezier::fit_chain(&chain, tolerance)
}

/// Couples the outer contour of every region against the outer contour
/// of each higher-id neighbour, so each shared border is snapped exactly
/// once. Coupled coordinates stay sub-pixel float all the way through to
/// curve fitting and SVG formatting (`svg::fmt_num` already writes with
/// `{:.3}` precision).
fn couple_adjacent_outer_contours(graph: &RegionGraph, by_id: &mut HashMap<u32, RegionContours>) {
    let ids: Vec<u32> = graph.regions().iter().filter(|r| !r.is_dissolved()).map(|r| r.id()).collect();

    for &a_id in &ids {
        let Some(region) = graph.region(a_id) else { continue };
        for &b_id in region.neighbours() {
            if b_id <= a_id {
                continue;
            }

            let (mut a_points, mut b_points) = {
                let a_outer = by_id.get(&a_id).and_then(|rc| rc.contours.iter().position(|c| !c.is_hole()));
                let b_outer = by_id.get(&b_id).and_then(|rc| rc.contours.iter().position(|c| !c.is_hole()));
                let (Some(ai), Some(bi)) = (a_outer, b_outer) else { continue };

                let a_points = by_id[&a_id].contours[ai].points.clone();
                let b_points = by_id[&b_id].contours[bi].points.clone();
                (a_points, b_points)
            };

            crate::coupling::couple_contours(&mut a_points, &mut b_points);

            if let Some(rc) = by_id.get_mut(&a_id) {
                if let Some(idx) = rc.contours.iter().position(|c| !c.is_hole()) {
                    rc.contours[idx].points = a_points;
                }
            }
            if let Some(rc) = by_id.get_mut(&b_id) {
                if let Some(idx) = rc.contours.iter().position(|c| !c.is_hole()) {
                    rc.contours[idx].points = b_points;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGBA8;

    #[test]
    fn single_colour_image_yields_one_path() {
        let img = Rgba8Image::filled(10, 10, RGBA8::new(200, 100, 50, 255)).unwrap();
        let mut opts = VectorizeOptions::default();
        opts.k = 1;
        opts.min_region_area = 1;
        opts.sg_radius = 2;
        opts.sg_order = 2;

        let svg = vectorize(&img, &opts).unwrap();
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains("M "));
        assert!(svg.contains(r#"width="10" height="10""#));
    }

    #[test]
    fn rejects_invalid_k() {
        let img = Rgba8Image::filled(4, 4, RGBA8::new(0, 0, 0, 255)).unwrap();
        let mut opts = VectorizeOptions::default();
        opts.k = 0;
        assert!(matches!(vectorize(&img, &opts), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn labels_to_svg_runs_standalone_without_kmeans() {
        // Labels supplied directly, as `img2num.h`'s `labels_to_svg` expects
        // — no call into `kmeans` anywhere in this path.
        let img = Rgba8Image::filled(6, 6, RGBA8::new(10, 200, 80, 255)).unwrap();
        let labels = vec![0i32; 36];
        let bytes = labels_to_svg(&img, &labels, 1, false).unwrap();
        assert_eq!(*bytes.last().unwrap(), 0);
        let svg = std::str::from_utf8(&bytes[..bytes.len() - 1]).unwrap();
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains(r#"fill="#0AC850""#));
    }

    #[test]
    fn labels_to_svg_rejects_mismatched_label_length() {
        let img = Rgba8Image::filled(4, 4, RGBA8::new(0, 0, 0, 255)).unwrap();
        assert!(labels_to_svg(&img, &[0, 0, 0], 1, false).is_err());
    }
}
