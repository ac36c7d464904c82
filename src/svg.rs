// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Serialises labelled, contoured regions to an SVG document.

use std::fmt::Write as _;

use crate::bezier::QuadBezier;

/// One subpath: an ordered list of fitted curves plus whether it should
/// be emitted with the even-odd hole-cutting winding rule.
pub struct SvgSubpath {
    pub curves: Vec<QuadBezier>,
    pub is_hole: bool,
}

/// Everything needed to emit one region's `<path>` element.
pub struct SvgRegion {
    pub fill: (u8, u8, u8),
    pub subpaths: Vec<SvgSubpath>,
}

fn write_subpath(out: &mut String, subpath: &SvgSubpath) {
    let Some(first) = subpath.curves.first() else { return };
    let _ = write!(out, "M {} {} ", fmt_num(first.p0.0), fmt_num(first.p0.1));
    for curve in &subpath.curves {
        let _ = write!(
            out,
            "Q {} {} {} {} ",
            fmt_num(curve.p1.0),
            fmt_num(curve.p1.1),
            fmt_num(curve.p2.0),
            fmt_num(curve.p2.1)
        );
    }
    out.push('Z');
}

fn fmt_num(v: f64) -> String {
    // Trim to a sane precision; SVG viewers don't need full f64 noise.
    format!("{:.3}", v)
}

/// Serialises `regions` to a complete SVG document sized `width x
/// height`. When `draw_contour_borders` is set, every path additionally
/// gets a thin black stroke. Regions with no subpaths are skipped.
pub fn serialize_svg(regions: &[SvgRegion], width: u32, height: u32, draw_contour_borders: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );

    for region in regions {
        if region.subpaths.iter().all(|s| s.curves.is_empty()) {
            continue;
        }

        let mut d = String::new();
        for subpath in &region.subpaths {
            write_subpath(&mut d, subpath);
        }
        let d = d.trim_end();

        let (r, g, b) = region.fill;
        let stroke = if draw_contour_borders {
            r#" stroke="#000000" stroke-width="0.5""#
        } else {
            ""
        };
        let has_hole = region.subpaths.iter().any(|s| s.is_hole);
        let fill_rule = if has_hole { r#" fill-rule="evenodd""# } else { "" };

        let _ = writeln!(
            out,
            r#"<path fill="#{r:02X}{g:02X}{b:02X}"{fill_rule}{stroke} d="{d}"/>"#,
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Serialises to a NUL-terminated byte string, matching the ownership
/// contract of the `labels_to_svg` external interface: a single heap
/// allocation whose lifetime transfers to the caller.
pub fn serialize_svg_c_string(regions: &[SvgRegion], width: u32, height: u32, draw_contour_borders: bool) -> Vec<u8> {
    let mut bytes = serialize_svg(regions, width, height, draw_contour_borders).into_bytes();
    bytes.push(0);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_region(fill: (u8, u8, u8)) -> SvgRegion {
        SvgRegion {
            fill,
            subpaths: vec![SvgSubpath {
                is_hole: false,
                curves: vec![
                    QuadBezier { p0: (0.0, 0.0), p1: (5.0, 0.0), p2: (10.0, 0.0) },
                    QuadBezier { p0: (10.0, 0.0), p1: (10.0, 5.0), p2: (10.0, 10.0) },
                    QuadBezier { p0: (10.0, 10.0), p1: (5.0, 10.0), p2: (0.0, 10.0) },
                    QuadBezier { p0: (0.0, 10.0), p1: (0.0, 5.0), p2: (0.0, 0.0) },
                ],
            }],
        }
    }

    #[test]
    fn single_region_round_trip() {
        let regions = vec![square_region((255, 0, 128))];
        let svg = serialize_svg(&regions, 10, 10, false);

        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains(r#"fill="#FF0080""#));
        assert!(svg.contains("M 0.000 0.000"));
        assert!(svg.contains(r#"width="10" height="10""#));
    }

    #[test]
    fn empty_regions_are_skipped() {
        let regions = vec![SvgRegion { fill: (1, 2, 3), subpaths: vec![] }];
        let svg = serialize_svg(&regions, 4, 4, false);
        assert_eq!(svg.matches("<path").count(), 0);
    }

    #[test]
    fn draw_contour_borders_adds_stroke() {
        let regions = vec![square_region((0, 0, 0))];
        let svg = serialize_svg(&regions, 10, 10, true);
        assert!(svg.contains("stroke=\"#000000\""));
    }

    #[test]
    fn holes_use_evenodd_fill_rule() {
        let mut region = square_region((10, 20, 30));
        region.subpaths.push(SvgSubpath {
            is_hole: true,
            curves: vec![QuadBezier { p0: (4.0, 4.0), p1: (5.0, 4.0), p2: (6.0, 4.0) }],
        });
        let svg = serialize_svg(&[region], 10, 10, false);
        assert!(svg.contains(r#"fill-rule="evenodd""#));
    }

    #[test]
    fn c_string_is_nul_terminated() {
        let regions = vec![square_region((1, 1, 1))];
        let bytes = serialize_svg_c_string(&regions, 10, 10, false);
        assert_eq!(*bytes.last().unwrap(), 0);
        assert!(bytes.len() > 1);
    }
}
