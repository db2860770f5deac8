//! Renderer-agnostic link geometry.
//!
//! Paths are plain segment lists in the layout's coordinate space. Consumers that draw SVG can
//! use [`LinkPath::to_svg_path`]; everything else can walk the segments directly.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum PathSegment {
    MoveTo {
        to: Point,
    },
    LineTo {
        to: Point,
    },
    CubicTo {
        c1: Point,
        c2: Point,
        to: Point,
    },
    /// Elliptical arc with no rotation and the small-arc flag unset, as in SVG `A`.
    ArcTo {
        rx: f64,
        ry: f64,
        sweep: bool,
        to: Point,
    },
}

impl PathSegment {
    pub fn end(&self) -> Point {
        match *self {
            PathSegment::MoveTo { to }
            | PathSegment::LineTo { to }
            | PathSegment::CubicTo { to, .. }
            | PathSegment::ArcTo { to, .. } => to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkPath {
    pub segments: Vec<PathSegment>,
}

impl LinkPath {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(PathSegment::end)
    }

    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(PathSegment::end)
    }

    /// End points of every segment, in drawing order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.segments.iter().map(PathSegment::end)
    }

    pub fn arc_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, PathSegment::ArcTo { .. }))
            .count()
    }

    pub fn to_svg_path(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            if !out.is_empty() {
                out.push(' ');
            }
            // Writing into a `String` cannot fail.
            let _ = match *seg {
                PathSegment::MoveTo { to } => write!(out, "M{},{}", to.x, to.y),
                PathSegment::LineTo { to } => write!(out, "L{},{}", to.x, to.y),
                PathSegment::CubicTo { c1, c2, to } => write!(
                    out,
                    "C{},{} {},{} {},{}",
                    c1.x, c1.y, c2.x, c2.y, to.x, to.y
                ),
                PathSegment::ArcTo { rx, ry, sweep, to } => write!(
                    out,
                    "A{} {} 0 0 {} {},{}",
                    rx,
                    ry,
                    u8::from(sweep),
                    to.x,
                    to.y
                ),
            };
        }
        out
    }
}

/// De Casteljau evaluation of a cubic Bezier at `t`.
pub fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let a = p0.lerp(p1, t);
    let b = p1.lerp(p2, t);
    let c = p2.lerp(p3, t);
    let d = a.lerp(b, t);
    let e = b.lerp(c, t);
    d.lerp(e, t)
}

/// Control polygon of the horizontal curve joining `source` to `target`: tangents stay
/// horizontal at both ends and meet at mid-x.
pub fn horizontal_link_controls(source: Point, target: Point) -> [Point; 4] {
    let mid_x = (source.x + target.x) / 2.0;
    [
        source,
        Point::new(mid_x, source.y),
        Point::new(mid_x, target.y),
        target,
    ]
}

pub fn horizontal_link(source: Point, target: Point) -> LinkPath {
    let [p0, c1, c2, to] = horizontal_link_controls(source, target);
    LinkPath {
        segments: vec![
            PathSegment::MoveTo { to: p0 },
            PathSegment::CubicTo { c1, c2, to },
        ],
    }
}

/// Point on the horizontal curve at parameter `t`; shared by overlap testing and drawing.
pub fn horizontal_link_point(source: Point, target: Point, t: f64) -> Point {
    let [p0, p1, p2, p3] = horizontal_link_controls(source, target);
    cubic_point(p0, p1, p2, p3, t)
}

/// Geometry of a circular link detour, in layout coordinates.
///
/// "Left" refers to the part of the detour next to the source node (which sits to the right of
/// the target for a backward link), "right" to the part next to the target node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CircularPathData {
    pub source_x: f64,
    pub source_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub left_small_arc_radius: f64,
    pub left_large_arc_radius: f64,
    pub right_small_arc_radius: f64,
    pub right_large_arc_radius: f64,
    pub left_inner_extent: f64,
    pub left_full_extent: f64,
    pub right_inner_extent: f64,
    pub right_full_extent: f64,
    pub vertical_buffer: f64,
    pub vertical_full_extent: f64,
    pub vertical_left_inner_extent: f64,
    pub vertical_right_inner_extent: f64,
}

/// Builds the detour: out of the source, around to the vertical extent, across, and back into
/// the target. `above` selects the top (counter-clockwise) or bottom (clockwise) variant.
pub fn circular_link(d: &CircularPathData, above: bool) -> LinkPath {
    let dir = if above { -1.0 } else { 1.0 };
    let sweep = !above;
    LinkPath {
        segments: vec![
            PathSegment::MoveTo {
                to: Point::new(d.source_x, d.source_y),
            },
            PathSegment::LineTo {
                to: Point::new(d.left_inner_extent, d.source_y),
            },
            PathSegment::ArcTo {
                rx: d.left_large_arc_radius,
                ry: d.left_small_arc_radius,
                sweep,
                to: Point::new(
                    d.left_full_extent,
                    d.source_y + dir * d.left_small_arc_radius,
                ),
            },
            PathSegment::LineTo {
                to: Point::new(d.left_full_extent, d.vertical_left_inner_extent),
            },
            PathSegment::ArcTo {
                rx: d.left_large_arc_radius,
                ry: d.left_large_arc_radius,
                sweep,
                to: Point::new(d.left_inner_extent, d.vertical_full_extent),
            },
            PathSegment::LineTo {
                to: Point::new(d.right_inner_extent, d.vertical_full_extent),
            },
            PathSegment::ArcTo {
                rx: d.right_large_arc_radius,
                ry: d.right_large_arc_radius,
                sweep,
                to: Point::new(d.right_full_extent, d.vertical_right_inner_extent),
            },
            PathSegment::LineTo {
                to: Point::new(
                    d.right_full_extent,
                    d.target_y + dir * d.right_small_arc_radius,
                ),
            },
            PathSegment::ArcTo {
                rx: d.right_large_arc_radius,
                ry: d.right_small_arc_radius,
                sweep,
                to: Point::new(d.right_inner_extent, d.target_y),
            },
            PathSegment::LineTo {
                to: Point::new(d.target_x, d.target_y),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_point_hits_end_points_and_midpoint() {
        let p = [
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 10.0),
            Point::new(10.0, 10.0),
        ];
        assert_eq!(cubic_point(p[0], p[1], p[2], p[3], 0.0), p[0]);
        assert_eq!(cubic_point(p[0], p[1], p[2], p[3], 1.0), p[3]);
        assert_eq!(
            cubic_point(p[0], p[1], p[2], p[3], 0.5),
            Point::new(5.0, 5.0)
        );
    }

    #[test]
    fn horizontal_link_point_matches_the_bernstein_form() {
        let (s, t) = (Point::new(10.0, 20.0), Point::new(110.0, 80.0));
        let u = 0.25_f64;
        let b0 = (1.0 - u).powi(3);
        let b1 = 3.0 * u * (1.0 - u).powi(2);
        let b2 = 3.0 * u * u * (1.0 - u);
        let b3 = u.powi(3);
        let expected_y = (b0 + b1) * s.y + (b2 + b3) * t.y;
        let p = horizontal_link_point(s, t, u);
        assert!((p.y - expected_y).abs() < 1e-9);
    }

    #[test]
    fn svg_path_formats_every_segment_kind() {
        let mut path = horizontal_link(Point::new(0.0, 1.0), Point::new(10.0, 3.0));
        path.segments.push(PathSegment::ArcTo {
            rx: 2.0,
            ry: 3.0,
            sweep: true,
            to: Point::new(4.0, 5.0),
        });
        path.segments.push(PathSegment::LineTo {
            to: Point::new(6.5, 7.0),
        });
        assert_eq!(
            path.to_svg_path(),
            "M0,1 C5,1 5,3 10,3 A2 3 0 0 1 4,5 L6.5,7"
        );
    }
}
