//! Geometry primitives for ink: pressure points, tangent quads, and
//! segment/rectangle intersection.
//!
//! Rectangles are `kurbo::Rect` values where `x0`/`y0` are the left/top
//! edges and `x1`/`y1` the right/bottom edges. Segments are `kurbo::Line`.

use kurbo::{BezPath, Line, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Tolerance used by range tests so that hits on a boundary count as inside.
pub const EPSILON: f64 = 0.000001;

/// A pointer sample: position plus pen pressure in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPoint {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
}

impl PointerPoint {
    pub fn new(x: f64, y: f64, pressure: f64) -> Self {
        Self { x, y, pressure }
    }

    /// Build a pointer point from a plain point and a pressure value.
    pub fn from_point(p: Point, pressure: f64) -> Self {
        Self::new(p.x, p.y, pressure)
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether both samples sit at exactly the same position.
    pub fn same_position(&self, other: &PointerPoint) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl From<PointerPoint> for Point {
    fn from(p: PointerPoint) -> Self {
        p.point()
    }
}

/// Four corners of the quadrilateral joining two consecutive tip shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
    pub p4: Point,
}

impl Quad {
    /// The quad as a closed path `p1 → p2 → p3 → p4 → p1`.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        self.append_to(&mut path);
        path
    }

    /// Append the quad as a closed subpath.
    pub fn append_to(&self, path: &mut BezPath) {
        path.move_to(self.p1);
        path.line_to(self.p2);
        path.line_to(self.p3);
        path.line_to(self.p4);
        path.close_path();
    }

    /// Whether the quad is simple, i.e. its two pairs of opposite edges do not cross.
    pub fn is_simple(&self) -> bool {
        let crosses = |a: Line, b: Line| strict_segments_cross(a, b);
        !crosses(Line::new(self.p1, self.p2), Line::new(self.p3, self.p4))
            && !crosses(Line::new(self.p2, self.p3), Line::new(self.p4, self.p1))
    }
}

fn strict_segments_cross(a: Line, b: Line) -> bool {
    let orient = |p: Point, q: Point, r: Point| (q - p).cross(r - p);
    let d1 = orient(a.p0, a.p1, b.p0);
    let d2 = orient(a.p0, a.p1, b.p1);
    let d3 = orient(b.p0, b.p1, a.p0);
    let d4 = orient(b.p0, b.p1, a.p1);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Scale a tip radius by pen pressure.
pub fn pressure_adjusted_tip_size(base_radius: f64, pressure: f64) -> f64 {
    base_radius * (pressure * 1.5 + 0.25)
}

/// Compute the quad bounded by the two outer tangents of two circles.
///
/// Viewed from below with the first circle on the left, `p1` is the upper
/// tangent point on the first circle and the remaining points follow
/// clockwise. Returns `None` when one circle contains the other, in which
/// case only the end cap needs drawing.
pub fn compute_quad_between_two_circles(
    center1: Point,
    r1: f64,
    center2: Point,
    r2: f64,
) -> Option<Quad> {
    let diff_x = center2.x - center1.x;
    let diff_y = center2.y - center1.y;
    let distance = (diff_x * diff_x + diff_y * diff_y).sqrt();

    if distance <= (r2 - r1).abs() {
        return None;
    }

    let cos_theta = diff_x / distance;
    let sin_theta = -diff_y / distance;
    let sin_delta = (r2 - r1) / distance;
    let cos_delta = (1.0 - sin_delta * sin_delta).sqrt();
    let sin_alpha = sin_theta * cos_delta + cos_theta * sin_delta;
    let cos_alpha = cos_theta * cos_delta - sin_theta * sin_delta;
    let sin_beta = sin_theta * cos_delta - cos_theta * sin_delta;
    let cos_beta = cos_theta * cos_delta + sin_theta * sin_delta;

    Some(Quad {
        p1: Point::new(center1.x - sin_alpha * r1, center1.y - cos_alpha * r1),
        p2: Point::new(center2.x - sin_alpha * r2, center2.y - cos_alpha * r2),
        p3: Point::new(center2.x + sin_beta * r2, center2.y + cos_beta * r2),
        p4: Point::new(center1.x + sin_beta * r1, center1.y + cos_beta * r1),
    })
}

/// Compute the quad joining two axis-aligned boxes given by center and half extents.
///
/// Returns `None` when one rectangle contains the other (or they coincide).
pub fn compute_quad_between_two_rectangles(
    center1: Point,
    half_width1: f64,
    half_height1: f64,
    center2: Point,
    half_width2: f64,
    half_height2: f64,
) -> Option<Quad> {
    let r1 = Rect::new(
        center1.x - half_width1,
        center1.y - half_height1,
        center1.x + half_width1,
        center1.y + half_height1,
    );
    let r2 = Rect::new(
        center2.x - half_width2,
        center2.y - half_height2,
        center2.x + half_width2,
        center2.y + half_height2,
    );
    let contains = |outer: &Rect, inner: &Rect| {
        inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
    };
    if contains(&r1, &r2) || contains(&r2, &r1) {
        return None;
    }

    let sign_dx = if center2.x - center1.x > 0.0 { 1.0 } else { -1.0 };
    let sign_dy = if center2.y - center1.y > 0.0 { 1.0 } else { -1.0 };

    Some(Quad {
        p1: Point::new(center1.x - sign_dy * half_width1, center1.y + sign_dx * half_height1),
        p2: Point::new(center1.x + sign_dy * half_width1, center1.y - sign_dx * half_height1),
        p3: Point::new(center2.x + sign_dy * half_width2, center2.y - sign_dx * half_height2),
        p4: Point::new(center2.x - sign_dy * half_width2, center2.y + sign_dx * half_height2),
    })
}

/// A `width` × `height` rectangle centered on `p`.
pub fn make_rectangle_from_point(p: Point, width: f64, height: f64) -> Rect {
    let half_width = width / 2.0;
    let half_height = height / 2.0;
    Rect::new(p.x - half_width, p.y - half_height, p.x + half_width, p.y + half_height)
}

/// Whether `n` lies between `r1` and `r2` (in either order), within `EPSILON`.
pub fn is_in_range(n: f64, r1: f64, r2: f64) -> bool {
    let adjusted_min = r1.min(r2) - EPSILON;
    let adjusted_max = r1.max(r2) + EPSILON;
    n >= adjusted_min && n <= adjusted_max
}

pub fn is_point_inside_rectangle(p: Point, r: &Rect) -> bool {
    is_in_range(p.x, r.x0, r.x1) && is_in_range(p.y, r.y0, r.y1)
}

/// Whether all four corners of `r` lie inside `container`.
pub fn is_rectangle_inside_rectangle(r: &Rect, container: &Rect) -> bool {
    [
        Point::new(r.x0, r.y0),
        Point::new(r.x1, r.y0),
        Point::new(r.x0, r.y1),
        Point::new(r.x1, r.y1),
    ]
    .into_iter()
    .all(|corner| is_point_inside_rectangle(corner, container))
}

/// Whether two rectangles share any area or boundary, within `EPSILON`.
pub fn do_rectangles_overlap(r1: &Rect, r2: &Rect) -> bool {
    r1.x0.min(r1.x1) <= r2.x0.max(r2.x1) + EPSILON
        && r2.x0.min(r2.x1) <= r1.x0.max(r1.x1) + EPSILON
        && r1.y0.min(r1.y1) <= r2.y0.max(r2.y1) + EPSILON
        && r2.y0.min(r2.y1) <= r1.y0.max(r1.y1) + EPSILON
}

/// Intersection point of two segments, if they cross.
///
/// Solves the two line equations by determinant, then checks the solution
/// lies on both segments. Parallel segments never intersect.
pub fn segments_intersection(s1: Line, s2: Line) -> Option<Point> {
    let a1 = s1.p1.y - s1.p0.y;
    let b1 = s1.p0.x - s1.p1.x;
    let a2 = s2.p1.y - s2.p0.y;
    let b2 = s2.p0.x - s2.p1.x;

    let delta = a1 * b2 - a2 * b1;
    if delta == 0.0 {
        return None;
    }

    let c1 = a2 * s2.p0.x + b2 * s2.p0.y;
    let c2 = a1 * s1.p0.x + b1 * s1.p0.y;
    let inv_delta = 1.0 / delta;

    let candidate = Point::new((b2 * c2 - b1 * c1) * inv_delta, (a1 * c1 - a2 * c2) * inv_delta);

    if is_in_range(candidate.x, s1.p0.x, s1.p1.x)
        && is_in_range(candidate.x, s2.p0.x, s2.p1.x)
        && is_in_range(candidate.y, s1.p0.y, s1.p1.y)
        && is_in_range(candidate.y, s2.p0.y, s2.p1.y)
    {
        Some(candidate)
    } else {
        None
    }
}

/// The edges of `r` in the order top, right, bottom, left.
pub fn rectangle_edges(r: &Rect) -> [Line; 4] {
    [
        Line::new((r.x0, r.y0), (r.x1, r.y0)),
        Line::new((r.x1, r.y0), (r.x1, r.y1)),
        Line::new((r.x1, r.y1), (r.x0, r.y1)),
        Line::new((r.x0, r.y1), (r.x0, r.y0)),
    ]
}

/// Points where segment `s` crosses the edges of `r`, without exact duplicates.
///
/// A segment passing through a corner yields the corner once.
pub fn segment_intersections_with_rectangle(s: Line, r: &Rect) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(2);
    for edge in rectangle_edges(r) {
        if let Some(intersection) = segments_intersection(s, edge) {
            if !result.contains(&intersection) {
                result.push(intersection);
            }
        }
    }
    result
}

pub fn distance_between_points(p1: Point, p2: Point) -> f64 {
    (p2.x - p1.x).hypot(p2.y - p1.y)
}

/// Convert a screen point into viewport space.
pub fn screen_to_viewport(p: Point, reference: Point, offset: Vec2, scale: f64) -> Point {
    Point::new(
        (p.x - offset.x - reference.x) / scale,
        (p.y - offset.y - reference.y) / scale,
    )
}

/// Convert a viewport point into screen space.
pub fn viewport_to_screen(p: Point, reference: Point, offset: Vec2, scale: f64) -> Point {
    Point::new(
        p.x * scale + reference.x + offset.x,
        p.y * scale + reference.y + offset.y,
    )
}
