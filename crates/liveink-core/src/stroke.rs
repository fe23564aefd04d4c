//! Strokes: an ordered point sequence with a brush and an identity.

use crate::brush::Brush;
use crate::error::InkResult;
use crate::geometry::{
    PointerPoint, distance_between_points, do_rectangles_overlap, is_point_inside_rectangle,
    is_rectangle_inside_rectangle, pressure_adjusted_tip_size, segment_intersections_with_rectangle,
    segments_intersection,
};
use kurbo::{Line, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a stroke.
pub type StrokeId = String;

/// Generate a fresh stroke id.
pub fn generate_stroke_id() -> StrokeId {
    Uuid::new_v4().to_string()
}

/// Options for creating a stroke. Missing fields fall back to a fresh id,
/// the default stroke brush and no points.
#[derive(Debug, Clone, Default)]
pub struct StrokeOptions {
    pub id: Option<StrokeId>,
    pub brush: Option<Brush>,
    pub points: Vec<PointerPoint>,
}

impl StrokeOptions {
    pub fn with_id(mut self, id: impl Into<StrokeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_brush(mut self, brush: Brush) -> Self {
        self.brush = Some(brush);
        self
    }

    pub fn with_points(mut self, points: Vec<PointerPoint>) -> Self {
        self.points = points;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    id: StrokeId,
    brush: Brush,
    points: Vec<PointerPoint>,
}

impl Default for Stroke {
    fn default() -> Self {
        Self::new(StrokeOptions::default())
    }
}

impl Stroke {
    pub fn new(options: StrokeOptions) -> Self {
        Self {
            id: options.id.unwrap_or_else(generate_stroke_id),
            brush: options.brush.unwrap_or_default(),
            points: options.points,
        }
    }

    /// A new empty stroke with a fresh id and the given brush.
    pub fn with_brush(brush: Brush) -> Self {
        Self::new(StrokeOptions::default().with_brush(brush))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point_at(&self, index: usize) -> Option<PointerPoint> {
        self.points.get(index).copied()
    }

    pub fn last_point(&self) -> Option<PointerPoint> {
        self.points.last().copied()
    }

    pub fn points(&self) -> &[PointerPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointerPoint> {
        self.points.iter()
    }

    /// Append a point unless it repeats the position of the last one.
    ///
    /// Returns whether the point was added.
    pub fn add_point(&mut self, p: PointerPoint) -> bool {
        match self.points.last() {
            Some(last) if last.same_position(&p) => false,
            _ => {
                self.points.push(p);
                true
            }
        }
    }

    fn segments(&self) -> impl Iterator<Item = Line> + '_ {
        self.points
            .windows(2)
            .map(|pair| Line::new(pair[0].point(), pair[1].point()))
    }

    /// Whether any segment of the stroke crosses an edge of `rect`.
    pub fn intersects_with_rectangle(&self, rect: &Rect) -> bool {
        self.segments()
            .any(|segment| !segment_intersections_with_rectangle(segment, rect).is_empty())
    }

    /// Whether `rect` crosses the stroke or contains any of its points.
    pub fn touches_rectangle(&self, rect: &Rect) -> bool {
        self.points
            .iter()
            .any(|p| is_point_inside_rectangle(p.point(), rect))
            || self.intersects_with_rectangle(rect)
    }

    /// Points where `segment` crosses the stroke, in stroke order.
    pub fn intersection_points(&self, segment: Line) -> Vec<Point> {
        self.segments()
            .filter_map(|s| segments_intersection(segment, s))
            .collect()
    }

    /// Bounding rect of the stroke's points. Empty strokes give `Rect::ZERO`.
    pub fn bounding_rect(&self) -> Rect {
        let mut iter = self.points.iter();
        let Some(first) = iter.next() else {
            return Rect::ZERO;
        };
        iter.fold(Rect::from_points(first.point(), first.point()), |rect, p| {
            rect.union_pt(p.point())
        })
    }

    /// Bounding rect of the rendered ink, including the tip extent at full pressure.
    pub fn ink_bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::ZERO;
        }
        let half = self.brush.tip_size / 2.0;
        let radius = self
            .points
            .iter()
            .map(|p| pressure_adjusted_tip_size(half, p.pressure))
            .fold(0.0_f64, f64::max);
        self.bounding_rect().inflate(radius, radius)
    }

    /// Erase the part of the stroke inside `eraser`.
    ///
    /// Returns `None` when nothing is erased, including when the eraser
    /// overlaps the bounds without touching any segment. Otherwise returns
    /// the surviving fragments (possibly none), which share the brush and
    /// get new ids.
    pub fn point_erase(&self, eraser: &Rect) -> Option<Vec<Stroke>> {
        if self.points.is_empty() {
            return None;
        }

        let bounds = self.bounding_rect();
        if is_rectangle_inside_rectangle(&bounds, eraser) {
            return Some(Vec::new());
        }
        if !do_rectangles_overlap(eraser, &bounds) {
            return None;
        }

        let mut fragments: Vec<Stroke> = Vec::new();
        let mut current = Stroke::with_brush(self.brush);
        let mut previous: Option<PointerPoint> = None;
        let mut cut = false;

        for &p in &self.points {
            let Some(prev) = previous else {
                current.add_point(p);
                previous = Some(p);
                continue;
            };

            let intersections =
                segment_intersections_with_rectangle(Line::new(prev.point(), p.point()), eraser);
            if !intersections.is_empty() {
                cut = true;
            }

            match intersections.as_slice() {
                [hit] => {
                    if is_point_inside_rectangle(prev.point(), eraser) {
                        // Leaving the eraser
                        current = Stroke::with_brush(self.brush);
                        current.add_point(PointerPoint::from_point(*hit, prev.pressure));
                        current.add_point(p);
                    } else {
                        // Entering the eraser
                        current.add_point(PointerPoint::from_point(*hit, p.pressure));
                        fragments.push(std::mem::replace(
                            &mut current,
                            Stroke::with_brush(self.brush),
                        ));
                    }
                }
                [first, second, ..] => {
                    let d1 = distance_between_points(prev.point(), *first);
                    let d2 = distance_between_points(prev.point(), *second);
                    let (near, far) = if d1 <= d2 { (*first, *second) } else { (*second, *first) };

                    current.add_point(PointerPoint::from_point(near, prev.pressure));
                    fragments.push(std::mem::replace(&mut current, Stroke::with_brush(self.brush)));

                    current.add_point(PointerPoint::from_point(far, prev.pressure));
                    current.add_point(p);
                }
                [] => {
                    if !is_point_inside_rectangle(prev.point(), eraser)
                        && !is_point_inside_rectangle(p.point(), eraser)
                    {
                        if current.is_empty() {
                            current.add_point(prev);
                        }
                        current.add_point(p);
                    } else {
                        cut = true;
                    }
                }
            }

            previous = Some(p);
        }

        if !cut {
            return None;
        }

        fragments.push(current);
        fragments.retain(|fragment| fragment.len() > 1);

        log::trace!("point erase split stroke {} into {} fragments", self.id, fragments.len());
        Some(fragments)
    }

    /// JSON encoding `{"id", "brush", "points"}`.
    pub fn serialize(&self) -> InkResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn deserialize(serialized: &str) -> InkResult<Stroke> {
        Ok(serde_json::from_str(serialized)?)
    }

    /// Replace this stroke's id, brush and points with the decoded ones.
    pub fn deserialize_into(&mut self, serialized: &str) -> InkResult<()> {
        *self = Self::deserialize(serialized)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Stroke {
    type Item = &'a PointerPoint;
    type IntoIter = std::slice::Iter<'a, PointerPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
