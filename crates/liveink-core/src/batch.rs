//! Coalescing and thinning of outgoing wet ink points.

use crate::geometry::PointerPoint;
use crate::scheduler::Instant;
use crate::stroke::StrokeId;
use kurbo::Point;
use std::time::Duration;

/// A run of points for one stroke, ready to broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct PointBatch {
    pub stroke_id: StrokeId,
    pub points: Vec<PointerPoint>,
}

#[derive(Debug, Clone)]
struct PendingBatch {
    batch: PointBatch,
    opened: Instant,
}

/// Collects consecutive points of one stroke for a time window.
#[derive(Debug, Clone)]
pub struct PointBatcher {
    window: Duration,
    reduction_threshold: Option<f64>,
    pending: Option<PendingBatch>,
}

impl PointBatcher {
    pub fn new(window: Duration) -> Self {
        Self { window, reduction_threshold: None, pending: None }
    }

    /// Thin each batch with [`reduce_points`] before it is released.
    pub fn with_reduction(mut self, threshold: Option<f64>) -> Self {
        self.reduction_threshold = threshold;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// Queue a point. Returns the batches that must be sent now: the
    /// previous batch when the stroke changes, and the new point itself
    /// when batching is disabled.
    pub fn push(&mut self, stroke_id: &str, point: PointerPoint, now: Instant) -> Vec<PointBatch> {
        let mut ready = Vec::new();

        let same_stroke = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.batch.stroke_id == stroke_id);
        if !same_stroke {
            ready.extend(self.flush());
        }

        match &mut self.pending {
            Some(pending) => pending.batch.points.push(point),
            None => {
                self.pending = Some(PendingBatch {
                    batch: PointBatch { stroke_id: stroke_id.to_string(), points: vec![point] },
                    opened: now,
                });
            }
        }

        if self.window.is_zero() {
            ready.extend(self.flush());
        }
        ready
    }

    /// Release the pending batch if its window has elapsed.
    pub fn flush_due(&mut self, now: Instant) -> Option<PointBatch> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now.duration_since(pending.opened) >= self.window);
        if due { self.flush() } else { None }
    }

    /// Release the pending batch for `stroke_id`, if any.
    pub fn flush_stroke(&mut self, stroke_id: &str) -> Option<PointBatch> {
        let matches = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.batch.stroke_id == stroke_id);
        if matches { self.flush() } else { None }
    }

    /// Release the pending batch.
    pub fn flush(&mut self) -> Option<PointBatch> {
        let mut batch = self.pending.take()?.batch;
        if let Some(threshold) = self.reduction_threshold {
            batch.points = reduce_points(&batch.points, threshold);
        }
        Some(batch)
    }
}

/// Distance from `point` to the line through `line_start` and `line_end`.
pub fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;

    let line_len_sq = dx * dx + dy * dy;
    if line_len_sq < f64::EPSILON {
        return (point - line_start).hypot();
    }

    let area2 = ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs();
    area2 / line_len_sq.sqrt()
}

/// Repeatedly drop the interior point that deviates least from the line
/// through its neighbors, while that deviation is below `threshold`.
/// The first and last points are always kept.
pub fn reduce_points(points: &[PointerPoint], threshold: f64) -> Vec<PointerPoint> {
    let mut result = points.to_vec();

    while result.len() > 2 {
        let candidate = (1..result.len() - 1)
            .map(|i| {
                let distance = perpendicular_distance(
                    result[i].point(),
                    result[i - 1].point(),
                    result[i + 1].point(),
                );
                (i, distance)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match candidate {
            Some((index, distance)) if distance < threshold => {
                result.remove(index);
            }
            _ => break,
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> PointerPoint {
        PointerPoint::new(x, y, 0.5)
    }

    #[test]
    fn test_batches_within_window() {
        let start = Instant::now();
        let mut batcher = PointBatcher::new(Duration::from_millis(30));

        assert!(batcher.push("a", pt(1.0, 0.0), start).is_empty());
        assert!(batcher.push("a", pt(2.0, 0.0), start + Duration::from_millis(10)).is_empty());
        assert!(batcher.flush_due(start + Duration::from_millis(20)).is_none());

        let batch = batcher.flush_due(start + Duration::from_millis(30)).unwrap();
        assert_eq!(batch.stroke_id, "a");
        assert_eq!(batch.points.len(), 2);
        assert!(batcher.is_empty());
    }

    #[test]
    fn test_different_stroke_flushes_previous() {
        let start = Instant::now();
        let mut batcher = PointBatcher::new(Duration::from_millis(30));
        batcher.push("a", pt(1.0, 0.0), start);

        let ready = batcher.push("b", pt(5.0, 0.0), start);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].stroke_id, "a");

        assert!(batcher.flush_stroke("a").is_none());
        assert_eq!(batcher.flush_stroke("b").unwrap().points, vec![pt(5.0, 0.0)]);
    }

    #[test]
    fn test_zero_window_sends_immediately() {
        let mut batcher = PointBatcher::new(Duration::ZERO);
        let ready = batcher.push("a", pt(1.0, 0.0), Instant::now());
        assert_eq!(ready.len(), 1);
        assert!(batcher.is_empty());
    }

    #[test]
    fn test_reduce_points_drops_collinear() {
        let points = vec![pt(0.0, 0.0), pt(1.0, 0.01), pt(2.0, 0.0), pt(3.0, 5.0), pt(4.0, 0.0)];
        let reduced = reduce_points(&points, 0.5);
        assert_eq!(reduced, vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(3.0, 5.0), pt(4.0, 0.0)]);
    }

    #[test]
    fn test_reduce_points_keeps_ends() {
        let points = vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(2.0, 0.0)];
        assert_eq!(reduce_points(&points, 10.0), vec![pt(0.0, 0.0), pt(2.0, 0.0)]);
        assert_eq!(reduce_points(&points[..2], 10.0).len(), 2);
    }

    #[test]
    fn test_perpendicular_distance() {
        let d = perpendicular_distance(Point::new(5.0, 3.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((d - 3.0).abs() < 1e-9);
        let degenerate = perpendicular_distance(Point::new(3.0, 4.0), Point::ZERO, Point::ZERO);
        assert!((degenerate - 5.0).abs() < 1e-9);
    }
}
