//! Ink canvases: incremental stroke rendering onto an [`InkSurface`].
//!
//! A canvas renders with one of three policies picked at construction:
//!
//! - [`RenderPolicy::Dry`] renders synchronously. A darken brush darkens
//!   through the fill composite, against ink already on the surface.
//! - [`RenderPolicy::Wet`] renders on frames until the stroke ends. A darken
//!   brush is applied to the whole surface, so it darkens what lies below
//!   the overlay. The two do not darken identically, so a highlighter
//!   stroke looks darker once committed to the dry canvas.
//! - [`RenderPolicy::LaserPointer`] keeps a short fading trail and redraws
//!   it from scratch every frame.

use crate::brush::{BlendMode, Brush, BrushTip, DrawingAttributes};
use crate::error::{InkError, InkResult};
use crate::geometry::{
    PointerPoint, compute_quad_between_two_circles, compute_quad_between_two_rectangles,
    pressure_adjusted_tip_size,
};
use crate::scheduler::{Instant, IntervalTimer};
use crate::stroke::Stroke;
use crate::surface::{Composite, InkSurface, Paint, SurfaceHost};
use kurbo::{Affine, BezPath, Circle, Rect, Shape, Size};
use std::collections::HashSet;
use std::time::Duration;

/// Tolerance used when flattening tip circles into path elements.
const CIRCLE_TOLERANCE: f64 = 0.1;

/// Rendering policy of an [`InkingCanvas`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPolicy {
    Dry,
    Wet,
    LaserPointer,
}

impl RenderPolicy {
    pub fn renders_asynchronously(self) -> bool {
        !matches!(self, RenderPolicy::Dry)
    }
}

/// Laser pointer trail parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserTrail {
    /// Maximum number of trailing points kept
    pub max_points: usize,
    /// Time for the whole trail to fade while the pointer is still
    pub trail_duration: Duration,
}

impl Default for LaserTrail {
    fn default() -> Self {
        Self {
            max_points: 20,
            trail_duration: Duration::from_millis(200),
        }
    }
}

impl LaserTrail {
    /// Interval between two trailing point removals.
    pub fn trim_interval(&self) -> Duration {
        let count = u32::try_from(self.max_points.max(1)).unwrap_or(u32::MAX);
        self.trail_duration / count
    }
}

pub struct InkingCanvas {
    surface: Box<dyn InkSurface>,
    policy: RenderPolicy,
    brush: Brush,
    attributes: DrawingAttributes,
    transform: Affine,
    points: Vec<PointerPoint>,
    pending_start: usize,
    stroke_started: bool,
    frame_requested: bool,
    laser: LaserTrail,
    trim_timer: IntervalTimer,
}

impl InkingCanvas {
    pub fn new(policy: RenderPolicy, surface: Box<dyn InkSurface>) -> Self {
        Self::with_laser_trail(policy, surface, LaserTrail::default())
    }

    pub fn with_laser_trail(
        policy: RenderPolicy,
        surface: Box<dyn InkSurface>,
        laser: LaserTrail,
    ) -> Self {
        let mut canvas = Self {
            surface,
            policy,
            brush: Brush::stroke(),
            attributes: DrawingAttributes::default(),
            transform: Affine::IDENTITY,
            points: Vec::new(),
            pending_start: 0,
            stroke_started: false,
            frame_requested: false,
            laser,
            trim_timer: IntervalTimer::new(laser.trim_interval()),
        };
        canvas.set_brush(Brush::stroke());
        canvas
    }

    pub fn policy(&self) -> RenderPolicy {
        self.policy
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn drawing_attributes(&self) -> &DrawingAttributes {
        &self.attributes
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.set_drawing_attributes(DrawingAttributes::from(&brush));
        self.brush = brush;
    }

    pub fn set_drawing_attributes(&mut self, attributes: DrawingAttributes) {
        self.attributes = attributes;
        if self.policy == RenderPolicy::Wet {
            self.surface.set_element_blend(attributes.blend_mode);
        }
    }

    /// Set the ink to surface transform used by subsequent fills.
    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    pub fn size(&self) -> Size {
        self.surface.size()
    }

    pub fn resize(&mut self, size: Size) {
        self.surface.resize(size);
    }

    pub fn clear(&mut self) {
        self.surface.clear();
    }

    pub fn has_stroke_ended(&self) -> bool {
        !self.stroke_started
    }

    /// Whether the canvas wants `render_frame` on the next frame.
    pub fn wants_frame(&self) -> bool {
        self.frame_requested
    }

    /// Number of points the canvas currently holds for rendering.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn begin_stroke(&mut self, p: PointerPoint) {
        self.stroke_started = true;
        self.points.clear();
        self.points.push(p);
        self.pending_start = 0;

        if self.policy == RenderPolicy::LaserPointer {
            self.trim_timer.stop();
            self.trim_timer.start();
        }

        if self.policy.renders_asynchronously() {
            self.frame_requested = true;
        } else {
            self.render();
        }
    }

    pub fn add_point(&mut self, p: PointerPoint) {
        self.points.push(p);

        if self.policy == RenderPolicy::LaserPointer && self.points.len() > self.laser.max_points {
            self.points.remove(0);
        }
    }

    pub fn end_stroke(&mut self, p: PointerPoint) {
        self.stroke_started = false;
        self.frame_requested = false;
        self.trim_timer.stop();
        self.add_point(p);
        self.render();
    }

    /// Replay a committed stroke through begin / add / end.
    pub fn render_stroke(&mut self, stroke: &Stroke) {
        self.set_brush(*stroke.brush());

        let points = stroke.points();
        let Some((first, rest)) = points.split_first() else {
            return;
        };

        self.begin_stroke(*first);
        match rest.split_last() {
            Some((last, middle)) => {
                for p in middle {
                    self.add_point(*p);
                }
                self.end_stroke(*last);
            }
            None => {
                self.stroke_started = false;
                self.frame_requested = false;
                self.trim_timer.stop();
                if self.policy.renders_asynchronously() {
                    self.render();
                }
            }
        }
    }

    /// Run one animation frame. Returns whether anything was rendered.
    pub fn render_frame(&mut self) -> bool {
        if !self.frame_requested {
            return false;
        }
        self.render();
        self.frame_requested = self.stroke_started;
        true
    }

    /// Advance laser trail trimming to `now`.
    pub fn advance_timers(&mut self, now: Instant) {
        if self.policy != RenderPolicy::LaserPointer {
            return;
        }
        let due = self.trim_timer.poll(now);
        for _ in 0..due {
            if self.points.len() > 1 {
                self.points.remove(0);
            }
        }
        if due > 0 {
            log::trace!("laser trail trimmed to {} points", self.points.len());
        }
    }

    fn render(&mut self) {
        match self.policy {
            RenderPolicy::Dry | RenderPolicy::Wet => self.render_pending(),
            RenderPolicy::LaserPointer => self.render_laser_trail(),
        }
    }

    fn paint(&self) -> Paint {
        let composite = match (self.policy, self.attributes.blend_mode) {
            (RenderPolicy::Dry, BlendMode::Darken) => Composite::Darken,
            _ => Composite::SourceOver,
        };
        Paint {
            color: self.attributes.color.to_color(),
            composite,
            transform: self.transform,
        }
    }

    /// Paint the points added since the last render, joined to the last
    /// rendered point.
    fn render_pending(&mut self) {
        if self.pending_start >= self.points.len() {
            return;
        }

        let half_width = self.attributes.half_width();
        let half_height = self.attributes.half_height();
        let mut path = BezPath::new();
        let mut previous = self
            .pending_start
            .checked_sub(1)
            .map(|index| self.points[index]);

        for &p in &self.points[self.pending_start..] {
            let width = pressure_adjusted_tip_size(half_width, p.pressure);

            match self.attributes.tip {
                BrushTip::Ellipse => {
                    if let Some(prev) = previous {
                        let prev_width = pressure_adjusted_tip_size(half_width, prev.pressure);
                        if let Some(quad) = compute_quad_between_two_circles(
                            p.point(),
                            width,
                            prev.point(),
                            prev_width,
                        ) {
                            quad.append_to(&mut path);
                        }
                    }
                    path.extend(Circle::new(p.point(), width).path_elements(CIRCLE_TOLERANCE));
                }
                BrushTip::Rectangle => {
                    let height = pressure_adjusted_tip_size(half_height, p.pressure);
                    if let Some(prev) = previous {
                        if let Some(quad) = compute_quad_between_two_rectangles(
                            p.point(),
                            width,
                            height,
                            prev.point(),
                            pressure_adjusted_tip_size(half_width, prev.pressure),
                            pressure_adjusted_tip_size(half_height, prev.pressure),
                        ) {
                            quad.append_to(&mut path);
                        }
                    }
                    let tip = Rect::new(p.x - width, p.y - height, p.x + width, p.y + height);
                    path.extend(tip.path_elements(CIRCLE_TOLERANCE));
                }
            }

            previous = Some(p);
        }

        let paint = self.paint();
        self.surface.fill(&path, &paint);
        self.pending_start = self.points.len();
    }

    /// Clear and redraw the trail, newest point widest.
    fn render_laser_trail(&mut self) {
        self.surface.clear();
        if self.points.is_empty() {
            return;
        }

        let mut radius = self.brush.tip_size / 2.0;
        let step = (radius - 1.0) / self.points.len() as f64;
        let mut path = BezPath::new();
        let mut previous: Option<(PointerPoint, f64)> = None;

        for &p in self.points.iter().rev() {
            let width = pressure_adjusted_tip_size(radius, p.pressure);
            if let Some((prev, prev_width)) = previous {
                if let Some(quad) =
                    compute_quad_between_two_circles(p.point(), width, prev.point(), prev_width)
                {
                    quad.append_to(&mut path);
                }
            }
            path.extend(Circle::new(p.point(), width).path_elements(CIRCLE_TOLERANCE));

            radius -= step;
            previous = Some((p, width));
        }

        let paint = self.paint();
        self.surface.fill(&path, &paint);
    }
}

/// Tracks which overlay surfaces are checked out of a [`SurfaceHost`].
pub struct CanvasPool {
    host: Box<dyn SurfaceHost>,
    acquired: HashSet<String>,
}

impl CanvasPool {
    pub fn new(host: Box<dyn SurfaceHost>) -> Self {
        Self { host, acquired: HashSet::new() }
    }

    /// Check out a canvas for `id`.
    pub fn acquire(
        &mut self,
        id: &str,
        policy: RenderPolicy,
        size: Size,
        laser: LaserTrail,
    ) -> InkResult<InkingCanvas> {
        if !self.acquired.insert(id.to_string()) {
            return Err(InkError::CanvasAlreadyAcquired(id.to_string()));
        }
        let surface = self.host.attach(id, size);
        log::debug!("acquired {policy:?} canvas {id}");
        Ok(InkingCanvas::with_laser_trail(policy, surface, laser))
    }

    /// Return the canvas checked out for `id` to the host.
    pub fn release(&mut self, id: &str) -> InkResult<()> {
        if !self.acquired.remove(id) {
            return Err(InkError::CanvasNotAcquired(id.to_string()));
        }
        self.host.detach(id);
        log::debug!("released canvas {id}");
        Ok(())
    }

    pub fn is_acquired(&self, id: &str) -> bool {
        self.acquired.contains(id)
    }

    pub fn acquired_count(&self) -> usize {
        self.acquired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::InkColor;
    use crate::stroke::StrokeOptions;
    use crate::surface::{RecordingHost, RecordingSurface};
    use kurbo::PathEl;

    fn canvas(policy: RenderPolicy) -> (InkingCanvas, RecordingSurface) {
        let surface = RecordingSurface::new(Size::new(200.0, 200.0));
        (InkingCanvas::new(policy, Box::new(surface.clone())), surface)
    }

    fn pt(x: f64, y: f64) -> PointerPoint {
        PointerPoint::new(x, y, 0.5)
    }

    fn subpath_count(path: &BezPath) -> usize {
        path.elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count()
    }

    #[test]
    fn test_dry_canvas_renders_synchronously() {
        let (mut canvas, surface) = canvas(RenderPolicy::Dry);
        canvas.begin_stroke(pt(0.0, 0.0));
        assert_eq!(surface.fill_count(), 1);
        assert!(!canvas.wants_frame());

        canvas.add_point(pt(10.0, 0.0));
        canvas.end_stroke(pt(20.0, 0.0));
        assert_eq!(surface.fill_count(), 2);

        // Second fill holds two quads and two circles.
        let fills = surface.fills();
        assert_eq!(subpath_count(&fills[1].path), 4);
    }

    #[test]
    fn test_wet_canvas_renders_on_frames() {
        let (mut canvas, surface) = canvas(RenderPolicy::Wet);
        canvas.begin_stroke(pt(0.0, 0.0));
        assert_eq!(surface.fill_count(), 0);
        assert!(canvas.wants_frame());

        assert!(canvas.render_frame());
        assert_eq!(surface.fill_count(), 1);

        // Nothing pending: the frame renders nothing but keeps requesting.
        assert!(canvas.render_frame());
        assert_eq!(surface.fill_count(), 1);
        assert!(canvas.wants_frame());

        canvas.add_point(pt(5.0, 0.0));
        canvas.render_frame();
        assert_eq!(surface.fill_count(), 2);

        canvas.end_stroke(pt(10.0, 0.0));
        assert_eq!(surface.fill_count(), 3);
        assert!(!canvas.wants_frame());
        assert!(!canvas.render_frame());
    }

    #[test]
    fn test_darken_realisation_per_policy() {
        let (mut dry, dry_surface) = canvas(RenderPolicy::Dry);
        dry.set_brush(Brush::highlighter());
        dry.begin_stroke(pt(0.0, 0.0));
        assert_eq!(dry_surface.fills()[0].paint.composite, Composite::Darken);
        assert_eq!(dry_surface.element_blend(), BlendMode::Normal);

        let (mut wet, wet_surface) = canvas(RenderPolicy::Wet);
        wet.set_brush(Brush::highlighter());
        wet.begin_stroke(pt(0.0, 0.0));
        wet.render_frame();
        assert_eq!(wet_surface.fills()[0].paint.composite, Composite::SourceOver);
        assert_eq!(wet_surface.element_blend(), BlendMode::Darken);
    }

    #[test]
    fn test_render_stroke_replays_points() {
        let (mut canvas, surface) = canvas(RenderPolicy::Dry);
        let brush = Brush::stroke().with_color(InkColor::RED);
        let stroke = Stroke::new(
            StrokeOptions::default()
                .with_brush(brush)
                .with_points(vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(20.0, 0.0)]),
        );
        canvas.render_stroke(&stroke);

        assert_eq!(canvas.point_count(), 3);
        assert!(canvas.has_stroke_ended());
        assert_eq!(surface.fills()[0].paint.color, InkColor::RED.to_color());
    }

    #[test]
    fn test_render_single_point_stroke() {
        let (mut canvas, surface) = canvas(RenderPolicy::Dry);
        let stroke = Stroke::new(StrokeOptions::default().with_points(vec![pt(3.0, 3.0)]));
        canvas.render_stroke(&stroke);
        assert_eq!(canvas.point_count(), 1);
        assert_eq!(surface.fill_count(), 1);
        assert!(canvas.has_stroke_ended());
    }

    #[test]
    fn test_rectangle_tip_renders_rectangles() {
        let (mut canvas, surface) = canvas(RenderPolicy::Dry);
        canvas.set_brush(Brush::highlighter());
        canvas.begin_stroke(pt(0.0, 0.0));

        let bbox = surface.fills()[0].path.bounding_box();
        // Half tip 5 at pressure 0.5 gives 5 * 1.0
        assert!((bbox.x0 + 5.0).abs() < 1e-9);
        assert!((bbox.y1 - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_laser_pointer_keeps_max_points() {
        let (mut canvas, _surface) = canvas(RenderPolicy::LaserPointer);
        canvas.set_brush(Brush::laser_pointer());
        canvas.begin_stroke(pt(0.0, 0.0));
        for i in 1..30 {
            canvas.add_point(pt(i as f64, 0.0));
        }
        assert_eq!(canvas.point_count(), 20);
    }

    #[test]
    fn test_laser_pointer_trims_while_active() {
        let (mut canvas, surface) = canvas(RenderPolicy::LaserPointer);
        canvas.begin_stroke(pt(0.0, 0.0));
        for i in 1..5 {
            canvas.add_point(pt(i as f64 * 10.0, 0.0));
        }

        let start = Instant::now();
        canvas.advance_timers(start);
        canvas.advance_timers(start + Duration::from_millis(10));
        assert_eq!(canvas.point_count(), 4);
        canvas.advance_timers(start + Duration::from_millis(100));
        // Never trims the last point.
        assert_eq!(canvas.point_count(), 1);

        canvas.render_frame();
        assert_eq!(surface.fill_count(), 1);
        assert!(surface.clear_count() >= 1);
    }

    #[test]
    fn test_laser_pointer_clears_each_frame() {
        let (mut canvas, surface) = canvas(RenderPolicy::LaserPointer);
        canvas.begin_stroke(pt(0.0, 0.0));
        canvas.add_point(pt(10.0, 0.0));
        canvas.render_frame();
        canvas.render_frame();
        assert_eq!(surface.clear_count(), 2);
        assert_eq!(surface.fill_count(), 1);
    }

    #[test]
    fn test_canvas_pool_errors() {
        let host = RecordingHost::new();
        let mut pool = CanvasPool::new(Box::new(host.clone()));
        let size = Size::new(100.0, 100.0);

        pool.acquire("a", RenderPolicy::Wet, size, LaserTrail::default()).unwrap();
        assert!(matches!(
            pool.acquire("a", RenderPolicy::Wet, size, LaserTrail::default()),
            Err(InkError::CanvasAlreadyAcquired(_))
        ));
        assert_eq!(host.attached_count(), 1);

        pool.release("a").unwrap();
        assert!(matches!(pool.release("a"), Err(InkError::CanvasNotAcquired(_))));
        assert_eq!(host.attached_count(), 0);
        assert_eq!(pool.acquired_count(), 0);
    }
}
