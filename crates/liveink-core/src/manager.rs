//! The inking manager: pointer state machine, stroke table and wet ink.

use crate::brush::Brush;
use crate::canvas::{CanvasPool, InkingCanvas, LaserTrail, RenderPolicy};
use crate::change_log::ChangeLog;
use crate::config::InkingConfig;
use crate::error::{InkError, InkResult};
use crate::geometry::{PointerPoint, make_rectangle_from_point};
use crate::input::{InputFilterCollection, JitterFilter, PointerEvent, ScreenToViewportFilter};
use crate::scheduler::{FrameRequest, Instant, IntervalTimer};
use crate::stroke::{Stroke, StrokeId, StrokeOptions, generate_stroke_id};
use crate::surface::{InkSurface, SurfaceHost};
use crate::tools::InkingTool;
use crate::viewport::{ReferencePoint, Viewport};
use kurbo::{Point, Size, Vec2};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Events produced by the manager, drained with [`InkingManager::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum InkEvent {
    /// Strokes were committed (new or replacing ones with the same id)
    StrokesAdded(Vec<Stroke>),
    StrokesRemoved(Vec<StrokeId>),
    Cleared,
    /// A pointer-driven wet stroke started
    BeginStroke {
        tool: InkingTool,
        stroke_id: StrokeId,
        brush: Brush,
        start_point: PointerPoint,
    },
    AddPoint {
        stroke_id: StrokeId,
        point: PointerPoint,
    },
    /// A pointer-driven wet stroke ended or was cancelled
    EndStroke {
        stroke_id: StrokeId,
        point: PointerPoint,
    },
}

/// Who drives a wet stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WetStrokeOrigin {
    /// Created by this manager's pointer input; committed on end
    Pointer,
    /// Created through the public wet stroke API (e.g. a remote peer);
    /// display only, the committed copy arrives through `add_stroke`
    External,
}

/// An in-progress stroke rendered onto its own overlay canvas.
pub struct WetStroke {
    stroke: Stroke,
    tool: InkingTool,
    origin: WetStrokeOrigin,
    canvas: InkingCanvas,
}

impl WetStroke {
    pub fn id(&self) -> &str {
        self.stroke.id()
    }

    pub fn tool(&self) -> InkingTool {
        self.tool
    }

    pub fn origin(&self) -> WetStrokeOrigin {
        self.origin
    }

    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    pub fn canvas(&self) -> &InkingCanvas {
        &self.canvas
    }

    fn add_point(&mut self, p: PointerPoint) -> bool {
        if !self.stroke.add_point(p) {
            return false;
        }
        if self.stroke.len() == 1 {
            self.canvas.set_brush(*self.stroke.brush());
            self.canvas.begin_stroke(p);
        } else {
            self.canvas.add_point(p);
        }
        true
    }

    fn end(&mut self, p: PointerPoint) {
        self.stroke.add_point(p);
        self.canvas.end_stroke(p);
    }
}

/// Builder for [`InkingManager`].
#[derive(Default)]
pub struct InkingManagerBuilder {
    dry_surface: Option<Box<dyn InkSurface>>,
    wet_host: Option<Box<dyn SurfaceHost>>,
    config: InkingConfig,
    viewport_size: Option<Size>,
}

impl InkingManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface committed ink is rendered to.
    pub fn dry_surface(mut self, surface: Box<dyn InkSurface>) -> Self {
        self.dry_surface = Some(surface);
        self
    }

    /// Host that provides an overlay surface per wet stroke.
    pub fn wet_host(mut self, host: Box<dyn SurfaceHost>) -> Self {
        self.wet_host = Some(host);
        self
    }

    pub fn config(mut self, config: InkingConfig) -> Self {
        self.config = config;
        self
    }

    /// Viewport size; defaults to the dry surface size.
    pub fn viewport_size(mut self, size: Size) -> Self {
        self.viewport_size = Some(size);
        self
    }

    pub fn build(self) -> InkResult<InkingManager> {
        let dry_surface = self
            .dry_surface
            .ok_or_else(|| InkError::Configuration("missing dry surface".to_string()))?;
        let wet_host = self
            .wet_host
            .ok_or_else(|| InkError::Configuration("missing wet canvas host".to_string()))?;

        let size = self.viewport_size.unwrap_or_else(|| dry_surface.size());
        let viewport = Rc::new(Cell::new(Viewport::new(size)));

        let mut filters = InputFilterCollection::new();
        filters.add_filter(Box::new(JitterFilter::new()));
        filters.add_filter(Box::new(ScreenToViewportFilter::new(viewport.clone())));

        let mut dry_canvas = InkingCanvas::new(RenderPolicy::Dry, dry_surface);
        dry_canvas.resize(size);
        dry_canvas.set_transform(viewport.get().transform());

        let config = self.config;
        log::debug!("inking manager built with viewport {}x{}", size.width, size.height);

        Ok(InkingManager {
            eraser_size: config.eraser_size,
            point_erase_timer: IntervalTimer::new(config.point_erase_interval()),
            laser_trail: LaserTrail {
                max_points: config.laser_max_points,
                trail_duration: config.laser_trail(),
            },
            config,
            dry_canvas,
            pool: CanvasPool::new(wet_host),
            filters,
            viewport,
            tool: InkingTool::default(),
            active: false,
            active_pointer: None,
            current_stroke: None,
            wet_strokes: HashMap::new(),
            strokes: HashMap::new(),
            z_order: Vec::new(),
            pending_point_erase: Vec::new(),
            change_log: ChangeLog::new(),
            updating: false,
            rerender: FrameRequest::default(),
            events: Vec::new(),
            stroke_brush: Brush::stroke(),
            highlighter_brush: Brush::highlighter(),
            laser_pointer_brush: Brush::laser_pointer(),
            next_stroke_id: generate_stroke_id,
        })
    }
}

/// Turns pointer input into strokes, renders them and tracks changes.
pub struct InkingManager {
    config: InkingConfig,
    eraser_size: f64,
    laser_trail: LaserTrail,
    dry_canvas: InkingCanvas,
    pool: CanvasPool,
    filters: InputFilterCollection,
    viewport: Rc<Cell<Viewport>>,
    tool: InkingTool,
    active: bool,
    /// Pointer captured by the current gesture
    active_pointer: Option<u32>,
    /// Wet stroke driven by the captured pointer
    current_stroke: Option<StrokeId>,
    wet_strokes: HashMap<StrokeId, WetStroke>,
    strokes: HashMap<StrokeId, Stroke>,
    /// Render order of committed strokes
    z_order: Vec<StrokeId>,
    pending_point_erase: Vec<Point>,
    point_erase_timer: IntervalTimer,
    change_log: ChangeLog,
    updating: bool,
    rerender: FrameRequest,
    events: Vec<InkEvent>,
    stroke_brush: Brush,
    highlighter_brush: Brush,
    laser_pointer_brush: Brush,
    /// Source of ids for pointer-driven strokes
    next_stroke_id: fn() -> StrokeId,
}

impl InkingManager {
    pub fn builder() -> InkingManagerBuilder {
        InkingManagerBuilder::new()
    }

    pub fn config(&self) -> &InkingConfig {
        &self.config
    }

    // --- Input ---

    /// Start accepting pointer input.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Stop accepting pointer input, ending any gesture in progress.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.cancel_current_stroke();
        self.stop_point_erase_processing();
        self.flush_change_log();
        self.active_pointer = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Handle a pointer press. Returns whether the event was consumed.
    pub fn pointer_down(&mut self, event: &PointerEvent) -> bool {
        if !self.active || self.active_pointer.is_some() {
            return false;
        }
        self.active_pointer = Some(event.pointer_id);

        self.filters.reset(event.point);
        let point = self.filters.filter_point(event.point);

        match self.tool {
            InkingTool::Stroke | InkingTool::LaserPointer | InkingTool::Highlighter => {
                let brush = self.brush_for(self.tool);
                let options = StrokeOptions::default()
                    .with_id((self.next_stroke_id)())
                    .with_brush(brush);
                match self.start_wet_stroke(self.tool, point, options, WetStrokeOrigin::Pointer) {
                    Ok(id) => {
                        self.events.push(InkEvent::BeginStroke {
                            tool: self.tool,
                            stroke_id: id.clone(),
                            brush,
                            start_point: point,
                        });
                        self.current_stroke = Some(id);
                    }
                    Err(e) => {
                        log::warn!("failed to begin wet stroke: {e}");
                        self.active_pointer = None;
                        return false;
                    }
                }
            }
            InkingTool::Eraser => self.erase(point.point()),
            InkingTool::PointEraser => self.enqueue_point_erase(point.point()),
        }
        true
    }

    /// Handle a pointer move of the captured pointer.
    pub fn pointer_move(&mut self, event: &PointerEvent) -> bool {
        if self.active_pointer != Some(event.pointer_id) {
            return false;
        }

        for raw in event.coalesced_points() {
            let point = self.filters.filter_point(raw);

            match self.tool {
                InkingTool::Stroke | InkingTool::LaserPointer | InkingTool::Highlighter => {
                    let Some(id) = self.current_stroke.clone() else {
                        continue;
                    };
                    let added = self
                        .wet_strokes
                        .get_mut(&id)
                        .is_some_and(|wet| wet.add_point(point));
                    if added {
                        log::trace!("stroke {id}: point ({}, {})", point.x, point.y);
                        self.events.push(InkEvent::AddPoint { stroke_id: id, point });
                    }
                }
                InkingTool::Eraser => self.erase(point.point()),
                InkingTool::PointEraser => self.enqueue_point_erase(point.point()),
            }
        }
        true
    }

    /// Handle the release of the captured pointer.
    pub fn pointer_up(&mut self, event: &PointerEvent) -> bool {
        if self.active_pointer != Some(event.pointer_id) {
            return false;
        }

        let point = self.filters.filter_point(event.point);

        match self.tool {
            InkingTool::Stroke | InkingTool::LaserPointer | InkingTool::Highlighter => {
                if let Some(id) = self.current_stroke.take() {
                    self.finish_wet_stroke(&id, point);
                    self.events.push(InkEvent::EndStroke { stroke_id: id, point });
                }
            }
            InkingTool::PointEraser => self.stop_point_erase_processing(),
            InkingTool::Eraser => {}
        }

        self.flush_change_log();
        self.active_pointer = None;
        true
    }

    // --- Tools and brushes ---

    pub fn tool(&self) -> InkingTool {
        self.tool
    }

    /// Switch tools. A wet stroke in progress is cancelled.
    pub fn set_tool(&mut self, tool: InkingTool) {
        if self.tool == tool {
            return;
        }
        self.cancel_current_stroke();
        if self.tool == InkingTool::PointEraser {
            self.stop_point_erase_processing();
        }
        self.tool = tool;
    }

    pub fn eraser_size(&self) -> f64 {
        self.eraser_size
    }

    pub fn set_eraser_size(&mut self, size: f64) {
        self.eraser_size = size;
    }

    pub fn stroke_brush(&self) -> &Brush {
        &self.stroke_brush
    }

    pub fn set_stroke_brush(&mut self, brush: Brush) {
        self.stroke_brush = brush;
    }

    pub fn highlighter_brush(&self) -> &Brush {
        &self.highlighter_brush
    }

    pub fn set_highlighter_brush(&mut self, brush: Brush) {
        self.highlighter_brush = brush;
    }

    pub fn laser_pointer_brush(&self) -> &Brush {
        &self.laser_pointer_brush
    }

    pub fn set_laser_pointer_brush(&mut self, brush: Brush) {
        self.laser_pointer_brush = brush;
    }

    fn brush_for(&self, tool: InkingTool) -> Brush {
        match tool {
            InkingTool::Highlighter => self.highlighter_brush,
            InkingTool::LaserPointer => self.laser_pointer_brush,
            _ => self.stroke_brush,
        }
    }

    // --- Viewport ---

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    pub fn offset(&self) -> Vec2 {
        self.viewport.get().offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.update_viewport(|viewport| {
            if viewport.offset == offset {
                return false;
            }
            viewport.offset = offset;
            true
        });
    }

    pub fn scale(&self) -> f64 {
        self.viewport.get().scale
    }

    /// Set the zoom factor. Non-positive values are ignored.
    pub fn set_scale(&mut self, scale: f64) {
        self.update_viewport(|viewport| {
            if viewport.scale == scale || scale <= 0.0 {
                return false;
            }
            viewport.scale = scale;
            true
        });
    }

    pub fn reference_point(&self) -> ReferencePoint {
        self.viewport.get().reference_point
    }

    pub fn set_reference_point(&mut self, reference_point: ReferencePoint) {
        self.update_viewport(|viewport| {
            if viewport.reference_point == reference_point {
                return false;
            }
            viewport.reference_point = reference_point;
            true
        });
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport.get().size
    }

    /// Resize the host element; canvases follow and ink is redrawn at once.
    pub fn resize(&mut self, size: Size) {
        self.dry_canvas.resize(size);
        for wet in self.wet_strokes.values_mut() {
            wet.canvas.resize(size);
        }
        self.update_viewport(|viewport| {
            viewport.size = size;
            true
        });
    }

    fn update_viewport(&mut self, change: impl FnOnce(&mut Viewport) -> bool) {
        let mut viewport = self.viewport.get();
        if !change(&mut viewport) {
            return;
        }
        self.viewport.set(viewport);

        let transform = viewport.transform();
        for wet in self.wet_strokes.values_mut() {
            wet.canvas.set_transform(transform);
        }
        self.rerender_now();
    }

    pub fn screen_to_viewport(&self, p: Point) -> Point {
        self.viewport.get().screen_to_viewport(p)
    }

    pub fn viewport_to_screen(&self, p: Point) -> Point {
        self.viewport.get().viewport_to_screen(p)
    }

    // --- Committed strokes ---

    pub fn get_stroke(&self, id: &str) -> Option<&Stroke> {
        self.strokes.get(id)
    }

    /// Committed strokes in render order.
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.z_order.iter().filter_map(|id| self.strokes.get(id))
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    /// Start batching programmatic changes into a single notification.
    pub fn begin_update(&mut self) {
        self.updating = true;
    }

    pub fn end_update(&mut self) {
        if self.updating {
            self.updating = false;
            self.flush_change_log();
        }
    }

    /// Commit a stroke, replacing any stroke with the same id.
    pub fn add_stroke(&mut self, stroke: Stroke) {
        self.internal_add_stroke(stroke);
        self.flush_unless_updating();
    }

    /// Remove a committed stroke. Returns whether it existed.
    pub fn remove_stroke(&mut self, id: &str) -> bool {
        if self.strokes.remove(id).is_none() {
            return false;
        }
        self.z_order.retain(|existing| existing != id);
        self.rerender.request();
        self.change_log.remove_stroke(id);
        self.flush_unless_updating();
        true
    }

    /// Remove every stroke touched by the eraser probe centred on `p`,
    /// including strokes lying entirely inside it.
    pub fn erase(&mut self, p: Point) {
        let eraser = make_rectangle_from_point(p, self.eraser_size, self.eraser_size);
        let mut result = ChangeLog::new();

        for id in &self.z_order {
            if let Some(stroke) = self.strokes.get(id) {
                if stroke.touches_rectangle(&eraser) {
                    result.remove_stroke(id);
                }
            }
        }

        if result.has_changes() {
            for id in result.removed_strokes() {
                self.strokes.remove(id);
            }
            let strokes = &self.strokes;
            self.z_order.retain(|id| strokes.contains_key(id));
            self.rerender.request();
            self.change_log.merge(result);
        }

        self.flush_unless_updating();
    }

    /// Erase only the ink inside the eraser probe centred on `p`.
    pub fn point_erase(&mut self, p: Point) {
        self.internal_point_erase(p);
        self.flush_unless_updating();
    }

    /// Remove all committed strokes.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.z_order.clear();
        self.change_log.clear();
        self.rerender.request();
        self.events.push(InkEvent::Cleared);
    }

    // --- Wet strokes ---

    /// Begin a display-only wet stroke, typically mirroring a remote peer.
    ///
    /// Fails with `UnsupportedTool` for eraser tools and with
    /// `CanvasAlreadyAcquired` when a wet stroke with that id exists.
    pub fn begin_wet_stroke(
        &mut self,
        tool: InkingTool,
        start: PointerPoint,
        options: StrokeOptions,
    ) -> InkResult<StrokeId> {
        self.start_wet_stroke(tool, start, options, WetStrokeOrigin::External)
    }

    pub fn add_wet_stroke_points(&mut self, id: &str, points: &[PointerPoint]) -> InkResult<()> {
        let wet = self
            .wet_strokes
            .get_mut(id)
            .ok_or_else(|| InkError::UnknownStroke(id.to_string()))?;
        for &p in points {
            wet.add_point(p);
        }
        Ok(())
    }

    /// End a wet stroke at `p` and release its canvas.
    pub fn end_wet_stroke(&mut self, id: &str, p: PointerPoint) -> InkResult<()> {
        if !self.wet_strokes.contains_key(id) {
            return Err(InkError::UnknownStroke(id.to_string()));
        }
        let committed = self.finish_wet_stroke(id, p);
        if self.current_stroke.as_deref() == Some(id) {
            self.current_stroke = None;
        }
        if committed {
            self.flush_unless_updating();
        }
        Ok(())
    }

    /// Discard a wet stroke without committing it.
    pub fn cancel_wet_stroke(&mut self, id: &str) -> InkResult<()> {
        self.wet_strokes
            .remove(id)
            .ok_or_else(|| InkError::UnknownStroke(id.to_string()))?;
        if self.current_stroke.as_deref() == Some(id) {
            self.current_stroke = None;
        }
        self.release_canvas(id);
        Ok(())
    }

    pub fn wet_stroke(&self, id: &str) -> Option<&WetStroke> {
        self.wet_strokes.get(id)
    }

    pub fn wet_stroke_count(&self) -> usize {
        self.wet_strokes.len()
    }

    /// Id of the wet stroke driven by the captured pointer.
    pub fn current_wet_stroke_id(&self) -> Option<&str> {
        self.current_stroke.as_deref()
    }

    fn start_wet_stroke(
        &mut self,
        tool: InkingTool,
        start: PointerPoint,
        options: StrokeOptions,
        origin: WetStrokeOrigin,
    ) -> InkResult<StrokeId> {
        if !tool.is_stroke_based() {
            return Err(InkError::UnsupportedTool(tool));
        }

        let mut stroke = Stroke::new(options);
        let id = stroke.id().to_string();
        if self.wet_strokes.contains_key(&id) {
            return Err(InkError::CanvasAlreadyAcquired(id));
        }

        let policy = if tool == InkingTool::LaserPointer {
            RenderPolicy::LaserPointer
        } else {
            RenderPolicy::Wet
        };
        let viewport = self.viewport.get();
        let mut canvas = self.pool.acquire(&id, policy, viewport.size, self.laser_trail)?;
        canvas.set_transform(viewport.transform());

        // Points given up front are replayed through the canvas.
        let initial: Vec<PointerPoint> = stroke.points().to_vec();
        stroke = Stroke::new(
            StrokeOptions::default()
                .with_id(id.clone())
                .with_brush(*stroke.brush()),
        );

        let mut wet = WetStroke { stroke, tool, origin, canvas };
        for p in initial {
            wet.add_point(p);
        }
        wet.add_point(start);

        self.wet_strokes.insert(id.clone(), wet);
        log::debug!("began {tool} wet stroke {id}");
        Ok(id)
    }

    /// End the wet stroke, commit it if it is pointer driven and its tool
    /// commits, then release its canvas. Returns whether it was committed.
    fn finish_wet_stroke(&mut self, id: &str, p: PointerPoint) -> bool {
        let Some(mut wet) = self.wet_strokes.remove(id) else {
            return false;
        };
        wet.end(p);

        let commit = wet.origin == WetStrokeOrigin::Pointer && wet.tool.commits_on_end();
        if commit {
            self.internal_add_stroke(wet.stroke);
        }
        self.release_canvas(id);
        commit
    }

    /// Cancel the pointer-driven wet stroke and tell peers it ended.
    fn cancel_current_stroke(&mut self) {
        let Some(id) = self.current_stroke.take() else {
            return;
        };
        let Some(wet) = self.wet_strokes.remove(&id) else {
            return;
        };
        let point = wet
            .stroke
            .last_point()
            .unwrap_or(PointerPoint::new(0.0, 0.0, 0.0));
        self.release_canvas(&id);
        log::debug!("cancelled wet stroke {id}");
        self.events.push(InkEvent::EndStroke { stroke_id: id, point });
    }

    fn release_canvas(&mut self, id: &str) {
        if let Err(e) = self.pool.release(id) {
            log::warn!("{e}");
        }
    }

    // --- Frame driving ---

    /// Run everything due at `now`: point erase batches, laser trails,
    /// the pending dry re-render and wet canvas frames.
    pub fn tick(&mut self, now: Instant) {
        if self.point_erase_timer.poll(now) > 0 {
            self.process_pending_point_erase();
        }

        for wet in self.wet_strokes.values_mut() {
            wet.canvas.advance_timers(now);
            wet.canvas.render_frame();
        }

        if self.rerender.take() {
            self.rerender_now();
        }
    }

    /// Whether a dry re-render is waiting for the next frame.
    pub fn has_pending_rerender(&self) -> bool {
        self.rerender.is_requested()
    }

    /// Drain the events produced since the last call.
    pub fn take_events(&mut self) -> Vec<InkEvent> {
        std::mem::take(&mut self.events)
    }

    fn rerender_now(&mut self) {
        self.dry_canvas.clear();
        self.dry_canvas.set_transform(self.viewport.get().transform());
        for id in &self.z_order {
            if let Some(stroke) = self.strokes.get(id) {
                self.dry_canvas.render_stroke(stroke);
            }
        }
    }

    // --- Changes from peers ---
    //
    // These mutate the stroke table and redraw without touching the change
    // log, so they neither emit events nor flush pending local changes.

    /// Commit a stroke received from a peer.
    pub(crate) fn apply_remote_stroke(&mut self, stroke: Stroke) {
        self.insert_stroke(stroke);
    }

    /// Remove a stroke a peer deleted. Returns whether it existed.
    pub(crate) fn apply_remote_removal(&mut self, id: &str) -> bool {
        if self.strokes.remove(id).is_none() {
            return false;
        }
        self.z_order.retain(|existing| existing != id);
        self.rerender.request();
        true
    }

    /// Remove all strokes after a peer cleared the document.
    pub(crate) fn apply_remote_clear(&mut self) {
        self.strokes.clear();
        self.z_order.clear();
        self.rerender.request();
    }

    // --- Internals ---

    fn internal_add_stroke(&mut self, stroke: Stroke) {
        let replaces = self.insert_stroke(stroke.clone());
        self.change_log.add_stroke(stroke, replaces);
    }

    /// Put `stroke` in the table and draw it. Returns whether it replaced a
    /// stroke with the same id.
    fn insert_stroke(&mut self, stroke: Stroke) -> bool {
        let id = stroke.id().to_string();
        let replaces = self.strokes.contains_key(&id);

        if replaces {
            self.rerender.request();
        } else {
            self.dry_canvas.render_stroke(&stroke);
            self.z_order.push(id.clone());
        }
        self.strokes.insert(id, stroke);
        replaces
    }

    fn internal_point_erase(&mut self, p: Point) {
        let eraser = make_rectangle_from_point(p, self.eraser_size, self.eraser_size);
        let mut result = ChangeLog::new();
        let mut z_order = Vec::with_capacity(self.z_order.len());

        for id in &self.z_order {
            let Some(stroke) = self.strokes.get(id) else {
                continue;
            };
            match stroke.point_erase(&eraser) {
                Some(fragments) => {
                    result.remove_stroke(id);
                    for fragment in fragments {
                        z_order.push(fragment.id().to_string());
                        result.add_stroke(fragment, false);
                    }
                }
                None => z_order.push(id.clone()),
            }
        }

        if !result.has_changes() {
            return;
        }

        for id in result.removed_strokes() {
            self.strokes.remove(id);
        }
        for fragment in result.added_strokes() {
            self.strokes.insert(fragment.id().to_string(), fragment);
        }
        self.z_order = z_order;
        self.rerender.request();
        self.change_log.merge(result);
    }

    fn enqueue_point_erase(&mut self, p: Point) {
        self.pending_point_erase.push(p);
        self.point_erase_timer.start();
    }

    fn process_pending_point_erase(&mut self) {
        for p in std::mem::take(&mut self.pending_point_erase) {
            self.internal_point_erase(p);
        }
    }

    fn stop_point_erase_processing(&mut self) {
        self.point_erase_timer.stop();
        self.process_pending_point_erase();
    }

    fn flush_unless_updating(&mut self) {
        if !self.updating {
            self.flush_change_log();
        }
    }

    fn flush_change_log(&mut self) {
        if !self.change_log.has_changes() {
            return;
        }
        let (removed, added) = self.change_log.take();
        if !removed.is_empty() {
            self.events.push(InkEvent::StrokesRemoved(removed));
        }
        if !added.is_empty() {
            self.events.push(InkEvent::StrokesAdded(added));
        }
    }
}
