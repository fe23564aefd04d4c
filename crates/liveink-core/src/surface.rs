//! Drawing surface abstraction implemented by rendering backends.

use crate::brush::BlendMode;
use kurbo::{Affine, BezPath, Size};
use peniko::Color;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// How a fill combines with pixels already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    #[default]
    SourceOver,
    Darken,
}

/// Fill parameters for one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub composite: Composite,
    /// Ink to surface transform
    pub transform: Affine,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            composite: Composite::SourceOver,
            transform: Affine::IDENTITY,
        }
    }
}

/// A host drawing surface that ink canvases render into.
pub trait InkSurface {
    fn size(&self) -> Size;

    fn resize(&mut self, size: Size);

    /// Erase everything drawn so far.
    fn clear(&mut self);

    /// Fill `path` (non-zero winding) with `paint`.
    fn fill(&mut self, path: &BezPath, paint: &Paint);

    /// Set how the whole surface blends with content underneath it.
    fn set_element_blend(&mut self, mode: BlendMode);
}

/// Creates and destroys overlay surfaces for wet strokes.
pub trait SurfaceHost {
    fn attach(&mut self, id: &str, size: Size) -> Box<dyn InkSurface>;

    fn detach(&mut self, id: &str);
}

/// A fill captured by a [`RecordingSurface`].
#[derive(Debug, Clone)]
pub struct FillRecord {
    pub path: BezPath,
    pub paint: Paint,
}

#[derive(Debug, Default)]
struct SurfaceState {
    size: Size,
    fills: Vec<FillRecord>,
    clears: usize,
    element_blend: BlendMode,
}

/// In-memory surface recording every call. Clones share the same record,
/// so a clone can be handed to a canvas while the original is inspected.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        let surface = Self::default();
        surface.state.borrow_mut().size = size;
        surface
    }

    /// Fills since the last clear.
    pub fn fills(&self) -> Vec<FillRecord> {
        self.state.borrow().fills.clone()
    }

    pub fn fill_count(&self) -> usize {
        self.state.borrow().fills.len()
    }

    pub fn clear_count(&self) -> usize {
        self.state.borrow().clears
    }

    pub fn element_blend(&self) -> BlendMode {
        self.state.borrow().element_blend
    }
}

impl InkSurface for RecordingSurface {
    fn size(&self) -> Size {
        self.state.borrow().size
    }

    fn resize(&mut self, size: Size) {
        self.state.borrow_mut().size = size;
    }

    fn clear(&mut self) {
        let mut state = self.state.borrow_mut();
        state.fills.clear();
        state.clears += 1;
    }

    fn fill(&mut self, path: &BezPath, paint: &Paint) {
        self.state.borrow_mut().fills.push(FillRecord {
            path: path.clone(),
            paint: *paint,
        });
    }

    fn set_element_blend(&mut self, mode: BlendMode) {
        self.state.borrow_mut().element_blend = mode;
    }
}

#[derive(Debug, Default)]
struct HostState {
    attached: HashMap<String, RecordingSurface>,
    attach_count: usize,
    detach_count: usize,
}

/// Surface host handing out [`RecordingSurface`]s. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    state: Rc<RefCell<HostState>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface currently attached under `id`.
    pub fn surface(&self, id: &str) -> Option<RecordingSurface> {
        self.state.borrow().attached.get(id).cloned()
    }

    pub fn attached_count(&self) -> usize {
        self.state.borrow().attached.len()
    }

    pub fn total_attached(&self) -> usize {
        self.state.borrow().attach_count
    }

    pub fn total_detached(&self) -> usize {
        self.state.borrow().detach_count
    }
}

impl SurfaceHost for RecordingHost {
    fn attach(&mut self, id: &str, size: Size) -> Box<dyn InkSurface> {
        let surface = RecordingSurface::new(size);
        let mut state = self.state.borrow_mut();
        state.attached.insert(id.to_string(), surface.clone());
        state.attach_count += 1;
        Box::new(surface)
    }

    fn detach(&mut self, id: &str) {
        let mut state = self.state.borrow_mut();
        if state.attached.remove(id).is_some() {
            state.detach_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Shape};

    #[test]
    fn test_recording_surface_shares_state() {
        let surface = RecordingSurface::new(Size::new(10.0, 10.0));
        let mut boxed: Box<dyn InkSurface> = Box::new(surface.clone());

        let path = Rect::new(0.0, 0.0, 1.0, 1.0).to_path(0.1);
        boxed.fill(&path, &Paint::default());
        assert_eq!(surface.fill_count(), 1);

        boxed.clear();
        assert_eq!(surface.fill_count(), 0);
        assert_eq!(surface.clear_count(), 1);

        boxed.set_element_blend(BlendMode::Darken);
        assert_eq!(surface.element_blend(), BlendMode::Darken);
    }

    #[test]
    fn test_recording_host_attach_detach() {
        let host = RecordingHost::new();
        let mut handle = host.clone();
        let _surface = handle.attach("a", Size::new(5.0, 5.0));
        assert_eq!(host.attached_count(), 1);
        assert_eq!(host.surface("a").unwrap().size(), Size::new(5.0, 5.0));

        handle.detach("a");
        handle.detach("a");
        assert_eq!(host.attached_count(), 0);
        assert_eq!(host.total_detached(), 1);
    }
}
