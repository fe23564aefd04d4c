//! Vello-backed ink surfaces.
//!
//! Fills are encoded into Vello scenes. Consecutive fills sharing a
//! composite mode go into the same [`InkLayer`], so the host compositor can
//! present each layer with its own blend without re-encoding the ink.

use kurbo::{BezPath, Size};
use liveink_core::{BlendMode, Composite, InkSurface, Paint, SurfaceHost};
use peniko::{Fill, Mix};
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use vello::Scene;

/// A run of fills sharing one composite mode.
pub struct InkLayer {
    pub composite: Composite,
    pub scene: Scene,
}

impl InkLayer {
    fn new(composite: Composite) -> Self {
        Self { composite, scene: Scene::new() }
    }

    /// Blend mode to present this layer with.
    pub fn blend_mode(&self) -> peniko::BlendMode {
        match self.composite {
            Composite::SourceOver => Mix::Normal.into(),
            Composite::Darken => Mix::Darken.into(),
        }
    }
}

#[derive(Default)]
struct SurfaceState {
    size: Size,
    layers: Vec<InkLayer>,
    element_blend: BlendMode,
    fill_count: usize,
}

/// Ink surface encoding into Vello scenes. Clones share the same scenes, so
/// one clone can be boxed into a canvas while the host keeps another for
/// presentation.
#[derive(Clone, Default)]
pub struct VelloSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl VelloSurface {
    pub fn new(size: Size) -> Self {
        let surface = Self::default();
        surface.state.borrow_mut().size = size;
        surface
    }

    /// Layers drawn since the last clear, bottom first.
    pub fn layers(&self) -> Ref<'_, [InkLayer]> {
        Ref::map(self.state.borrow(), |state| state.layers.as_slice())
    }

    pub fn layer_count(&self) -> usize {
        self.state.borrow().layers.len()
    }

    /// Number of paths filled since the last clear.
    pub fn fill_count(&self) -> usize {
        self.state.borrow().fill_count
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().layers.is_empty()
    }

    /// How the whole surface should blend with content beneath it.
    pub fn element_blend(&self) -> BlendMode {
        self.state.borrow().element_blend
    }

    /// Blend for the whole surface, as a Vello blend mode.
    pub fn element_blend_mode(&self) -> peniko::BlendMode {
        match self.element_blend() {
            BlendMode::Normal => Mix::Normal.into(),
            BlendMode::Darken => Mix::Darken.into(),
        }
    }

    /// Take the encoded layers, leaving the surface blank.
    pub fn take_layers(&self) -> Vec<InkLayer> {
        let mut state = self.state.borrow_mut();
        state.fill_count = 0;
        std::mem::take(&mut state.layers)
    }
}

impl InkSurface for VelloSurface {
    fn size(&self) -> Size {
        self.state.borrow().size
    }

    fn resize(&mut self, size: Size) {
        self.state.borrow_mut().size = size;
    }

    fn clear(&mut self) {
        let mut state = self.state.borrow_mut();
        state.layers.clear();
        state.fill_count = 0;
    }

    fn fill(&mut self, path: &BezPath, paint: &Paint) {
        let mut state = self.state.borrow_mut();
        let reuse = state
            .layers
            .last()
            .is_some_and(|layer| layer.composite == paint.composite);
        if !reuse {
            state.layers.push(InkLayer::new(paint.composite));
        }
        if let Some(layer) = state.layers.last_mut() {
            layer
                .scene
                .fill(Fill::NonZero, paint.transform, paint.color, None, path);
        }
        state.fill_count += 1;
    }

    fn set_element_blend(&mut self, mode: BlendMode) {
        self.state.borrow_mut().element_blend = mode;
    }
}

/// Hands out one [`VelloSurface`] per wet stroke overlay.
#[derive(Clone, Default)]
pub struct VelloSurfaceHost {
    surfaces: Rc<RefCell<HashMap<String, VelloSurface>>>,
}

impl VelloSurfaceHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay currently attached under `id`.
    pub fn surface(&self, id: &str) -> Option<VelloSurface> {
        self.surfaces.borrow().get(id).cloned()
    }

    /// Attached overlays in no particular order.
    pub fn surfaces(&self) -> Vec<VelloSurface> {
        self.surfaces.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.surfaces.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.borrow().is_empty()
    }
}

impl SurfaceHost for VelloSurfaceHost {
    fn attach(&mut self, id: &str, size: Size) -> Box<dyn InkSurface> {
        let surface = VelloSurface::new(size);
        if self
            .surfaces
            .borrow_mut()
            .insert(id.to_string(), surface.clone())
            .is_some()
        {
            log::warn!("Replaced overlay surface {}", id);
        }
        log::debug!("Attached overlay surface {} ({}x{})", id, size.width, size.height);
        Box::new(surface)
    }

    fn detach(&mut self, id: &str) {
        if self.surfaces.borrow_mut().remove(id).is_some() {
            log::debug!("Detached overlay surface {}", id);
        }
    }
}
