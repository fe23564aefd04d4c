//! Pointer input events and the point filter chain.

use crate::geometry::PointerPoint;
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// A single pointer sample delivered by the host, possibly carrying a
/// batch of coalesced samples that arrived since the previous event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub point: PointerPoint,
    #[serde(default)]
    pub coalesced: Vec<PointerPoint>,
}

impl PointerEvent {
    pub fn new(pointer_id: u32, point: PointerPoint) -> Self {
        Self { pointer_id, point, coalesced: Vec::new() }
    }

    pub fn with_coalesced(mut self, coalesced: Vec<PointerPoint>) -> Self {
        self.coalesced = coalesced;
        self
    }

    /// The samples to process for this event, in arrival order.
    pub fn coalesced_points(&self) -> Vec<PointerPoint> {
        if self.coalesced.is_empty() {
            vec![self.point]
        } else {
            self.coalesced.clone()
        }
    }
}

/// A stage in the point filter chain.
pub trait InputFilter {
    /// Reset internal state at the start of a stroke.
    fn reset(&mut self, _start: PointerPoint) {}

    fn filter_point(&mut self, p: PointerPoint) -> PointerPoint;
}

/// Second-order IIR smoothing:
/// `out[n] = (1 - a - b) * in[n] + a * out[n-1] + b * out[n-2]`.
#[derive(Debug, Clone)]
pub struct JitterFilter {
    out1: PointerPoint,
    out2: PointerPoint,
}

impl JitterFilter {
    const A: f64 = 1.33;
    const B: f64 = -0.5;
    const AB: f64 = 1.0 - Self::A - Self::B;

    pub fn new() -> Self {
        let origin = PointerPoint::new(0.0, 0.0, 0.0);
        Self { out1: origin, out2: origin }
    }

    fn iir(input: f64, output1: f64, output2: f64) -> f64 {
        Self::AB * input + Self::A * output1 + Self::B * output2
    }
}

impl Default for JitterFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl InputFilter for JitterFilter {
    fn reset(&mut self, start: PointerPoint) {
        self.out1 = start;
        self.out2 = start;
    }

    fn filter_point(&mut self, p: PointerPoint) -> PointerPoint {
        let output = PointerPoint::new(
            Self::iir(p.x, self.out1.x, self.out2.x),
            Self::iir(p.y, self.out1.y, self.out2.y),
            p.pressure,
        );
        self.out2 = self.out1;
        self.out1 = output;
        output
    }
}

/// Maps screen coordinates into ink coordinates using a live viewport.
pub struct ScreenToViewportFilter {
    viewport: Rc<Cell<Viewport>>,
}

impl ScreenToViewportFilter {
    pub fn new(viewport: Rc<Cell<Viewport>>) -> Self {
        Self { viewport }
    }
}

impl InputFilter for ScreenToViewportFilter {
    fn filter_point(&mut self, p: PointerPoint) -> PointerPoint {
        let mapped = self.viewport.get().screen_to_viewport(p.point());
        PointerPoint::from_point(mapped, p.pressure)
    }
}

/// Ordered chain of filters; each stage feeds the next.
#[derive(Default)]
pub struct InputFilterCollection {
    filters: Vec<Box<dyn InputFilter>>,
}

impl InputFilterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: Box<dyn InputFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn reset(&mut self, start: PointerPoint) {
        for filter in &mut self.filters {
            filter.reset(start);
        }
    }

    pub fn filter_point(&mut self, p: PointerPoint) -> PointerPoint {
        self.filters
            .iter_mut()
            .fold(p, |point, filter| filter.filter_point(point))
    }
}

impl InputFilter for InputFilterCollection {
    fn reset(&mut self, start: PointerPoint) {
        InputFilterCollection::reset(self, start);
    }

    fn filter_point(&mut self, p: PointerPoint) -> PointerPoint {
        InputFilterCollection::filter_point(self, p)
    }
}
