//! Viewport transform between screen and ink coordinates.

use crate::geometry::{screen_to_viewport, viewport_to_screen};
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Which point of the host element ink coordinates are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReferencePoint {
    TopLeft,
    #[default]
    Center,
}

/// Pan, zoom and size of the ink viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Translation applied after the reference point (pan)
    pub offset: Vec2,
    /// Zoom factor
    pub scale: f64,
    pub reference_point: ReferencePoint,
    /// Size of the host element in screen pixels
    pub size: Size,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            reference_point: ReferencePoint::default(),
            size: Size::ZERO,
        }
    }
}

impl Viewport {
    pub fn new(size: Size) -> Self {
        Self { size, ..Self::default() }
    }

    /// Screen position of the ink origin before the offset is applied.
    pub fn reference(&self) -> Point {
        match self.reference_point {
            ReferencePoint::Center => Point::new(self.size.width / 2.0, self.size.height / 2.0),
            ReferencePoint::TopLeft => Point::ZERO,
        }
    }

    /// Transform from ink coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.reference().to_vec2() + self.offset) * Affine::scale(self.scale)
    }

    pub fn screen_to_viewport(&self, p: Point) -> Point {
        screen_to_viewport(p, self.reference(), self.offset, self.scale)
    }

    pub fn viewport_to_screen(&self, p: Point) -> Point {
        viewport_to_screen(p, self.reference(), self.offset, self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_reference() {
        let viewport = Viewport::new(Size::new(800.0, 600.0));
        let p = viewport.screen_to_viewport(Point::new(400.0, 300.0));
        assert!(p.x.abs() < f64::EPSILON && p.y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_top_left_reference() {
        let mut viewport = Viewport::new(Size::new(800.0, 600.0));
        viewport.reference_point = ReferencePoint::TopLeft;
        viewport.scale = 2.0;
        let p = viewport.screen_to_viewport(Point::new(100.0, 200.0));
        assert!((p.x - 50.0).abs() < f64::EPSILON);
        assert!((p.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_transform_matches_conversion() {
        let mut viewport = Viewport::new(Size::new(640.0, 480.0));
        viewport.offset = Vec2::new(30.0, -20.0);
        viewport.scale = 1.5;

        let ink = Point::new(12.0, -7.0);
        let via_affine = viewport.transform() * ink;
        let via_fn = viewport.viewport_to_screen(ink);
        assert!((via_affine.x - via_fn.x).abs() < 1e-10);
        assert!((via_affine.y - via_fn.y).abs() < 1e-10);

        let back = viewport.screen_to_viewport(via_fn);
        assert!((back.x - ink.x).abs() < 1e-10);
        assert!((back.y - ink.y).abs() < 1e-10);
    }
}
