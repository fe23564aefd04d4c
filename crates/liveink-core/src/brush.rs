//! Brush and drawing attribute values.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// An RGBA color with 8-bit channels and a floating point alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl InkColor {
    pub const BLACK: InkColor = InkColor::rgb(0, 0, 0);
    pub const RED: InkColor = InkColor::rgb(255, 0, 0);
    pub const HIGHLIGHTER_YELLOW: InkColor = InkColor::rgb(255, 252, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Convert to a peniko color for rendering.
    pub fn to_color(&self) -> Color {
        let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color::from_rgba8(self.r, self.g, self.b, alpha)
    }
}

impl Default for InkColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<InkColor> for Color {
    fn from(color: InkColor) -> Self {
        color.to_color()
    }
}

/// Shape of the pen tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrushTip {
    #[default]
    Ellipse,
    Rectangle,
}

/// How ink combines with what is already on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Darken,
}

/// Stroke style. Copied on assignment; never shared by reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brush {
    pub color: InkColor,
    pub tip: BrushTip,
    pub tip_size: f64,
    pub blend_mode: BlendMode,
}

impl Default for Brush {
    fn default() -> Self {
        Self::stroke()
    }
}

impl Brush {
    pub fn new(color: InkColor, tip: BrushTip, tip_size: f64, blend_mode: BlendMode) -> Self {
        Self { color, tip, tip_size, blend_mode }
    }

    /// Default pen brush.
    pub fn stroke() -> Self {
        Self::new(InkColor::BLACK, BrushTip::Ellipse, 10.0, BlendMode::Normal)
    }

    /// Default highlighter brush.
    pub fn highlighter() -> Self {
        Self::new(
            InkColor::HIGHLIGHTER_YELLOW,
            BrushTip::Rectangle,
            10.0,
            BlendMode::Darken,
        )
    }

    /// Default laser pointer brush.
    pub fn laser_pointer() -> Self {
        Self::new(InkColor::RED, BrushTip::Ellipse, 10.0, BlendMode::Normal)
    }

    pub fn with_color(mut self, color: InkColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_tip(mut self, tip: BrushTip) -> Self {
        self.tip = tip;
        self
    }

    pub fn with_tip_size(mut self, tip_size: f64) -> Self {
        self.tip_size = tip_size;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }
}

/// Style as consumed by canvases, with independent tip width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingAttributes {
    pub color: InkColor,
    pub tip: BrushTip,
    pub tip_width: f64,
    pub tip_height: f64,
    pub blend_mode: BlendMode,
}

impl Default for DrawingAttributes {
    fn default() -> Self {
        Self {
            color: InkColor::BLACK,
            tip: BrushTip::Ellipse,
            tip_width: 8.0,
            tip_height: 10.0,
            blend_mode: BlendMode::Normal,
        }
    }
}

impl DrawingAttributes {
    pub fn half_width(&self) -> f64 {
        self.tip_width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.tip_height / 2.0
    }
}

impl From<&Brush> for DrawingAttributes {
    fn from(brush: &Brush) -> Self {
        Self {
            color: brush.color,
            tip: brush.tip,
            tip_width: brush.tip_size,
            tip_height: brush.tip_size,
            blend_mode: brush.blend_mode,
        }
    }
}

impl From<Brush> for DrawingAttributes {
    fn from(brush: Brush) -> Self {
        Self::from(&brush)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_brushes() {
        let stroke = Brush::stroke();
        assert_eq!(stroke.color, InkColor::BLACK);
        assert_eq!(stroke.tip, BrushTip::Ellipse);
        assert_eq!(stroke.blend_mode, BlendMode::Normal);

        let highlighter = Brush::highlighter();
        assert_eq!(highlighter.color, InkColor::rgba(255, 252, 0, 1.0));
        assert_eq!(highlighter.tip, BrushTip::Rectangle);
        assert_eq!(highlighter.blend_mode, BlendMode::Darken);

        assert_eq!(Brush::laser_pointer().color, InkColor::RED);
    }

    #[test]
    fn test_brush_is_copied() {
        let original = Brush::stroke();
        let mut copy = original;
        copy.tip_size = 42.0;
        assert_eq!(original.tip_size, 10.0);
    }

    #[test]
    fn test_drawing_attributes_from_brush() {
        let attrs = DrawingAttributes::from(&Brush::highlighter().with_tip_size(6.0));
        assert_eq!(attrs.tip_width, 6.0);
        assert_eq!(attrs.tip_height, 6.0);
        assert_eq!(attrs.half_width(), 3.0);
        assert_eq!(attrs.tip, BrushTip::Rectangle);

        let default = DrawingAttributes::default();
        assert_eq!((default.tip_width, default.tip_height), (8.0, 10.0));
    }

    #[test]
    fn test_brush_json_shape() {
        let json = serde_json::to_value(Brush::highlighter()).unwrap();
        assert_eq!(json["tip"], "rectangle");
        assert_eq!(json["tipSize"], 10.0);
        assert_eq!(json["blendMode"], "darken");
        assert_eq!(json["color"]["g"], 252);
        assert_eq!(json["color"]["a"], 1.0);
    }

    #[test]
    fn test_color_alpha_conversion() {
        let color = InkColor::rgba(10, 20, 30, 0.5).to_color();
        let rgba = color.to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b, rgba.a), (10, 20, 30, 128));
    }
}
