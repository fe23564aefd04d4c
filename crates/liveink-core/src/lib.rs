//! LiveInk Core Library
//!
//! Platform-agnostic freehand ink: stroke geometry, incremental canvas
//! rendering, the inking manager and the collaborative sync adapter.

pub mod batch;
pub mod brush;
pub mod canvas;
pub mod change_log;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod manager;
pub mod scheduler;
pub mod stroke;
pub mod surface;
pub mod sync;
pub mod tools;
pub mod transport;
pub mod viewport;

pub use brush::{BlendMode, Brush, BrushTip, DrawingAttributes, InkColor};
pub use canvas::{CanvasPool, InkingCanvas, LaserTrail, RenderPolicy};
pub use config::{InkingConfig, SyncConfig};
pub use error::{InkError, InkResult};
pub use geometry::{PointerPoint, Quad};
pub use input::{InputFilter, InputFilterCollection, JitterFilter, PointerEvent};
pub use manager::{InkEvent, InkingManager, InkingManagerBuilder, WetStroke, WetStrokeOrigin};
pub use scheduler::Instant;
pub use stroke::{Stroke, StrokeId, StrokeOptions};
pub use surface::{Composite, InkSurface, Paint, RecordingHost, RecordingSurface, SurfaceHost};
pub use sync::{SharedInkingSession, SharedStrokeMap, UserRole, WetInkChannel, WetInkMessage};
pub use tools::InkingTool;
pub use transport::{MemoryChannel, MemoryHub, MemoryMap};
pub use viewport::{ReferencePoint, Viewport};
