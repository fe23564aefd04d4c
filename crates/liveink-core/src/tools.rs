//! Inking tools.

use crate::error::InkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available inking tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum InkingTool {
    #[default]
    Stroke,
    LaserPointer,
    Highlighter,
    Eraser,
    PointEraser,
}

impl InkingTool {
    /// Whether this tool produces a wet stroke while the pointer is down.
    pub fn is_stroke_based(self) -> bool {
        matches!(
            self,
            InkingTool::Stroke | InkingTool::LaserPointer | InkingTool::Highlighter
        )
    }

    /// Whether strokes drawn with this tool are committed as dry ink when they end.
    pub fn commits_on_end(self) -> bool {
        matches!(self, InkingTool::Stroke | InkingTool::Highlighter)
    }

    /// Wire name of the tool.
    pub fn name(self) -> &'static str {
        match self {
            InkingTool::Stroke => "stroke",
            InkingTool::LaserPointer => "laserPointer",
            InkingTool::Highlighter => "highlighter",
            InkingTool::Eraser => "eraser",
            InkingTool::PointEraser => "pointEraser",
        }
    }
}

impl fmt::Display for InkingTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InkingTool {
    type Err = InkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stroke" => Ok(InkingTool::Stroke),
            "laserPointer" => Ok(InkingTool::LaserPointer),
            "highlighter" => Ok(InkingTool::Highlighter),
            "eraser" => Ok(InkingTool::Eraser),
            "pointEraser" => Ok(InkingTool::PointEraser),
            other => Err(InkError::UnknownTool(other.to_string())),
        }
    }
}
