//! Toolbar tools and the current tool selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A toolbar tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Circle,
    Rectangle,
    Line,
    Undo,
    Erase,
    Text,
    Arrow,
}

impl Tool {
    /// All tools in toolbar order.
    pub const ALL: [Tool; 7] = [
        Tool::Circle,
        Tool::Rectangle,
        Tool::Line,
        Tool::Undo,
        Tool::Erase,
        Tool::Text,
        Tool::Arrow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Circle => "circle",
            Tool::Rectangle => "rectangle",
            Tool::Line => "line",
            Tool::Undo => "undo",
            Tool::Erase => "erase",
            Tool::Text => "text",
            Tool::Arrow => "arrow",
        }
    }

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Tool::Circle => "Circle",
            Tool::Rectangle => "Rectangle",
            Tool::Line => "Line",
            Tool::Undo => "Undo",
            Tool::Erase => "Erase",
            Tool::Text => "Text",
            Tool::Arrow => "Arrow",
        }
    }

    /// Tools that create their shape on pointer-down instead of on selection.
    pub fn is_freehand(self) -> bool {
        matches!(self, Tool::Line | Tool::Erase)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool: {0}")]
pub struct ParseToolError(pub String);

impl FromStr for Tool {
    type Err = ParseToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| ParseToolError(s.to_string()))
    }
}

/// Per-tool active flags, one field per tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFlags {
    pub circle: bool,
    pub rectangle: bool,
    pub line: bool,
    pub undo: bool,
    pub erase: bool,
    pub text: bool,
    pub arrow: bool,
}

/// The current tool. At most one is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolState {
    current: Option<Tool>,
}

impl ToolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Tool> {
        self.current
    }

    pub fn set(&mut self, tool: Tool) {
        self.current = Some(tool);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_active(&self, tool: Tool) -> bool {
        self.current == Some(tool)
    }

    /// Whether pointer-down should start a stroke.
    pub fn is_painting_tool(&self) -> bool {
        self.current.is_some_and(Tool::is_freehand)
    }

    pub fn flags(&self) -> ToolFlags {
        let active = |tool| self.is_active(tool);
        ToolFlags {
            circle: active(Tool::Circle),
            rectangle: active(Tool::Rectangle),
            line: active(Tool::Line),
            undo: active(Tool::Undo),
            erase: active(Tool::Erase),
            text: active(Tool::Text),
            arrow: active(Tool::Arrow),
        }
    }
}
