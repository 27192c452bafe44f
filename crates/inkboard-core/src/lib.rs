//! Inkboard Core Library
//!
//! Platform-agnostic board model for the Inkboard whiteboard: shapes, the
//! stage and its layer, transform handles, and the controller that drives
//! them from tool, pointer and keyboard input.

pub mod board;
pub mod config;
pub mod error;
pub mod factory;
pub mod import;
pub mod input;
pub mod keymap;
pub mod shapes;
pub mod stage;
pub mod text_node;
pub mod tools;
pub mod transformer;

pub use board::{StrokeState, Whiteboard};
pub use config::{BoardConfig, FactoryConfig, TextConfig};
pub use error::{ConfigError, ImportError};
pub use factory::ShapeFactory;
pub use input::{InputState, Modifiers, PointerEvent, PointerSource};
pub use keymap::{Key, KeyCommand, KeyEvent, Keymap};
pub use stage::{ClickTarget, Layer, Stage};
pub use text_node::{TextEdit, TextNodeHelper};
pub use tools::{ParseToolError, Tool, ToolFlags, ToolState};
pub use transformer::{AnchorSet, Handle, HandleKind, Transformer, Transformers};
