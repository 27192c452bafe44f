//! Board configuration: stage sizing, interaction tolerances and the
//! defaults the shape factory and text helper build from.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```json
//! { "stage_width_fraction": 1.0, "factory": { "line": { "width": 8.0 } } }
//! ```

use crate::error::ConfigError;
use crate::shapes::{SerializableColor, ShapeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Share of the window width given to the stage at startup.
    pub stage_width_fraction: f64,
    /// Stage color. Erase strokes paint with it.
    pub background: SerializableColor,
    /// Pick distance around shapes, in pixels.
    pub hit_tolerance: f64,
    /// Pick distance around transformer anchors, in pixels.
    pub handle_tolerance: f64,
    /// Pointer travel before a press becomes a drag instead of a click.
    pub drag_threshold: f64,
    /// Maximum gap between two clicks of a double-click.
    pub double_click_ms: u64,
    pub factory: FactoryConfig,
    pub text: TextConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            stage_width_fraction: 0.9,
            background: SerializableColor::white(),
            hit_tolerance: 4.0,
            handle_tolerance: 8.0,
            drag_threshold: 3.0,
            double_click_ms: 400,
            factory: FactoryConfig::default(),
            text: TextConfig::default(),
        }
    }
}

impl BoardConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Geometry and style of shapes produced by [`crate::factory::ShapeFactory`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    pub circle: CircleDefaults,
    pub rectangle: RectangleDefaults,
    pub arrow: ArrowDefaults,
    /// Freehand strokes, both brush and erase.
    pub line: StrokeDefaults,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            circle: CircleDefaults::default(),
            rectangle: RectangleDefaults::default(),
            arrow: ArrowDefaults::default(),
            line: StrokeDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleDefaults {
    pub center: Point,
    pub radius: f64,
    pub style: ShapeStyle,
}

impl Default for CircleDefaults {
    fn default() -> Self {
        Self {
            center: Point::new(100.0, 100.0),
            radius: 70.0,
            style: ShapeStyle::stroked(SerializableColor::black(), 4.0)
                .with_fill(SerializableColor::new(255, 0, 0, 255)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangleDefaults {
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
}

impl Default for RectangleDefaults {
    fn default() -> Self {
        Self {
            position: Point::new(20.0, 50.0),
            width: 100.0,
            height: 50.0,
            style: ShapeStyle::stroked(SerializableColor::black(), 4.0)
                .with_fill(SerializableColor::new(0, 0, 255, 255)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowDefaults {
    pub start: Point,
    pub end: Point,
    pub pointer_length: f64,
    pub pointer_width: f64,
    pub style: ShapeStyle,
}

impl Default for ArrowDefaults {
    fn default() -> Self {
        Self {
            start: Point::new(150.0, 150.0),
            end: Point::new(250.0, 250.0),
            pointer_length: 20.0,
            pointer_width: 20.0,
            style: ShapeStyle::stroked(SerializableColor::black(), 4.0)
                .with_fill(SerializableColor::black()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeDefaults {
    pub color: SerializableColor,
    pub width: f64,
}

impl Default for StrokeDefaults {
    fn default() -> Self {
        Self {
            color: SerializableColor::new(0xdf, 0x4b, 0x26, 255),
            width: 5.0,
        }
    }
}

/// Defaults for text nodes created by the text tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub content: String,
    pub position: Point,
    pub font_size: f64,
    /// Initial wrap width.
    pub width: f64,
    pub color: SerializableColor,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "Some text here".to_string(),
            position: Point::new(50.0, 80.0),
            font_size: 20.0,
            width: 200.0,
            color: SerializableColor::black(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "stage_width_fraction": 1.0, "factory": { "line": { "width": 8.0 } } }"#;
        let config = BoardConfig::from_json(json).unwrap();
        assert!((config.stage_width_fraction - 1.0).abs() < f64::EPSILON);
        assert!((config.factory.line.width - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.factory.line.color, SerializableColor::new(0xdf, 0x4b, 0x26, 255));
        assert!((config.factory.circle.radius - 70.0).abs() < f64::EPSILON);
        assert_eq!(config.text.content, "Some text here");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            BoardConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(matches!(
            BoardConfig::from_file("/nonexistent/inkboard.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let json = BoardConfig::default().to_json().unwrap();
        let config = BoardConfig::from_json(&json).unwrap();
        assert_eq!(config.double_click_ms, 400);
    }
}
