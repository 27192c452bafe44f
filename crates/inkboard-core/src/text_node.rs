//! Text nodes: creation with a width-only transformer, and edit sessions.

use crate::config::TextConfig;
use crate::shapes::{ShapeId, ShapeStyle, Text};
use crate::stage::{Layer, Stage};
use crate::transformer::{AnchorSet, Transformer};
use kurbo::Point;

/// Builds editable text nodes on a stage's layer.
pub struct TextNodeHelper;

impl TextNodeHelper {
    /// Add a text node to `layer` and return its id with a transformer
    /// bound to it. The node is kept inside the stage.
    pub fn create(stage: &Stage, layer: &mut Layer, config: &TextConfig) -> (ShapeId, Transformer) {
        let bounds = stage.bounds();
        let position = Point::new(
            config.position.x.clamp(bounds.x0, bounds.x1.max(bounds.x0)),
            config.position.y.clamp(bounds.y0, bounds.y1.max(bounds.y0)),
        );
        let text = Text::new(position, config.content.clone(), config.width)
            .with_font_size(config.font_size)
            .with_style(ShapeStyle::stroked(config.color, 0.0));
        let id = layer.add(text.into());
        layer.batch_draw();

        let mut transformer = Transformer::new(AnchorSet::WidthOnly);
        transformer.attach(id);
        (id, transformer)
    }
}

/// An open text edit. Holds what to restore on cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub shape_id: ShapeId,
    pub original: String,
}

impl TextEdit {
    pub fn new(shape_id: ShapeId, original: impl Into<String>) -> Self {
        Self {
            shape_id,
            original: original.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_adds_node_with_transformer() {
        let stage = Stage::new(800.0, 600.0);
        let mut layer = Layer::new();
        let (id, transformer) = TextNodeHelper::create(&stage, &mut layer, &TextConfig::default());

        assert_eq!(transformer.node(), Some(id));
        assert_eq!(transformer.anchors(), AnchorSet::WidthOnly);
        assert_eq!(transformer.handles(&layer).len(), 2);

        let text = layer.get(id).and_then(|s| s.as_text());
        assert_eq!(text.map(|t| t.content.as_str()), Some("Some text here"));
        assert!(layer.redraw_pending());
    }

    #[test]
    fn test_create_clamps_into_small_stage() {
        let stage = Stage::new(20.0, 20.0);
        let mut layer = Layer::new();
        let (id, _) = TextNodeHelper::create(&stage, &mut layer, &TextConfig::default());
        let position = layer.get(id).and_then(|s| s.as_text()).map(|t| t.position);
        assert_eq!(position, Some(Point::new(20.0, 20.0)));
    }
}
