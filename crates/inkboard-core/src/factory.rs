//! Shape factory: builds new nodes from the configured defaults.

use crate::config::FactoryConfig;
use crate::shapes::{Arrow, Circle, Line, LineMode, Rectangle, Shape, ShapeStyle};
use kurbo::Point;

#[derive(Debug, Clone, Default)]
pub struct ShapeFactory {
    config: FactoryConfig,
}

impl ShapeFactory {
    pub fn new(config: FactoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn circle(&self) -> Shape {
        let defaults = &self.config.circle;
        Circle::new(defaults.center, defaults.radius)
            .with_style(defaults.style.clone())
            .into()
    }

    pub fn rectangle(&self) -> Shape {
        let defaults = &self.config.rectangle;
        Rectangle::new(defaults.position, defaults.width, defaults.height)
            .with_style(defaults.style.clone())
            .into()
    }

    pub fn arrow(&self) -> Shape {
        let defaults = &self.config.arrow;
        Arrow::new(defaults.start, defaults.end)
            .with_pointer(defaults.pointer_length, defaults.pointer_width)
            .with_style(defaults.style.clone())
            .into()
    }

    /// Start a freehand stroke at `position`. `mode` selects painting or erasing.
    pub fn line(&self, position: Point, mode: LineMode) -> Shape {
        let stroke = self.config.line;
        Line::new(position, mode)
            .with_style(ShapeStyle::stroked(stroke.color, stroke.width))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Composite, ShapeKind, ShapeTrait};

    #[test]
    fn test_factory_kinds() {
        let factory = ShapeFactory::default();
        assert_eq!(factory.circle().kind(), ShapeKind::Circle);
        assert_eq!(factory.rectangle().kind(), ShapeKind::Rectangle);
        assert_eq!(factory.arrow().kind(), ShapeKind::Arrow);
        assert_eq!(factory.line(Point::ZERO, LineMode::Brush).kind(), ShapeKind::Line);
    }

    #[test]
    fn test_each_call_is_a_new_node() {
        let factory = ShapeFactory::default();
        assert_ne!(factory.circle().id(), factory.circle().id());
    }

    #[test]
    fn test_line_starts_at_position() {
        let factory = ShapeFactory::default();
        let shape = factory.line(Point::new(12.0, 34.0), LineMode::Erase);
        let Shape::Line(line) = shape else {
            panic!("expected a line");
        };
        assert_eq!(line.flat_points(), vec![12.0, 34.0]);
        assert_eq!(line.mode.composite(), Composite::DestinationOut);
        assert!((line.style().stroke_width - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_defaults_follow_config() {
        let mut config = FactoryConfig::default();
        config.circle.radius = 10.0;
        let factory = ShapeFactory::new(config);
        let Shape::Circle(circle) = factory.circle() else {
            panic!("expected a circle");
        };
        assert!((circle.radius_x - 10.0).abs() < f64::EPSILON);
        assert!(circle.style.fill_color.is_some());
    }
}
