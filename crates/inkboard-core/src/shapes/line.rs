//! Freehand line shape, painted point by point while the pointer moves.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_id, point_to_polyline_dist, points_bounds};
use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// Painting mode of a freehand stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineMode {
    /// Paints with the stroke color.
    #[default]
    Brush,
    /// Removes whatever was painted underneath.
    Erase,
}

/// How a stroke is composited onto the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    SourceOver,
    DestinationOut,
}

impl LineMode {
    pub fn composite(self) -> Composite {
        match self {
            LineMode::Brush => Composite::SourceOver,
            LineMode::Erase => Composite::DestinationOut,
        }
    }
}

/// A freehand stroke made of an ordered, growing list of points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub(crate) id: ShapeId,
    /// Points in paint order. Never empty.
    pub points: Vec<Point>,
    pub mode: LineMode,
    pub style: ShapeStyle,
}

impl Line {
    /// Start a stroke at `start`.
    pub fn new(start: Point, mode: LineMode) -> Self {
        Self {
            id: new_id(),
            points: vec![start],
            mode,
            style: ShapeStyle::default(),
        }
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Append the next pointer position.
    pub fn push_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Number of points painted so far.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Coordinates flattened to `[x0, y0, x1, y1, ...]`.
    pub fn flat_points(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }
}

impl ShapeTrait for Line {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        points_bounds(&self.points)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.points) <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some((first, rest)) = self.points.split_first() else {
            return path;
        };
        path.move_to(*first);
        if rest.is_empty() {
            // A single tap still shows up as a dot under round caps
            path.line_to(*first);
        }
        for p in rest {
            path.line_to(*p);
        }
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        for p in &mut self.points {
            *p = affine * *p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_points_grow_by_two() {
        let mut line = Line::new(Point::new(1.0, 2.0), LineMode::Brush);
        assert_eq!(line.flat_points(), vec![1.0, 2.0]);
        line.push_point(Point::new(3.0, 4.0));
        assert_eq!(line.flat_points(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(line.len(), 2);
    }

    #[test]
    fn test_mode_composite() {
        assert_eq!(LineMode::Brush.composite(), Composite::SourceOver);
        assert_eq!(LineMode::Erase.composite(), Composite::DestinationOut);
    }

    #[test]
    fn test_hit_test_along_stroke() {
        let mut line = Line::new(Point::new(0.0, 0.0), LineMode::Brush);
        line.push_point(Point::new(100.0, 0.0));
        assert!(line.hit_test(Point::new(50.0, 2.0), 2.0));
        assert!(!line.hit_test(Point::new(50.0, 20.0), 2.0));
    }

    #[test]
    fn test_single_point_path_is_not_empty() {
        let line = Line::new(Point::new(5.0, 5.0), LineMode::Erase);
        assert_eq!(line.to_path().elements().len(), 2);
        let bounds = line.bounds();
        assert!((bounds.x0 - 5.0).abs() < f64::EPSILON);
        assert!(bounds.width().abs() < f64::EPSILON);
    }
}
