//! Arrow shape: a straight shaft ending in a filled head.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_id, point_to_segment_dist, points_bounds};
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrow {
    pub(crate) id: ShapeId,
    /// Tail of the shaft.
    pub start: Point,
    /// Tip of the head.
    pub end: Point,
    /// Head length along the shaft.
    pub pointer_length: f64,
    /// Head width across the shaft.
    pub pointer_width: f64,
    pub style: ShapeStyle,
}

impl Arrow {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: new_id(),
            start,
            end,
            pointer_length: 20.0,
            pointer_width: 20.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_pointer(mut self, length: f64, width: f64) -> Self {
        self.pointer_length = length;
        self.pointer_width = width;
        self
    }

    /// Unit direction from start to end (points right when degenerate).
    pub fn direction(&self) -> Vec2 {
        let d = self.end - self.start;
        let len = d.hypot();
        if len < f64::EPSILON {
            Vec2::new(1.0, 0.0)
        } else {
            d / len
        }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }

    /// Tip, left and right corners of the head.
    pub fn head_points(&self) -> [Point; 3] {
        let dir = self.direction();
        let perp = Vec2::new(-dir.y, dir.x);
        let back = self.end - dir * self.pointer_length;
        let half = self.pointer_width / 2.0;
        [self.end, back + perp * half, back - perp * half]
    }

    /// Closed head triangle, filled by the renderer.
    pub fn head_path(&self) -> BezPath {
        let [tip, left, right] = self.head_points();
        let mut path = BezPath::new();
        path.move_to(tip);
        path.line_to(left);
        path.line_to(right);
        path.close_path();
        path
    }
}

impl ShapeTrait for Arrow {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let [tip, left, right] = self.head_points();
        points_bounds(&[self.start, tip, left, right])
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if point_to_segment_dist(point, self.start, self.end)
            <= tolerance + self.style.stroke_width / 2.0
        {
            return true;
        }

        let [tip, left, right] = self.head_points();
        fn sign(p1: Point, p2: Point, p3: Point) -> f64 {
            (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
        }
        let d1 = sign(point, tip, left);
        let d2 = sign(point, left, right);
        let d3 = sign(point, right, tip);
        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        !(has_neg && has_pos)
    }

    /// The shaft only; the head comes from [`Arrow::head_path`].
    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.start = affine * self.start;
        self.end = affine * self.end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction() {
        let arrow = Arrow::new(Point::ZERO, Point::new(10.0, 0.0));
        let dir = arrow.direction();
        assert!((dir.x - 1.0).abs() < f64::EPSILON);
        assert!(dir.y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_shaft() {
        let arrow = Arrow::new(Point::ZERO, Point::new(100.0, 0.0));
        assert!(arrow.hit_test(Point::new(50.0, 1.0), 2.0));
        assert!(!arrow.hit_test(Point::new(50.0, 30.0), 2.0));
    }

    #[test]
    fn test_hit_test_head() {
        let arrow = Arrow::new(Point::ZERO, Point::new(100.0, 0.0)).with_pointer(20.0, 20.0);
        assert!(arrow.hit_test(Point::new(85.0, 5.0), 0.0));
    }

    #[test]
    fn test_bounds_include_head() {
        let arrow = Arrow::new(Point::ZERO, Point::new(100.0, 0.0)).with_pointer(20.0, 20.0);
        let bounds = arrow.bounds();
        assert!((bounds.y0 + 10.0).abs() < 1e-9);
        assert!((bounds.y1 - 10.0).abs() < 1e-9);
    }
}
