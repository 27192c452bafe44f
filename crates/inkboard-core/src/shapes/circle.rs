//! Circle shape. Non-uniform resizes turn it into an ellipse.

use super::{ShapeId, ShapeStyle, ShapeTrait, new_id, to_local};
use kurbo::{Affine, BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub(crate) id: ShapeId,
    /// Center point.
    pub center: Point,
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Circle {
    /// Create a circle with equal radii.
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            id: new_id(),
            center,
            radius_x: radius,
            radius_y: radius,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Get as a kurbo Ellipse, rotation included.
    pub fn as_kurbo(&self) -> KurboEllipse {
        KurboEllipse::new(self.center, (self.radius_x, self.radius_y), self.rotation)
    }

    /// Whether both radii are still equal.
    pub fn is_round(&self) -> bool {
        (self.radius_x - self.radius_y).abs() < f64::EPSILON
    }
}

impl ShapeTrait for Circle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = to_local(point, self.center, self.rotation);
        let half_sw = self.style.stroke_width / 2.0;
        let dx = (local.x - self.center.x) / (self.radius_x + tolerance + half_sw);
        let dy = (local.y - self.center.y) / (self.radius_y + tolerance + half_sw);
        if dx * dx + dy * dy > 1.0 {
            return false;
        }
        if self.style.fill_color.is_some() {
            return true;
        }
        // Outline only: reject points inside the inner ring
        let inner_rx = self.radius_x - tolerance - half_sw;
        let inner_ry = self.radius_y - tolerance - half_sw;
        if inner_rx < f64::EPSILON || inner_ry < f64::EPSILON {
            return true;
        }
        let dx = (local.x - self.center.x) / inner_rx;
        let dy = (local.y - self.center.y) / inner_ry;
        dx * dx + dy * dy > 1.0
    }

    fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.center = affine * self.center;
        let coeffs = affine.as_coeffs();
        self.radius_x *= coeffs[0].abs();
        self.radius_y *= coeffs[3].abs();
    }
}
