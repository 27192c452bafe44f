//! The drawing surface and its render layer.

use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect, Size};
use std::collections::HashMap;

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The bare stage surface.
    Background,
    Shape(ShapeId),
}

/// The drawing surface. Its origin is the top-left corner of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    size: Size,
}

impl Stage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width.max(0.0), height.max(0.0)),
        }
    }

    /// Stage sized to a share of the window width and the full window height.
    pub fn for_window(window: Size, width_fraction: f64) -> Self {
        Self::new(window.width * width_fraction, window.height)
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.size = Size::new(width.max(0.0), height.max(0.0));
    }

    pub fn bounds(&self) -> Rect {
        self.size.to_rect()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }
}

/// Pending redraw work for a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedrawStats {
    /// Batched requests coalesced into the next frame.
    pub batched: u64,
    /// Immediate draws.
    pub immediate: u64,
}

/// Holds the nodes drawn in one pass, bottom to top.
#[derive(Debug, Default)]
pub struct Layer {
    shapes: HashMap<ShapeId, Shape>,
    z_order: Vec<ShapeId>,
    pending: bool,
    stats: RedrawStats,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node on top of the others.
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        if self.shapes.insert(id, shape).is_none() {
            self.z_order.push(id);
        }
        id
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let removed = self.shapes.remove(&id)?;
        self.z_order.retain(|&shape_id| shape_id != id);
        Some(removed)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.z_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_order.is_empty()
    }

    /// Nodes in draw order (bottom first).
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Topmost node under `point`, or the background.
    pub fn target_at(&self, point: Point, tolerance: f64) -> ClickTarget {
        self.z_order
            .iter()
            .rev()
            .filter_map(|id| self.shapes.get(id))
            .find(|shape| shape.is_hit_target() && shape.hit_test(point, tolerance))
            .map_or(ClickTarget::Background, |shape| ClickTarget::Shape(shape.id()))
    }

    /// Request a redraw on the next frame. Repeated requests coalesce.
    pub fn batch_draw(&mut self) {
        if !self.pending {
            self.pending = true;
            self.stats.batched += 1;
        }
    }

    /// Redraw right away.
    pub fn draw(&mut self) {
        self.pending = true;
        self.stats.immediate += 1;
    }

    pub fn redraw_pending(&self) -> bool {
        self.pending
    }

    /// Clear and return the pending flag. Called once per frame by the host.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn redraw_stats(&self) -> RedrawStats {
        self.stats
    }

    /// Debug dump of the nodes in draw order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let nodes: Vec<&Shape> = self.iter().collect();
        serde_json::to_string_pretty(&nodes)
    }
}
