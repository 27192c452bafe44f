//! Transform handles: anchors bound to a single shape, and the drag
//! manipulations they drive.

use crate::shapes::{Shape, ShapeId};
use crate::stage::Layer;
use kurbo::{Affine, Point, Rect, Vec2};
use std::collections::HashMap;

/// Anchor square size in pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Distance from the top edge to the rotate anchor.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;
/// Shapes never resize below this, in pixels.
pub const MIN_RESIZE: f64 = 1.0;
const ROTATION_SNAP: f64 = std::f64::consts::PI / 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Arrow endpoint (0 = start, 1 = end).
    Endpoint(usize),
    Corner(Corner),
    Edge(Edge),
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// An anchor with its position in stage coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Which anchors a transformer offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSet {
    /// Corners, edge midpoints and the rotate anchor.
    Full,
    /// Bounding box corners only.
    Corners,
    /// Left and right edges. Used for text, where width is the wrap width.
    WidthOnly,
    /// Arrow start and end.
    Endpoints,
}

impl AnchorSet {
    pub fn for_shape(shape: &Shape) -> Self {
        match shape {
            Shape::Circle(_) | Shape::Rectangle(_) | Shape::Image(_) => AnchorSet::Full,
            Shape::Line(_) => AnchorSet::Corners,
            Shape::Arrow(_) => AnchorSet::Endpoints,
            Shape::Text(_) => AnchorSet::WidthOnly,
        }
    }

    /// Anchors for `shape`, rotated with it.
    pub fn handles(self, shape: &Shape) -> Vec<Handle> {
        if let (AnchorSet::Endpoints, Shape::Arrow(arrow)) = (self, shape) {
            return vec![
                Handle::new(arrow.start, HandleKind::Endpoint(0)),
                Handle::new(arrow.end, HandleKind::Endpoint(1)),
            ];
        }

        let bounds = shape.bounds();
        let center = bounds.center();
        let rotate = Affine::rotate_about(shape.rotation(), center);
        let at = |x: f64, y: f64, kind| Handle::new(rotate * Point::new(x, y), kind);

        let corners = || {
            [
                at(bounds.x0, bounds.y0, HandleKind::Corner(Corner::TopLeft)),
                at(bounds.x1, bounds.y0, HandleKind::Corner(Corner::TopRight)),
                at(bounds.x0, bounds.y1, HandleKind::Corner(Corner::BottomLeft)),
                at(bounds.x1, bounds.y1, HandleKind::Corner(Corner::BottomRight)),
            ]
        };
        let side_edges = || {
            [
                at(bounds.x0, center.y, HandleKind::Edge(Edge::Left)),
                at(bounds.x1, center.y, HandleKind::Edge(Edge::Right)),
            ]
        };

        match self {
            AnchorSet::Full => {
                let mut handles = corners().to_vec();
                handles.push(at(center.x, bounds.y0, HandleKind::Edge(Edge::Top)));
                handles.push(at(center.x, bounds.y1, HandleKind::Edge(Edge::Bottom)));
                handles.extend(side_edges());
                handles.push(at(
                    center.x,
                    bounds.y0 - ROTATE_HANDLE_OFFSET,
                    HandleKind::Rotate,
                ));
                handles
            }
            AnchorSet::Corners => corners().to_vec(),
            AnchorSet::WidthOnly => side_edges().to_vec(),
            // Endpoint anchors on anything but an arrow fall back to corners
            AnchorSet::Endpoints => corners().to_vec(),
        }
    }
}

/// A transform handle. Attached to at most one shape at a time.
#[derive(Debug, Clone)]
pub struct Transformer {
    node: Option<ShapeId>,
    anchors: AnchorSet,
    visible: bool,
}

impl Transformer {
    pub fn new(anchors: AnchorSet) -> Self {
        Self {
            node: None,
            anchors,
            visible: true,
        }
    }

    /// Transformer with the default anchors for `shape`, attached to it.
    pub fn for_shape(shape: &Shape) -> Self {
        let mut transformer = Self::new(AnchorSet::for_shape(shape));
        transformer.attach(shape.id());
        transformer
    }

    pub fn attach(&mut self, id: ShapeId) {
        self.node = Some(id);
    }

    pub fn detach(&mut self) {
        self.node = None;
    }

    pub fn node(&self) -> Option<ShapeId> {
        self.node
    }

    pub fn is_attached(&self) -> bool {
        self.node.is_some()
    }

    pub fn anchors(&self) -> AnchorSet {
        self.anchors
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Current anchors, or nothing when detached or hidden.
    pub fn handles(&self, layer: &Layer) -> Vec<Handle> {
        match self.node.and_then(|id| layer.get(id)) {
            Some(shape) if self.visible => self.anchors.handles(shape),
            _ => Vec::new(),
        }
    }

    pub fn hit_test_handle(
        &self,
        layer: &Layer,
        point: Point,
        tolerance: f64,
    ) -> Option<HandleKind> {
        self.handles(layer)
            .into_iter()
            .find(|handle| handle.hit_test(point, tolerance))
            .map(|handle| handle.kind)
    }
}

/// Owns every transformer, at most one per shape, and tracks the active one.
#[derive(Debug, Default)]
pub struct Transformers {
    by_shape: HashMap<ShapeId, Transformer>,
    active: Option<ShapeId>,
}

impl Transformers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a fresh transformer to `shape`, replacing any it already had,
    /// and make it the only attached one.
    pub fn select(&mut self, shape: &Shape) {
        self.insert(Transformer::for_shape(shape));
    }

    /// Register an attached transformer as the active one. Other
    /// transformers are detached. Ignored when `transformer` is detached.
    pub fn insert(&mut self, transformer: Transformer) {
        let Some(id) = transformer.node() else {
            log::warn!("Ignoring a detached transformer");
            return;
        };
        self.detach_all();
        self.by_shape.insert(id, transformer);
        self.active = Some(id);
    }

    /// Detach the active transformer, if any.
    pub fn detach_active(&mut self) {
        if let Some(transformer) = self.active.take().and_then(|id| self.by_shape.get_mut(&id)) {
            transformer.detach();
        }
    }

    pub fn detach_all(&mut self) {
        for transformer in self.by_shape.values_mut() {
            transformer.detach();
        }
        self.active = None;
    }

    /// Drop the transformer owned by `id`.
    pub fn release(&mut self, id: ShapeId) -> Option<Transformer> {
        if self.active == Some(id) {
            self.active = None;
        }
        self.by_shape.remove(&id)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Transformer> {
        self.by_shape.get(&id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Transformer> {
        self.by_shape.get_mut(&id)
    }

    /// The attached transformer, if any.
    pub fn active(&self) -> Option<&Transformer> {
        self.active.and_then(|id| self.by_shape.get(&id))
    }

    /// Shape the active transformer is attached to.
    pub fn active_shape(&self) -> Option<ShapeId> {
        self.active().and_then(Transformer::node)
    }

    /// Number of transformers held, attached or not.
    pub fn len(&self) -> usize {
        self.by_shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_shape.is_empty()
    }
}

/// An in-progress drag of a shape or one of its anchors.
#[derive(Debug, Clone)]
pub struct Manipulation {
    pub shape_id: ShapeId,
    /// None moves the whole shape.
    pub handle: Option<HandleKind>,
    pub start_point: Point,
    /// Snapshot taken at press time. Every move is applied to this.
    pub original: Shape,
}

impl Manipulation {
    pub fn new(shape: &Shape, handle: Option<HandleKind>, start_point: Point) -> Self {
        Self {
            shape_id: shape.id(),
            handle,
            start_point,
            original: shape.clone(),
        }
    }

    /// The shape as it should look with the pointer at `point`.
    /// `snap` rounds rotation to 15 degree steps.
    pub fn apply(&self, point: Point, snap: bool) -> Shape {
        let delta = point - self.start_point;
        let mut shape = self.original.clone();
        match self.handle {
            None => shape.translate(delta),
            Some(HandleKind::Endpoint(index)) => move_endpoint(&mut shape, index, delta),
            Some(HandleKind::Rotate) => {
                apply_rotation(&mut shape, point, snap);
            }
            Some(kind @ (HandleKind::Corner(_) | HandleKind::Edge(_))) => {
                // Resize in the shape's own frame so rotated shapes follow the anchor
                let rotation = shape.rotation();
                let local = Affine::rotate(-rotation) * delta.to_point();
                let bounds = shape.bounds();
                let target = resized_bounds(bounds, kind, local.to_vec2());
                shape.transform(box_mapping(bounds, target));
                // Rotation pivots on the center, which moved. Pin the opposite anchor.
                if rotation != 0.0 {
                    let fixed = fixed_anchor(bounds, kind);
                    let before = Affine::rotate_about(rotation, bounds.center()) * fixed;
                    let after = Affine::rotate_about(rotation, target.center()) * fixed;
                    shape.translate(before - after);
                }
            }
        }
        shape
    }
}

fn move_endpoint(shape: &mut Shape, index: usize, delta: Vec2) {
    if let Shape::Arrow(arrow) = shape {
        match index {
            0 => arrow.start += delta,
            _ => arrow.end += delta,
        }
    }
}

/// Move the side(s) of `bounds` that `kind` controls, keeping a minimum size.
fn resized_bounds(bounds: Rect, kind: HandleKind, delta: Vec2) -> Rect {
    let Rect { mut x0, mut y0, mut x1, mut y1 } = bounds;
    match kind {
        HandleKind::Corner(Corner::TopLeft) => {
            x0 += delta.x;
            y0 += delta.y;
        }
        HandleKind::Corner(Corner::TopRight) => {
            x1 += delta.x;
            y0 += delta.y;
        }
        HandleKind::Corner(Corner::BottomLeft) => {
            x0 += delta.x;
            y1 += delta.y;
        }
        HandleKind::Corner(Corner::BottomRight) => {
            x1 += delta.x;
            y1 += delta.y;
        }
        HandleKind::Edge(Edge::Left) => x0 += delta.x,
        HandleKind::Edge(Edge::Right) => x1 += delta.x,
        HandleKind::Edge(Edge::Top) => y0 += delta.y,
        HandleKind::Edge(Edge::Bottom) => y1 += delta.y,
        HandleKind::Endpoint(_) | HandleKind::Rotate => {}
    }
    let rect = Rect::new(x0, y0, x1, y1).abs();
    Rect::from_origin_size(
        rect.origin(),
        (rect.width().max(MIN_RESIZE), rect.height().max(MIN_RESIZE)),
    )
}

/// The point of `bounds` that stays put while `kind` is dragged: the opposite
/// corner, or the middle of the opposite edge.
fn fixed_anchor(bounds: Rect, kind: HandleKind) -> Point {
    let Rect { x0, y0, x1, y1 } = bounds;
    let center = bounds.center();
    match kind {
        HandleKind::Corner(Corner::TopLeft) => Point::new(x1, y1),
        HandleKind::Corner(Corner::TopRight) => Point::new(x0, y1),
        HandleKind::Corner(Corner::BottomLeft) => Point::new(x1, y0),
        HandleKind::Corner(Corner::BottomRight) => Point::new(x0, y0),
        HandleKind::Edge(Edge::Left) => Point::new(x1, center.y),
        HandleKind::Edge(Edge::Right) => Point::new(x0, center.y),
        HandleKind::Edge(Edge::Top) => Point::new(center.x, y1),
        HandleKind::Edge(Edge::Bottom) => Point::new(center.x, y0),
        HandleKind::Endpoint(_) | HandleKind::Rotate => center,
    }
}

/// Affine taking `from` onto `to`. Degenerate axes keep their scale.
fn box_mapping(from: Rect, to: Rect) -> Affine {
    let scale = |old: f64, new: f64| if old > f64::EPSILON { new / old } else { 1.0 };
    Affine::translate(to.origin().to_vec2())
        * Affine::scale_non_uniform(
            scale(from.width(), to.width()),
            scale(from.height(), to.height()),
        )
        * Affine::translate(-from.origin().to_vec2())
}

/// Rotate `shape` so its top points at `cursor`. Returns the new angle.
pub fn apply_rotation(shape: &mut Shape, cursor: Point, snap: bool) -> f64 {
    let center = shape.bounds().center();
    let to_cursor = cursor - center;
    let mut angle = to_cursor.y.atan2(to_cursor.x) + std::f64::consts::FRAC_PI_2;
    if snap {
        angle = (angle / ROTATION_SNAP).round() * ROTATION_SNAP;
    }
    shape.set_rotation(angle);
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Arrow, Circle, Rectangle, Text};

    const EPS: f64 = 1e-9;

    fn rect_shape() -> Shape {
        Rectangle::new(Point::new(0.0, 0.0), 100.0, 50.0).into()
    }

    #[test]
    fn test_anchor_sets_per_kind() {
        let text: Shape = Text::new(Point::ZERO, "abc", 200.0).into();
        let arrow: Shape = Arrow::new(Point::ZERO, Point::new(10.0, 0.0)).into();
        assert_eq!(AnchorSet::for_shape(&rect_shape()), AnchorSet::Full);
        assert_eq!(AnchorSet::for_shape(&text), AnchorSet::WidthOnly);
        assert_eq!(AnchorSet::for_shape(&arrow), AnchorSet::Endpoints);

        assert_eq!(AnchorSet::Full.handles(&rect_shape()).len(), 9);
        let kinds: Vec<_> = AnchorSet::WidthOnly.handles(&text).iter().map(|h| h.kind).collect();
        assert_eq!(
            kinds,
            vec![HandleKind::Edge(Edge::Left), HandleKind::Edge(Edge::Right)]
        );
        assert_eq!(AnchorSet::Endpoints.handles(&arrow).len(), 2);
    }

    #[test]
    fn test_handles_follow_rotation() {
        let mut shape = rect_shape();
        shape.set_rotation(std::f64::consts::PI);
        let handles = AnchorSet::Full.handles(&shape);
        let top_left = handles
            .iter()
            .find(|h| h.kind == HandleKind::Corner(Corner::TopLeft))
            .map(|h| h.position);
        let top_left = top_left.unwrap_or(Point::ZERO);
        assert!((top_left.x - 100.0).abs() < EPS);
        assert!((top_left.y - 50.0).abs() < EPS);
    }

    #[test]
    fn test_select_replaces_existing_transformer() {
        let shape = rect_shape();
        let mut transformers = Transformers::new();
        transformers.select(&shape);
        transformers.select(&shape);
        assert_eq!(transformers.len(), 1);
        assert_eq!(transformers.active_shape(), Some(shape.id()));
    }

    #[test]
    fn test_select_detaches_previous() {
        let a = rect_shape();
        let b: Shape = Circle::new(Point::new(300.0, 300.0), 10.0).into();
        let mut transformers = Transformers::new();
        transformers.select(&a);
        transformers.select(&b);
        assert!(!transformers.get(a.id()).is_some_and(Transformer::is_attached));
        assert_eq!(transformers.active_shape(), Some(b.id()));
    }

    #[test]
    fn test_detach_and_release() {
        let shape = rect_shape();
        let mut transformers = Transformers::new();
        transformers.select(&shape);
        transformers.detach_active();
        assert!(transformers.active().is_none());
        assert_eq!(transformers.len(), 1);

        transformers.select(&shape);
        assert!(transformers.release(shape.id()).is_some());
        assert!(transformers.is_empty());
        assert!(transformers.active_shape().is_none());
    }

    #[test]
    fn test_hidden_transformer_has_no_handles() {
        let mut layer = Layer::new();
        let id = layer.add(rect_shape());
        let mut transformer = Transformer::new(AnchorSet::Full);
        transformer.attach(id);
        assert_eq!(transformer.handles(&layer).len(), 9);
        transformer.set_visible(false);
        assert!(transformer.handles(&layer).is_empty());
        assert!(
            transformer
                .hit_test_handle(&layer, Point::new(0.0, 0.0), 8.0)
                .is_none()
        );
    }

    #[test]
    fn test_move_manipulation() {
        let shape = rect_shape();
        let manipulation = Manipulation::new(&shape, None, Point::new(10.0, 10.0));
        let moved = manipulation.apply(Point::new(30.0, 15.0), false);
        let bounds = moved.bounds();
        assert!((bounds.x0 - 20.0).abs() < EPS);
        assert!((bounds.y0 - 5.0).abs() < EPS);
    }

    #[test]
    fn test_corner_resize() {
        let shape = rect_shape();
        let handle = Some(HandleKind::Corner(Corner::BottomRight));
        let manipulation = Manipulation::new(&shape, handle, Point::new(100.0, 50.0));
        let resized = manipulation.apply(Point::new(150.0, 100.0), false);
        let bounds = resized.bounds();
        assert!((bounds.width() - 150.0).abs() < EPS);
        assert!((bounds.height() - 100.0).abs() < EPS);
        assert!(bounds.x0.abs() < EPS);
    }

    /// World position of a corner of a possibly rotated rectangle.
    fn world_corner(shape: &Shape, corner: Corner) -> Point {
        let bounds = shape.bounds();
        let local = match corner {
            Corner::TopLeft => Point::new(bounds.x0, bounds.y0),
            Corner::TopRight => Point::new(bounds.x1, bounds.y0),
            Corner::BottomLeft => Point::new(bounds.x0, bounds.y1),
            Corner::BottomRight => Point::new(bounds.x1, bounds.y1),
        };
        Affine::rotate_about(shape.rotation(), bounds.center()) * local
    }

    #[test]
    fn test_rotated_corner_resize_keeps_opposite_corner() {
        let mut shape = rect_shape();
        shape.set_rotation(std::f64::consts::FRAC_PI_2);
        let pinned = world_corner(&shape, Corner::TopLeft);
        let grabbed = world_corner(&shape, Corner::BottomRight);

        // A quarter turn maps local +x onto world +y
        let handle = Some(HandleKind::Corner(Corner::BottomRight));
        let manipulation = Manipulation::new(&shape, handle, grabbed);
        let resized = manipulation.apply(grabbed + Vec2::new(0.0, 50.0), false);

        assert!((resized.bounds().width() - 150.0).abs() < EPS);
        assert!((resized.bounds().height() - 50.0).abs() < EPS);
        let after = world_corner(&resized, Corner::TopLeft);
        assert!((after - pinned).hypot() < EPS);
        let dragged = world_corner(&resized, Corner::BottomRight);
        assert!((dragged - (grabbed + Vec2::new(0.0, 50.0))).hypot() < EPS);
    }

    #[test]
    fn test_rotated_edge_resize_keeps_opposite_edge() {
        let mut shape = rect_shape();
        shape.set_rotation(0.7);
        let pinned = world_corner(&shape, Corner::TopRight);
        let pinned_low = world_corner(&shape, Corner::BottomRight);

        let handle = Some(HandleKind::Edge(Edge::Left));
        let start = world_corner(&shape, Corner::TopLeft);
        let manipulation = Manipulation::new(&shape, handle, start);
        let resized = manipulation.apply(start + Vec2::new(-30.0, 12.0), false);

        assert!((world_corner(&resized, Corner::TopRight) - pinned).hypot() < EPS);
        assert!((world_corner(&resized, Corner::BottomRight) - pinned_low).hypot() < EPS);
    }

    #[test]
    fn test_resize_keeps_minimum() {
        let shape = rect_shape();
        let handle = Some(HandleKind::Edge(Edge::Right));
        let manipulation = Manipulation::new(&shape, handle, Point::new(100.0, 25.0));
        let resized = manipulation.apply(Point::new(0.0, 25.0), false);
        assert!((resized.bounds().width() - MIN_RESIZE).abs() < EPS);
    }

    #[test]
    fn test_text_edge_resize_changes_wrap_width() {
        let shape: Shape = Text::new(Point::new(50.0, 80.0), "Some text here", 200.0).into();
        let handle = Some(HandleKind::Edge(Edge::Left));
        let manipulation = Manipulation::new(&shape, handle, Point::new(50.0, 90.0));
        let resized = manipulation.apply(Point::new(100.0, 90.0), false);
        let text = resized.as_text().map(|t| (t.width, t.position.x, t.font_size));
        let (width, x, font_size) = text.unwrap_or_default();
        assert!((width - 150.0).abs() < EPS);
        assert!((x - 100.0).abs() < EPS);
        assert!((font_size - Text::DEFAULT_FONT_SIZE).abs() < EPS);
    }

    #[test]
    fn test_endpoint_drag() {
        let shape: Shape = Arrow::new(Point::ZERO, Point::new(100.0, 0.0)).into();
        let handle = Some(HandleKind::Endpoint(1));
        let manipulation = Manipulation::new(&shape, handle, Point::new(100.0, 0.0));
        let Shape::Arrow(arrow) = manipulation.apply(Point::new(100.0, 40.0), false) else {
            panic!("expected an arrow");
        };
        assert_eq!(arrow.end, Point::new(100.0, 40.0));
        assert_eq!(arrow.start, Point::ZERO);
    }

    #[test]
    fn test_rotation_snaps() {
        let mut shape = rect_shape();
        // Cursor straight right of the center is a quarter turn
        let angle = apply_rotation(&mut shape, Point::new(200.0, 25.0), false);
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < EPS);

        let snapped = apply_rotation(&mut shape, Point::new(200.0, 30.0), true);
        let steps = snapped / ROTATION_SNAP;
        assert!((steps - steps.round()).abs() < EPS);
        assert!((shape.rotation() - snapped).abs() < EPS);
    }
}
