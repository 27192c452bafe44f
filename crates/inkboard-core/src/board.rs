//! The whiteboard controller: tool selection, freehand strokes, selection,
//! undo, delete and image import over one stage and layer.

use crate::config::BoardConfig;
use crate::error::ImportError;
use crate::factory::ShapeFactory;
use crate::import::decode_image;
use crate::input::{InputState, Instant, Modifiers, PointerEvent, Release};
use crate::keymap::{KeyCommand, KeyEvent, Keymap};
use crate::shapes::{Image, Line, LineMode, Shape, ShapeId};
use crate::stage::{ClickTarget, Layer, Stage};
use crate::text_node::{TextEdit, TextNodeHelper};
use crate::tools::{Tool, ToolState};
use crate::transformer::{Manipulation, Transformer, Transformers};
use kurbo::{Point, Size};
use std::time::Duration;

/// Freehand drawing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    /// A line or erase stroke follows the pointer.
    Painting { line: ShapeId },
}

pub struct Whiteboard {
    config: BoardConfig,
    stage: Stage,
    layer: Layer,
    factory: ShapeFactory,
    tools: ToolState,
    /// Creation order. Undo pops from the back.
    shapes: Vec<ShapeId>,
    transformers: Transformers,
    stroke: StrokeState,
    manipulation: Option<Manipulation>,
    text_edit: Option<TextEdit>,
    input: InputState,
    keymap: Keymap,
    /// Set once an image import has sized the stage.
    stage_pinned: bool,
}

impl Whiteboard {
    /// Board with a stage sized for a window of `window` logical pixels.
    pub fn new(config: BoardConfig, window: Size) -> Self {
        let stage = Stage::for_window(window, config.stage_width_fraction);
        let input = InputState::new(
            config.drag_threshold,
            Duration::from_millis(config.double_click_ms),
        );
        log::info!(
            "Stage created at {:.0}x{:.0}",
            stage.width(),
            stage.height()
        );
        Self {
            factory: ShapeFactory::new(config.factory.clone()),
            config,
            stage,
            layer: Layer::new(),
            tools: ToolState::new(),
            shapes: Vec::new(),
            transformers: Transformers::new(),
            stroke: StrokeState::Idle,
            manipulation: None,
            text_edit: None,
            input,
            keymap: Keymap::default(),
            stage_pinned: false,
        }
    }

    // --- Tools -------------------------------------------------------------

    /// Select a tool by name. Unknown names are logged and ignored.
    pub fn select_tool(&mut self, name: &str) {
        match name.parse::<Tool>() {
            Ok(tool) => self.add_shape(tool),
            Err(e) => log::warn!("Ignoring tool selection: {}", e),
        }
    }

    /// Make `tool` current and run its creation path.
    pub fn add_shape(&mut self, tool: Tool) {
        self.tools.set(tool);
        log::debug!("Tool selected: {}", tool);
        match tool {
            Tool::Circle => {
                let shape = self.factory.circle();
                self.push_shape(shape);
            }
            Tool::Rectangle => {
                let shape = self.factory.rectangle();
                self.push_shape(shape);
            }
            Tool::Arrow => {
                let shape = self.factory.arrow();
                self.push_shape(shape);
            }
            Tool::Text => {
                let (id, transformer) =
                    TextNodeHelper::create(&self.stage, &mut self.layer, &self.config.text);
                self.shapes.push(id);
                self.transformers.insert(transformer);
            }
            // Created on pointer-down
            Tool::Line | Tool::Erase => {}
            Tool::Undo => {
                self.undo();
            }
        }
    }

    fn push_shape(&mut self, shape: Shape) -> ShapeId {
        let kind = shape.kind();
        let id = self.layer.add(shape);
        self.shapes.push(id);
        self.layer.batch_draw();
        log::debug!("Added {:?} {}", kind, id);
        id
    }

    // --- Pointer -----------------------------------------------------------

    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, .. } => self.pointer_down(position),
            PointerEvent::Move { position, .. } => self.pointer_move(position),
            PointerEvent::Up { position, .. } => self.pointer_up(position),
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.input.set_modifiers(modifiers);
    }

    pub fn pointer_down(&mut self, position: Point) {
        if !self.stage.contains(position) {
            return;
        }
        self.input.press(position);

        if self.tools.is_painting_tool() {
            self.start_stroke(position);
            return;
        }

        let handle = self.transformers.active().and_then(|transformer| {
            transformer.hit_test_handle(&self.layer, position, self.config.handle_tolerance)
        });
        let press_target = match handle {
            Some(kind) => self
                .transformers
                .active_shape()
                .map(|id| (id, Some(kind))),
            None => match self.layer.target_at(position, self.config.hit_tolerance) {
                ClickTarget::Shape(id) => Some((id, None)),
                ClickTarget::Background => None,
            },
        };
        self.manipulation = press_target.and_then(|(id, handle)| {
            let shape = self.layer.get(id)?;
            (handle.is_some() || shape.is_draggable())
                .then(|| Manipulation::new(shape, handle, position))
        });
    }

    pub fn pointer_move(&mut self, position: Point) {
        let dragging = self.input.move_to(position);

        if let StrokeState::Painting { line } = self.stroke {
            if let Some(line) = self.layer.get_mut(line).and_then(Shape::as_line_mut) {
                line.push_point(position);
                self.layer.batch_draw();
            }
            return;
        }

        if !dragging {
            return;
        }
        if let Some(manipulation) = &self.manipulation {
            let updated = manipulation.apply(position, self.input.modifiers.shift);
            if let Some(shape) = self.layer.get_mut(manipulation.shape_id) {
                *shape = updated;
                self.layer.batch_draw();
            }
        }
    }

    pub fn pointer_up(&mut self, position: Point) {
        let release = self.input.release(position, Instant::now());

        if let StrokeState::Painting { line } = std::mem::take(&mut self.stroke) {
            let points = self.layer.get(line).and_then(Shape::as_line).map_or(0, Line::len);
            log::debug!("Stroke {} finished with {} points", line, points);
            return;
        }

        let manipulation = self.manipulation.take();
        match release {
            Release::DragEnd => {
                if let Some(manipulation) = manipulation {
                    log::debug!("Finished manipulating {}", manipulation.shape_id);
                }
            }
            Release::Click => {
                self.click(position);
            }
            Release::DoubleClick => {
                self.click(position);
                self.double_click(position);
            }
            Release::Stray => {}
        }
    }

    fn start_stroke(&mut self, position: Point) {
        let mode = if self.tools.is_active(Tool::Erase) {
            LineMode::Erase
        } else {
            LineMode::Brush
        };
        let shape = self.factory.line(position, mode);
        let id = self.push_shape(shape);
        self.stroke = StrokeState::Painting { line: id };
        log::debug!("Started {:?} stroke {}", mode, id);
    }

    // --- Selection ---------------------------------------------------------

    /// Resolve a click: select the shape under `position` or clear the
    /// selection on the background.
    pub fn click(&mut self, position: Point) -> ClickTarget {
        let target = self.layer.target_at(position, self.config.hit_tolerance);
        match target {
            ClickTarget::Shape(id) => {
                if let Some(shape) = self.layer.get(id) {
                    self.transformers.select(shape);
                    log::debug!("Selected {:?} {}", shape.kind(), id);
                }
            }
            ClickTarget::Background => self.transformers.detach_active(),
        }
        self.layer.draw();
        target
    }

    /// Double-clicking a text node starts editing it.
    pub fn double_click(&mut self, position: Point) {
        if let ClickTarget::Shape(id) = self.layer.target_at(position, self.config.hit_tolerance) {
            self.begin_text_edit(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.transformers.detach_active();
        self.layer.batch_draw();
    }

    // --- Keyboard ----------------------------------------------------------

    /// Run the command bound to `event`. Returns false when nothing handled
    /// it. Keys go to the text editor while an edit is open.
    pub fn key_down(&mut self, event: &KeyEvent) -> bool {
        if self.text_edit.is_some() {
            return false;
        }
        let Some(command) = self.keymap.resolve(event) else {
            return false;
        };
        match command {
            KeyCommand::DeleteSelected => {
                self.delete_selected();
            }
            KeyCommand::Undo => {
                self.undo();
            }
            KeyCommand::ClearSelection => self.clear_selection(),
        }
        true
    }

    /// Remove the selected shape. Without a selection this only logs.
    pub fn delete_selected(&mut self) -> Option<ShapeId> {
        let Some(id) = self.transformers.active_shape() else {
            log::warn!("Delete pressed with nothing selected");
            return None;
        };
        self.forget(id);
        self.shapes.retain(|&shape_id| shape_id != id);
        self.transformers.detach_all();
        self.layer.batch_draw();
        log::info!("Deleted shape {}", id);
        Some(id)
    }

    /// Remove the most recently created shape.
    pub fn undo(&mut self) -> Option<ShapeId> {
        self.transformers.detach_all();
        let popped = self.shapes.pop();
        match popped {
            Some(id) => {
                self.forget(id);
                log::debug!("Undo removed {}", id);
            }
            None => log::debug!("Nothing to undo"),
        }
        self.layer.draw();
        popped
    }

    /// Drop `id` from the layer and every piece of state that refers to it.
    fn forget(&mut self, id: ShapeId) {
        self.layer.remove(id);
        self.transformers.release(id);
        if self.stroke == (StrokeState::Painting { line: id }) {
            self.stroke = StrokeState::Idle;
        }
        if self.manipulation.as_ref().is_some_and(|m| m.shape_id == id) {
            self.manipulation = None;
        }
        if self.text_edit.as_ref().is_some_and(|edit| edit.shape_id == id) {
            self.text_edit = None;
        }
    }

    // --- Text editing ------------------------------------------------------

    /// Open an edit session on a text node. Returns false for other shapes.
    pub fn begin_text_edit(&mut self, id: ShapeId) -> bool {
        let Some(text) = self.layer.get(id).and_then(Shape::as_text) else {
            return false;
        };
        self.text_edit = Some(TextEdit::new(id, text.content.clone()));
        if let Some(transformer) = self.transformers.get_mut(id) {
            transformer.set_visible(false);
        }
        self.layer.batch_draw();
        log::debug!("Editing text {}", id);
        true
    }

    /// Close the edit session, keeping `content`.
    pub fn commit_text_edit(&mut self, content: &str) {
        let Some(edit) = self.text_edit.take() else {
            return;
        };
        if let Some(text) = self.layer.get_mut(edit.shape_id).and_then(Shape::as_text_mut) {
            text.set_content(content);
        }
        self.show_transformer(edit.shape_id);
        log::info!("Committed text edit on {}", edit.shape_id);
    }

    /// Close the edit session and restore the text it started with.
    pub fn cancel_text_edit(&mut self) {
        let Some(edit) = self.text_edit.take() else {
            return;
        };
        if let Some(text) = self.layer.get_mut(edit.shape_id).and_then(Shape::as_text_mut) {
            text.set_content(edit.original);
        }
        self.show_transformer(edit.shape_id);
        log::debug!("Cancelled text edit on {}", edit.shape_id);
    }

    fn show_transformer(&mut self, id: ShapeId) {
        if let Some(transformer) = self.transformers.get_mut(id) {
            transformer.set_visible(true);
        }
        self.layer.batch_draw();
    }

    /// Whether `point` falls on the node being edited.
    pub fn text_edit_contains(&self, point: Point) -> bool {
        self.text_edit
            .as_ref()
            .and_then(|edit| self.layer.get(edit.shape_id))
            .is_some_and(|shape| shape.hit_test(point, self.config.hit_tolerance))
    }

    // --- Image import & stage ------------------------------------------------

    /// Place an encoded image at the origin and size the stage to it.
    pub fn import_image(&mut self, bytes: Vec<u8>) -> Result<ShapeId, ImportError> {
        let decoded = decode_image(&bytes)?;
        self.resize_stage(decoded.width as f64, decoded.height as f64);
        self.stage_pinned = true;
        let image = Image::new(
            Point::ZERO,
            bytes,
            decoded.width,
            decoded.height,
            decoded.format,
        );
        let id = self.push_shape(image.into());
        log::info!(
            "Imported {:?} image {}x{}",
            decoded.format,
            decoded.width,
            decoded.height
        );
        Ok(id)
    }

    pub fn resize_stage(&mut self, width: f64, height: f64) {
        self.stage.resize(width, height);
        self.layer.batch_draw();
    }

    /// Follow the window size until an import fixes the stage size.
    pub fn set_window_size(&mut self, window: Size) {
        if self.stage_pinned {
            return;
        }
        self.stage = Stage::for_window(window, self.config.stage_width_fraction);
        self.layer.batch_draw();
    }

    // --- Accessors -----------------------------------------------------------

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Shape ids in creation order.
    pub fn shape_ids(&self) -> &[ShapeId] {
        &self.shapes
    }

    pub fn transformers(&self) -> &Transformers {
        &self.transformers
    }

    pub fn active_transformer(&self) -> Option<&Transformer> {
        self.transformers.active()
    }

    /// The shape keyboard commands act on.
    pub fn selected(&self) -> Option<ShapeId> {
        self.transformers.active_shape()
    }

    pub fn stroke(&self) -> StrokeState {
        self.stroke
    }

    pub fn is_painting(&self) -> bool {
        matches!(self.stroke, StrokeState::Painting { .. })
    }

    /// The stroke being painted, if any.
    pub fn active_line(&self) -> Option<&Line> {
        match self.stroke {
            StrokeState::Painting { line } => self.layer.get(line).and_then(Shape::as_line),
            StrokeState::Idle => None,
        }
    }

    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.text_edit.as_ref()
    }

    /// Whether the layer asked for a redraw since the last call.
    pub fn take_redraw(&mut self) -> bool {
        self.layer.take_redraw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::tests::png_bytes;
    use crate::keymap::Key;
    use crate::shapes::ShapeKind;
    use crate::tools::ToolFlags;

    fn board() -> Whiteboard {
        Whiteboard::new(BoardConfig::default(), Size::new(1000.0, 800.0))
    }

    fn click_at(board: &mut Whiteboard, point: Point) {
        board.pointer_down(point);
        board.pointer_up(point);
    }

    fn paint(board: &mut Whiteboard, points: &[Point]) {
        board.pointer_down(points[0]);
        for point in &points[1..] {
            board.pointer_move(*point);
        }
        board.pointer_up(points[points.len() - 1]);
    }

    #[test]
    fn test_initial_stage_size() {
        let board = board();
        assert!((board.stage().width() - 900.0).abs() < f64::EPSILON);
        assert!((board.stage().height() - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shape_list_counts_creations() {
        let mut board = board();
        let tools = [
            Tool::Circle,
            Tool::Rectangle,
            Tool::Arrow,
            Tool::Text,
            Tool::Line,
            Tool::Circle,
        ];
        for tool in tools {
            board.add_shape(tool);
        }
        // Line creates nothing until the pointer goes down
        assert_eq!(board.shape_ids().len(), 5);
        assert_eq!(board.layer().len(), 5);
    }

    #[test]
    fn test_unknown_tool_is_ignored() {
        let mut board = board();
        board.select_tool("circle");
        board.select_tool("hexagon");
        assert_eq!(board.tools().current(), Some(Tool::Circle));
        assert_eq!(board.shape_ids().len(), 1);
    }

    #[test]
    fn test_circle_then_line_flags() {
        let mut board = board();
        board.select_tool("circle");
        board.select_tool("line");
        assert_eq!(
            board.tools().flags(),
            ToolFlags {
                circle: false,
                line: true,
                rectangle: false,
                undo: false,
                erase: false,
                text: false,
                arrow: false,
            }
        );
    }

    #[test]
    fn test_undo_pops_one_at_a_time() {
        let mut board = board();
        for tool in [Tool::Circle, Tool::Rectangle, Tool::Arrow] {
            board.add_shape(tool);
        }
        for expected in (0..3).rev() {
            assert!(board.undo().is_some());
            assert_eq!(board.shape_ids().len(), expected);
            assert_eq!(board.layer().len(), expected);
        }
        assert!(board.undo().is_none());
        assert!(board.shape_ids().is_empty());
    }

    #[test]
    fn test_undo_tool_runs_undo() {
        let mut board = board();
        board.add_shape(Tool::Circle);
        board.add_shape(Tool::Rectangle);
        board.select_tool("undo");
        assert_eq!(board.shape_ids().len(), 1);
        assert!(board.tools().flags().undo);
        assert_eq!(board.layer().redraw_stats().immediate, 1);
    }

    #[test]
    fn test_undo_removes_text_nodes() {
        let mut board = board();
        board.add_shape(Tool::Text);
        assert_eq!(board.layer().len(), 1);
        board.undo();
        assert!(board.layer().is_empty());
        assert!(board.transformers().is_empty());
    }

    #[test]
    fn test_undo_detaches_handles() {
        let mut board = board();
        board.add_shape(Tool::Circle);
        board.add_shape(Tool::Rectangle);
        // Rectangle defaults sit at (20, 50) 100x50, circle at (100, 100)
        click_at(&mut board, Point::new(100.0, 160.0));
        assert!(board.selected().is_some());
        board.undo();
        assert!(board.active_transformer().is_none());
        assert!(board.selected().is_none());
    }

    #[test]
    fn test_painting_grows_two_coords_per_move() {
        let mut board = board();
        board.select_tool("line");
        board.pointer_down(Point::new(10.0, 10.0));
        assert!(board.is_painting());
        let coords = |board: &Whiteboard| board.active_line().map_or(0, |l| l.flat_points().len());
        assert_eq!(coords(&board), 2);
        for i in 1..=5 {
            board.pointer_move(Point::new(10.0 + i as f64, 10.0));
            assert_eq!(coords(&board), 2 + 2 * i);
        }
        board.pointer_up(Point::new(15.0, 10.0));
        assert!(!board.is_painting());

        let id = board.shape_ids()[0];
        let before = board.layer().get(id).and_then(Shape::as_line).map(Line::len);
        board.pointer_move(Point::new(50.0, 50.0));
        let after = board.layer().get(id).and_then(Shape::as_line).map(Line::len);
        assert_eq!(before, after);
    }

    #[test]
    fn test_no_stroke_without_painting_tool() {
        let mut board = board();
        board.select_tool("circle");
        board.pointer_down(Point::new(500.0, 500.0));
        assert!(!board.is_painting());
        board.pointer_move(Point::new(520.0, 520.0));
        board.pointer_up(Point::new(520.0, 520.0));
        assert_eq!(board.shape_ids().len(), 1);
    }

    #[test]
    fn test_erase_stroke_mode() {
        let mut board = board();
        board.select_tool("erase");
        paint(&mut board, &[Point::new(10.0, 10.0), Point::new(40.0, 40.0)]);
        let shape = board.layer().get(board.shape_ids()[0]);
        assert_eq!(shape.and_then(Shape::as_line).map(|l| l.mode), Some(LineMode::Erase));
        assert!(!shape.is_some_and(Shape::is_draggable));
    }

    #[test]
    fn test_click_background_detaches() {
        let mut board = board();
        board.add_shape(Tool::Circle);
        click_at(&mut board, Point::new(100.0, 100.0));
        assert_eq!(board.selected(), Some(board.shape_ids()[0]));
        assert!(board.active_transformer().is_some());

        board.take_redraw();
        click_at(&mut board, Point::new(600.0, 600.0));
        assert!(board.active_transformer().is_none());
        assert!(board.take_redraw());
        assert!(board.active_transformer().is_none());
    }

    #[test]
    fn test_reselection_keeps_one_transformer() {
        let mut board = board();
        board.add_shape(Tool::Circle);
        for _ in 0..3 {
            click_at(&mut board, Point::new(100.0, 100.0));
            click_at(&mut board, Point::new(600.0, 600.0));
        }
        assert_eq!(board.transformers().len(), 1);
    }

    #[test]
    fn test_stroke_consumes_click() {
        let mut board = board();
        board.select_tool("line");
        click_at(&mut board, Point::new(300.0, 300.0));
        assert!(board.selected().is_none());
        assert_eq!(board.shape_ids().len(), 1);
    }

    #[test]
    fn test_drag_moves_shape() {
        let mut board = board();
        board.add_shape(Tool::Circle);
        let id = board.shape_ids()[0];
        board.pointer_down(Point::new(100.0, 100.0));
        board.pointer_move(Point::new(150.0, 120.0));
        board.pointer_up(Point::new(150.0, 120.0));
        let center = board.layer().get(id).map(|s| s.bounds().center());
        assert_eq!(center, Some(Point::new(150.0, 120.0)));
        // A drag is not a click
        assert!(board.selected().is_none());
    }

    #[test]
    fn test_drag_handle_resizes() {
        let mut board = board();
        board.add_shape(Tool::Rectangle);
        let id = board.shape_ids()[0];
        click_at(&mut board, Point::new(70.0, 75.0));
        // Bottom-right corner of the default rectangle
        board.pointer_down(Point::new(120.0, 100.0));
        board.pointer_move(Point::new(170.0, 150.0));
        board.pointer_up(Point::new(170.0, 150.0));
        let bounds = board.layer().get(id).map(Shape::bounds).unwrap_or_default();
        assert!((bounds.width() - 150.0).abs() < 1e-9);
        assert!((bounds.height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_delete_selected() {
        let mut board = board();
        board.add_shape(Tool::Circle);
        board.add_shape(Tool::Arrow);
        let circle = board.shape_ids()[0];
        click_at(&mut board, Point::new(60.0, 100.0));
        assert_eq!(board.selected(), Some(circle));

        assert!(board.key_down(&KeyEvent::plain(Key::Delete)));
        assert!(!board.layer().contains(circle));
        assert_eq!(board.shape_ids().len(), 1);
        assert!(board.transformers().get(circle).is_none());
        assert!(board.selected().is_none());
    }

    #[test]
    fn test_delete_without_selection_is_noop() {
        let mut board = board();
        board.add_shape(Tool::Circle);
        assert_eq!(board.delete_selected(), None);
        assert_eq!(board.shape_ids().len(), 1);
        assert_eq!(board.layer().len(), 1);
    }

    #[test]
    fn test_ctrl_z_undoes() {
        let mut board = board();
        board.add_shape(Tool::Circle);
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert!(board.key_down(&KeyEvent::new(Key::Character('z'), ctrl)));
        assert!(board.shape_ids().is_empty());
        assert!(!board.key_down(&KeyEvent::plain(Key::Character('q'))));
    }

    #[test]
    fn test_import_image_resizes_stage() {
        let mut board = board();
        let id = board.import_image(png_bytes(800, 600)).unwrap();
        assert!((board.stage().width() - 800.0).abs() < f64::EPSILON);
        assert!((board.stage().height() - 600.0).abs() < f64::EPSILON);
        assert_eq!(board.shape_ids(), &[id]);
        let shape = board.layer().get(id);
        assert_eq!(shape.map(Shape::kind), Some(ShapeKind::Image));
        assert_eq!(shape.map(|s| s.bounds().origin()), Some(Point::ZERO));

        // The stage keeps the image size from now on
        board.set_window_size(Size::new(2000.0, 2000.0));
        assert!((board.stage().width() - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_import_changes_nothing() {
        let mut board = board();
        assert!(board.import_image(b"not an image".to_vec()).is_err());
        assert!(board.shape_ids().is_empty());
        assert!((board.stage().width() - 900.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_imported_image_takes_part_in_undo() {
        let mut board = board();
        board.import_image(png_bytes(4, 4)).unwrap();
        board.undo();
        assert!(board.layer().is_empty());
    }

    #[test]
    fn test_window_resize_before_import() {
        let mut board = board();
        board.set_window_size(Size::new(500.0, 400.0));
        assert!((board.stage().width() - 450.0).abs() < f64::EPSILON);
        assert!((board.stage().height() - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_edit_commit_and_cancel() {
        let mut board = board();
        board.add_shape(Tool::Text);
        let id = board.shape_ids()[0];
        assert!(board.begin_text_edit(id));
        assert!(board.active_transformer().is_some_and(|t| !t.is_visible()));
        // Keys belong to the editor while editing
        assert!(!board.key_down(&KeyEvent::plain(Key::Delete)));

        board.commit_text_edit("Hello board");
        let content = |board: &Whiteboard| {
            board
                .layer()
                .get(id)
                .and_then(Shape::as_text)
                .map(|t| t.content.clone())
        };
        assert_eq!(content(&board).as_deref(), Some("Hello board"));
        assert!(board.active_transformer().is_some_and(Transformer::is_visible));

        board.begin_text_edit(id);
        board.cancel_text_edit();
        assert_eq!(content(&board).as_deref(), Some("Hello board"));
        assert!(board.text_edit().is_none());
    }

    #[test]
    fn test_double_click_opens_text_edit() {
        let mut board = board();
        board.add_shape(Tool::Text);
        let point = Point::new(60.0, 90.0);
        click_at(&mut board, point);
        click_at(&mut board, point);
        assert_eq!(board.text_edit().map(|e| e.shape_id), Some(board.shape_ids()[0]));
        assert!(board.text_edit_contains(point));
    }

    #[test]
    fn test_double_click_on_circle_does_not_edit() {
        let mut board = board();
        board.add_shape(Tool::Circle);
        let id = board.shape_ids()[0];
        assert!(!board.begin_text_edit(id));
        assert!(board.text_edit().is_none());
    }

    #[test]
    fn test_presses_outside_stage_are_ignored() {
        let mut board = board();
        board.select_tool("line");
        board.pointer_down(Point::new(950.0, 10.0));
        assert!(!board.is_painting());
        assert!(board.shape_ids().is_empty());
    }
}
