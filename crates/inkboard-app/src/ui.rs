//! Toolbar built with egui.

use egui::{Align2, Color32, Context, CornerRadius, Frame, Margin, RichText, Stroke, Vec2};
use inkboard_core::shapes::ShapeKind;
use inkboard_core::{Tool, Whiteboard};

const BUTTON_SIZE: Vec2 = Vec2::new(96.0, 28.0);

/// What the toolbar shows, mirrored from the board each frame.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub current_tool: Option<Tool>,
    pub shape_count: usize,
    pub selected: Option<ShapeKind>,
    pub editing_text: bool,
}

impl UiState {
    pub fn sync_from(&mut self, board: &Whiteboard) {
        self.current_tool = board.tools().current();
        self.shape_count = board.shape_ids().len();
        self.selected = board
            .selected()
            .and_then(|id| board.layer().get(id))
            .map(|shape| shape.kind());
        self.editing_text = board.text_edit().is_some();
    }
}

/// Toolbar actions for the app to run against the board.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SelectTool(Tool),
    /// Open a file picker and import the chosen image.
    ImportImage,
}

/// Render the UI and return the triggered action, if any.
pub fn render_ui(ctx: &Context, ui_state: &UiState) -> Option<UiAction> {
    let mut action = None;

    egui::Area::new(egui::Id::new("toolbar"))
        .anchor(Align2::RIGHT_TOP, Vec2::new(-8.0, 8.0))
        .show(ctx, |ui| {
            panel_frame().show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.spacing_mut().item_spacing = Vec2::new(0.0, 4.0);

                    for tool in Tool::ALL {
                        let selected = ui_state.current_tool == Some(tool);
                        let button = egui::Button::new(tool.label()).selected(selected);
                        if ui.add_sized(BUTTON_SIZE, button).clicked() {
                            action = Some(UiAction::SelectTool(tool));
                        }
                    }

                    ui.separator();
                    if ui
                        .add_sized(BUTTON_SIZE, egui::Button::new("Image"))
                        .on_hover_text("Import an image and size the stage to it")
                        .clicked()
                    {
                        action = Some(UiAction::ImportImage);
                    }

                    ui.separator();
                    render_status(ui, ui_state);
                });
            });
        });

    action
}

fn render_status(ui: &mut egui::Ui, ui_state: &UiState) {
    let status = |text: String| RichText::new(text).small().color(Color32::from_gray(110));
    ui.label(status(format!("{} shapes", ui_state.shape_count)));
    if let Some(kind) = ui_state.selected {
        ui.label(status(format!("{kind:?} selected")));
    }
    if ui_state.editing_text {
        ui.label(status("Enter commits, Esc cancels".to_string()));
    }
}

fn panel_frame() -> Frame {
    Frame::new()
        .fill(Color32::WHITE)
        .stroke(Stroke::new(1.0, Color32::from_gray(220)))
        .corner_radius(CornerRadius::same(8))
        .inner_margin(Margin::same(8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::BoardConfig;
    use kurbo::Size;

    #[test]
    fn test_sync_from_board() {
        let mut board = Whiteboard::new(BoardConfig::default(), Size::new(800.0, 600.0));
        board.add_shape(Tool::Text);
        let mut ui_state = UiState::default();
        ui_state.sync_from(&board);
        assert_eq!(ui_state.current_tool, Some(Tool::Text));
        assert_eq!(ui_state.shape_count, 1);
        assert_eq!(ui_state.selected, Some(ShapeKind::Text));
        assert!(!ui_state.editing_text);
    }

    #[test]
    fn test_render_without_input_triggers_nothing() {
        let ctx = Context::default();
        let mut action = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            action = render_ui(ctx, &UiState::default());
        });
        assert_eq!(action, None);
    }
}
