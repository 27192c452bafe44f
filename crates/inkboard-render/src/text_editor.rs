//! Text editing state using Parley's PlainEditor.

use inkboard_core::Modifiers;
use parley::editing::{PlainEditor, PlainEditorDriver};
use parley::{FontContext, GenericFamily, LayoutContext, StyleProperty};
use peniko::Brush;
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Keyboard key for text editing.
#[derive(Debug, Clone, PartialEq)]
pub enum TextKey {
    Character(String),
    Backspace,
    Delete,
    Enter,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Escape,
}

/// What the caller should do after a key.
#[derive(Debug, Clone, PartialEq)]
pub enum TextEditResult {
    /// Event was handled, text may have changed.
    Handled,
    /// Keep the edited text and leave edit mode.
    Commit,
    /// Restore the original text and leave edit mode.
    Cancel,
    /// Event was not handled (pass to other handlers).
    NotHandled,
}

/// Editor for the one text node being edited.
pub struct TextEditState {
    editor: PlainEditor<Brush>,
    cursor_visible: bool,
    /// Blink phase origin. None disables blinking.
    start_time: Option<Instant>,
    blink_period: Duration,
    /// Pointer drag extending the selection.
    is_dragging: bool,
}

impl TextEditState {
    /// Editor holding `text`, wrapped at `width`.
    pub fn new(text: &str, font_size: f32, width: f32) -> Self {
        let mut editor = PlainEditor::new(font_size);
        editor.set_text(text);
        editor.set_scale(1.0);
        editor.set_width(Some(width));

        let styles = editor.edit_styles();
        styles.insert(GenericFamily::SansSerif.into());
        styles.insert(StyleProperty::Brush(Brush::Solid(peniko::Color::BLACK)));

        Self {
            editor,
            cursor_visible: true,
            start_time: None,
            blink_period: Duration::from_millis(500),
            is_dragging: false,
        }
    }

    pub fn editor_mut(&mut self) -> &mut PlainEditor<Brush> {
        &mut self.editor
    }

    pub fn editor(&self) -> &PlainEditor<Brush> {
        &self.editor
    }

    pub fn driver<'a>(
        &'a mut self,
        font_cx: &'a mut FontContext,
        layout_cx: &'a mut LayoutContext<Brush>,
    ) -> PlainEditorDriver<'a, Brush> {
        self.editor.driver(font_cx, layout_cx)
    }

    pub fn text(&self) -> String {
        self.editor.text().to_string()
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.editor.edit_styles().insert(StyleProperty::Brush(brush));
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.editor.edit_styles().insert(StyleProperty::FontSize(size));
    }

    /// Reset cursor to visible state and start blinking.
    pub fn cursor_reset(&mut self) {
        self.start_time = Some(Instant::now());
        self.cursor_visible = true;
    }

    /// When the caret should next toggle.
    pub fn next_blink_time(&self) -> Option<Instant> {
        self.start_time.map(|start_time| {
            let period = self.blink_period.as_nanos();
            let phase = Instant::now().duration_since(start_time).as_nanos();
            start_time + Duration::from_nanos(((phase / period + 1) * period) as u64)
        })
    }

    /// Update cursor visibility based on blink state.
    pub fn cursor_blink(&mut self) {
        self.cursor_visible = self.start_time.is_some_and(|start_time| {
            let elapsed = Instant::now().duration_since(start_time);
            (elapsed.as_millis() / self.blink_period.as_millis()) % 2 == 0
        });
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Whether an IME composition is in progress.
    pub fn is_composing(&self) -> bool {
        self.editor.is_composing()
    }

    /// Handle a key press. Enter commits; Shift+Enter starts a new line.
    pub fn handle_key(
        &mut self,
        key: TextKey,
        modifiers: Modifiers,
        font_cx: &mut FontContext,
        layout_cx: &mut LayoutContext<Brush>,
    ) -> TextEditResult {
        if self.editor.is_composing() {
            return TextEditResult::NotHandled;
        }
        let action_mod = modifiers.action_mod();
        let shift = modifiers.shift;
        match key {
            TextKey::Escape => return TextEditResult::Cancel,
            TextKey::Enter if !shift => return TextEditResult::Commit,
            _ => {}
        }

        self.cursor_reset();
        let mut drv = self.editor.driver(font_cx, layout_cx);
        match key {
            TextKey::Escape => {}
            TextKey::Enter => drv.insert_or_replace_selection("\n"),
            TextKey::Backspace => {
                if action_mod {
                    drv.backdelete_word();
                } else {
                    drv.backdelete();
                }
            }
            TextKey::Delete => {
                if action_mod {
                    drv.delete_word();
                } else {
                    drv.delete();
                }
            }
            TextKey::Left => match (action_mod, shift) {
                (true, true) => drv.select_word_left(),
                (true, false) => drv.move_word_left(),
                (false, true) => drv.select_left(),
                (false, false) => drv.move_left(),
            },
            TextKey::Right => match (action_mod, shift) {
                (true, true) => drv.select_word_right(),
                (true, false) => drv.move_word_right(),
                (false, true) => drv.select_right(),
                (false, false) => drv.move_right(),
            },
            TextKey::Up => {
                if shift {
                    drv.select_up();
                } else {
                    drv.move_up();
                }
            }
            TextKey::Down => {
                if shift {
                    drv.select_down();
                } else {
                    drv.move_down();
                }
            }
            TextKey::Home => match (action_mod, shift) {
                (true, true) => drv.select_to_text_start(),
                (true, false) => drv.move_to_text_start(),
                (false, true) => drv.select_to_line_start(),
                (false, false) => drv.move_to_line_start(),
            },
            TextKey::End => match (action_mod, shift) {
                (true, true) => drv.select_to_text_end(),
                (true, false) => drv.move_to_text_end(),
                (false, true) => drv.select_to_line_end(),
                (false, false) => drv.move_to_line_end(),
            },
            TextKey::Character(ref c) => {
                if action_mod && c.eq_ignore_ascii_case("a") {
                    drv.select_all();
                } else if action_mod {
                    return TextEditResult::NotHandled;
                } else {
                    drv.insert_or_replace_selection(c);
                }
            }
        }
        TextEditResult::Handled
    }

    /// Place the caret at a point relative to the text node's top-left.
    pub fn handle_mouse_down(
        &mut self,
        local_x: f32,
        local_y: f32,
        shift: bool,
        font_cx: &mut FontContext,
        layout_cx: &mut LayoutContext<Brush>,
    ) {
        self.cursor_reset();
        self.is_dragging = true;
        let mut drv = self.editor.driver(font_cx, layout_cx);
        if shift {
            drv.extend_selection_to_point(local_x, local_y);
        } else {
            drv.move_to_point(local_x, local_y);
        }
    }

    pub fn handle_mouse_drag(
        &mut self,
        local_x: f32,
        local_y: f32,
        font_cx: &mut FontContext,
        layout_cx: &mut LayoutContext<Brush>,
    ) {
        if !self.is_dragging {
            return;
        }
        self.cursor_reset();
        self.editor
            .driver(font_cx, layout_cx)
            .extend_selection_to_point(local_x, local_y);
    }

    pub fn handle_mouse_up(&mut self) {
        self.is_dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// Select the word under the pointer.
    pub fn handle_double_click(
        &mut self,
        local_x: f32,
        local_y: f32,
        font_cx: &mut FontContext,
        layout_cx: &mut LayoutContext<Brush>,
    ) {
        self.cursor_reset();
        self.editor
            .driver(font_cx, layout_cx)
            .select_word_at_point(local_x, local_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts() -> (FontContext, LayoutContext<Brush>) {
        (FontContext::new(), LayoutContext::new())
    }

    fn shift() -> Modifiers {
        Modifiers {
            shift: true,
            ..Modifiers::NONE
        }
    }

    #[test]
    fn test_enter_commits_escape_cancels() {
        let (mut font_cx, mut layout_cx) = contexts();
        let mut state = TextEditState::new("hello", 20.0, 200.0);
        assert_eq!(
            state.handle_key(TextKey::Enter, Modifiers::NONE, &mut font_cx, &mut layout_cx),
            TextEditResult::Commit
        );
        assert_eq!(
            state.handle_key(TextKey::Escape, Modifiers::NONE, &mut font_cx, &mut layout_cx),
            TextEditResult::Cancel
        );
        assert_eq!(state.text(), "hello");
    }

    #[test]
    fn test_typing_and_newline() {
        let (mut font_cx, mut layout_cx) = contexts();
        let mut state = TextEditState::new("", 20.0, 200.0);
        for c in ["h", "i"] {
            state.handle_key(
                TextKey::Character(c.to_string()),
                Modifiers::NONE,
                &mut font_cx,
                &mut layout_cx,
            );
        }
        assert_eq!(
            state.handle_key(TextKey::Enter, shift(), &mut font_cx, &mut layout_cx),
            TextEditResult::Handled
        );
        state.handle_key(TextKey::Backspace, Modifiers::NONE, &mut font_cx, &mut layout_cx);
        state.handle_key(
            TextKey::Character("!".to_string()),
            Modifiers::NONE,
            &mut font_cx,
            &mut layout_cx,
        );
        assert_eq!(state.text(), "hi!");
    }

    #[test]
    fn test_blink_toggles_visibility_window() {
        let mut state = TextEditState::new("abc", 20.0, 100.0);
        assert!(state.next_blink_time().is_none());
        state.cursor_reset();
        assert!(state.next_blink_time().is_some());
        state.cursor_blink();
        assert!(state.is_cursor_visible());
    }
}
