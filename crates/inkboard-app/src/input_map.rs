//! Translation from winit input to board and text editor input.

use inkboard_core::{Key, KeyEvent, Modifiers};
use inkboard_render::TextKey;
use winit::keyboard::{Key as WinitKey, ModifiersState, NamedKey};

pub fn modifiers(state: ModifiersState) -> Modifiers {
    Modifiers {
        shift: state.shift_key(),
        ctrl: state.control_key(),
        alt: state.alt_key(),
        meta: state.super_key(),
    }
}

/// Board key event for a pressed key. Keys the keymap can never bind
/// (arrows, Backspace, Enter, function keys) map to None.
pub fn board_key(key: &WinitKey, modifiers: Modifiers) -> Option<KeyEvent> {
    let key = match key {
        WinitKey::Named(NamedKey::Delete) => Key::Delete,
        WinitKey::Named(NamedKey::Escape) => Key::Escape,
        WinitKey::Character(c) => Key::Character(c.chars().next()?),
        _ => return None,
    };
    Some(KeyEvent::new(key, modifiers))
}

/// Editor key for a pressed key while a text node is being edited.
pub fn text_key(key: &WinitKey) -> Option<TextKey> {
    match key {
        WinitKey::Named(named) => match named {
            NamedKey::Escape => Some(TextKey::Escape),
            NamedKey::Backspace => Some(TextKey::Backspace),
            NamedKey::Delete => Some(TextKey::Delete),
            NamedKey::Enter => Some(TextKey::Enter),
            NamedKey::ArrowLeft => Some(TextKey::Left),
            NamedKey::ArrowRight => Some(TextKey::Right),
            NamedKey::ArrowUp => Some(TextKey::Up),
            NamedKey::ArrowDown => Some(TextKey::Down),
            NamedKey::Home => Some(TextKey::Home),
            NamedKey::End => Some(TextKey::End),
            NamedKey::Space => Some(TextKey::Character(" ".to_string())),
            _ => None,
        },
        WinitKey::Character(c) => Some(TextKey::Character(c.to_string())),
        _ => None,
    }
}
