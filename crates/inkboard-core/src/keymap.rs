//! Keyboard shortcuts. One keymap serves the whole board; commands run
//! against whatever is selected when the key arrives.

use crate::input::Modifiers;
use std::fmt;

/// Keys the board reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Delete,
    Escape,
    Character(char),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Delete => f.write_str("Delete"),
            Key::Escape => f.write_str("Escape"),
            Key::Character(c) => write!(f, "{}", c.to_ascii_uppercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    DeleteSelected,
    Undo,
    ClearSelection,
}

/// A key combination bound to a command.
#[derive(Debug, Clone)]
pub struct Binding {
    pub key: Key,
    /// Ctrl, or Cmd on macOS.
    pub action_mod: bool,
    pub shift: bool,
    pub command: KeyCommand,
    pub description: &'static str,
}

impl Binding {
    pub const fn new(
        key: Key,
        action_mod: bool,
        shift: bool,
        command: KeyCommand,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            action_mod,
            shift,
            command,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.action_mod {
            parts.push("Ctrl".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        parts.push(self.key.to_string());
        parts.join("+")
    }

    fn matches(&self, event: &KeyEvent) -> bool {
        let key_matches = match (self.key, event.key) {
            (Key::Character(a), Key::Character(b)) => a.eq_ignore_ascii_case(&b),
            (a, b) => a == b,
        };
        key_matches
            && self.action_mod == event.modifiers.action_mod()
            && self.shift == event.modifiers.shift
    }
}

#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<Binding>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            bindings: vec![
                Binding::new(
                    Key::Delete,
                    false,
                    false,
                    KeyCommand::DeleteSelected,
                    "Delete selected shape",
                ),
                Binding::new(Key::Character('z'), true, false, KeyCommand::Undo, "Undo"),
                Binding::new(
                    Key::Escape,
                    false,
                    false,
                    KeyCommand::ClearSelection,
                    "Clear selection",
                ),
            ],
        }
    }
}

impl Keymap {
    pub fn new(bindings: Vec<Binding>) -> Self {
        Self { bindings }
    }

    pub fn resolve(&self, event: &KeyEvent) -> Option<KeyCommand> {
        self.bindings
            .iter()
            .find(|binding| binding.matches(event))
            .map(|binding| binding.command)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn log_bindings(&self) {
        for binding in &self.bindings {
            log::info!("  {:12} {}", binding.format(), binding.description);
        }
    }
}
