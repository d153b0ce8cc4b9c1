//! Keyboard shortcut table.
//!
//! The rendering layer translates key chords into action names here before
//! calling [`Editor::dispatch`](crate::editor::Editor::dispatch).

/// Modifier keys held during a keystroke.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl on Linux and Windows, Cmd on macOS.
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { ctrl: false, shift: false };
    pub const CTRL: Self = Self { ctrl: true, shift: false };
    pub const CTRL_SHIFT: Self = Self { ctrl: true, shift: true };
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub key: &'static str,
    pub modifiers: Modifiers,
    /// Action name passed to the dispatcher.
    pub action: &'static str,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        modifiers: Modifiers,
        action: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            modifiers,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.modifiers.ctrl {
            parts.push("Ctrl");
        }
        if self.modifiers.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.modifiers == modifiers && self.key.eq_ignore_ascii_case(key)
    }
}

/// Every registered shortcut.
pub const SHORTCUTS: &[Shortcut] = &[
    Shortcut::new("C", Modifiers::CTRL, "copy", "Copy the active object"),
    Shortcut::new("X", Modifiers::CTRL, "cut", "Cut the active object"),
    Shortcut::new("V", Modifiers::CTRL, "paste", "Paste"),
    Shortcut::new("Z", Modifiers::CTRL, "undo", "Undo"),
    Shortcut::new("Z", Modifiers::CTRL_SHIFT, "redo", "Redo"),
    Shortcut::new("Y", Modifiers::CTRL, "redo", "Redo"),
    Shortcut::new("Delete", Modifiers::NONE, "delete", "Delete the active object"),
    Shortcut::new("Backspace", Modifiers::NONE, "delete", "Delete the active object"),
];

/// Look up the action bound to a key chord. Keys compare case-insensitively.
pub fn action_for_key(key: &str, modifiers: Modifiers) -> Option<&'static str> {
    SHORTCUTS
        .iter()
        .find(|shortcut| shortcut.matches(key, modifiers))
        .map(|shortcut| shortcut.action)
}
