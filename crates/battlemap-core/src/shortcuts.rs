//! Keyboard shortcut registry.

use crate::input::Modifiers;
use crate::scene::LayerMove;

/// Command triggered by a keyboard shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Undo,
    Redo,
    /// Remove the selected asset (transform tool only).
    DeleteSelection,
    /// Reorder the selected asset.
    Layer(LayerMove),
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub command: bool,
    pub shift: bool,
    pub action: EditorCommand,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, command: bool, shift: bool, action: EditorCommand, description: &'static str) -> Self {
        Self {
            key,
            command,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.command {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        let key = match self.key {
            "z" => "Z",
            "y" => "Y",
            other => other,
        };
        parts.push(key);
        parts.join("+")
    }

    fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key) && self.command == modifiers.command() && self.shift == modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("z", true, false, EditorCommand::Undo, "Undo"),
            Shortcut::new("z", true, true, EditorCommand::Redo, "Redo"),
            Shortcut::new("y", true, false, EditorCommand::Redo, "Redo"),
            Shortcut::new("Delete", false, false, EditorCommand::DeleteSelection, "Delete selected asset"),
            Shortcut::new("Backspace", false, false, EditorCommand::DeleteSelection, "Delete selected asset"),
            Shortcut::new("]", false, false, EditorCommand::Layer(LayerMove::Forward), "Bring asset forward"),
            Shortcut::new("[", false, false, EditorCommand::Layer(LayerMove::Backward), "Send asset backward"),
            Shortcut::new("]", false, true, EditorCommand::Layer(LayerMove::ToFront), "Bring asset to front"),
            Shortcut::new("[", false, true, EditorCommand::Layer(LayerMove::ToBack), "Send asset to back"),
        ]
    }

    /// Find the command bound to `key` with the given modifiers.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<EditorCommand> {
        // Shifted brackets arrive as braces on US layouts.
        let key = match key {
            "}" => "]",
            "{" => "[",
            other => other,
        };
        Self::all().into_iter().find(|s| s.matches(key, modifiers)).map(|s| s.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(command: bool, shift: bool) -> Modifiers {
        Modifiers {
            ctrl: command,
            shift,
            ..Default::default()
        }
    }

    #[test]
    fn test_undo_redo_bindings() {
        assert_eq!(ShortcutRegistry::resolve("z", mods(true, false)), Some(EditorCommand::Undo));
        assert_eq!(ShortcutRegistry::resolve("Z", mods(true, true)), Some(EditorCommand::Redo));
        assert_eq!(ShortcutRegistry::resolve("y", mods(true, false)), Some(EditorCommand::Redo));
        assert_eq!(ShortcutRegistry::resolve("z", mods(false, false)), None);

        let meta = Modifiers {
            meta: true,
            ..Default::default()
        };
        assert_eq!(ShortcutRegistry::resolve("z", meta), Some(EditorCommand::Undo));
    }

    #[test]
    fn test_layer_bindings() {
        assert_eq!(
            ShortcutRegistry::resolve("]", mods(false, false)),
            Some(EditorCommand::Layer(LayerMove::Forward))
        );
        assert_eq!(
            ShortcutRegistry::resolve("{", mods(false, true)),
            Some(EditorCommand::Layer(LayerMove::ToBack))
        );
    }

    #[test]
    fn test_delete_bindings() {
        assert_eq!(
            ShortcutRegistry::resolve("Backspace", mods(false, false)),
            Some(EditorCommand::DeleteSelection)
        );
        assert_eq!(ShortcutRegistry::resolve("Delete", mods(true, false)), None);
    }

    #[test]
    fn test_format() {
        let redo = &ShortcutRegistry::all()[1];
        assert_eq!(redo.format(), "Ctrl+Shift+Z");
    }
}
