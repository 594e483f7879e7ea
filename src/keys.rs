// src/keys.rs

use serde::{Deserialize, Serialize};

/// Represents a key symbol.
///
/// This is the platform-neutral key vocabulary shared by the window layer
/// and the render worker. Window backends translate their native key codes
/// into these symbols before anything crosses the thread boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KeySymbol {
    // Alphanumeric keys
    Char(char),

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Modifier keys (when pressed and released without other keys)
    Shift,
    Control,
    Alt,
    Super,

    // Navigation keys
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Delete,

    // Other common keys
    Enter,
    Backspace,
    Tab,
    Escape,

    // Unidentified key
    #[default]
    Unknown,
}

impl KeySymbol {
    /// Returns true if the key symbol represents a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            KeySymbol::Shift | KeySymbol::Control | KeySymbol::Alt | KeySymbol::Super
        )
    }

    /// Human-readable label used in on-screen hints ("F1", "Escape", "a").
    pub fn label(&self) -> String {
        match self {
            KeySymbol::Char(c) => c.to_string(),
            other => format!("{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_are_recognised() {
        assert!(KeySymbol::Shift.is_modifier());
        assert!(KeySymbol::Super.is_modifier());
        assert!(!KeySymbol::F1.is_modifier());
        assert!(!KeySymbol::Char('a').is_modifier());
    }

    #[test]
    fn labels_read_like_key_caps() {
        assert_eq!(KeySymbol::F1.label(), "F1");
        assert_eq!(KeySymbol::Escape.label(), "Escape");
        assert_eq!(KeySymbol::Char('q').label(), "q");
    }

    #[test]
    fn key_symbols_parse_from_config_names() {
        let parsed: KeySymbol = serde_json::from_str("\"F5\"").unwrap();
        assert_eq!(parsed, KeySymbol::F5);
        let parsed: KeySymbol = serde_json::from_str("{\"Char\":\"x\"}").unwrap();
        assert_eq!(parsed, KeySymbol::Char('x'));
    }
}
