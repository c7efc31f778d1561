//! Keyboard handling module
//!
//! Host-neutral key names, slideshow actions and the binding table that maps
//! one to the other. Hosts translate their native key events into [`Key`]
//! and forward them to the controller.

use std::collections::HashMap;

/// Keys the slideshow can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
    Enter,
    Backspace,
    Home,
    End,
    PageUp,
    PageDown,
    F11,
    /// A printable letter or digit, stored uppercase
    Char(char),
}

/// Key press with modifier state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyBinding {
    Key(Key),
    WithCtrl(Key),
    WithShift(Key),
    WithAlt(Key),
}

/// Actions a key press can trigger while a session is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NextSlide,
    PreviousSlide,
    Close,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::NextSlide, Action::PreviousSlide, Action::Close];

    pub fn from_str(s: &str) -> Option<Action> {
        match s.trim().to_lowercase().as_str() {
            "next_slide" | "next" => Some(Action::NextSlide),
            "previous_slide" | "prev_slide" | "previous" | "prev" => Some(Action::PreviousSlide),
            "close" | "exit" => Some(Action::Close),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::NextSlide => "next_slide",
            Action::PreviousSlide => "previous_slide",
            Action::Close => "close",
        }
    }
}

/// Parse an input binding from string, e.g. `right`, `ctrl+w`
pub fn parse_key_binding(s: &str) -> Option<KeyBinding> {
    let s = s.trim().to_lowercase();

    if let Some(key_str) = s.strip_prefix("ctrl+") {
        return parse_key(key_str).map(KeyBinding::WithCtrl);
    }
    if let Some(key_str) = s.strip_prefix("shift+") {
        return parse_key(key_str).map(KeyBinding::WithShift);
    }
    if let Some(key_str) = s.strip_prefix("alt+") {
        return parse_key(key_str).map(KeyBinding::WithAlt);
    }

    parse_key(&s).map(KeyBinding::Key)
}

/// Parse a single key from string
pub fn parse_key(s: &str) -> Option<Key> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "escape" | "esc" => Some(Key::Escape),
        "left" | "arrow_left" | "arrowleft" => Some(Key::ArrowLeft),
        "right" | "arrow_right" | "arrowright" => Some(Key::ArrowRight),
        "up" | "arrow_up" | "arrowup" => Some(Key::ArrowUp),
        "down" | "arrow_down" | "arrowdown" => Some(Key::ArrowDown),
        "space" | "spacebar" => Some(Key::Space),
        "enter" | "return" => Some(Key::Enter),
        "backspace" => Some(Key::Backspace),
        "home" => Some(Key::Home),
        "end" => Some(Key::End),
        "pageup" | "page_up" => Some(Key::PageUp),
        "pagedown" | "page_down" => Some(Key::PageDown),
        "f11" => Some(Key::F11),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => Some(Key::Char(c.to_ascii_uppercase())),
                _ => None,
            }
        }
    }
}

/// Convert a binding back to its string representation
pub fn binding_to_string(binding: &KeyBinding) -> String {
    match binding {
        KeyBinding::Key(key) => key_to_string(key),
        KeyBinding::WithCtrl(key) => format!("ctrl+{}", key_to_string(key)),
        KeyBinding::WithShift(key) => format!("shift+{}", key_to_string(key)),
        KeyBinding::WithAlt(key) => format!("alt+{}", key_to_string(key)),
    }
}

fn key_to_string(key: &Key) -> String {
    match key {
        Key::Escape => "escape".to_string(),
        Key::ArrowLeft => "left".to_string(),
        Key::ArrowRight => "right".to_string(),
        Key::ArrowUp => "up".to_string(),
        Key::ArrowDown => "down".to_string(),
        Key::Space => "space".to_string(),
        Key::Enter => "enter".to_string(),
        Key::Backspace => "backspace".to_string(),
        Key::Home => "home".to_string(),
        Key::End => "end".to_string(),
        Key::PageUp => "pageup".to_string(),
        Key::PageDown => "pagedown".to_string(),
        Key::F11 => "f11".to_string(),
        Key::Char(c) => c.to_ascii_lowercase().to_string(),
    }
}

/// Map from key binding to action, plus the reverse lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: HashMap<KeyBinding, Action>,
    action_bindings: HashMap<Action, Vec<KeyBinding>>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
            action_bindings: HashMap::new(),
        }
    }

    pub fn add(&mut self, binding: KeyBinding, action: Action) {
        if let Some(previous) = self.bindings.insert(binding, action) {
            if let Some(list) = self.action_bindings.get_mut(&previous) {
                list.retain(|b| *b != binding);
            }
        }
        self.action_bindings.entry(action).or_default().push(binding);
    }

    /// Drop every binding for `action`
    pub fn clear_action(&mut self, action: Action) {
        if let Some(list) = self.action_bindings.remove(&action) {
            for binding in list {
                self.bindings.remove(&binding);
            }
        }
    }

    pub fn action_for(&self, binding: &KeyBinding) -> Option<Action> {
        self.bindings.get(binding).copied()
    }

    pub fn bindings_for(&self, action: Action) -> &[KeyBinding] {
        self.action_bindings
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for KeyBindings {
    /// Escape closes, left/right arrows navigate
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.add(KeyBinding::Key(Key::Escape), Action::Close);
        bindings.add(KeyBinding::Key(Key::ArrowLeft), Action::PreviousSlide);
        bindings.add(KeyBinding::Key(Key::ArrowRight), Action::NextSlide);
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_keys() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.action_for(&KeyBinding::Key(Key::Escape)), Some(Action::Close));
        assert_eq!(bindings.action_for(&KeyBinding::Key(Key::ArrowLeft)), Some(Action::PreviousSlide));
        assert_eq!(bindings.action_for(&KeyBinding::Key(Key::ArrowRight)), Some(Action::NextSlide));
        assert_eq!(bindings.action_for(&KeyBinding::Key(Key::Space)), None);
    }

    #[test]
    fn parses_modifiers_and_chars() {
        assert_eq!(parse_key_binding("Ctrl+W"), Some(KeyBinding::WithCtrl(Key::Char('W'))));
        assert_eq!(parse_key_binding(" esc "), Some(KeyBinding::Key(Key::Escape)));
        assert_eq!(parse_key_binding("shift+right"), Some(KeyBinding::WithShift(Key::ArrowRight)));
        assert_eq!(parse_key_binding("mouse_left"), None);
    }

    #[test]
    fn binding_strings_parse_back() {
        for binding in [
            KeyBinding::Key(Key::PageDown),
            KeyBinding::WithAlt(Key::Char('Q')),
        ] {
            assert_eq!(parse_key_binding(&binding_to_string(&binding)), Some(binding));
        }
    }

    #[test]
    fn rebinding_a_key_moves_it_between_actions() {
        let mut bindings = KeyBindings::default();
        bindings.add(KeyBinding::Key(Key::ArrowRight), Action::Close);

        assert_eq!(bindings.action_for(&KeyBinding::Key(Key::ArrowRight)), Some(Action::Close));
        assert!(bindings.bindings_for(Action::NextSlide).is_empty());
    }
}
