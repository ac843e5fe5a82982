use std::fmt;

/// A single key event as delivered by the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A key press that produced a printable character.
    Character(char),
    /// A letter or digit key that produced no printable character, named
    /// by its physical key. This is what ctrl or alt combinations look like.
    Chord(char),
    Modifier(Modifier, KeyPhase),
    Special(SpecialKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPhase {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    CtrlLeft,
    CtrlRight,
    AltLeft,
    AltRight,
    ShiftLeft,
    ShiftRight,
    MetaLeft,
    MetaRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKind {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    pub fn kind(self) -> ModifierKind {
        match self {
            Modifier::CtrlLeft | Modifier::CtrlRight => ModifierKind::Ctrl,
            Modifier::AltLeft | Modifier::AltRight => ModifierKind::Alt,
            Modifier::ShiftLeft | Modifier::ShiftRight => ModifierKind::Shift,
            Modifier::MetaLeft | Modifier::MetaRight => ModifierKind::Meta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Backspace,
    Tab,
    Enter,
    Space,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Other,
}

/// Keys that end a word and start a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Space,
    Tab,
    Enter,
}

impl SpecialKey {
    pub fn as_trigger(self) -> Option<Trigger> {
        match self {
            SpecialKey::Space => Some(Trigger::Space),
            SpecialKey::Tab => Some(Trigger::Tab),
            SpecialKey::Enter => Some(Trigger::Enter),
            _ => None,
        }
    }

    /// Cursor movement keys leave a pending keyword intact.
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            SpecialKey::Left
                | SpecialKey::Right
                | SpecialKey::Up
                | SpecialKey::Down
                | SpecialKey::Home
                | SpecialKey::End
                | SpecialKey::PageUp
                | SpecialKey::PageDown
        )
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Space => write!(f, "space"),
            Trigger::Tab => write!(f, "tab"),
            Trigger::Enter => write!(f, "enter"),
        }
    }
}
