//! Maps each raw key event to what the engine should do with it.

use crate::engine::buffer::{is_keyword_char, ClearReason};
use crate::engine::event::{KeyEvent, KeyPhase, ModifierKind, SpecialKey, Trigger};
use crate::engine::state::{EngineFlags, EngineState};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ignore,
    AppendChar(char),
    RemoveLast(usize),
    Flush(Trigger),
    ClearBuffer(ClearReason),
    ToggleEnabled,
}

#[derive(Debug, Clone)]
pub struct EventClassifier {
    debounce: Duration,
    hotkey: char,
}

impl EventClassifier {
    pub fn new(debounce: Duration, hotkey: char) -> Self {
        Self { debounce, hotkey }
    }

    /// Classify `event`, updating the held modifiers and the debounce clock.
    ///
    /// Modifier state is tracked and the toggle hotkey recognised even while
    /// disabled, otherwise the engine could never be switched back on.
    pub fn classify(
        &self,
        state: &mut EngineState,
        flags: EngineFlags,
        event: &KeyEvent,
        now: Instant,
    ) -> Disposition {
        if flags.expanding {
            return Disposition::Ignore;
        }

        match *event {
            KeyEvent::Modifier(modifier, KeyPhase::Down) => {
                state.modifiers.press(modifier);
                return Disposition::Ignore;
            }
            KeyEvent::Modifier(modifier, KeyPhase::Up) => {
                state.modifiers.release(modifier);
                return Disposition::Ignore;
            }
            KeyEvent::Character(c) | KeyEvent::Chord(c) if self.is_hotkey(state, c) => {
                return Disposition::ToggleEnabled;
            }
            _ => {}
        }

        if !flags.enabled {
            return Disposition::Ignore;
        }

        if state.modifiers.has_command_modifier() {
            return Disposition::ClearBuffer(ClearReason::ModifierCombo);
        }

        match *event {
            KeyEvent::Character(c) => {
                let settled = state
                    .last_char_time
                    .map_or(true, |last| now.saturating_duration_since(last) >= self.debounce);

                if settled && is_keyword_char(c) {
                    state.last_char_time = Some(now);
                    Disposition::AppendChar(c)
                } else if !settled {
                    Disposition::Ignore
                } else {
                    Disposition::ClearBuffer(ClearReason::InvalidChar)
                }
            }
            KeyEvent::Chord(_) => Disposition::ClearBuffer(ClearReason::OtherSpecialKey),
            KeyEvent::Special(SpecialKey::Backspace) => Disposition::RemoveLast(1),
            KeyEvent::Special(key) => match key.as_trigger() {
                Some(trigger) => Disposition::Flush(trigger),
                None if key.is_navigation() => Disposition::Ignore,
                None => Disposition::ClearBuffer(ClearReason::OtherSpecialKey),
            },
            KeyEvent::Modifier(..) => Disposition::Ignore,
        }
    }

    fn is_hotkey(&self, state: &EngineState, c: char) -> bool {
        c.to_lowercase().eq(self.hotkey.to_lowercase())
            && state.modifiers.is_held(ModifierKind::Ctrl)
            && state.modifiers.is_held(ModifierKind::Alt)
    }
}
