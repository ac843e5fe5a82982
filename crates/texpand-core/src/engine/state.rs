use crate::config::EngineConfig;
use crate::engine::buffer::{ClearReason, KeywordBuffer};
use crate::engine::event::{KeyEvent, Modifier, ModifierKind};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Modifier keys currently held down.
#[derive(Debug, Default)]
pub struct ModifierSet {
    held: HashSet<Modifier>,
}

impl ModifierSet {
    pub fn press(&mut self, modifier: Modifier) {
        self.held.insert(modifier);
    }

    pub fn release(&mut self, modifier: Modifier) {
        self.held.remove(&modifier);
    }

    pub fn is_held(&self, kind: ModifierKind) -> bool {
        self.held.iter().any(|m| m.kind() == kind)
    }

    /// True while ctrl, alt or meta is down. Shift alone only changes case.
    pub fn has_command_modifier(&self) -> bool {
        self.held.iter().any(|m| m.kind() != ModifierKind::Shift)
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

/// Synthetic events the hook is expected to hand back after a replacement.
///
/// Echoes must arrive in injection order before the deadline. The first
/// event that does not match drops whatever is still expected.
#[derive(Debug, Default)]
pub struct EchoFilter {
    expected: VecDeque<KeyEvent>,
    deadline: Option<Instant>,
}

impl EchoFilter {
    pub fn expect(&mut self, events: Vec<KeyEvent>, deadline: Instant) {
        self.expected = events.into();
        self.deadline = Some(deadline);
    }

    /// Swallow `event` if it is the next expected echo.
    pub fn consume(&mut self, event: &KeyEvent, now: Instant) -> bool {
        if self.expected.is_empty() {
            return false;
        }
        // Modifiers are never injected, and their state must stay accurate.
        if matches!(event, KeyEvent::Modifier(..)) {
            return false;
        }

        let live = self.deadline.map_or(false, |deadline| now <= deadline);
        if live && self.expected.front() == Some(event) {
            self.expected.pop_front();
            return true;
        }

        self.clear();
        false
    }

    pub fn pending(&self) -> usize {
        self.expected.len()
    }

    pub fn clear(&mut self) {
        self.expected.clear();
        self.deadline = None;
    }
}

/// Everything mutated per keystroke. Lives behind a single mutex.
#[derive(Debug)]
pub struct EngineState {
    pub buffer: KeywordBuffer,
    pub modifiers: ModifierSet,
    pub last_char_time: Option<Instant>,
    pub echo: EchoFilter,
}

impl EngineState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            buffer: KeywordBuffer::new(config.max_buffer_len, config.idle_timeout()),
            modifiers: ModifierSet::default(),
            last_char_time: None,
            echo: EchoFilter::default(),
        }
    }
}

/// Flags read by the classifier on every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineFlags {
    pub enabled: bool,
    pub expanding: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineStatus {
    pub enabled: bool,
    pub expanding: bool,
    pub buffer_len: usize,
}

#[derive(Debug)]
pub(crate) struct EngineShared {
    state: Mutex<EngineState>,
    enabled: AtomicBool,
    pub(crate) expanding: AtomicBool,
}

impl EngineShared {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        // A panic while holding the lock leaves the buffer in a usable state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn flags(&self) -> EngineFlags {
        EngineFlags {
            enabled: self.enabled.load(Ordering::SeqCst),
            expanding: self.expanding.load(Ordering::SeqCst),
        }
    }
}

/// Cloneable view of the engine for status displays and remote control.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    pub(crate) shared: Arc<EngineShared>,
}

impl EngineHandle {
    /// Fresh engine state: empty buffer, enabled.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                state: Mutex::new(EngineState::new(config)),
                enabled: AtomicBool::new(true),
                expanding: AtomicBool::new(false),
            }),
        }
    }

    /// Flip the enabled flag and drop any pending keyword.
    pub fn toggle_enabled(&self) -> bool {
        let mut state = self.shared.lock_state();
        let enabled = !self.shared.enabled.fetch_xor(true, Ordering::SeqCst);
        state.buffer.clear(ClearReason::Toggle);
        drop(state);

        info!(
            "Text expansion {}",
            if enabled { "ENABLED" } else { "DISABLED" }
        );
        enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    pub fn is_expanding(&self) -> bool {
        self.shared.expanding.load(Ordering::SeqCst)
    }

    /// Diagnostic copy of the pending keyword.
    pub fn buffer_preview(&self) -> String {
        self.shared.lock_state().buffer.snapshot()
    }

    pub fn status(&self) -> EngineStatus {
        let buffer_len = self.shared.lock_state().buffer.len();
        let flags = self.shared.flags();
        EngineStatus {
            enabled: flags.enabled,
            expanding: flags.expanding,
            buffer_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::event::KeyPhase;
    use std::time::Duration;

    #[test]
    fn starts_enabled_and_empty() {
        let handle = EngineHandle::new(&EngineConfig::default());
        assert!(handle.is_enabled());
        assert!(!handle.is_expanding());
        assert_eq!(handle.buffer_preview(), "");
    }

    #[test]
    fn toggle_flips_and_clears() {
        let handle = EngineHandle::new(&EngineConfig::default());
        handle
            .shared
            .lock_state()
            .buffer
            .append('a', Instant::now());

        assert!(!handle.toggle_enabled());
        assert_eq!(handle.buffer_preview(), "");
        assert!(handle.toggle_enabled());
        assert_eq!(handle.status().buffer_len, 0);
    }

    #[test]
    fn left_and_right_modifiers_are_tracked_separately() {
        let mut mods = ModifierSet::default();
        mods.press(Modifier::CtrlLeft);
        mods.press(Modifier::CtrlRight);
        mods.release(Modifier::CtrlLeft);
        assert!(mods.is_held(ModifierKind::Ctrl));
        mods.release(Modifier::CtrlRight);
        assert!(!mods.is_held(ModifierKind::Ctrl));
        assert!(mods.is_empty());
    }

    #[test]
    fn echoes_are_consumed_in_order() {
        let now = Instant::now();
        let mut echo = EchoFilter::default();
        echo.expect(
            vec![KeyEvent::Character('h'), KeyEvent::Character('i')],
            now + Duration::from_millis(500),
        );

        let shift = KeyEvent::Modifier(Modifier::ShiftLeft, KeyPhase::Down);
        assert!(!echo.consume(&shift, now));
        assert!(echo.consume(&KeyEvent::Character('h'), now));
        assert!(echo.consume(&KeyEvent::Character('i'), now));
        assert_eq!(echo.pending(), 0);
        assert!(!echo.consume(&KeyEvent::Character('i'), now));
    }

    #[test]
    fn unexpected_event_or_late_echo_drops_the_rest() {
        let now = Instant::now();
        let deadline = now + Duration::from_millis(500);
        let mut echo = EchoFilter::default();

        echo.expect(vec![KeyEvent::Character('a'), KeyEvent::Character('b')], deadline);
        assert!(!echo.consume(&KeyEvent::Character('z'), now));
        assert_eq!(echo.pending(), 0);

        echo.expect(vec![KeyEvent::Character('a')], deadline);
        assert!(!echo.consume(&KeyEvent::Character('a'), deadline + Duration::from_millis(1)));
        assert_eq!(echo.pending(), 0);
    }

    #[test]
    fn shift_is_not_a_command_modifier() {
        let mut mods = ModifierSet::default();
        mods.press(Modifier::ShiftLeft);
        assert!(!mods.has_command_modifier());
        mods.press(Modifier::MetaLeft);
        assert!(mods.has_command_modifier());
    }
}
