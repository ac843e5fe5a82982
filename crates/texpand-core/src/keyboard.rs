//! Platform adapters: rdev hook events in, enigo synthetic input out.

use crate::engine::event::{KeyEvent, KeyPhase, Modifier, SpecialKey};
use crate::engine::ports::{Injector, SyntheticKey};
use crate::error::{Result, TexpandError};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use rdev::{self, EventType, Key as RdevKey};

fn modifier_for(key: RdevKey) -> Option<Modifier> {
    match key {
        RdevKey::ControlLeft => Some(Modifier::CtrlLeft),
        RdevKey::ControlRight => Some(Modifier::CtrlRight),
        RdevKey::Alt => Some(Modifier::AltLeft),
        RdevKey::AltGr => Some(Modifier::AltRight),
        RdevKey::ShiftLeft => Some(Modifier::ShiftLeft),
        RdevKey::ShiftRight => Some(Modifier::ShiftRight),
        RdevKey::MetaLeft => Some(Modifier::MetaLeft),
        RdevKey::MetaRight => Some(Modifier::MetaRight),
        _ => None,
    }
}

fn special_for(key: RdevKey) -> Option<SpecialKey> {
    match key {
        RdevKey::Backspace => Some(SpecialKey::Backspace),
        RdevKey::Tab => Some(SpecialKey::Tab),
        RdevKey::Return | RdevKey::KpReturn => Some(SpecialKey::Enter),
        RdevKey::Space => Some(SpecialKey::Space),
        RdevKey::LeftArrow => Some(SpecialKey::Left),
        RdevKey::RightArrow => Some(SpecialKey::Right),
        RdevKey::UpArrow => Some(SpecialKey::Up),
        RdevKey::DownArrow => Some(SpecialKey::Down),
        RdevKey::Home => Some(SpecialKey::Home),
        RdevKey::End => Some(SpecialKey::End),
        RdevKey::PageUp => Some(SpecialKey::PageUp),
        RdevKey::PageDown => Some(SpecialKey::PageDown),
        _ => None,
    }
}

/// Letter or digit printed on the physical key, used when a held modifier
/// turned the event's text into a control character or dropped it.
fn physical_char(key: RdevKey) -> Option<char> {
    let c = match key {
        RdevKey::KeyA => 'a',
        RdevKey::KeyB => 'b',
        RdevKey::KeyC => 'c',
        RdevKey::KeyD => 'd',
        RdevKey::KeyE => 'e',
        RdevKey::KeyF => 'f',
        RdevKey::KeyG => 'g',
        RdevKey::KeyH => 'h',
        RdevKey::KeyI => 'i',
        RdevKey::KeyJ => 'j',
        RdevKey::KeyK => 'k',
        RdevKey::KeyL => 'l',
        RdevKey::KeyM => 'm',
        RdevKey::KeyN => 'n',
        RdevKey::KeyO => 'o',
        RdevKey::KeyP => 'p',
        RdevKey::KeyQ => 'q',
        RdevKey::KeyR => 'r',
        RdevKey::KeyS => 's',
        RdevKey::KeyT => 't',
        RdevKey::KeyU => 'u',
        RdevKey::KeyV => 'v',
        RdevKey::KeyW => 'w',
        RdevKey::KeyX => 'x',
        RdevKey::KeyY => 'y',
        RdevKey::KeyZ => 'z',
        RdevKey::Num0 => '0',
        RdevKey::Num1 => '1',
        RdevKey::Num2 => '2',
        RdevKey::Num3 => '3',
        RdevKey::Num4 => '4',
        RdevKey::Num5 => '5',
        RdevKey::Num6 => '6',
        RdevKey::Num7 => '7',
        RdevKey::Num8 => '8',
        RdevKey::Num9 => '9',
        _ => return None,
    };
    Some(c)
}

/// Single printable character carried by the event, if any.
fn printable_char(name: Option<&str>) -> Option<char> {
    let name = name?;
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(c),
        _ => None,
    }
}

/// Translate a raw hook event. Returns `None` for events the engine never
/// needs to see (mouse, lock keys, releases of ordinary keys).
pub fn translate(event: &rdev::Event) -> Option<KeyEvent> {
    match event.event_type {
        EventType::KeyPress(key) => {
            if let Some(modifier) = modifier_for(key) {
                return Some(KeyEvent::Modifier(modifier, KeyPhase::Down));
            }
            if let Some(special) = special_for(key) {
                return Some(KeyEvent::Special(special));
            }
            // Lock toggles do not affect the word being typed.
            if matches!(key, RdevKey::CapsLock | RdevKey::NumLock | RdevKey::ScrollLock) {
                return None;
            }
            let event = match (printable_char(event.name.as_deref()), physical_char(key)) {
                (Some(c), _) => KeyEvent::Character(c),
                (None, Some(c)) => KeyEvent::Chord(c),
                (None, None) => KeyEvent::Special(SpecialKey::Other),
            };
            Some(event)
        }
        EventType::KeyRelease(key) => {
            modifier_for(key).map(|modifier| KeyEvent::Modifier(modifier, KeyPhase::Up))
        }
        _ => None,
    }
}

/// [`Injector`] backed by the system input simulator.
pub struct EnigoInjector {
    enigo: Enigo,
}

impl EnigoInjector {
    pub fn new() -> Result<Self> {
        let settings = Settings::default();
        match Enigo::new(&settings) {
            Ok(enigo) => Ok(Self { enigo }),
            Err(err) => Err(TexpandError::Injection(format!(
                "Failed to create keyboard controller: {}",
                err
            ))),
        }
    }
}

impl Injector for EnigoInjector {
    fn press_and_release(&mut self, key: SyntheticKey) -> Result<()> {
        let enigo_key = match key {
            SyntheticKey::Backspace => Key::Backspace,
            SyntheticKey::Enter => Key::Return,
            SyntheticKey::Tab => Key::Tab,
            SyntheticKey::Space => Key::Space,
        };

        self.enigo
            .key(enigo_key, Direction::Click)
            .map_err(|err| TexpandError::Injection(format!("Failed to press {:?}: {}", key, err)))
    }

    fn type_char(&mut self, c: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.enigo
            .text(c.encode_utf8(&mut buf))
            .map_err(|err| TexpandError::Injection(format!("Failed to type '{}': {}", c, err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::buffer::ClearReason;
    use crate::engine::mock::{Injected, MemoryLookup, RecordingInjector};
    use crate::engine::{Disposition, EngineController, EngineHandle};
    use std::time::{Duration, Instant, SystemTime};

    fn press(key: RdevKey, name: Option<&str>) -> rdev::Event {
        rdev::Event {
            time: SystemTime::now(),
            name: name.map(str::to_string),
            event_type: EventType::KeyPress(key),
        }
    }

    fn release(key: RdevKey) -> rdev::Event {
        rdev::Event {
            time: SystemTime::now(),
            name: None,
            event_type: EventType::KeyRelease(key),
        }
    }

    #[test]
    fn letters_become_characters() {
        assert_eq!(
            translate(&press(RdevKey::KeyA, Some("a"))),
            Some(KeyEvent::Character('a'))
        );
        assert_eq!(
            translate(&press(RdevKey::KeyA, Some("ả"))),
            Some(KeyEvent::Character('ả'))
        );
    }

    #[test]
    fn modifiers_report_both_phases() {
        assert_eq!(
            translate(&press(RdevKey::ControlLeft, None)),
            Some(KeyEvent::Modifier(Modifier::CtrlLeft, KeyPhase::Down))
        );
        assert_eq!(
            translate(&release(RdevKey::ControlLeft)),
            Some(KeyEvent::Modifier(Modifier::CtrlLeft, KeyPhase::Up))
        );
    }

    #[test]
    fn special_keys_win_over_their_names() {
        assert_eq!(
            translate(&press(RdevKey::Space, Some(" "))),
            Some(KeyEvent::Special(SpecialKey::Space))
        );
        assert_eq!(
            translate(&press(RdevKey::Backspace, Some("\u{8}"))),
            Some(KeyEvent::Special(SpecialKey::Backspace))
        );
    }

    #[test]
    fn unnamed_keys_are_other() {
        assert_eq!(
            translate(&press(RdevKey::Escape, None)),
            Some(KeyEvent::Special(SpecialKey::Other))
        );
        assert_eq!(
            translate(&press(RdevKey::F5, Some("\u{1b}[15~"))),
            Some(KeyEvent::Special(SpecialKey::Other))
        );
    }

    #[test]
    fn letters_under_ctrl_keep_their_physical_key() {
        // X11 reports ctrl+x as the control character CAN.
        assert_eq!(
            translate(&press(RdevKey::KeyX, Some("\u{18}"))),
            Some(KeyEvent::Chord('x'))
        );
        // Windows reports no name at all.
        assert_eq!(translate(&press(RdevKey::KeyX, None)), Some(KeyEvent::Chord('x')));
        assert_eq!(translate(&press(RdevKey::Num4, None)), Some(KeyEvent::Chord('4')));
    }

    #[test]
    fn lock_keys_and_plain_releases_are_dropped() {
        assert_eq!(translate(&press(RdevKey::CapsLock, None)), None);
        assert_eq!(translate(&release(RdevKey::KeyA)), None);
    }

    /// Feeds raw hook events through [`translate`] into a controller.
    struct HookDriver {
        controller: EngineController<MemoryLookup, RecordingInjector>,
        handle: EngineHandle,
        injector: RecordingInjector,
        now: Instant,
    }

    impl HookDriver {
        fn new(entries: &[(&str, &str)]) -> Self {
            let config = EngineConfig {
                key_delay_ms: 0,
                pre_type_delay_ms: 0,
                search_fallback: false,
                ..EngineConfig::default()
            };
            let handle = EngineHandle::new(&config);
            let injector = RecordingInjector::new();
            let controller =
                EngineController::new(&handle, &config, MemoryLookup::new(entries), injector.clone());
            Self {
                controller,
                handle,
                injector,
                now: Instant::now(),
            }
        }

        fn feed(&mut self, event: rdev::Event) -> Option<Disposition> {
            self.now += Duration::from_millis(100);
            let event = translate(&event)?;
            Some(self.controller.on_key_event_at(event, self.now))
        }
    }

    #[test]
    fn ctrl_alt_x_from_the_hook_toggles_the_engine() {
        let mut hook = HookDriver::new(&[]);
        assert!(hook.handle.is_enabled());

        hook.feed(press(RdevKey::ControlLeft, None));
        hook.feed(press(RdevKey::Alt, None));
        assert_eq!(
            hook.feed(press(RdevKey::KeyX, Some("\u{18}"))),
            Some(Disposition::ToggleEnabled)
        );
        assert!(!hook.handle.is_enabled());

        hook.feed(release(RdevKey::KeyX));
        assert_eq!(
            hook.feed(press(RdevKey::KeyX, None)),
            Some(Disposition::ToggleEnabled)
        );
        assert!(hook.handle.is_enabled());
    }

    #[test]
    fn ctrl_c_from_the_hook_clears_the_pending_keyword() {
        let mut hook = HookDriver::new(&[("cc", "copy")]);

        hook.feed(press(RdevKey::KeyC, Some("c")));
        assert_eq!(hook.handle.buffer_preview(), "c");

        hook.feed(press(RdevKey::ControlLeft, None));
        assert_eq!(
            hook.feed(press(RdevKey::KeyC, Some("\u{3}"))),
            Some(Disposition::ClearBuffer(ClearReason::ModifierCombo))
        );
        hook.feed(release(RdevKey::ControlLeft));
        assert_eq!(hook.handle.buffer_preview(), "");

        hook.feed(press(RdevKey::KeyC, Some("c")));
        hook.feed(press(RdevKey::Space, Some(" ")));
        assert!(hook.injector.taken().is_empty());
    }

    #[test]
    fn typed_keyword_from_the_hook_expands() {
        let mut hook = HookDriver::new(&[("cc", "ok")]);

        hook.feed(press(RdevKey::KeyC, Some("c")));
        hook.feed(release(RdevKey::KeyC));
        hook.feed(press(RdevKey::KeyC, Some("c")));
        hook.feed(press(RdevKey::Space, Some(" ")));

        assert_eq!(
            hook.injector.taken(),
            vec![
                Injected::Key(SyntheticKey::Backspace),
                Injected::Key(SyntheticKey::Backspace),
                Injected::Char('o'),
                Injected::Char('k'),
                Injected::Key(SyntheticKey::Space),
            ]
        );
    }
}
