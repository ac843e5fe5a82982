use crate::engine::buffer::ClearReason;
use crate::engine::event::{KeyEvent, Trigger};
use crate::engine::ports::{Injector, SyntheticKey};
use crate::engine::state::EngineShared;
use crate::error::{Result, TexpandError};
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Holds the reentrancy flag for the lifetime of one replacement.
struct ExpansionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ExpansionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ExpansionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// What happened to one replacement request.
#[derive(Debug)]
pub enum Outcome {
    Completed { erased: usize, typed: usize },
    /// Another replacement was still in flight.
    Rejected,
    /// Injection stopped part way; the text on screen may be garbled.
    Failed {
        erased: usize,
        typed: usize,
        error: TexpandError,
    },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }
}

#[derive(Default)]
struct Progress {
    erased: usize,
    typed: usize,
    /// Every event injected so far, as the hook will report it.
    injected: Vec<KeyEvent>,
}

/// Erases the typed keyword and types the replacement through the injector.
pub struct ReplacementExecutor<I> {
    injector: I,
    shared: Arc<EngineShared>,
    key_delay: Duration,
    pre_type_delay: Duration,
    echo_window: Duration,
}

impl<I: Injector> ReplacementExecutor<I> {
    pub(crate) fn new(
        injector: I,
        shared: Arc<EngineShared>,
        key_delay: Duration,
        pre_type_delay: Duration,
        echo_window: Duration,
    ) -> Self {
        Self {
            injector,
            shared,
            key_delay,
            pre_type_delay,
            echo_window,
        }
    }

    /// Replace `typed` with `content` for a trigger seen at `now`. Never
    /// fails outward: problems are logged and reported through the returned
    /// [`Outcome`].
    ///
    /// The injected events are registered as expected echoes, so the hook
    /// handing them back afterwards does not feed the buffer again.
    pub fn execute(&mut self, typed: &str, content: &str, trigger: Trigger, now: Instant) -> Outcome {
        let shared = Arc::clone(&self.shared);
        let Some(_guard) = ExpansionGuard::acquire(&shared.expanding) else {
            warn!("Replacement for '{}' skipped: another one is in progress", typed);
            return Outcome::Rejected;
        };

        let started = Instant::now();
        let mut progress = Progress::default();
        let result = self.run(typed, content, trigger, &mut progress);

        let deadline = now + started.elapsed() + self.echo_window;
        let mut state = shared.lock_state();
        state.buffer.clear(ClearReason::Expanded);
        state.echo.expect(std::mem::take(&mut progress.injected), deadline);
        drop(state);

        match result {
            Ok(()) => {
                info!(
                    "Expanded '{}' ({} chars erased, {} typed)",
                    typed, progress.erased, progress.typed
                );
                Outcome::Completed {
                    erased: progress.erased,
                    typed: progress.typed,
                }
            }
            Err(e) => {
                error!(
                    "Partial replacement of '{}': erased {}/{}, typed {}: {}",
                    typed,
                    progress.erased,
                    typed.chars().count(),
                    progress.typed,
                    e
                );
                Outcome::Failed {
                    erased: progress.erased,
                    typed: progress.typed,
                    error: e,
                }
            }
        }
    }

    fn run(
        &mut self,
        typed: &str,
        content: &str,
        trigger: Trigger,
        progress: &mut Progress,
    ) -> Result<()> {
        for _ in typed.chars() {
            self.press(SyntheticKey::Backspace, progress)?;
            progress.erased += 1;
            pause(self.key_delay);
        }

        pause(self.pre_type_delay);

        let mut chars = content.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                // CRLF becomes a single Enter
                '\r' if chars.peek() == Some(&'\n') => continue,
                '\r' | '\n' => self.press(SyntheticKey::Enter, progress)?,
                '\t' => self.press(SyntheticKey::Tab, progress)?,
                other => {
                    self.injector.type_char(other)?;
                    progress.injected.push(KeyEvent::Character(other));
                }
            }
            progress.typed += 1;
            pause(self.key_delay);
        }

        if trigger == Trigger::Space {
            self.press(SyntheticKey::Space, progress)?;
            progress.typed += 1;
        }

        Ok(())
    }

    fn press(&mut self, key: SyntheticKey, progress: &mut Progress) -> Result<()> {
        self.injector.press_and_release(key)?;
        progress.injected.push(key.echo());
        Ok(())
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::event::SpecialKey;
    use crate::engine::mock::{Injected, RecordingInjector};
    use crate::engine::state::EngineHandle;

    fn executor(injector: RecordingInjector) -> (ReplacementExecutor<RecordingInjector>, EngineHandle) {
        let handle = EngineHandle::new(&EngineConfig::default());
        let exec = ReplacementExecutor::new(
            injector,
            Arc::clone(&handle.shared),
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_millis(500),
        );
        (exec, handle)
    }

    #[test]
    fn erases_then_types_then_restores_space() {
        let injector = RecordingInjector::new();
        let (mut exec, handle) = executor(injector.clone());

        let outcome = exec.execute("cc", "hi", Trigger::Space, Instant::now());
        assert!(outcome.is_completed());
        assert_eq!(
            injector.taken(),
            vec![
                Injected::Key(SyntheticKey::Backspace),
                Injected::Key(SyntheticKey::Backspace),
                Injected::Char('h'),
                Injected::Char('i'),
                Injected::Key(SyntheticKey::Space),
            ]
        );
        assert!(!handle.is_expanding());
    }

    #[test]
    fn translates_newlines_and_tabs() {
        let injector = RecordingInjector::new();
        let (mut exec, _handle) = executor(injector.clone());

        exec.execute("k", "a\nb\tc\r\nd", Trigger::Enter, Instant::now());
        assert_eq!(
            injector.taken(),
            vec![
                Injected::Key(SyntheticKey::Backspace),
                Injected::Char('a'),
                Injected::Key(SyntheticKey::Enter),
                Injected::Char('b'),
                Injected::Key(SyntheticKey::Tab),
                Injected::Char('c'),
                Injected::Key(SyntheticKey::Enter),
                Injected::Char('d'),
            ]
        );
    }

    #[test]
    fn tab_and_enter_triggers_are_not_replayed() {
        for trigger in [Trigger::Tab, Trigger::Enter] {
            let injector = RecordingInjector::new();
            let (mut exec, _handle) = executor(injector.clone());
            exec.execute("k", "v", trigger, Instant::now());
            assert_eq!(
                injector.taken(),
                vec![Injected::Key(SyntheticKey::Backspace), Injected::Char('v')]
            );
        }
    }

    #[test]
    fn erase_count_follows_characters_not_bytes() {
        let injector = RecordingInjector::new();
        let (mut exec, _handle) = executor(injector.clone());

        exec.execute("Cảm", "x", Trigger::Tab, Instant::now());
        let backspaces = injector
            .taken()
            .into_iter()
            .filter(|e| *e == Injected::Key(SyntheticKey::Backspace))
            .count();
        assert_eq!(backspaces, 3);
    }

    #[test]
    fn overlapping_replacement_is_rejected() {
        let injector = RecordingInjector::new();
        let (mut exec, handle) = executor(injector.clone());

        handle.shared.expanding.store(true, Ordering::SeqCst);
        let outcome = exec.execute("cc", "hi", Trigger::Space, Instant::now());
        assert!(matches!(outcome, Outcome::Rejected));
        assert!(injector.taken().is_empty());
        // The rejected call must not release someone else's guard.
        assert!(handle.is_expanding());
    }

    #[test]
    fn failure_releases_guard_and_clears_buffer() {
        let injector = RecordingInjector::failing_after(3);
        let (mut exec, handle) = executor(injector.clone());
        handle
            .shared
            .lock_state()
            .buffer
            .append('z', Instant::now());

        let outcome = exec.execute("cc", "hello", Trigger::Space, Instant::now());
        match outcome {
            Outcome::Failed { erased, typed, error } => {
                assert_eq!(erased, 2);
                assert_eq!(typed, 1);
                assert!(matches!(error, TexpandError::Injection(_)));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!handle.is_expanding());
        assert_eq!(handle.buffer_preview(), "");
        // Only what actually went out can come back.
        assert_eq!(handle.shared.lock_state().echo.pending(), 3);
    }

    #[test]
    fn injected_events_are_expected_back_in_order() {
        let (mut exec, handle) = executor(RecordingInjector::new());
        let now = Instant::now();

        exec.execute("cc", "hi", Trigger::Space, now);

        let mut state = handle.shared.lock_state();
        assert_eq!(state.echo.pending(), 5);
        for event in [
            KeyEvent::Special(SpecialKey::Backspace),
            KeyEvent::Special(SpecialKey::Backspace),
            KeyEvent::Character('h'),
            KeyEvent::Character('i'),
            KeyEvent::Special(SpecialKey::Space),
        ] {
            assert!(state.echo.consume(&event, now + Duration::from_millis(100)));
        }
        assert_eq!(state.echo.pending(), 0);
    }
}
