use crate::config::EngineConfig;
use crate::engine::buffer::ClearReason;
use crate::engine::classifier::{Disposition, EventClassifier};
use crate::engine::event::{KeyEvent, Trigger};
use crate::engine::executor::ReplacementExecutor;
use crate::engine::ports::{Injector, SnippetLookup};
use crate::engine::resolver::Resolver;
use crate::engine::state::{EngineHandle, EngineShared};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Receives every hook event and drives the buffer, resolver and executor.
///
/// Runs on the hook thread; the [`EngineHandle`] it was built from is the
/// only piece other threads touch.
pub struct EngineController<L, I> {
    shared: Arc<EngineShared>,
    classifier: EventClassifier,
    resolver: Resolver<L>,
    executor: ReplacementExecutor<I>,
}

impl<L: SnippetLookup, I: Injector> EngineController<L, I> {
    pub fn new(handle: &EngineHandle, config: &EngineConfig, store: L, injector: I) -> Self {
        let shared = Arc::clone(&handle.shared);
        Self {
            classifier: EventClassifier::new(config.debounce(), config.toggle_hotkey),
            resolver: Resolver::new(store, config.search_fallback),
            executor: ReplacementExecutor::new(
                injector,
                Arc::clone(&shared),
                config.key_delay(),
                config.pre_type_delay(),
                config.echo_window(),
            ),
            shared,
        }
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn on_key_event(&mut self, event: KeyEvent) -> Disposition {
        self.on_key_event_at(event, Instant::now())
    }

    /// Process one event as if it arrived at `now`.
    ///
    /// Events that echo a finished replacement are ignored before anything
    /// else looks at them.
    pub fn on_key_event_at(&mut self, event: KeyEvent, now: Instant) -> Disposition {
        let mut state = self.shared.lock_state();
        if state.echo.consume(&event, now) {
            return Disposition::Ignore;
        }
        let flags = self.shared.flags();

        if flags.enabled && !flags.expanding && state.buffer.check_timeout(now) {
            debug!("Pending keyword dropped after idle timeout");
        }

        let disposition = self.classifier.classify(&mut state, flags, &event, now);
        let mut flushed = None;

        match disposition {
            Disposition::Ignore | Disposition::ToggleEnabled => {}
            Disposition::AppendChar(c) => {
                state.buffer.append(c, now);
            }
            Disposition::RemoveLast(count) => {
                state.buffer.remove_last(count, now);
            }
            Disposition::ClearBuffer(reason) => state.buffer.clear(reason),
            Disposition::Flush(trigger) => {
                let keyword = state.buffer.snapshot();
                state.buffer.clear(ClearReason::Flushed);
                flushed = Some((keyword, trigger));
            }
        }
        drop(state);

        if disposition == Disposition::ToggleEnabled {
            self.handle().toggle_enabled();
        }
        if let Some((keyword, trigger)) = flushed {
            self.flush(&keyword, trigger, now);
        }

        disposition
    }

    fn flush(&mut self, keyword: &str, trigger: Trigger, now: Instant) {
        if keyword.is_empty() {
            return;
        }

        let resolution = match self.resolver.resolve(keyword) {
            Ok(Some(resolution)) => resolution,
            Ok(None) => {
                debug!("No snippet for '{}'", keyword);
                return;
            }
            Err(e) => {
                warn!("Flush of '{}' skipped: {}", keyword, e);
                return;
            }
        };

        info!(
            "Expanding '{}' via {} match on '{}' ({} chars, trigger {})",
            resolution.typed,
            resolution.strategy,
            resolution.matched_key,
            resolution.content.chars().count(),
            trigger
        );

        // Failures are logged by the executor and never reach the hook.
        let _ = self
            .executor
            .execute(&resolution.typed, &resolution.content, trigger, now);
    }
}
