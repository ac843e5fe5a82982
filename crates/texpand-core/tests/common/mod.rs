#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use texpand_core::engine::{Injector, KeyEvent, SnippetLookup, SpecialKey, SyntheticKey};
use texpand_core::{EngineConfig, EngineController, EngineHandle, Result, SearchHit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injected {
    Key(SyntheticKey),
    Char(char),
}

#[derive(Clone, Default)]
pub struct Recorder {
    pub events: Arc<Mutex<Vec<Injected>>>,
}

impl Recorder {
    pub fn taken(&self) -> Vec<Injected> {
        self.events.lock().unwrap().clone()
    }

    pub fn backspaces(&self) -> usize {
        self.taken()
            .iter()
            .filter(|e| **e == Injected::Key(SyntheticKey::Backspace))
            .count()
    }

    pub fn typed_text(&self) -> String {
        self.taken()
            .iter()
            .filter_map(|e| match e {
                Injected::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }
}

impl Injected {
    /// The event a hook reports when this injection comes back to it.
    pub fn as_hook_event(&self) -> KeyEvent {
        match *self {
            Injected::Key(key) => key.echo(),
            Injected::Char(c) => KeyEvent::Character(c),
        }
    }
}

impl Injector for Recorder {
    fn press_and_release(&mut self, key: SyntheticKey) -> Result<()> {
        self.events.lock().unwrap().push(Injected::Key(key));
        Ok(())
    }

    fn type_char(&mut self, c: char) -> Result<()> {
        self.events.lock().unwrap().push(Injected::Char(c));
        Ok(())
    }
}

/// Case-sensitive map that counts get/search calls.
#[derive(Default)]
pub struct MapLookup {
    entries: HashMap<String, String>,
    pub calls: Mutex<usize>,
}

impl MapLookup {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl SnippetLookup for MapLookup {
    fn get(&self, keyword: &str, _record_usage: bool) -> Result<Option<String>> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.entries.get(keyword).cloned())
    }

    fn search(&self, _text: &str) -> Result<Vec<SearchHit>> {
        *self.calls.lock().unwrap() += 1;
        Ok(Vec::new())
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        key_delay_ms: 0,
        pre_type_delay_ms: 0,
        ..EngineConfig::default()
    }
}

/// Drives a controller with a synthetic clock, 100ms between keystrokes
/// unless told otherwise.
pub struct Harness<L: SnippetLookup> {
    pub controller: EngineController<L, Recorder>,
    pub handle: EngineHandle,
    pub recorder: Recorder,
    pub now: Instant,
}

impl<L: SnippetLookup> Harness<L> {
    pub fn new(store: L) -> Self {
        Self::with_config(store, test_config())
    }

    pub fn with_config(store: L, config: EngineConfig) -> Self {
        let handle = EngineHandle::new(&config);
        let recorder = Recorder::default();
        let controller = EngineController::new(&handle, &config, store, recorder.clone());
        Self {
            controller,
            handle,
            recorder,
            now: Instant::now(),
        }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    pub fn send(&mut self, event: KeyEvent) {
        self.advance(Duration::from_millis(100));
        self.controller.on_key_event_at(event, self.now);
    }

    pub fn type_str(&mut self, text: &str) {
        for c in text.chars() {
            self.send(KeyEvent::Character(c));
        }
    }

    pub fn press(&mut self, key: SpecialKey) {
        self.send(KeyEvent::Special(key));
    }

    /// Hand every injected event back to the controller, `step` apart.
    pub fn replay_injected(&mut self, step: Duration) {
        for event in self.recorder.taken() {
            self.advance(step);
            self.controller.on_key_event_at(event.as_hook_event(), self.now);
        }
    }

    pub fn buffer(&self) -> String {
        self.handle.buffer_preview()
    }
}
