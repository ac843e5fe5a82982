//! In-memory port doubles for unit tests.

use crate::engine::ports::{Injector, SnippetLookup, SyntheticKey};
use crate::error::{Result, TexpandError};
use crate::models::SearchHit;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Case-sensitive keyword map that remembers every query.
#[derive(Default)]
pub struct MemoryLookup {
    entries: HashMap<String, String>,
    usage: Mutex<HashMap<String, u64>>,
    gets: Mutex<Vec<String>>,
    searches: Mutex<Vec<String>>,
    failing: bool,
}

impl MemoryLookup {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn usage_of(&self, keyword: &str) -> u64 {
        self.usage.lock().unwrap().get(keyword).copied().unwrap_or(0)
    }
}

impl SnippetLookup for MemoryLookup {
    fn get(&self, keyword: &str, record_usage: bool) -> Result<Option<String>> {
        self.gets.lock().unwrap().push(keyword.to_string());
        if self.failing {
            return Err(TexpandError::Lookup("store offline".to_string()));
        }

        let found = self.entries.get(keyword).cloned();
        if found.is_some() && record_usage {
            *self.usage.lock().unwrap().entry(keyword.to_string()).or_default() += 1;
        }
        Ok(found)
    }

    fn search(&self, text: &str) -> Result<Vec<SearchHit>> {
        self.searches.lock().unwrap().push(text.to_string());
        if self.failing {
            return Err(TexpandError::Lookup("store offline".to_string()));
        }

        let query = text.to_lowercase();
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .filter(|(k, v)| k.to_lowercase().contains(&query) || v.to_lowercase().contains(&query))
            .map(|(k, v)| SearchHit {
                keyword: k.clone(),
                content: v.clone(),
                usage_count: 0,
            })
            .collect();
        hits.sort_by(|a, b| a.keyword.cmp(&b.keyword));
        Ok(hits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injected {
    Key(SyntheticKey),
    Char(char),
}

/// Records injected events; optionally fails once `fail_after` events went out.
#[derive(Clone, Default)]
pub struct RecordingInjector {
    pub events: Arc<Mutex<Vec<Injected>>>,
    fail_after: Option<usize>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Default::default()
        }
    }

    pub fn taken(&self) -> Vec<Injected> {
        self.events.lock().unwrap().clone()
    }

    fn push(&mut self, event: Injected) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        if self.fail_after.is_some_and(|limit| events.len() >= limit) {
            return Err(TexpandError::Injection("sink refused event".to_string()));
        }
        events.push(event);
        Ok(())
    }
}

impl Injector for RecordingInjector {
    fn press_and_release(&mut self, key: SyntheticKey) -> Result<()> {
        self.push(Injected::Key(key))
    }

    fn type_char(&mut self, c: char) -> Result<()> {
        self.push(Injected::Char(c))
    }
}
