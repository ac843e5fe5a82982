//! Seams between the engine and the outside world.

use crate::engine::event::{KeyEvent, SpecialKey};
use crate::error::Result;
use crate::models::SearchHit;
use std::sync::Arc;

/// Keyword to replacement lookups against the snippet store.
pub trait SnippetLookup {
    /// Return the content for `keyword`. When `record_usage` is set a hit
    /// counts as a use of the snippet.
    fn get(&self, keyword: &str, record_usage: bool) -> Result<Option<String>>;

    /// Ranked candidates whose keyword or content contains `text`.
    fn search(&self, text: &str) -> Result<Vec<SearchHit>>;
}

impl<T: SnippetLookup + ?Sized> SnippetLookup for Arc<T> {
    fn get(&self, keyword: &str, record_usage: bool) -> Result<Option<String>> {
        (**self).get(keyword, record_usage)
    }

    fn search(&self, text: &str) -> Result<Vec<SearchHit>> {
        (**self).search(text)
    }
}

impl<T: SnippetLookup + ?Sized> SnippetLookup for &T {
    fn get(&self, keyword: &str, record_usage: bool) -> Result<Option<String>> {
        (**self).get(keyword, record_usage)
    }

    fn search(&self, text: &str) -> Result<Vec<SearchHit>> {
        (**self).search(text)
    }
}

/// Keys the executor can press on the user's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticKey {
    Backspace,
    Enter,
    Tab,
    Space,
}

impl SyntheticKey {
    /// The event the hook reports when this key comes back to it.
    pub fn echo(self) -> KeyEvent {
        let key = match self {
            SyntheticKey::Backspace => SpecialKey::Backspace,
            SyntheticKey::Enter => SpecialKey::Enter,
            SyntheticKey::Tab => SpecialKey::Tab,
            SyntheticKey::Space => SpecialKey::Space,
        };
        KeyEvent::Special(key)
    }
}

/// Synthetic input sink. Injected events re-enter the key event source.
pub trait Injector {
    fn press_and_release(&mut self, key: SyntheticKey) -> Result<()>;

    fn type_char(&mut self, c: char) -> Result<()>;
}

impl<T: Injector + ?Sized> Injector for Box<T> {
    fn press_and_release(&mut self, key: SyntheticKey) -> Result<()> {
        (**self).press_and_release(key)
    }

    fn type_char(&mut self, c: char) -> Result<()> {
        (**self).type_char(c)
    }
}
