use log::debug;
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Why the pending keyword was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    ModifierCombo,
    InvalidChar,
    OtherSpecialKey,
    Timeout,
    Toggle,
    Flushed,
    Expanded,
}

impl fmt::Display for ClearReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ClearReason::ModifierCombo => "modifier combo",
            ClearReason::InvalidChar => "invalid char",
            ClearReason::OtherSpecialKey => "other special key",
            ClearReason::Timeout => "idle timeout",
            ClearReason::Toggle => "engine toggled",
            ClearReason::Flushed => "flushed",
            ClearReason::Expanded => "expansion finished",
        };
        f.write_str(reason)
    }
}

/// Characters that may appear in a keyword.
pub fn is_keyword_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Bounded accumulator for the word currently being typed.
///
/// The buffer itself is not synchronised; the engine keeps it behind the
/// same mutex as the modifier state.
#[derive(Debug)]
pub struct KeywordBuffer {
    chars: VecDeque<char>,
    capacity: usize,
    timeout: Duration,
    last_activity: Option<Instant>,
}

impl KeywordBuffer {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            chars: VecDeque::with_capacity(capacity),
            capacity,
            timeout,
            last_activity: None,
        }
    }

    /// Append `c`, evicting the oldest character when full. Characters
    /// outside the keyword alphabet are refused.
    pub fn append(&mut self, c: char, now: Instant) -> bool {
        if !is_keyword_char(c) {
            return false;
        }

        if self.chars.len() == self.capacity {
            self.chars.pop_front();
        }
        self.chars.push_back(c);
        self.last_activity = Some(now);
        true
    }

    /// Remove up to `count` trailing characters, returning how many went.
    pub fn remove_last(&mut self, count: usize, now: Instant) -> usize {
        let removed = count.min(self.chars.len());
        for _ in 0..removed {
            self.chars.pop_back();
        }
        if removed > 0 {
            self.last_activity = Some(now);
        }
        removed
    }

    pub fn clear(&mut self, reason: ClearReason) {
        if !self.chars.is_empty() {
            debug!("Clearing keyword buffer ({})", reason);
        }
        self.chars.clear();
        self.last_activity = None;
    }

    pub fn snapshot(&self) -> String {
        self.chars.iter().collect()
    }

    /// Clear the buffer if it has been idle for longer than the timeout.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        match self.last_activity {
            Some(last) if now.saturating_duration_since(last) > self.timeout => {
                self.clear(ClearReason::Timeout);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
