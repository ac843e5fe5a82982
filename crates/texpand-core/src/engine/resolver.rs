use crate::engine::ports::SnippetLookup;
use crate::error::{Result, TexpandError};
use crate::normalize::{has_diacritics, normalize};
use log::{debug, warn};
use std::fmt;

/// Which lookup produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Exact,
    CaseFolded,
    AccentStripped,
    Search,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::CaseFolded => "case-folded",
            MatchStrategy::AccentStripped => "accent-stripped",
            MatchStrategy::Search => "search",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The keyword exactly as typed; this is what gets erased.
    pub typed: String,
    /// The store key that answered the lookup.
    pub matched_key: String,
    pub content: String,
    pub strategy: MatchStrategy,
}

impl Resolution {
    pub fn erase_count(&self) -> usize {
        self.typed.chars().count()
    }
}

/// Runs the ordered lookup strategy against the snippet store.
pub struct Resolver<L> {
    store: L,
    search_fallback: bool,
}

impl<L: SnippetLookup> Resolver<L> {
    pub fn new(store: L, search_fallback: bool) -> Self {
        Self {
            store,
            search_fallback,
        }
    }

    /// Find the replacement for `keyword`, first strategy to hit wins.
    ///
    /// Store failures count as misses; only an empty keyword is an error.
    pub fn resolve(&self, keyword: &str) -> Result<Option<Resolution>> {
        let typed = keyword.trim();
        if typed.is_empty() {
            return Err(TexpandError::InvalidKeyword(keyword.to_string()));
        }

        let lowered = typed.to_lowercase();
        let mut candidates = vec![(typed.to_string(), MatchStrategy::Exact)];
        if lowered != typed {
            candidates.push((lowered.clone(), MatchStrategy::CaseFolded));
        }
        if has_diacritics(&lowered) {
            candidates.push((normalize(&lowered), MatchStrategy::AccentStripped));
        }

        for (candidate, strategy) in candidates {
            if let Some(content) = self.lookup(&candidate) {
                debug!("Resolved '{}' via {} lookup", typed, strategy);
                return Ok(Some(Resolution {
                    typed: typed.to_string(),
                    matched_key: candidate,
                    content,
                    strategy,
                }));
            }
        }

        if self.search_fallback {
            return Ok(self.search(typed));
        }

        Ok(None)
    }

    fn lookup(&self, candidate: &str) -> Option<String> {
        match self.store.get(candidate, true) {
            Ok(found) => found,
            Err(e) => {
                warn!("Snippet lookup for '{}' failed: {}", candidate, e);
                None
            }
        }
    }

    fn search(&self, typed: &str) -> Option<Resolution> {
        let hits = match self.store.search(typed) {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Snippet search for '{}' failed: {}", typed, e);
                return None;
            }
        };

        let best = hits.into_iter().next()?;
        // Count the use against the winning record.
        let content = self.lookup(&best.keyword).unwrap_or(best.content);
        debug!("Resolved '{}' via search to '{}'", typed, best.keyword);

        Some(Resolution {
            typed: typed.to_string(),
            matched_key: best.keyword,
            content,
            strategy: MatchStrategy::Search,
        })
    }
}
