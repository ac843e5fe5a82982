use crate::config::get_db_file_path;
use crate::engine::ports::SnippetLookup;
use crate::error::{Result, TexpandError};
use crate::models::{SearchHit, SnippetEntry, StoreStats};
use log::{debug, info, warn};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// JSON-file snippet store. Keywords are unique and compared
/// case-insensitively; every mutation is written through to disk.
#[derive(Debug)]
pub struct SnippetStore {
    path: PathBuf,
    entries: Mutex<Vec<SnippetEntry>>,
}

impl SnippetStore {
    /// Open the store at `path`. A missing or empty file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = load_entries(&path)?;
        debug!("Loaded {} snippets from {}", entries.len(), path.display());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Open the store in the configuration directory.
    pub fn open_default() -> Result<Self> {
        Self::open(get_db_file_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the backing file, picking up edits made by other processes.
    pub fn reload(&self) -> Result<usize> {
        let fresh = load_entries(&self.path)?;
        let count = fresh.len();
        *self.lock() = fresh;
        debug!("Reloaded {} snippets from {}", count, self.path.display());
        Ok(count)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SnippetEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock and bring the entries up to date with the file, so a write does
    /// not drop snippets another process saved since the last read. If the
    /// file is gone or unreadable the in-memory entries are kept.
    fn lock_fresh(&self) -> MutexGuard<'_, Vec<SnippetEntry>> {
        let mut entries = self.lock();
        if !self.path.exists() {
            return entries;
        }
        match load_entries(&self.path) {
            Ok(fresh) => *entries = fresh,
            Err(e) => warn!(
                "Could not refresh snippets from {}: {}",
                self.path.display(),
                e
            ),
        }
        entries
    }

    fn save(&self, entries: &[SnippetEntry]) -> Result<()> {
        write_entries(&self.path, entries)
    }

    pub fn add(&self, keyword: &str, content: &str) -> Result<()> {
        let keyword = clean_keyword(keyword)?;
        let mut entries = self.lock_fresh();
        if entries.iter().any(|e| e.matches_keyword(&keyword)) {
            return Err(TexpandError::DuplicateKeyword(keyword));
        }

        entries.push(SnippetEntry::new(keyword.clone(), content.to_string()));
        self.save(&entries)?;
        info!("Added snippet '{}'", keyword);
        Ok(())
    }

    /// Content for `keyword`. With `record_usage` a hit bumps the usage
    /// counter and last-used stamp; failing to persist that only logs a
    /// warning.
    pub fn get(&self, keyword: &str, record_usage: bool) -> Result<Option<String>> {
        let keyword = keyword.trim();
        let mut entries = if record_usage { self.lock_fresh() } else { self.lock() };
        let Some(entry) = entries.iter_mut().find(|e| e.matches_keyword(keyword)) else {
            return Ok(None);
        };

        let content = entry.content.clone();
        if record_usage {
            entry.record_use();
            // The content is still good when the usage stamp cannot be saved.
            if let Err(e) = self.save(&entries) {
                warn!("Usage of '{}' not saved: {}", keyword, e);
            }
        }
        Ok(Some(content))
    }

    pub fn find(&self, keyword: &str) -> Option<SnippetEntry> {
        let keyword = keyword.trim();
        self.lock().iter().find(|e| e.matches_keyword(keyword)).cloned()
    }

    pub fn update(&self, keyword: &str, content: &str) -> Result<()> {
        let keyword = keyword.trim();
        let mut entries = self.lock_fresh();
        let entry = entries
            .iter_mut()
            .find(|e| e.matches_keyword(keyword))
            .ok_or_else(|| TexpandError::SnippetNotFound(keyword.to_string()))?;

        entry.update_content(content.to_string());
        self.save(&entries)?;
        info!("Updated snippet '{}'", keyword);
        Ok(())
    }

    pub fn delete(&self, keyword: &str) -> Result<()> {
        let keyword = keyword.trim();
        let mut entries = self.lock_fresh();
        let before = entries.len();
        entries.retain(|e| !e.matches_keyword(keyword));
        if entries.len() == before {
            return Err(TexpandError::SnippetNotFound(keyword.to_string()));
        }

        self.save(&entries)?;
        info!("Deleted snippet '{}'", keyword);
        Ok(())
    }

    /// All snippets, most used first, then by keyword.
    pub fn list(&self) -> Vec<SnippetEntry> {
        let mut entries = self.lock().clone();
        entries.sort_by_key(|e| (Reverse(e.usage_count), e.keyword.to_lowercase()));
        entries
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snippets whose keyword or content contains `text`, ranked: exact
    /// keyword, keyword prefix, keyword substring, content substring.
    /// Ties go to higher usage, then keyword order.
    pub fn search(&self, text: &str) -> Vec<SearchHit> {
        let query = text.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let entries = self.lock();
        let mut ranked: Vec<(u8, &SnippetEntry)> = entries
            .iter()
            .filter_map(|e| relevance(e, &query).map(|rank| (rank, e)))
            .collect();
        ranked.sort_by_key(|(rank, e)| (*rank, Reverse(e.usage_count), e.keyword.to_lowercase()));
        ranked.into_iter().map(|(_, e)| SearchHit::from(e)).collect()
    }

    pub fn most_used(&self, limit: usize) -> Vec<SnippetEntry> {
        self.list()
            .into_iter()
            .filter(|e| e.usage_count > 0)
            .take(limit)
            .collect()
    }

    pub fn recent(&self, limit: usize) -> Vec<SnippetEntry> {
        let mut used: Vec<SnippetEntry> = self
            .lock()
            .iter()
            .filter(|e| e.last_used_at().is_some())
            .cloned()
            .collect();
        used.sort_by_key(|e| Reverse(e.last_used_at()));
        used.truncate(limit);
        used
    }

    pub fn stats(&self) -> StoreStats {
        let entries = self.lock();
        // max_by_key keeps the last maximum; reverse so the first wins ties.
        let top = entries.iter().rev().max_by_key(|e| e.usage_count);
        StoreStats {
            total_snippets: entries.len(),
            total_usage: entries.iter().map(|e| e.usage_count).sum(),
            most_used_keyword: top.map(|e| e.keyword.clone()),
            most_used_count: top.map_or(0, |e| e.usage_count),
        }
    }

    /// Write a copy of the current store to `path`.
    pub fn backup(&self, path: &Path) -> Result<()> {
        let entries = self.lock();
        write_entries(path, &entries)?;
        info!("Backed up {} snippets to {}", entries.len(), path.display());
        Ok(())
    }

    /// Add every pair that is not already present. Returns (added, failed).
    pub fn import_map(&self, snippets: &BTreeMap<String, String>) -> Result<(usize, usize)> {
        let mut entries = self.lock_fresh();
        let mut added = 0;
        let mut failed = 0;

        for (keyword, content) in snippets {
            let keyword = match clean_keyword(keyword) {
                Ok(k) if !entries.iter().any(|e| e.matches_keyword(&k)) => k,
                _ => {
                    failed += 1;
                    continue;
                }
            };
            entries.push(SnippetEntry::new(keyword, content.clone()));
            added += 1;
        }

        if added > 0 {
            self.save(&entries)?;
        }
        Ok((added, failed))
    }

    pub fn export_map(&self) -> BTreeMap<String, String> {
        self.lock()
            .iter()
            .map(|e| (e.keyword.clone(), e.content.clone()))
            .collect()
    }
}

impl SnippetLookup for SnippetStore {
    fn get(&self, keyword: &str, record_usage: bool) -> Result<Option<String>> {
        SnippetStore::get(self, keyword, record_usage)
            .map_err(|e| TexpandError::Lookup(e.to_string()))
    }

    fn search(&self, text: &str) -> Result<Vec<SearchHit>> {
        Ok(SnippetStore::search(self, text))
    }
}

fn clean_keyword(keyword: &str) -> Result<String> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(TexpandError::InvalidKeyword(keyword.to_string()));
    }
    Ok(keyword.to_string())
}

fn relevance(entry: &SnippetEntry, query: &str) -> Option<u8> {
    let keyword = entry.keyword.to_lowercase();
    if keyword == query {
        Some(0)
    } else if keyword.starts_with(query) {
        Some(1)
    } else if keyword.contains(query) {
        Some(2)
    } else if entry.content.to_lowercase().contains(query) {
        Some(3)
    } else {
        None
    }
}

fn load_entries(path: &Path) -> Result<Vec<SnippetEntry>> {
    if !path.exists() {
        return Ok(vec![]);
    }

    let content = fs::read_to_string(path)?;

    // Handle empty database file
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    serde_json::from_str(&content).map_err(|e| e.into())
}

fn write_entries(path: &Path, entries: &[SnippetEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let serialized = serde_json::to_string_pretty(entries)?;
    fs::write(path, serialized)?;
    Ok(())
}
