use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SnippetEntry {
    pub keyword: String,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub last_used: Option<String>,
}

impl SnippetEntry {
    pub fn new(keyword: String, content: String) -> Self {
        Self {
            keyword,
            content,
            created_at: Local::now().to_rfc3339(),
            usage_count: 0,
            last_used: None,
        }
    }

    pub fn update_content(&mut self, content: String) {
        self.content = content;
    }

    pub fn record_use(&mut self) {
        self.usage_count += 1;
        self.last_used = Some(Local::now().to_rfc3339());
    }

    /// Case-insensitive keyword comparison, the way the store indexes entries.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.keyword.to_lowercase() == keyword.to_lowercase()
    }

    pub fn last_used_at(&self) -> Option<DateTime<Local>> {
        self.last_used
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Local))
    }

    pub fn formatted_last_used(&self) -> String {
        let Some(used) = self.last_used_at() else {
            return "never".to_string();
        };

        let duration = Local::now().signed_duration_since(used);

        if duration.num_seconds() < 60 {
            format!("{}s ago", duration.num_seconds())
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            format!("{}d ago", duration.num_days())
        }
    }
}

/// One ranked result of a store search.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub keyword: String,
    pub content: String,
    pub usage_count: u64,
}

impl From<&SnippetEntry> for SearchHit {
    fn from(entry: &SnippetEntry) -> Self {
        Self {
            keyword: entry.keyword.clone(),
            content: entry.content.clone(),
            usage_count: entry.usage_count,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub total_snippets: usize,
    pub total_usage: u64,
    pub most_used_keyword: Option<String>,
    pub most_used_count: u64,
}
