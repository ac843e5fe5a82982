//! Plain-text rendering for CLI listings.

use texpand_core::{SearchHit, SnippetEntry, StoreStats};

const PREVIEW_CHARS: usize = 50;

/// Single-line preview: line breaks shown as `\n`, long text cut with `...`.
pub fn preview(content: &str) -> String {
    let flat = content.replace("\r\n", "\n").replace('\n', "\\n").replace('\t', "\\t");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(PREVIEW_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

pub fn format_entries(entries: &[SnippetEntry]) -> String {
    if entries.is_empty() {
        return "No snippets found.".to_string();
    }

    let width = entries
        .iter()
        .map(|e| e.keyword.chars().count())
        .max()
        .unwrap_or(0)
        .max("KEYWORD".len());

    let mut out = format!("{:<width$}  {:>5}  {:<16}  CONTENT\n", "KEYWORD", "USES", "LAST USED");
    for entry in entries {
        out.push_str(&format!(
            "{:<width$}  {:>5}  {:<16}  {}\n",
            entry.keyword,
            entry.usage_count,
            entry.formatted_last_used(),
            preview(&entry.content),
        ));
    }
    out
}

pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No matching snippets.".to_string();
    }
    hits.iter()
        .map(|hit| format!("{} ({} uses): {}", hit.keyword, hit.usage_count, preview(&hit.content)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_stats(stats: &StoreStats) -> String {
    let mut out = format!(
        "Snippets:    {}\nTotal uses:  {}",
        stats.total_snippets, stats.total_usage
    );
    if let Some(keyword) = &stats.most_used_keyword {
        out.push_str(&format!(
            "\nMost used:   {} ({} uses)",
            keyword, stats.most_used_count
        ));
    }
    out
}
