use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summaries longer than this many characters are cut and suffixed with [`ELLIPSIS`].
pub const SUMMARY_LIMIT: usize = 200;
pub const ELLIPSIS: &str = "...";

/// One news item captured from a listing page.
///
/// `link` is the idempotency key: storage keeps the first article seen for a
/// given link and ignores later ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub headline: String,
    pub summary: String,
    pub image_url: String,
    pub link: String,
    pub source: String,
    /// Capture time. Listing pages do not expose a reliable publish date.
    pub captured_at: DateTime<Utc>,
}

/// Cuts `text` to [`SUMMARY_LIMIT`] characters and appends [`ELLIPSIS`] when it was longer.
pub fn truncate_summary(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_LIMIT) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_summary_untouched() {
        assert_eq!(truncate_summary("Obra vial en el Urubó"), "Obra vial en el Urubó");
        assert_eq!(truncate_summary(""), "");
    }

    #[test]
    fn test_exact_limit_untouched() {
        let text = "a".repeat(SUMMARY_LIMIT);
        assert_eq!(truncate_summary(&text), text);
    }

    #[test]
    fn test_long_summary_truncated() {
        let text = "ñ".repeat(SUMMARY_LIMIT + 50);
        let summary = truncate_summary(&text);
        assert_eq!(summary.chars().count(), SUMMARY_LIMIT + ELLIPSIS.len());
        assert!(summary.ends_with(ELLIPSIS));
        let prefix: String = text.chars().take(SUMMARY_LIMIT).collect();
        assert!(summary.starts_with(&prefix));
    }
}
