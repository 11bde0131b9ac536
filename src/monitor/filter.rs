//! Keyword allow-list.

use crate::feed::Entry;

/// Case-insensitive substring filter over an entry's title and description.
///
/// An empty filter lets every entry through.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    /// Build a filter from keywords; blank keywords are ignored.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Whether no keywords are configured.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Configured keywords, lowercased.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether the entry should be delivered.
    pub fn matches(&self, entry: &Entry) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let haystack = format!("{} {}", entry.title, entry.description).to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }
}
