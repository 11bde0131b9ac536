//! Feed entry types.

use serde::Serialize;

/// Maximum length (in characters) of an entry description.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

/// Number of newest entries re-checked by the full-window cycle.
pub const FULL_WINDOW: usize = 10;

/// Number of entries fetched for a test delivery.
pub const LATEST_WINDOW: usize = 1;

/// Title used when a feed item has none.
pub const DEFAULT_TITLE: &str = "no title";

/// One feed item, normalized for de-duplication and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// De-duplication key: the item's guid, or its link when the guid is missing.
    pub guid: String,
    /// Item title.
    pub title: String,
    /// Link to the original article.
    pub link: String,
    /// Publish date exactly as the feed states it.
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    /// Plain-text description, at most [`MAX_DESCRIPTION_LENGTH`] characters.
    pub description: String,
}

impl Entry {
    /// Create an entry with the given guid and title.
    pub fn new(guid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            title: title.into(),
            link: String::new(),
            pub_date: String::new(),
            description: String::new(),
        }
    }

    /// Set the link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Set the publish date.
    pub fn with_pub_date(mut self, pub_date: impl Into<String>) -> Self {
        self.pub_date = pub_date.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Item fields as extracted from the feed, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub pub_date: Option<String>,
    /// Description (or content body) as HTML.
    pub description: Option<String>,
}

impl RawEntry {
    /// Normalize into an [`Entry`].
    ///
    /// Returns `None` when the item has neither a guid nor a link, since such
    /// an item cannot be de-duplicated.
    pub fn normalize(self) -> Option<Entry> {
        let link = non_empty(self.link).unwrap_or_default();
        let guid = non_empty(self.guid).unwrap_or_else(|| link.clone());
        if guid.is_empty() {
            return None;
        }

        let description = self
            .description
            .map(|d| truncate_chars(&strip_html(&d), MAX_DESCRIPTION_LENGTH))
            .unwrap_or_default();

        Some(Entry {
            guid,
            title: non_empty(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            link,
            pub_date: non_empty(self.pub_date).unwrap_or_default(),
            description,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strip HTML tags, then decode the common entities.
///
/// Tags are removed before entities are decoded, so escaped markup such as
/// `&lt;b&gt;` survives as literal text.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    // A `<` only opens a tag when a `>` follows it
    while let Some(start) = rest.find('<') {
        match rest[start..].find('>') {
            Some(len) => {
                text.push_str(&rest[..start]);
                rest = &rest[start + len + 1..];
            }
            None => break,
        }
    }
    text.push_str(rest);

    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start + 1..];

        let decoded = candidate
            .find(';')
            .filter(|&end| end > 0 && end <= 8)
            .and_then(|end| decode_entity(&candidate[..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = candidate;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "nbsp" => Some(' '),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(|c: char| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(guid: Option<&str>, link: Option<&str>) -> RawEntry {
        RawEntry {
            guid: guid.map(String::from),
            link: link.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_defaults() {
        let entry = raw(Some("g1"), None).normalize().unwrap();
        assert_eq!(entry.guid, "g1");
        assert_eq!(entry.title, DEFAULT_TITLE);
        assert_eq!(entry.link, "");
        assert_eq!(entry.pub_date, "");
        assert_eq!(entry.description, "");
    }

    #[test]
    fn test_normalize_guid_falls_back_to_link() {
        let entry = raw(Some(""), Some("https://x/1")).normalize().unwrap();
        assert_eq!(entry.guid, "https://x/1");
        assert_eq!(entry.link, "https://x/1");

        let entry = raw(None, Some("https://x/1")).normalize().unwrap();
        assert_eq!(entry.guid, "https://x/1");
    }

    #[test]
    fn test_normalize_without_guid_or_link() {
        assert!(raw(None, None).normalize().is_none());
        assert!(raw(Some("  "), Some("")).normalize().is_none());
    }

    #[test]
    fn test_normalize_truncates_after_stripping() {
        let body = "a".repeat(250);
        let entry = RawEntry {
            guid: Some("g".to_string()),
            description: Some(format!("<p>{body}</p>")),
            ..Default::default()
        }
        .normalize()
        .unwrap();

        assert_eq!(entry.description.chars().count(), MAX_DESCRIPTION_LENGTH);
        assert!(!entry.description.contains('<'));
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html("<p>Hello</p>"), "Hello");
        assert_eq!(strip_html("<b>Bold</b> text"), "Bold text");
        assert_eq!(strip_html("<div><a href=\"x\">Nested</a></div>"), "Nested");
    }

    #[test]
    fn test_strip_html_entities() {
        assert_eq!(strip_html("A&nbsp;B"), "A B");
        assert_eq!(strip_html("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(strip_html("&lt;b&gt;kept&lt;/b&gt;"), "<b>kept</b>");
        assert_eq!(strip_html("&#65;&#x42;"), "AB");
    }

    #[test]
    fn test_strip_html_unknown_entity_kept() {
        assert_eq!(strip_html("fish &chips; co"), "fish &chips; co");
        assert_eq!(strip_html("a & b"), "a & b");
    }

    #[test]
    fn test_strip_html_unclosed_angle_bracket_kept() {
        assert_eq!(
            strip_html("Scores: 3 < 5 and the rest of the summary"),
            "Scores: 3 < 5 and the rest of the summary"
        );
        assert_eq!(strip_html("<p>Latency < 5ms</p>"), "Latency < 5ms");
        assert_eq!(strip_html("a > b"), "a > b");
    }

    #[test]
    fn test_strip_html_whitespace() {
        assert_eq!(strip_html("<p>\n\tNewlines\n\tand   tabs\n</p>"), "Newlines and tabs");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let text = "あ".repeat(300);
        let truncated = truncate_chars(&text, MAX_DESCRIPTION_LENGTH);
        assert_eq!(truncated.chars().count(), MAX_DESCRIPTION_LENGTH);

        assert_eq!(truncate_chars("short", MAX_DESCRIPTION_LENGTH), "short");
    }
}
