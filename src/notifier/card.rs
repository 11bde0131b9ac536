//! Interactive card rendering.

use serde_json::{json, Value};

use crate::feed::types::{truncate_chars, Entry, MAX_DESCRIPTION_LENGTH};

/// Card header text.
pub const CARD_HEADER: &str = "📢 RSS Update";

/// Body text used when an entry has no description.
pub const NO_DESCRIPTION: &str = "no description";

/// Label of the button linking to the original item.
pub const VIEW_BUTTON: &str = "View original";

/// Render an entry as an interactive card message.
///
/// Layout: header, bold title, publish time, description (at most
/// [`MAX_DESCRIPTION_LENGTH`] characters), and a button linking to the item.
pub fn build_card(entry: &Entry) -> Value {
    let description = if entry.description.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        truncate_chars(&entry.description, MAX_DESCRIPTION_LENGTH)
    };

    json!({
        "msg_type": "interactive",
        "card": {
            "header": {
                "title": { "tag": "plain_text", "content": CARD_HEADER },
                "template": "blue"
            },
            "elements": [
                {
                    "tag": "div",
                    "text": { "tag": "lark_md", "content": format!("**{}**", entry.title) }
                },
                {
                    "tag": "div",
                    "text": { "tag": "lark_md", "content": format!("🕒 Published: {}", entry.pub_date) }
                },
                {
                    "tag": "div",
                    "text": { "tag": "lark_md", "content": description }
                },
                {
                    "tag": "action",
                    "actions": [
                        {
                            "tag": "button",
                            "text": { "tag": "plain_text", "content": VIEW_BUTTON },
                            "type": "primary",
                            "url": entry.link
                        }
                    ]
                }
            ]
        }
    })
}
