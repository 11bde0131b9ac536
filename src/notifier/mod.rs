//! Chat webhook notifier for rss-notify.

pub mod card;
pub mod webhook;

pub use card::{build_card, CARD_HEADER, NO_DESCRIPTION, VIEW_BUTTON};
pub use webhook::{Notifier, WebhookNotifier, WebhookResponse};
