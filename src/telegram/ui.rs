//! HTML escaping and inline keyboard helpers for Telegram messages.
//!
//! All output uses HTML parse mode (never MarkdownV2).

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::dispatch::Button;

/// Escape special HTML characters in user-provided text.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Convert dispatcher button rows into a Telegram inline keyboard.
pub fn keyboard(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    let rows = rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.data.clone()))
            .collect::<Vec<_>>()
    });
    InlineKeyboardMarkup::new(rows)
}
