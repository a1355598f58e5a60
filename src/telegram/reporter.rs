//! Telegram delivery of alert events to the notification chat.
//!
//! Uses teloxide Bot directly (send-only, no dispatcher). Per-GPU warnings
//! can be throttled with a cooldown; transition alerts (offline, online,
//! GPU lost) are always sent.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{ParseMode, Recipient};
use tracing::debug;

use crate::engine::AlertEvent;
use crate::notify::NotificationSink;
use crate::telegram::ui::escape_html;

/// Parse a notification destination: a numeric chat id or a channel username.
pub fn parse_recipient(chat: &str) -> Recipient {
    let chat = chat.trim();
    if let Ok(id) = chat.parse::<i64>() {
        return Recipient::Id(ChatId(id));
    }
    if chat.starts_with('@') {
        Recipient::ChannelUsername(chat.to_owned())
    } else {
        Recipient::ChannelUsername(format!("@{chat}"))
    }
}

/// [`NotificationSink`] that posts alerts to a Telegram chat or channel.
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
    cooldowns: Mutex<HashMap<String, DateTime<Utc>>>,
    cooldown_mins: u64,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("recipient", &self.recipient)
            .field("cooldown_mins", &self.cooldown_mins)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// Create a notifier. A `cooldown_mins` of zero disables throttling.
    pub fn new(bot: Bot, recipient: Recipient, cooldown_mins: u64) -> Self {
        Self {
            bot,
            recipient,
            cooldowns: Mutex::new(HashMap::new()),
            cooldown_mins,
        }
    }

    /// Decide whether `alert` goes out at `now`, recording it if so.
    pub fn admit(&self, alert: &AlertEvent, now: DateTime<Utc>) -> bool {
        if self.cooldown_mins == 0 || alert.kind.is_transition() {
            return true;
        }

        let key = alert.cooldown_key();
        let mut cooldowns = self.cooldowns.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(last_sent) = cooldowns.get(&key) {
            // Out-of-range cooldowns hold repeats indefinitely.
            let cooldown = i64::try_from(self.cooldown_mins)
                .ok()
                .and_then(chrono::Duration::try_minutes)
                .unwrap_or(chrono::Duration::MAX);
            if now.signed_duration_since(*last_sent) < cooldown {
                return false;
            }
        }
        cooldowns.insert(key, now);
        true
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn notify(&self, alert: &AlertEvent) -> anyhow::Result<()> {
        if !self.admit(alert, Utc::now()) {
            debug!(key = %alert.cooldown_key(), "alert in cooldown, skipping");
            return Ok(());
        }

        self.bot
            .send_message(self.recipient.clone(), escape_html(&alert.message))
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}
