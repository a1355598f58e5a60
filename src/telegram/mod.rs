//! Telegram adapter: bot dispatcher, alert notifier, and UI helpers.
//!
//! Inbound messages and button callbacks are checked against the username
//! allow-list, parsed, and handed to the [`CommandDispatcher`]. Updates are
//! processed one at a time in arrival order.

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, info, warn};

use crate::dispatch::{Command, CommandDispatcher, Reply};

pub mod reporter;
pub mod ui;

pub use reporter::{parse_recipient, TelegramNotifier};

/// Fixed reply for senders outside the allow-list.
pub const UNAUTHORIZED_REPLY: &str = "Unauthorized access, please contact system admin";

// ---------------------------------------------------------------------------
// Shared state for handler injection
// ---------------------------------------------------------------------------

/// Shared dependencies injected into teloxide handlers via `dptree::deps!`.
#[derive(Clone)]
struct SharedState {
    dispatcher: Arc<CommandDispatcher>,
    allowed_users: Arc<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Run the Telegram bot until it is stopped (Ctrl+C).
///
/// # Errors
///
/// Currently infallible once started; the signature leaves room for
/// startup checks.
pub async fn run_telegram(
    bot: Bot,
    dispatcher: Arc<CommandDispatcher>,
    allowed_users: Vec<String>,
) -> anyhow::Result<()> {
    let shared = SharedState {
        dispatcher,
        allowed_users: Arc::new(allowed_users),
    };

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("telegram dispatcher starting");

    // A constant distribution key serializes every update.
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![shared])
        .distribution_function(|_| Some(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("telegram dispatcher stopped");
    Ok(())
}

/// Whether `username` is on the allow-list. Matching ignores case and a
/// leading `@` on either side; senders without a username are rejected.
pub fn is_authorized(allowed: &[String], username: Option<&str>) -> bool {
    let Some(username) = username else {
        return false;
    };
    let username = username.trim_start_matches('@');
    allowed
        .iter()
        .any(|entry| entry.trim_start_matches('@').eq_ignore_ascii_case(username))
}

// ---------------------------------------------------------------------------
// Message handler
// ---------------------------------------------------------------------------

async fn handle_message(bot: Bot, msg: Message, state: SharedState) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let username = msg.from.as_ref().and_then(|user| user.username.as_deref());

    if !is_authorized(&state.allowed_users, username) {
        warn!(chat_id = msg.chat.id.0, ?username, "message rejected: user not allowed");
        bot.send_message(msg.chat.id, UNAUTHORIZED_REPLY).await?;
        return Ok(());
    }

    let command = Command::parse(text);
    debug!(chat_id = msg.chat.id.0, ?username, ?command, "telegram request");

    let replies = state.dispatcher.handle_command(&command).await;
    send_replies(&bot, msg.chat.id, replies).await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Callback query handler
// ---------------------------------------------------------------------------

async fn handle_callback(bot: Bot, query: CallbackQuery, state: SharedState) -> ResponseResult<()> {
    bot.answer_callback_query(&query.id).await?;

    let Some(chat_id) = query.message.as_ref().map(|m| m.chat().id) else {
        return Ok(());
    };
    let username = query.from.username.as_deref();

    if !is_authorized(&state.allowed_users, username) {
        warn!(chat_id = chat_id.0, ?username, "callback rejected: user not allowed");
        bot.send_message(chat_id, UNAUTHORIZED_REPLY).await?;
        return Ok(());
    }

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    debug!(chat_id = chat_id.0, ?username, data, "telegram callback");

    let replies = state.dispatcher.handle_callback(data).await;
    send_replies(&bot, chat_id, replies).await;
    Ok(())
}

/// Send each reply in order. Failures are logged, never retried.
async fn send_replies(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) {
    for reply in replies {
        let mut req = bot
            .send_message(chat_id, reply.text)
            .parse_mode(ParseMode::Html);
        if !reply.keyboard.is_empty() {
            req = req.reply_markup(ui::keyboard(&reply.keyboard));
        }
        if let Err(e) = req.await {
            warn!(chat_id = chat_id.0, error = %e, "failed to send telegram message");
        }
    }
}
