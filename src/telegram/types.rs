//! Handler types, dependencies, and shared message helpers

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, InlineKeyboardMarkup, MessageId, ParseMode};

use crate::storage::db::DbPool;
use crate::telegram::admin::AdminFlow;
use crate::telegram::checkout::CheckoutFlow;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub checkout: Arc<CheckoutFlow>,
    pub admin_forms: Arc<AdminFlow>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<DbPool>, checkout: Arc<CheckoutFlow>, admin_forms: Arc<AdminFlow>) -> Self {
        Self {
            db_pool,
            checkout,
            admin_forms,
        }
    }
}

/// Edits the message in place, falling back to a fresh message when the
/// original can no longer be edited (deleted, media caption, too old).
pub async fn safe_edit(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> ResponseResult<()> {
    let mut edit = bot.edit_message_text(chat_id, message_id, text).parse_mode(ParseMode::Html);
    if let Some(kb) = markup.clone() {
        edit = edit.reply_markup(kb);
    }
    if edit.await.is_ok() {
        return Ok(());
    }

    let mut send = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
    if let Some(kb) = markup {
        send = send.reply_markup(kb);
    }
    send.await?;
    Ok(())
}

/// Sends a plain message with HTML parse mode and an optional keyboard.
pub async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> ResponseResult<()> {
    let mut send = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
    if let Some(kb) = markup {
        send = send.reply_markup(kb);
    }
    send.await?;
    Ok(())
}

/// Shows a transient popup alert on a callback query.
pub async fn answer_alert(bot: &Bot, callback_id: &CallbackQueryId, text: &str) {
    if let Err(e) = bot
        .answer_callback_query(callback_id.clone())
        .text(text)
        .show_alert(true)
        .await
    {
        log::warn!("Failed to answer callback query: {}", e);
    }
}

/// Acknowledges a callback query, ignoring stale-query errors.
pub async fn answer_silent(bot: &Bot, callback_id: &CallbackQueryId) {
    let _ = bot.answer_callback_query(callback_id.clone()).await;
}
