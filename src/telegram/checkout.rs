//! Checkout conversation state machine
//!
//! One explicit automaton per user: `AwaitingPhone → AwaitingConfirmation →
//! (finalized | cancelled)`. Idle is the absence of an entry; terminal
//! states are never stored — the slot is removed right after finalize or
//! cancel, and `start` wipes any stale slot before arming a new one.

use std::sync::Arc;

use dashmap::DashMap;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, MessageId};

use crate::core::config;
use crate::core::error::AppError;
use crate::storage::db::{set_user_phone, upsert_user};
use crate::storage::orders::finalize_order;
use crate::storage::get_connection;
use crate::telegram::keyboards;
use crate::telegram::notifications::{notification_recipients, notify_new_order};
use crate::telegram::types::{answer_silent, safe_edit, send_html, HandlerDeps};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutState {
    AwaitingPhone,
    AwaitingConfirmation { phone: String },
}

/// Per-user checkout slot. At most one state machine is active per user;
/// whoever starts a new flow overwrites the previous slot wholesale.
pub struct CheckoutFlow {
    states: DashMap<i64, CheckoutState>,
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self { states: DashMap::new() }
    }

    /// Arms a fresh flow: any stale state is dropped first.
    pub fn start(&self, user_id: i64) {
        self.clear(user_id);
        self.states.insert(user_id, CheckoutState::AwaitingPhone);
    }

    pub fn get(&self, user_id: i64) -> Option<CheckoutState> {
        self.states.get(&user_id).map(|entry| entry.value().clone())
    }

    pub fn set(&self, user_id: i64, state: CheckoutState) {
        self.states.insert(user_id, state);
    }

    pub fn clear(&self, user_id: i64) {
        self.states.remove(&user_id);
    }

    pub fn is_active(&self, user_id: i64) -> bool {
        self.states.contains_key(&user_id)
    }
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

const AFFIRMATIVE: &[&str] = &["да", "yes", "y", "ok"];

/// Case-insensitive match against the affirmative token set; anything else
/// cancels the checkout.
pub fn is_affirmative(text: &str) -> bool {
    AFFIRMATIVE.contains(&text.trim().to_lowercase().as_str())
}

/// Entry point: the "✅ Оформить" button.
pub async fn start_checkout(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    deps.checkout.start(chat_id.0);
    safe_edit(bot, chat_id, message_id, "Введите телефон", None).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Handles a message while the user's checkout automaton is armed.
pub async fn handle_checkout_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let user_id = msg.chat.id.0;
    let Some(state) = deps.checkout.get(user_id) else {
        return Ok(());
    };

    match state {
        CheckoutState::AwaitingPhone => handle_phone(bot, msg, deps).await,
        CheckoutState::AwaitingConfirmation { phone } => handle_confirmation(bot, msg, deps, &phone).await,
    }
}

async fn handle_phone(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let user_id = msg.chat.id.0;

    // Either a shared contact payload or free-text phone.
    let phone = msg
        .contact()
        .map(|c| c.phone_number.clone())
        .or_else(|| msg.text().map(|t| t.trim().to_string()))
        .unwrap_or_default();

    if phone.is_empty() {
        // Retry prompt; the automaton stays in AwaitingPhone.
        bot.send_message(msg.chat.id, "Введите телефон").await?;
        return Ok(());
    }

    // Best-effort profile update; checkout continues even if it fails.
    match get_connection(&deps.db_pool) {
        Ok(conn) => {
            let first_name = msg.from.as_ref().map(|u| u.first_name.as_str());
            let last_name = msg.from.as_ref().and_then(|u| u.last_name.as_deref());
            if let Err(e) = upsert_user(&conn, user_id, first_name, last_name) {
                log::warn!("Failed to upsert user {} during checkout: {}", user_id, e);
            }
            if let Err(e) = set_user_phone(&conn, user_id, &phone) {
                log::warn!("Failed to save phone for user {}: {}", user_id, e);
            }
        }
        Err(e) => log::warn!("No DB connection for profile update of user {}: {}", user_id, e),
    }

    deps.checkout.set(user_id, CheckoutState::AwaitingConfirmation { phone });
    bot.send_message(msg.chat.id, "Подтвердите оформление заказа: отправьте 'Да' или 'Нет'")
        .await?;
    Ok(())
}

async fn handle_confirmation(bot: &Bot, msg: &Message, deps: &HandlerDeps, phone: &str) -> ResponseResult<()> {
    let user_id = msg.chat.id.0;

    if !is_affirmative(msg.text().unwrap_or_default()) {
        deps.checkout.clear(user_id);
        bot.send_message(msg.chat.id, "Отменено").await?;
        return Ok(());
    }

    // The automaton is done either way; the slot must not survive finalize.
    deps.checkout.clear(user_id);

    let finalized = match get_connection(&deps.db_pool) {
        Ok(mut conn) => finalize_order(&mut conn, user_id, phone),
        Err(e) => {
            log::error!("No DB connection for finalize of user {}: {}", user_id, e);
            Err(AppError::DatabasePool(e))
        }
    };

    match finalized {
        Ok(summary) => {
            let is_admin = config::admin::is_admin(user_id);
            send_html(
                bot,
                msg.chat.id,
                "Заказ оформлен ✅",
                Some(keyboards::main_menu(is_admin)),
            )
            .await?;

            // Fan-out is a best-effort side channel: the order is already
            // committed, delivery failures must not surface to the customer.
            let bot_notify = bot.clone();
            let db_pool = Arc::clone(&deps.db_pool);
            tokio::spawn(async move {
                let recipients = match get_connection(&db_pool) {
                    Ok(conn) => notification_recipients(&conn),
                    Err(e) => {
                        log::error!("No DB connection for notification recipients: {}", e);
                        config::MANAGER_CHAT_ID.iter().copied().collect()
                    }
                };
                let delivered = notify_new_order(&bot_notify, &recipients, &summary).await;
                log::info!(
                    "Order #{} notification: delivered to {}/{} recipient(s)",
                    summary.order_id,
                    delivered,
                    recipients.len()
                );
            });
        }
        Err(AppError::EmptyCart) => {
            bot.send_message(msg.chat.id, "Корзина пуста").await?;
        }
        Err(e) => {
            log::error!("Failed to finalize order for user {}: {}", user_id, e);
            bot.send_message(msg.chat.id, "Не удалось оформить заказ. Попробуйте позже.")
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_tokens() {
        assert!(is_affirmative("Да"));
        assert!(is_affirmative(" yes "));
        assert!(is_affirmative("OK"));
        assert!(is_affirmative("Y"));
        assert!(!is_affirmative("нет"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("да, но позже"));
    }

    #[test]
    fn test_flow_start_overwrites_stale_state() {
        let flow = CheckoutFlow::new();
        flow.set(
            1,
            CheckoutState::AwaitingConfirmation {
                phone: "+7000".to_string(),
            },
        );
        flow.start(1);
        assert_eq!(flow.get(1), Some(CheckoutState::AwaitingPhone));
    }

    #[test]
    fn test_flow_clear_removes_slot() {
        let flow = CheckoutFlow::new();
        flow.start(5);
        assert!(flow.is_active(5));
        flow.clear(5);
        assert!(!flow.is_active(5));
        assert_eq!(flow.get(5), None);
    }
}
