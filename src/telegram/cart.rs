//! Cart handlers: add, view, clear.

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, MessageId};

use crate::core::error::AppError;
use crate::storage::get_connection;
use crate::storage::orders::{add_cart_item, clear_cart, load_cart, Cart};
use crate::telegram::html;
use crate::telegram::keyboards;
use crate::telegram::types::{answer_alert, answer_silent, safe_edit, HandlerDeps};

/// "🛒 В корзину" — both the flavorless (`cart:add`) and the flavored
/// (`flavor:add`) button land here.
pub async fn handle_add(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    user_id: i64,
    deps: &HandlerDeps,
    product_id: i64,
    flavor_id: Option<i64>,
    qty: i64,
) -> ResponseResult<()> {
    let result = match get_connection(&deps.db_pool) {
        Ok(mut conn) => add_cart_item(&mut conn, user_id, product_id, flavor_id, qty),
        Err(e) => Err(AppError::DatabasePool(e)),
    };

    match result {
        Ok(()) => {
            let _ = bot.answer_callback_query(callback_id.clone()).text("В корзине").await;
        }
        Err(AppError::FlavorRequired) => {
            answer_alert(bot, callback_id, "Сначала выберите вкус").await;
        }
        Err(AppError::NotFound(_)) => {
            answer_alert(bot, callback_id, "Товар не найден").await;
        }
        Err(e) => {
            log::error!("Failed to add product {} to cart of {}: {}", product_id, user_id, e);
            answer_alert(bot, callback_id, "Не удалось добавить в корзину").await;
        }
    }
    Ok(())
}

/// Renders the cart: stored line prices only, never recomputed from the
/// catalog — a price edit must not change what is already in the cart.
fn format_cart(cart: &Cart) -> String {
    let mut lines = vec!["<b>Корзина</b>".to_string()];
    for line in &cart.lines {
        let title = match &line.flavor {
            Some(flavor) => format!("{} ({})", html::escape(&line.title), html::escape(flavor)),
            None => html::escape(&line.title),
        };
        lines.push(format!(
            "{} — {} x {:.2} = {:.2}",
            title,
            line.quantity,
            line.unit_price,
            line.subtotal()
        ));
    }
    lines.push(String::new());
    lines.push(format!("Итого: {:.2}", cart.total()));
    lines.join("\n")
}

/// "🛒 Корзина".
pub async fn handle_view(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    let cart = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| load_cart(&conn, chat_id.0).ok())
        .flatten();

    let kb = keyboards::cart_actions();
    match cart {
        Some(cart) if !cart.lines.is_empty() => {
            safe_edit(bot, chat_id, message_id, &format_cart(&cart), Some(kb)).await?;
        }
        _ => {
            safe_edit(bot, chat_id, message_id, "Корзина пуста", Some(kb)).await?;
        }
    }
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// "🧹 Очистить".
pub async fn handle_clear(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    match get_connection(&deps.db_pool) {
        Ok(conn) => {
            if let Err(e) = clear_cart(&conn, chat_id.0) {
                log::error!("Failed to clear cart of {}: {}", chat_id.0, e);
            }
        }
        Err(e) => log::error!("No DB connection to clear cart of {}: {}", chat_id.0, e),
    }
    safe_edit(
        bot,
        chat_id,
        message_id,
        "Корзина очищена",
        Some(keyboards::cart_actions()),
    )
    .await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}
