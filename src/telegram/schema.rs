//! Dispatcher schema and handler chain builders
//!
//! The same schema is used in production and can be reused in integration
//! tests. Branch order matters: hidden admin commands run before the
//! Command enum, which runs before the dialogue message handler.

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, Message, MessageId};

use crate::core::config;
use crate::telegram::bot::Command;
use crate::telegram::types::{answer_silent, HandlerDeps, HandlerError};
use crate::telegram::{admin, branding, cart, catalog, checkout, managers, reviews};

/// Creates the main dispatcher schema for the Telegram bot.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_addcat = deps.clone();
    let deps_delmanager = deps.clone();
    let deps_purge = deps.clone();
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Hidden admin commands (not in the Command enum)
        .branch(addcat_handler(deps_addcat))
        .branch(delmanager_handler(deps_delmanager))
        .branch(purgeproduct_handler(deps_purge))
        // Command handler
        .branch(command_handler(deps_commands))
        // Dialogue messages: checkout steps and admin forms
        .branch(message_handler(deps_messages))
        // Callback query handler
        .branch(callback_handler(deps_callback))
}

fn sender_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .and_then(|u| i64::try_from(u.id.0).ok())
        .unwrap_or(msg.chat.id.0)
}

/// Handler for the /addcat admin command (hidden, not in Command enum)
fn addcat_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| text.starts_with("/addcat")).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if !config::admin::is_admin(sender_id(&msg)) {
                    bot.send_message(msg.chat.id, "Нет доступа").await?;
                    return Ok(());
                }
                admin::handle_addcat_command(&bot, &msg, &deps).await?;
                Ok(())
            }
        })
}

/// Handler for the /delmanager admin command (hidden, not in Command enum)
fn delmanager_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| text.starts_with("/delmanager")).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if !config::admin::is_admin(sender_id(&msg)) {
                    return Ok(());
                }
                managers::handle_delmanager_command(&bot, &msg, &deps).await?;
                Ok(())
            }
        })
}

/// Handler for the /purgeproduct admin command (hidden, not in Command enum)
fn purgeproduct_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| {
            msg.text()
                .map(|text| text.starts_with("/purgeproduct"))
                .unwrap_or(false)
        })
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if !config::admin::is_admin(sender_id(&msg)) {
                    return Ok(());
                }
                admin::handle_purgeproduct_command(&bot, &msg, &deps).await?;
                Ok(())
            }
        })
}

/// Handler for bot commands (/start, /admin)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => {
                        catalog::handle_start(&bot, &msg, &deps).await?;
                    }
                    Command::Admin => {
                        if config::admin::is_admin(sender_id(&msg)) {
                            crate::telegram::types::send_html(
                                &bot,
                                msg.chat.id,
                                "Админ меню",
                                Some(crate::telegram::keyboards::admin_menu()),
                            )
                            .await?;
                        } else {
                            bot.send_message(msg.chat.id, "Нет доступа").await?;
                        }
                    }
                }
                Ok(())
            }
        },
    ))
}

/// Handler for dialogue messages: an armed checkout automaton takes the
/// message first, otherwise an active admin form does. Anything else is
/// ignored.
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move {
            let user_id = msg.chat.id.0;

            if deps.checkout.is_active(user_id) {
                checkout::handle_checkout_message(&bot, &msg, &deps).await?;
            } else if deps.admin_forms.is_active(user_id) && config::admin::is_admin(sender_id(&msg)) {
                admin::handle_admin_message(&bot, &msg, &deps).await?;
            }
            Ok(())
        }
    })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            if let Err(e) = route_callback(&bot, &q, &deps).await {
                log::error!("Callback handler error for data {:?}: {}", q.data, e);
            }
            Ok(())
        }
    })
}

/// Parses the i64 at `index` of a colon-separated callback payload.
fn arg(parts: &[&str], index: usize) -> Option<i64> {
    parts.get(index).and_then(|s| s.parse::<i64>().ok())
}

/// Routes a callback query by its data prefix.
async fn route_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> ResponseResult<()> {
    let callback_id: &CallbackQueryId = &q.id;
    let Some(data) = q.data.as_deref() else {
        answer_silent(bot, callback_id).await;
        return Ok(());
    };

    let (chat_id, message_id): (ChatId, MessageId) = match q.message.as_ref().map(|m| (m.chat().id, m.id())) {
        Some(pair) => pair,
        None => {
            answer_silent(bot, callback_id).await;
            return Ok(());
        }
    };
    let has_photo = matches!(
        q.message.as_ref(),
        Some(teloxide::types::MaybeInaccessibleMessage::Regular(m)) if m.photo().is_some()
    );
    let user_id = i64::try_from(q.from.id.0).unwrap_or(chat_id.0);

    let parts: Vec<&str> = data.split(':').collect();

    match parts.as_slice() {
        ["noop"] => answer_silent(bot, callback_id).await,

        ["nav", "home"] => catalog::show_home(bot, callback_id, chat_id, message_id, deps).await?,
        ["catalog", "open"] | ["nav", "categories"] => {
            catalog::open_catalog(bot, callback_id, chat_id, message_id, deps).await?;
        }
        ["category", _] => {
            if let Some(category_id) = arg(&parts, 1) {
                catalog::open_category(bot, callback_id, chat_id, message_id, deps, category_id).await?;
            }
        }
        ["nav", "category", _] => {
            if let Some(category_id) = arg(&parts, 2) {
                catalog::open_category(bot, callback_id, chat_id, message_id, deps, category_id).await?;
            }
        }
        ["product", _] => {
            if let Some(product_id) = arg(&parts, 1) {
                catalog::open_product(bot, callback_id, chat_id, message_id, deps, product_id).await?;
            }
        }
        ["qty", action, _, _] => {
            if let (Some(product_id), Some(qty)) = (arg(&parts, 2), arg(&parts, 3)) {
                catalog::change_qty(
                    bot,
                    callback_id,
                    chat_id,
                    message_id,
                    has_photo,
                    deps,
                    product_id,
                    qty,
                    *action == "inc",
                )
                .await?;
            }
        }

        ["flavor", "select", _, _] => {
            if let (Some(product_id), Some(qty)) = (arg(&parts, 2), arg(&parts, 3)) {
                catalog::select_flavor(bot, callback_id, chat_id, message_id, has_photo, deps, product_id, qty).await?;
            }
        }
        ["flavor", "set", _, _, _] => {
            if let (Some(product_id), Some(flavor_id), Some(qty)) = (arg(&parts, 2), arg(&parts, 3), arg(&parts, 4)) {
                catalog::show_flavor_view(
                    bot, callback_id, chat_id, message_id, has_photo, deps, product_id, flavor_id, qty,
                )
                .await?;
            }
        }
        ["flavor", "qty", action, _, _, _] => {
            if let (Some(product_id), Some(flavor_id), Some(qty)) = (arg(&parts, 3), arg(&parts, 4), arg(&parts, 5)) {
                catalog::change_flavor_qty(
                    bot,
                    callback_id,
                    chat_id,
                    message_id,
                    has_photo,
                    deps,
                    product_id,
                    flavor_id,
                    qty,
                    *action == "inc",
                )
                .await?;
            }
        }
        ["flavor", "add", _, _, _] => {
            if let (Some(product_id), Some(flavor_id), Some(qty)) = (arg(&parts, 2), arg(&parts, 3), arg(&parts, 4)) {
                cart::handle_add(bot, callback_id, user_id, deps, product_id, Some(flavor_id), qty).await?;
            }
        }

        ["cart", "add", _, _] => {
            if let (Some(product_id), Some(qty)) = (arg(&parts, 2), arg(&parts, 3)) {
                cart::handle_add(bot, callback_id, user_id, deps, product_id, None, qty).await?;
            }
        }
        ["cart", "view"] => cart::handle_view(bot, callback_id, chat_id, message_id, deps).await?,
        ["cart", "clear"] => cart::handle_clear(bot, callback_id, chat_id, message_id, deps).await?,
        ["cart", "checkout"] => checkout::start_checkout(bot, callback_id, chat_id, message_id, deps).await?,

        ["info", "open"] => catalog::open_info(bot, callback_id, chat_id, message_id).await?,
        ["info", "item", key] => {
            catalog::show_info_item(bot, callback_id, chat_id, message_id, deps, key).await?;
        }

        ["admin", ..] | ["adminprod", _] | ["admincat", _] | ["admincatset", _, _] => {
            if !config::admin::is_admin(user_id) {
                answer_silent(bot, callback_id).await;
                return Ok(());
            }
            route_admin_callback(bot, q, deps, &parts, chat_id, message_id).await?;
        }

        _ => {
            log::warn!("Unknown callback data: {}", data);
            answer_silent(bot, callback_id).await;
        }
    }

    Ok(())
}

/// Admin-gated callbacks; the allow-list check already happened.
async fn route_admin_callback(
    bot: &Bot,
    q: &CallbackQuery,
    deps: &HandlerDeps,
    parts: &[&str],
    chat_id: ChatId,
    message_id: MessageId,
) -> ResponseResult<()> {
    let callback_id: &CallbackQueryId = &q.id;

    match parts {
        ["admin", "open"] => admin::open_admin_menu(bot, callback_id, chat_id, message_id).await?,
        ["admin", "product", "add"] => {
            admin::start_product_wizard(bot, callback_id, chat_id, message_id, deps).await?;
        }
        ["admin", "category", "add"] => {
            admin::start_category_form(bot, callback_id, chat_id, message_id, deps).await?;
        }
        ["admin", "category", "list"] => {
            admin::show_category_list(bot, callback_id, chat_id, message_id, deps).await?;
        }
        ["admin", "products"] => admin::show_product_list(bot, callback_id, chat_id, message_id, deps).await?,
        ["admin", "products", "archived"] => {
            admin::show_archived_list(bot, callback_id, chat_id, message_id, deps).await?;
        }
        ["admin", "product", "delete", _] => {
            if let Some(product_id) = arg(parts, 3) {
                admin::archive(bot, callback_id, chat_id, message_id, deps, product_id).await?;
            }
        }
        ["admin", "product", "restore", _] => {
            if let Some(product_id) = arg(parts, 3) {
                admin::restore(bot, callback_id, chat_id, message_id, deps, product_id).await?;
            }
        }
        ["adminprod", _] => {
            if let Some(product_id) = arg(parts, 1) {
                admin::open_product_editor(bot, callback_id, chat_id, message_id, deps, product_id).await?;
            }
        }
        ["admin", "availability", choice] => {
            admin::pick_availability(bot, callback_id, chat_id, message_id, deps, *choice == "yes").await?;
        }
        ["admincat", _] => {
            if let Some(category_id) = arg(parts, 1) {
                admin::pick_category(bot, callback_id, chat_id, message_id, deps, category_id).await?;
            }
        }
        ["admincatset", _, _] => {
            if let (Some(product_id), Some(category_id)) = (arg(parts, 1), arg(parts, 2)) {
                admin::reassign_category(bot, callback_id, chat_id, message_id, deps, product_id, category_id).await?;
            }
        }
        ["admin", "edit", "toggle_instock", _] => {
            if let Some(product_id) = arg(parts, 3) {
                admin::toggle_in_stock(bot, callback_id, chat_id, message_id, deps, product_id).await?;
            }
        }
        ["admin", "edit", "category", _] => {
            if let Some(product_id) = arg(parts, 3) {
                admin::start_category_reassign(bot, callback_id, chat_id, message_id, deps, product_id).await?;
            }
        }
        ["admin", "edit", "flavors", _] => {
            if let Some(product_id) = arg(parts, 3) {
                admin::show_flavor_admin(bot, callback_id, chat_id, message_id, deps, product_id).await?;
            }
        }
        ["admin", "edit", field, _] => {
            if let Some(product_id) = arg(parts, 3) {
                admin::start_edit(bot, callback_id, chat_id, message_id, deps, field, product_id).await?;
            }
        }
        ["admin", "flavor", "add", _] => {
            if let Some(product_id) = arg(parts, 3) {
                admin::start_flavor_form(bot, callback_id, chat_id, message_id, deps, product_id).await?;
            }
        }
        ["admin", "flavor", "toggle", _, _] => {
            if let (Some(product_id), Some(flavor_id)) = (arg(parts, 3), arg(parts, 4)) {
                admin::toggle_flavor(bot, callback_id, chat_id, message_id, deps, product_id, flavor_id).await?;
            }
        }
        ["admin", "flavor", "delete", _] => {
            if let Some(product_id) = arg(parts, 3) {
                admin::delete_product_flavors(bot, callback_id, chat_id, message_id, deps, product_id).await?;
            }
        }
        ["admin", "review", "add"] => {
            reviews::start_review_form(bot, callback_id, chat_id, message_id, deps).await?;
        }
        ["admin", "reviews"] => reviews::list_reviews(bot, callback_id, chat_id, message_id, deps).await?,
        ["admin", "branding"] => branding::open_branding(bot, callback_id, chat_id, message_id, deps).await?,
        ["admin", "branding", "set_logo"] => {
            branding::start_logo_form(bot, callback_id, chat_id, message_id, deps).await?;
        }
        ["admin", "branding", "set_text"] => {
            branding::start_text_form(bot, callback_id, chat_id, message_id, deps).await?;
        }
        ["admin", "managers"] => managers::open_managers(bot, callback_id, chat_id, message_id, deps).await?,
        ["admin", "managers", "add"] => {
            managers::start_manager_form(bot, callback_id, chat_id, message_id, deps).await?;
        }
        ["admin", "managers", "del", _] => {
            if let Some(user_id) = arg(parts, 3) {
                managers::delete_manager(bot, callback_id, chat_id, message_id, deps, user_id).await?;
            }
        }
        _ => {
            log::warn!("Unknown admin callback data: {:?}", parts);
            answer_silent(bot, callback_id).await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_parses_and_rejects() {
        let parts: Vec<&str> = "cart:add:15:3".split(':').collect();
        assert_eq!(arg(&parts, 2), Some(15));
        assert_eq!(arg(&parts, 3), Some(3));
        assert_eq!(arg(&parts, 4), None);

        let bad: Vec<&str> = "cart:add:abc:3".split(':').collect();
        assert_eq!(arg(&bad, 2), None);
    }
}
