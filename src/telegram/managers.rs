//! Manager registry admin: notification recipients with admin access.
//!
//! Adding a manager also grants runtime admin access through the allow-list;
//! removal revokes it (ids from ADMIN_IDS itself stay permanent).

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, MessageId};

use crate::core::config;
use crate::storage::get_connection;
use crate::storage::managers::{add_manager, list_managers, remove_manager};
use crate::telegram::admin::AdminState;
use crate::telegram::keyboards;
use crate::telegram::types::{answer_silent, safe_edit, send_html, HandlerDeps};

async fn render_manager_list(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    suffix: Option<&str>,
) -> ResponseResult<()> {
    let managers = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_managers(&conn).ok())
        .unwrap_or_default();

    let mut text = if managers.is_empty() {
        "Менеджеры:\nПока не добавлено ни одного менеджера".to_string()
    } else {
        "Менеджеры:".to_string()
    };
    if let Some(suffix) = suffix {
        text.push('\n');
        text.push_str(suffix);
    }

    safe_edit(bot, chat_id, message_id, &text, Some(keyboards::admin_managers(&managers))).await
}

/// "👥 Менеджеры": list with inline delete buttons.
pub async fn open_managers(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    render_manager_list(bot, chat_id, message_id, deps, None).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn start_manager_form(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    deps.admin_forms.clear(chat_id.0);
    deps.admin_forms.set(chat_id.0, AdminState::ManagerUserId);
    safe_edit(
        bot,
        chat_id,
        message_id,
        "Отправьте user_id менеджера (число). Он должен нажать /start боту.",
        None,
    )
    .await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Message-side step: numeric user id. Invalid input re-prompts without
/// clearing the form.
pub async fn handle_manager_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let Ok(user_id) = msg.text().unwrap_or_default().trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Неверный формат. Отправьте числовой user_id")
            .await?;
        return Ok(());
    };

    deps.admin_forms.clear(msg.chat.id.0);
    let added = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| add_manager(&conn, user_id).ok());

    let reply = match added {
        Some(true) => {
            config::admin::grant(user_id);
            "Менеджер добавлен"
        }
        Some(false) => "Такой менеджер уже есть",
        None => "Не удалось сохранить менеджера",
    };
    send_html(bot, msg.chat.id, reply, Some(keyboards::admin_menu())).await
}

/// Inline delete button next to a manager entry.
pub async fn delete_manager(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    user_id: i64,
) -> ResponseResult<()> {
    let removed = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| remove_manager(&conn, user_id).ok())
        .unwrap_or(false);
    if removed {
        config::admin::revoke(user_id);
    }

    let suffix = if removed { "Удалён ✅" } else { "Такого менеджера нет" };
    render_manager_list(bot, chat_id, message_id, deps, Some(suffix)).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// `/delmanager <user_id>` — removal without the inline list.
pub async fn handle_delmanager_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let text = msg.text().unwrap_or_default();
    let parsed = text.strip_prefix("/delmanager").map(str::trim).filter(|s| !s.is_empty());
    let Some(raw) = parsed else {
        send_html(
            bot,
            msg.chat.id,
            "Использование: /delmanager <user_id>",
            Some(keyboards::admin_menu()),
        )
        .await?;
        return Ok(());
    };
    let Ok(user_id) = raw.parse::<i64>() else {
        send_html(bot, msg.chat.id, "user_id должен быть числом", Some(keyboards::admin_menu())).await?;
        return Ok(());
    };

    let removed = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| remove_manager(&conn, user_id).ok())
        .unwrap_or(false);
    if removed {
        config::admin::revoke(user_id);
    }

    let reply = if removed { "Менеджер удалён" } else { "Такого менеджера нет" };
    send_html(bot, msg.chat.id, reply, Some(keyboards::admin_menu())).await
}
