//! Admin branding forms: logo photo and welcome text.
//!
//! Values saved here land in the singleton branding row and take precedence
//! over config defaults via `core::branding::resolve`.

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, MessageId};

use crate::storage::branding::{get_branding, set_logo, set_welcome_text};
use crate::storage::get_connection;
use crate::telegram::admin::AdminState;
use crate::telegram::html;
use crate::telegram::keyboards;
use crate::telegram::types::{answer_silent, safe_edit, send_html, HandlerDeps};

/// "🎨 Брендинг": current values plus the two edit buttons.
pub async fn open_branding(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    let row = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| get_branding(&conn).ok())
        .flatten();

    let mut lines = vec!["Брендинг".to_string()];
    if let Some(text) = row.as_ref().and_then(|r| r.welcome_text.as_deref()) {
        lines.push(format!("Текущий текст: {}", html::escape(text)));
    }
    if row.as_ref().and_then(|r| r.logo_file_id.as_deref()).is_some() {
        lines.push("Логотип: установлен".to_string());
    } else {
        lines.push("Логотип: не задан".to_string());
    }

    safe_edit(
        bot,
        chat_id,
        message_id,
        &lines.join("\n"),
        Some(keyboards::admin_branding()),
    )
    .await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn start_logo_form(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    deps.admin_forms.clear(chat_id.0);
    deps.admin_forms.set(chat_id.0, AdminState::BrandingLogo);
    safe_edit(bot, chat_id, message_id, "Отправьте фото логотипа (как фото)", None).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn start_text_form(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    deps.admin_forms.clear(chat_id.0);
    deps.admin_forms.set(chat_id.0, AdminState::BrandingText);
    safe_edit(bot, chat_id, message_id, "Отправьте новый приветственный текст", None).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Message-side steps of the branding forms, dispatched from
/// `admin::handle_admin_message`.
pub async fn handle_branding_message(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    state: AdminState,
) -> ResponseResult<()> {
    match state {
        AdminState::BrandingLogo => {
            let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
                bot.send_message(msg.chat.id, "Отправьте фото логотипа (как фото)").await?;
                return Ok(());
            };
            let file_id = photo.file.id.0.clone();

            deps.admin_forms.clear(msg.chat.id.0);
            let saved = get_connection(&deps.db_pool)
                .ok()
                .map(|conn| set_logo(&conn, &file_id).is_ok())
                .unwrap_or(false);
            let reply = if saved { "Логотип обновлён" } else { "Не удалось сохранить логотип" };
            send_html(bot, msg.chat.id, reply, Some(keyboards::admin_menu())).await
        }
        AdminState::BrandingText => {
            let text = msg.text().unwrap_or_default().trim().to_string();
            if text.is_empty() {
                bot.send_message(msg.chat.id, "Отправьте новый приветственный текст")
                    .await?;
                return Ok(());
            }

            deps.admin_forms.clear(msg.chat.id.0);
            let saved = get_connection(&deps.db_pool)
                .ok()
                .map(|conn| set_welcome_text(&conn, &text).is_ok())
                .unwrap_or(false);
            let reply = if saved {
                "Приветственный текст обновлён"
            } else {
                "Не удалось сохранить текст"
            };
            send_html(bot, msg.chat.id, reply, Some(keyboards::admin_menu())).await
        }
        _ => Ok(()),
    }
}
