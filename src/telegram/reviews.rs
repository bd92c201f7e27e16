//! Admin review forms: capture a photo/video, then an optional caption.

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, FileId, InputFile, MessageId};

use crate::storage::get_connection;
use crate::storage::reviews::{create_review, list_recent_reviews};
use crate::telegram::admin::AdminState;
use crate::telegram::keyboards;
use crate::telegram::types::{answer_silent, safe_edit, send_html, HandlerDeps};

pub async fn start_review_form(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    deps.admin_forms.clear(chat_id.0);
    deps.admin_forms.set(chat_id.0, AdminState::ReviewMedia);
    safe_edit(
        bot,
        chat_id,
        message_id,
        "Отправьте фото или видео отзыва (как фото/видео, не как файл)",
        None,
    )
    .await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Message-side steps of the review form.
pub async fn handle_review_message(bot: &Bot, msg: &Message, deps: &HandlerDeps, state: AdminState) -> ResponseResult<()> {
    match state {
        AdminState::ReviewMedia => {
            let media = if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
                Some(("photo".to_string(), photo.file.id.0.clone()))
            } else {
                msg.video().map(|video| ("video".to_string(), video.file.id.0.clone()))
            };

            let Some((media_type, file_id)) = media else {
                bot.send_message(msg.chat.id, "Отправьте фото или видео отзыва").await?;
                return Ok(());
            };

            deps.admin_forms
                .set(msg.chat.id.0, AdminState::ReviewCaption { media_type, file_id });
            bot.send_message(msg.chat.id, "Добавьте подпись к отзыву (или отправьте '-' чтобы пропустить)")
                .await?;
            Ok(())
        }
        AdminState::ReviewCaption { media_type, file_id } => {
            let text = msg.text().unwrap_or_default().trim();
            let caption = if text == "-" { None } else { Some(text) };

            deps.admin_forms.clear(msg.chat.id.0);
            let saved = get_connection(&deps.db_pool)
                .ok()
                .map(|conn| create_review(&conn, &media_type, &file_id, caption).is_ok())
                .unwrap_or(false);
            let reply = if saved { "Отзыв добавлен" } else { "Не удалось сохранить отзыв" };
            send_html(bot, msg.chat.id, reply, Some(keyboards::admin_menu())).await
        }
        _ => Ok(()),
    }
}

/// "🗂 Отзывы": resend the last 10 reviews to the admin chat.
pub async fn list_reviews(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    let reviews = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_recent_reviews(&conn, 10).ok())
        .unwrap_or_default();

    if reviews.is_empty() {
        safe_edit(bot, chat_id, message_id, "Пока нет отзывов", Some(keyboards::admin_menu())).await?;
        answer_silent(bot, callback_id).await;
        return Ok(());
    }

    safe_edit(
        bot,
        chat_id,
        message_id,
        &format!("Всего показано: {}. Последние отзывы отправлены в чат.", reviews.len()),
        None,
    )
    .await?;

    for review in &reviews {
        let caption = review.caption.clone().unwrap_or_default();
        let file = InputFile::file_id(FileId(review.file_id.clone()));
        let sent = if review.media_type == "photo" {
            bot.send_photo(chat_id, file).caption(caption).await.map(|_| ())
        } else {
            bot.send_video(chat_id, file).caption(caption).await.map(|_| ())
        };
        if let Err(e) = sent {
            log::warn!("Failed to resend review {}: {}", review.id, e);
        }
    }

    // Keyboard under the last message so the buttons stay reachable.
    send_html(bot, chat_id, "↩️ Назад в админ-меню", Some(keyboards::admin_menu())).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}
