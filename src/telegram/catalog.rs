//! User-side catalog browsing: /start, categories, product cards, flavors,
//! and the info section.

use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, FileId, InputFile, MessageId, ParseMode};

use crate::core::pricing::unit_price;
use crate::core::{branding, config};
use crate::storage::catalog::{get_product, list_available_flavors, list_categories, list_products_by_category, Product};
use crate::storage::db::upsert_user;
use crate::storage::get_connection;
use crate::storage::reviews::list_recent_reviews;
use crate::telegram::html;
use crate::telegram::keyboards;
use crate::telegram::types::{answer_silent, safe_edit, HandlerDeps};

/// /start: upsert the user row, resolve branding and show the main menu.
pub async fn handle_start(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let user_id = chat_id.0;

    let resolved = match get_connection(&deps.db_pool) {
        Ok(conn) => {
            let first_name = msg.from.as_ref().map(|u| u.first_name.as_str());
            let last_name = msg.from.as_ref().and_then(|u| u.last_name.as_deref());
            if let Err(e) = upsert_user(&conn, user_id, first_name, last_name) {
                log::error!("Failed to upsert user {}: {}", user_id, e);
            }
            branding::resolve(&conn)
        }
        Err(e) => {
            log::error!("No DB connection on /start for user {}: {}", user_id, e);
            branding::Branding {
                logo_file_id: None,
                welcome_text: branding::DEFAULT_WELCOME_TEXT.to_string(),
            }
        }
    };

    send_welcome(bot, chat_id, &resolved, config::admin::is_admin(user_id)).await
}

/// "🏠 Главная": replaces the current screen with the welcome screen.
pub async fn show_home(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    let resolved = match get_connection(&deps.db_pool) {
        Ok(conn) => branding::resolve(&conn),
        Err(_) => branding::Branding {
            logo_file_id: None,
            welcome_text: branding::DEFAULT_WELCOME_TEXT.to_string(),
        },
    };

    let is_admin = config::admin::is_admin(chat_id.0);
    if resolved.logo_file_id.is_some() {
        // The current message may be text-only; replace it so the logo shows.
        let _ = bot.delete_message(chat_id, message_id).await;
        send_welcome(bot, chat_id, &resolved, is_admin).await?;
    } else {
        safe_edit(
            bot,
            chat_id,
            message_id,
            &resolved.welcome_text,
            Some(keyboards::main_menu(is_admin)),
        )
        .await?;
    }
    answer_silent(bot, callback_id).await;
    Ok(())
}

async fn send_welcome(bot: &Bot, chat_id: ChatId, resolved: &branding::Branding, is_admin: bool) -> ResponseResult<()> {
    if let Some(logo) = &resolved.logo_file_id {
        let sent = bot
            .send_photo(chat_id, InputFile::file_id(FileId(logo.clone())))
            .caption(resolved.welcome_text.clone())
            .reply_markup(keyboards::main_menu(is_admin))
            .await;
        if sent.is_ok() {
            return Ok(());
        }
        log::warn!("Failed to send branding logo, falling back to text");
    }
    bot.send_message(chat_id, &resolved.welcome_text)
        .reply_markup(keyboards::main_menu(is_admin))
        .await?;
    Ok(())
}

/// "🏷️ Каталог": category list.
pub async fn open_catalog(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    let cats = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_categories(&conn).ok())
        .unwrap_or_default();

    if cats.is_empty() {
        safe_edit(bot, chat_id, message_id, "Категории пока не добавлены.", None).await?;
    } else {
        safe_edit(
            bot,
            chat_id,
            message_id,
            "Выберите категорию:",
            Some(keyboards::categories(&cats)),
        )
        .await?;
    }
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Product list of one category (in-stock, non-archived only).
pub async fn open_category(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    category_id: i64,
) -> ResponseResult<()> {
    let products = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_products_by_category(&conn, category_id).ok())
        .unwrap_or_default();

    if products.is_empty() {
        safe_edit(bot, chat_id, message_id, "В этой категории пока нет товаров.", None).await?;
    } else {
        safe_edit(
            bot,
            chat_id,
            message_id,
            "Выберите товар:",
            Some(keyboards::products(&products)),
        )
        .await?;
    }
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Renders the product card text with a live price preview for `qty`.
fn product_text(product: &Product, qty: i64, flavor: Option<&str>) -> String {
    let mut lines = vec![format!("<b>{}</b>", html::escape(&product.title)), String::new()];
    if let Some(description) = &product.description {
        lines.push(html::escape(description));
        lines.push(String::new());
    }
    if let Some(flavor) = flavor {
        lines.push(format!("Вкус: <b>{}</b>", html::escape(flavor)));
    }
    let price = unit_price(product, qty);
    lines.push(format!("Цена: <b>{:.2}</b>", price));
    if qty > 1 {
        lines.push(format!("Итого: <b>{:.2}</b>", price * qty as f64));
    }
    lines.push(String::new());
    lines.push(format!(
        "Наличие: <b>{}</b>",
        if product.in_stock { "Есть" } else { "Нет" }
    ));
    lines.join("\n")
}

fn load_product_with_flavors(
    deps: &HandlerDeps,
    product_id: i64,
) -> Option<(Product, Vec<crate::storage::catalog::Flavor>)> {
    let conn = get_connection(&deps.db_pool).ok()?;
    let product = get_product(&conn, product_id).ok().flatten()?;
    let flavors = list_available_flavors(&conn, product_id).unwrap_or_default();
    Some((product, flavors))
}

/// Product card with photo, description, price preview and qty controls.
pub async fn open_product(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    let Some((product, flavors)) = load_product_with_flavors(deps, product_id) else {
        safe_edit(bot, chat_id, message_id, "Товар не найден.", None).await?;
        answer_silent(bot, callback_id).await;
        return Ok(());
    };

    let qty = 1;
    let text = product_text(&product, qty, None);
    let kb = keyboards::product_view(&product, qty, !flavors.is_empty());

    if let Some(photo) = product.photo_file_id.clone() {
        let _ = bot.delete_message(chat_id, message_id).await;
        let sent = bot
            .send_photo(chat_id, InputFile::file_id(FileId(photo)))
            .caption(text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(kb.clone())
            .await;
        if sent.is_err() {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(kb)
                .await?;
        }
    } else {
        safe_edit(bot, chat_id, message_id, &text, Some(kb)).await?;
    }
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Redraws a card (text or caption) after a qty change or flavor pick.
async fn redraw_card(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    has_photo: bool,
    text: &str,
    kb: teloxide::types::InlineKeyboardMarkup,
) -> ResponseResult<()> {
    if has_photo {
        let edited = bot
            .edit_message_caption(chat_id, message_id)
            .caption(text.to_string())
            .parse_mode(ParseMode::Html)
            .reply_markup(kb.clone())
            .await;
        if edited.is_ok() {
            return Ok(());
        }
    }
    safe_edit(bot, chat_id, message_id, text, Some(kb)).await
}

/// ± counter on the product card. Purely a display change: nothing touches
/// the cart until "В корзину" is pressed.
#[allow(clippy::too_many_arguments)]
pub async fn change_qty(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    has_photo: bool,
    deps: &HandlerDeps,
    product_id: i64,
    qty: i64,
    increment: bool,
) -> ResponseResult<()> {
    let qty = if increment { qty + 1 } else { (qty - 1).max(1) };

    let Some((product, flavors)) = load_product_with_flavors(deps, product_id) else {
        answer_silent(bot, callback_id).await;
        return Ok(());
    };

    let text = product_text(&product, qty, None);
    let kb = keyboards::product_view(&product, qty, !flavors.is_empty());
    redraw_card(bot, chat_id, message_id, has_photo, &text, kb).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// "🍃 Выбрать вкус": list of available flavors.
#[allow(clippy::too_many_arguments)]
pub async fn select_flavor(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    has_photo: bool,
    deps: &HandlerDeps,
    product_id: i64,
    qty: i64,
) -> ResponseResult<()> {
    let Some((product, flavors)) = load_product_with_flavors(deps, product_id) else {
        answer_silent(bot, callback_id).await;
        return Ok(());
    };

    if flavors.is_empty() {
        safe_edit(bot, chat_id, message_id, "У этого товара нет вкусов.", None).await?;
        answer_silent(bot, callback_id).await;
        return Ok(());
    }

    let text = format!("<b>{}</b>\n\nВыберите вкус:", html::escape(&product.title));
    let kb = keyboards::flavor_list(product_id, qty, &flavors);
    redraw_card(bot, chat_id, message_id, has_photo, &text, kb).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// A flavor was picked: card with the flavor shown and the cart unlocked.
#[allow(clippy::too_many_arguments)]
pub async fn show_flavor_view(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    has_photo: bool,
    deps: &HandlerDeps,
    product_id: i64,
    flavor_id: i64,
    qty: i64,
) -> ResponseResult<()> {
    let Some((product, flavors)) = load_product_with_flavors(deps, product_id) else {
        answer_silent(bot, callback_id).await;
        return Ok(());
    };
    let Some(flavor) = flavors.iter().find(|f| f.id == flavor_id) else {
        safe_edit(bot, chat_id, message_id, "Вкус не найден.", None).await?;
        answer_silent(bot, callback_id).await;
        return Ok(());
    };

    let text = product_text(&product, qty, Some(&flavor.name));
    let kb = keyboards::flavor_view(&product, flavor_id, qty);
    redraw_card(bot, chat_id, message_id, has_photo, &text, kb).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// ± counter on the flavor card.
#[allow(clippy::too_many_arguments)]
pub async fn change_flavor_qty(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    has_photo: bool,
    deps: &HandlerDeps,
    product_id: i64,
    flavor_id: i64,
    qty: i64,
    increment: bool,
) -> ResponseResult<()> {
    let qty = if increment { qty + 1 } else { (qty - 1).max(1) };
    show_flavor_view(
        bot, callback_id, chat_id, message_id, has_photo, deps, product_id, flavor_id, qty,
    )
    .await
}

// --- Раздел «О нас» ---

pub async fn open_info(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
) -> ResponseResult<()> {
    safe_edit(
        bot,
        chat_id,
        message_id,
        "Раздел: ℹ️ О нас\n\nВыберите тему:",
        Some(keyboards::info_menu()),
    )
    .await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

fn info_text(key: &str) -> Option<&'static str> {
    match key {
        "about" => Some(
            "<b>О нас</b>\n\n\
             Мы — команда, которая любит качественные товары и честный сервис. \
             Собираем ассортимент, проверяем поставщиков и быстро доставляем. \
             Наша цель — чтобы ваш опыт покупки был простым, удобным и приятным.",
        ),
        "packaging" => Some(
            "<b>Упаковка</b>\n\n\
             Мы упаковываем товары в неприметные коробки без опознавательных знаков. \
             Содержимое не указано на упаковке. Бережная защита от повреждений во время доставки.",
        ),
        "wholesale" => Some(
            "<b>Скидки для оптовых покупателей</b>\n\n\
             При крупных заказах действуют персональные условия. \
             Скидки зависят от объёма и регулярности закупок. Напишите нам для расчёта.",
        ),
        "privacy" => Some(
            "<b>Почему мы запрашиваем телефон и адрес</b>\n\n\
             Эти данные нужны для подтверждения заказа и корректной доставки. \
             Телефон — чтобы уточнить детали, адрес — чтобы доставить вовремя. \
             Мы не передаём данные третьим лицам и используем их только для выполнения заказа.",
        ),
        _ => None,
    }
}

pub async fn show_info_item(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    key: &str,
) -> ResponseResult<()> {
    if key == "reviews" {
        show_reviews(bot, chat_id, deps).await?;
        answer_silent(bot, callback_id).await;
        return Ok(());
    }

    let text = info_text(key).unwrap_or("Раздел не найден");
    safe_edit(bot, chat_id, message_id, text, Some(keyboards::info_item())).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

async fn show_reviews(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> ResponseResult<()> {
    let reviews = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_recent_reviews(&conn, 10).ok())
        .unwrap_or_default();

    if reviews.is_empty() {
        bot.send_message(chat_id, "Пока нет отзывов")
            .reply_markup(keyboards::info_item())
            .await?;
        return Ok(());
    }

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
    bot.send_message(chat_id, "Это последние отзывы")
        .reply_markup(keyboards::info_item())
        .await?;
    Ok(())
}
