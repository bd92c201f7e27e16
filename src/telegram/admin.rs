//! Admin panel: chat-driven forms for catalog management.
//!
//! Every text-input form is a state in [`AdminState`], held in one per-user
//! slot ([`AdminFlow`]). The router checks the allow-list before anything
//! here runs; handlers only dispatch on state and callback data.

use dashmap::DashMap;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, FileId, InputFile, MessageId, ParseMode};

use crate::core::error::AppError;
use crate::storage::catalog::{
    self, archive_product, create_category, create_flavor, create_product, get_product, list_archived_products,
    list_categories, list_flavors, list_products, purge_product, restore_product, toggle_flavor_availability,
    toggle_product_in_stock, NewProduct,
};
use crate::storage::get_connection;
use crate::telegram::html;
use crate::telegram::keyboards;
use crate::telegram::types::{answer_silent, safe_edit, send_html, HandlerDeps};

/// Draft collected by the product creation wizard.
#[derive(Clone, Debug, Default)]
pub struct ProductDraft {
    pub title: String,
    pub description: Option<String>,
    pub photo_file_id: Option<String>,
    pub price: f64,
    pub in_stock: bool,
}

/// Per-user admin form state. Absent entry = no form in progress.
#[derive(Clone, Debug)]
pub enum AdminState {
    CategoryName,
    ProductTitle,
    ProductDescription { title: String },
    ProductPhoto { title: String, description: Option<String> },
    ProductPrice { title: String, description: Option<String>, photo_file_id: Option<String> },
    /// Waiting for the availability callback, draft complete up to price.
    ProductAvailability { draft: ProductDraft },
    /// Waiting for the category callback, draft complete.
    ProductCategory { draft: ProductDraft },
    EditTitle { product_id: i64 },
    EditDescription { product_id: i64 },
    EditPrice { product_id: i64 },
    EditStock { product_id: i64 },
    EditBulkPrice { product_id: i64 },
    EditBulkThreshold { product_id: i64 },
    FlavorName { product_id: i64 },
    BrandingLogo,
    BrandingText,
    ReviewMedia,
    ReviewCaption { media_type: String, file_id: String },
    ManagerUserId,
}

/// Admin form slots, one per user, overwritten wholesale when a new form
/// starts.
pub struct AdminFlow {
    states: DashMap<i64, AdminState>,
}

impl AdminFlow {
    pub fn new() -> Self {
        Self { states: DashMap::new() }
    }

    pub fn get(&self, user_id: i64) -> Option<AdminState> {
        self.states.get(&user_id).map(|entry| entry.value().clone())
    }

    pub fn set(&self, user_id: i64, state: AdminState) {
        self.states.insert(user_id, state);
    }

    pub fn clear(&self, user_id: i64) {
        self.states.remove(&user_id);
    }

    pub fn is_active(&self, user_id: i64) -> bool {
        self.states.contains_key(&user_id)
    }
}

impl Default for AdminFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a price with either decimal separator. `Err` keeps the form alive
/// so the admin can resubmit.
fn parse_price(text: &str) -> Result<f64, ()> {
    text.trim().replace(',', ".").parse::<f64>().map_err(|_| ())
}

// --- Message-side form steps ---

/// Dispatches a message to the active admin form. The router has already
/// verified the sender against the allow-list.
pub async fn handle_admin_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let user_id = msg.chat.id.0;
    let Some(state) = deps.admin_forms.get(user_id) else {
        return Ok(());
    };

    match state {
        AdminState::CategoryName => handle_category_name(bot, msg, deps).await,
        AdminState::ProductTitle => handle_product_title(bot, msg, deps).await,
        AdminState::ProductDescription { title } => handle_product_description(bot, msg, deps, title).await,
        AdminState::ProductPhoto { title, description } => {
            handle_product_photo(bot, msg, deps, title, description).await
        }
        AdminState::ProductPrice {
            title,
            description,
            photo_file_id,
        } => handle_product_price(bot, msg, deps, title, description, photo_file_id).await,
        AdminState::ProductAvailability { .. } | AdminState::ProductCategory { .. } => {
            // These steps are answered with inline buttons, not text.
            bot.send_message(msg.chat.id, "Воспользуйтесь кнопками выше").await?;
            Ok(())
        }
        AdminState::EditTitle { product_id } => handle_edit_title(bot, msg, deps, product_id).await,
        AdminState::EditDescription { product_id } => handle_edit_description(bot, msg, deps, product_id).await,
        AdminState::EditPrice { product_id } => handle_edit_price(bot, msg, deps, product_id).await,
        AdminState::EditStock { product_id } => handle_edit_stock(bot, msg, deps, product_id).await,
        AdminState::EditBulkPrice { product_id } => handle_edit_bulk_price(bot, msg, deps, product_id).await,
        AdminState::EditBulkThreshold { product_id } => handle_edit_bulk_threshold(bot, msg, deps, product_id).await,
        AdminState::FlavorName { product_id } => handle_flavor_name(bot, msg, deps, product_id).await,
        AdminState::BrandingLogo | AdminState::BrandingText => {
            crate::telegram::branding::handle_branding_message(bot, msg, deps, state).await
        }
        AdminState::ReviewMedia | AdminState::ReviewCaption { .. } => {
            crate::telegram::reviews::handle_review_message(bot, msg, deps, state).await
        }
        AdminState::ManagerUserId => crate::telegram::managers::handle_manager_message(bot, msg, deps).await,
    }
}

async fn handle_category_name(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let name = msg.text().unwrap_or_default().trim().to_string();
    if name.is_empty() {
        bot.send_message(msg.chat.id, "Название не может быть пустым. Введите ещё раз")
            .await?;
        return Ok(());
    }

    let created = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| create_category(&conn, &name).ok());

    deps.admin_forms.clear(msg.chat.id.0);
    let reply = match created {
        Some(Some(_)) => "Категория добавлена",
        Some(None) => "Такая категория уже существует",
        None => "Не удалось сохранить категорию",
    };
    send_html(bot, msg.chat.id, reply, Some(keyboards::admin_menu())).await
}

async fn handle_product_title(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let title = msg.text().unwrap_or_default().trim().to_string();
    if title.is_empty() {
        bot.send_message(msg.chat.id, "Введите название товара").await?;
        return Ok(());
    }
    deps.admin_forms.set(msg.chat.id.0, AdminState::ProductDescription { title });
    bot.send_message(msg.chat.id, "Введите описание (или отправьте '-' чтобы пропустить)")
        .await?;
    Ok(())
}

async fn handle_product_description(bot: &Bot, msg: &Message, deps: &HandlerDeps, title: String) -> ResponseResult<()> {
    let text = msg.text().unwrap_or_default().trim();
    let description = if text == "-" { None } else { Some(text.to_string()) };
    deps.admin_forms
        .set(msg.chat.id.0, AdminState::ProductPhoto { title, description });
    bot.send_message(
        msg.chat.id,
        "Пришлите фото товара (как фото, не как файл). Можно пропустить '-'",
    )
    .await?;
    Ok(())
}

async fn handle_product_photo(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    title: String,
    description: Option<String>,
) -> ResponseResult<()> {
    let photo_file_id = if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        Some(photo.file.id.0.clone())
    } else if msg.text().map(str::trim) == Some("-") {
        None
    } else {
        bot.send_message(msg.chat.id, "Пришлите фото или '-' для пропуска").await?;
        return Ok(());
    };

    deps.admin_forms.set(
        msg.chat.id.0,
        AdminState::ProductPrice {
            title,
            description,
            photo_file_id,
        },
    );
    bot.send_message(msg.chat.id, "Введите цену, например 199.99").await?;
    Ok(())
}

async fn handle_product_price(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    title: String,
    description: Option<String>,
    photo_file_id: Option<String>,
) -> ResponseResult<()> {
    let Ok(price) = parse_price(msg.text().unwrap_or_default()) else {
        bot.send_message(msg.chat.id, "Неверная цена. Введите ещё раз, например 199.99")
            .await?;
        return Ok(());
    };

    let draft = ProductDraft {
        title,
        description,
        photo_file_id,
        price,
        in_stock: true,
    };
    deps.admin_forms
        .set(msg.chat.id.0, AdminState::ProductAvailability { draft });
    bot.send_message(msg.chat.id, "Товар в наличии?")
        .reply_markup(keyboards::admin_availability())
        .await?;
    Ok(())
}

/// Shared shape of the single-field edit steps: load, mutate, confirm.
async fn finish_edit(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    product_id: i64,
    updated: Result<usize, AppError>,
    confirmation: &str,
) -> ResponseResult<()> {
    deps.admin_forms.clear(msg.chat.id.0);
    match updated {
        Ok(0) => send_html(bot, msg.chat.id, "Товар не найден", Some(keyboards::admin_menu())).await,
        Ok(_) => {
            send_html(
                bot,
                msg.chat.id,
                confirmation,
                Some(keyboards::admin_product_edit(product_id)),
            )
            .await
        }
        Err(e) => {
            log::error!("Failed to update product {}: {}", product_id, e);
            send_html(bot, msg.chat.id, "Не удалось сохранить", Some(keyboards::admin_menu())).await
        }
    }
}

async fn handle_edit_title(bot: &Bot, msg: &Message, deps: &HandlerDeps, product_id: i64) -> ResponseResult<()> {
    let title = msg.text().unwrap_or_default().trim().to_string();
    if title.is_empty() {
        bot.send_message(msg.chat.id, "Введите новое название").await?;
        return Ok(());
    }
    let updated = get_connection(&deps.db_pool)
        .map_err(AppError::from)
        .and_then(|conn| catalog::update_product_title(&conn, product_id, &title).map_err(AppError::from));
    finish_edit(bot, msg, deps, product_id, updated, "Название обновлено").await
}

async fn handle_edit_description(bot: &Bot, msg: &Message, deps: &HandlerDeps, product_id: i64) -> ResponseResult<()> {
    let text = msg.text().unwrap_or_default().trim();
    let description = if text == "-" { None } else { Some(text) };
    let updated = get_connection(&deps.db_pool)
        .map_err(AppError::from)
        .and_then(|conn| catalog::update_product_description(&conn, product_id, description).map_err(AppError::from));
    finish_edit(bot, msg, deps, product_id, updated, "Описание обновлено").await
}

async fn handle_edit_price(bot: &Bot, msg: &Message, deps: &HandlerDeps, product_id: i64) -> ResponseResult<()> {
    let Ok(price) = parse_price(msg.text().unwrap_or_default()) else {
        bot.send_message(msg.chat.id, "Неверная цена").await?;
        return Ok(());
    };
    let updated = get_connection(&deps.db_pool)
        .map_err(AppError::from)
        .and_then(|conn| catalog::update_product_price(&conn, product_id, price).map_err(AppError::from));
    finish_edit(bot, msg, deps, product_id, updated, "Цена обновлена").await
}

async fn handle_edit_stock(bot: &Bot, msg: &Message, deps: &HandlerDeps, product_id: i64) -> ResponseResult<()> {
    let Ok(qty) = msg.text().unwrap_or_default().trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Неверное число").await?;
        return Ok(());
    };
    let updated = get_connection(&deps.db_pool)
        .map_err(AppError::from)
        .and_then(|conn| catalog::update_product_stock_qty(&conn, product_id, qty).map_err(AppError::from));
    finish_edit(bot, msg, deps, product_id, updated, "Остаток обновлён").await
}

async fn handle_edit_bulk_price(bot: &Bot, msg: &Message, deps: &HandlerDeps, product_id: i64) -> ResponseResult<()> {
    let text = msg.text().unwrap_or_default().trim().to_string();
    let bulk_price = if text == "-" {
        None
    } else {
        match parse_price(&text) {
            Ok(price) => Some(price),
            Err(()) => {
                bot.send_message(msg.chat.id, "Неверная цена").await?;
                return Ok(());
            }
        }
    };
    let updated = get_connection(&deps.db_pool)
        .map_err(AppError::from)
        .and_then(|conn| catalog::update_product_bulk_price(&conn, product_id, bulk_price).map_err(AppError::from));
    finish_edit(bot, msg, deps, product_id, updated, "Оптовая цена обновлена").await
}

async fn handle_edit_bulk_threshold(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    let text = msg.text().unwrap_or_default().trim().to_string();
    let threshold = if text == "-" {
        None
    } else {
        match text.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                bot.send_message(msg.chat.id, "Неверное число").await?;
                return Ok(());
            }
        }
    };
    let updated = get_connection(&deps.db_pool)
        .map_err(AppError::from)
        .and_then(|conn| catalog::update_product_bulk_threshold(&conn, product_id, threshold).map_err(AppError::from));
    finish_edit(bot, msg, deps, product_id, updated, "Оптовый порог обновлён").await
}

async fn handle_flavor_name(bot: &Bot, msg: &Message, deps: &HandlerDeps, product_id: i64) -> ResponseResult<()> {
    let name = msg.text().unwrap_or_default().trim().to_string();
    if name.is_empty() {
        bot.send_message(msg.chat.id, "Введите название вкуса").await?;
        return Ok(());
    }

    deps.admin_forms.clear(msg.chat.id.0);
    match get_connection(&deps.db_pool) {
        Ok(conn) => match create_flavor(&conn, product_id, &name) {
            Ok(_) => {
                let flavors = list_flavors(&conn, product_id).unwrap_or_default();
                send_html(
                    bot,
                    msg.chat.id,
                    "Вкус добавлен",
                    Some(keyboards::admin_flavors(product_id, &flavors)),
                )
                .await?;
            }
            Err(e) => {
                log::error!("Failed to create flavor for product {}: {}", product_id, e);
                send_html(bot, msg.chat.id, "Не удалось сохранить вкус", Some(keyboards::admin_menu())).await?;
            }
        },
        Err(e) => {
            log::error!("No DB connection for flavor creation: {}", e);
            send_html(bot, msg.chat.id, "Не удалось сохранить вкус", Some(keyboards::admin_menu())).await?;
        }
    }
    Ok(())
}

// --- Callback-side handlers ---

pub async fn open_admin_menu(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
) -> ResponseResult<()> {
    safe_edit(bot, chat_id, message_id, "Админ меню", Some(keyboards::admin_menu())).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn start_product_wizard(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    deps.admin_forms.clear(chat_id.0);
    deps.admin_forms.set(chat_id.0, AdminState::ProductTitle);
    safe_edit(bot, chat_id, message_id, "Введите название товара", None).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn start_category_form(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    deps.admin_forms.clear(chat_id.0);
    deps.admin_forms.set(chat_id.0, AdminState::CategoryName);
    safe_edit(bot, chat_id, message_id, "Отправьте название категории", None).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn show_category_list(
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
    let text = if cats.is_empty() {
        "Категорий нет".to_string()
    } else {
        cats.iter()
            .map(|c| format!("{}: {}", c.id, html::escape(&c.name)))
            .collect::<Vec<_>>()
            .join("\n")
    };
    safe_edit(bot, chat_id, message_id, &text, Some(keyboards::admin_menu())).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn show_product_list(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    let products = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_products(&conn).ok())
        .unwrap_or_default();
    if products.is_empty() {
        safe_edit(bot, chat_id, message_id, "Товаров нет", Some(keyboards::admin_menu())).await?;
    } else {
        safe_edit(
            bot,
            chat_id,
            message_id,
            "Выберите товар для редактирования:",
            Some(keyboards::admin_products(&products)),
        )
        .await?;
    }
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn show_archived_list(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
) -> ResponseResult<()> {
    let products = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_archived_products(&conn).ok())
        .unwrap_or_default();
    if products.is_empty() {
        safe_edit(bot, chat_id, message_id, "Архив пуст", Some(keyboards::admin_menu())).await?;
    } else {
        safe_edit(
            bot,
            chat_id,
            message_id,
            "Архив товаров:",
            Some(keyboards::admin_archived_products(&products)),
        )
        .await?;
    }
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn open_product_editor(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    let product = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| get_product(&conn, product_id).ok())
        .flatten();
    let kb = keyboards::admin_product_edit(product_id);

    match product {
        Some(product) => {
            let mut caption = vec![format!("<b>{}</b>", html::escape(&product.title))];
            if let Some(description) = &product.description {
                caption.push(html::escape(description));
            }
            caption.push(format!("Цена: {:.2}", product.price));
            if let (Some(threshold), Some(bulk)) = (product.bulk_threshold, product.bulk_price) {
                caption.push(format!("Опт: от {} шт. по {:.2}", threshold, bulk));
            }
            let text = caption.join("\n");

            if let Some(photo) = product.photo_file_id.clone() {
                let _ = bot.delete_message(chat_id, message_id).await;
                let sent = bot
                    .send_photo(chat_id, InputFile::file_id(FileId(photo)))
                    .caption(text.clone())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(kb.clone())
                    .await;
                if sent.is_err() {
                    send_html(bot, chat_id, &text, Some(kb)).await?;
                }
            } else {
                safe_edit(bot, chat_id, message_id, &text, Some(kb)).await?;
            }
        }
        None => {
            safe_edit(bot, chat_id, message_id, "Товар не найден", Some(keyboards::admin_menu())).await?;
        }
    }
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Availability picked in the creation wizard; next step is the category.
pub async fn pick_availability(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    in_stock: bool,
) -> ResponseResult<()> {
    let Some(AdminState::ProductAvailability { mut draft }) = deps.admin_forms.get(chat_id.0) else {
        answer_silent(bot, callback_id).await;
        return Ok(());
    };
    draft.in_stock = in_stock;

    let cats = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_categories(&conn).ok())
        .unwrap_or_default();
    if cats.is_empty() {
        deps.admin_forms.clear(chat_id.0);
        safe_edit(
            bot,
            chat_id,
            message_id,
            "Сначала создайте категорию: /addcat Название",
            Some(keyboards::admin_menu()),
        )
        .await?;
        answer_silent(bot, callback_id).await;
        return Ok(());
    }

    deps.admin_forms.set(chat_id.0, AdminState::ProductCategory { draft });
    safe_edit(
        bot,
        chat_id,
        message_id,
        "Выберите категорию",
        Some(keyboards::admin_categories_pick(&cats)),
    )
    .await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Category picked; the wizard persists the draft.
pub async fn pick_category(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    category_id: i64,
) -> ResponseResult<()> {
    let Some(AdminState::ProductCategory { draft }) = deps.admin_forms.get(chat_id.0) else {
        answer_silent(bot, callback_id).await;
        return Ok(());
    };
    deps.admin_forms.clear(chat_id.0);

    let created = get_connection(&deps.db_pool).ok().and_then(|conn| {
        create_product(
            &conn,
            &NewProduct {
                title: &draft.title,
                description: draft.description.as_deref(),
                price: draft.price,
                photo_file_id: draft.photo_file_id.as_deref(),
                in_stock: draft.in_stock,
                category_id: Some(category_id),
            },
        )
        .ok()
    });

    let text = if created.is_some() {
        "Товар создан ✅"
    } else {
        "Не удалось создать товар"
    };
    safe_edit(bot, chat_id, message_id, text, Some(keyboards::admin_menu())).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

/// Arms a single-field edit form and prompts for the value.
pub async fn start_edit(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    field: &str,
    product_id: i64,
) -> ResponseResult<()> {
    let (state, prompt) = match field {
        "title" => (AdminState::EditTitle { product_id }, "Введите новое название"),
        "desc" => (
            AdminState::EditDescription { product_id },
            "Введите новое описание (или '-' чтобы очистить)",
        ),
        "price" => (AdminState::EditPrice { product_id }, "Введите новую цену, например 199.99"),
        "stock" => (
            AdminState::EditStock { product_id },
            "Введите остаток на складе (целое число)",
        ),
        "bulk_price" => (
            AdminState::EditBulkPrice { product_id },
            "Введите оптовую цену, например 149.99 (или '-' чтобы очистить)",
        ),
        "bulk_threshold" => (
            AdminState::EditBulkThreshold { product_id },
            "Введите оптовый порог (целое число, '-' чтобы очистить)",
        ),
        _ => {
            answer_silent(bot, callback_id).await;
            return Ok(());
        }
    };

    deps.admin_forms.clear(chat_id.0);
    deps.admin_forms.set(chat_id.0, state);
    safe_edit(bot, chat_id, message_id, prompt, None).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn toggle_in_stock(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    let toggled = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| toggle_product_in_stock(&conn, product_id).ok())
        .flatten();
    let text = match toggled {
        Some(true) => "Наличие: есть",
        Some(false) => "Наличие: нет",
        None => "Товар не найден",
    };
    safe_edit(bot, chat_id, message_id, text, Some(keyboards::admin_product_edit(product_id))).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn start_category_reassign(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    let cats = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_categories(&conn).ok())
        .unwrap_or_default();
    if cats.is_empty() {
        safe_edit(bot, chat_id, message_id, "Категорий нет", Some(keyboards::admin_menu())).await?;
    } else {
        safe_edit(
            bot,
            chat_id,
            message_id,
            "Выберите новую категорию",
            Some(keyboards::admin_categories_reassign(product_id, &cats)),
        )
        .await?;
    }
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn reassign_category(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
    category_id: i64,
) -> ResponseResult<()> {
    let updated = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| catalog::update_product_category(&conn, product_id, category_id).ok())
        .unwrap_or(0);
    let text = if updated > 0 { "Категория обновлена" } else { "Товар не найден" };
    safe_edit(bot, chat_id, message_id, text, Some(keyboards::admin_product_edit(product_id))).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn show_flavor_admin(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    let flavors = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| list_flavors(&conn, product_id).ok())
        .unwrap_or_default();
    let text = if flavors.is_empty() {
        "Вкусов пока нет"
    } else {
        "Вкусы товара (нажмите, чтобы переключить доступность):"
    };
    safe_edit(
        bot,
        chat_id,
        message_id,
        text,
        Some(keyboards::admin_flavors(product_id, &flavors)),
    )
    .await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn start_flavor_form(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    deps.admin_forms.clear(chat_id.0);
    deps.admin_forms.set(chat_id.0, AdminState::FlavorName { product_id });
    safe_edit(bot, chat_id, message_id, "Введите название вкуса", None).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn toggle_flavor(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
    flavor_id: i64,
) -> ResponseResult<()> {
    if let Ok(conn) = get_connection(&deps.db_pool) {
        if let Err(e) = toggle_flavor_availability(&conn, flavor_id) {
            log::error!("Failed to toggle flavor {}: {}", flavor_id, e);
        }
    }
    show_flavor_admin(bot, callback_id, chat_id, message_id, deps, product_id).await
}

pub async fn delete_product_flavors(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    match get_connection(&deps.db_pool) {
        Ok(mut conn) => {
            if let Err(e) = catalog::delete_flavors(&mut conn, product_id) {
                log::error!("Failed to delete flavors of product {}: {}", product_id, e);
            }
        }
        Err(e) => log::error!("No DB connection for flavor deletion: {}", e),
    }
    show_flavor_admin(bot, callback_id, chat_id, message_id, deps, product_id).await
}

/// "🗃 В архив": soft delete, order lines keep their reference.
pub async fn archive(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    let archived = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| archive_product(&conn, product_id).ok())
        .unwrap_or(0);
    let text = if archived > 0 { "Товар отправлен в архив" } else { "Товар не найден" };
    safe_edit(bot, chat_id, message_id, text, Some(keyboards::admin_menu())).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

pub async fn restore(
    bot: &Bot,
    callback_id: &CallbackQueryId,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    product_id: i64,
) -> ResponseResult<()> {
    let restored = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| restore_product(&conn, product_id).ok())
        .unwrap_or(0);
    let text = if restored > 0 { "Товар возвращён из архива" } else { "Товар не найден" };
    safe_edit(bot, chat_id, message_id, text, Some(keyboards::admin_menu())).await?;
    answer_silent(bot, callback_id).await;
    Ok(())
}

// --- Hidden text commands ---

/// `/addcat Название` — quick category creation without the form.
pub async fn handle_addcat_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let text = msg.text().unwrap_or_default();
    let Some(name) = text.strip_prefix("/addcat").map(str::trim).filter(|s| !s.is_empty()) else {
        send_html(
            bot,
            msg.chat.id,
            "Использование: /addcat НазваниеКатегории",
            Some(keyboards::admin_menu()),
        )
        .await?;
        return Ok(());
    };

    let created = get_connection(&deps.db_pool)
        .ok()
        .and_then(|conn| create_category(&conn, name).ok());
    let reply = match created {
        Some(Some(_)) => "Категория добавлена",
        Some(None) => "Такая категория уже существует",
        None => "Не удалось сохранить категорию",
    };
    send_html(bot, msg.chat.id, reply, Some(keyboards::admin_menu())).await
}

/// `/purgeproduct <id>` — hard delete with explicit cascade: order lines
/// and flavors first, then the product itself.
pub async fn handle_purgeproduct_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let text = msg.text().unwrap_or_default();
    let id = text
        .strip_prefix("/purgeproduct")
        .map(str::trim)
        .and_then(|s| s.parse::<i64>().ok());
    let Some(product_id) = id else {
        send_html(
            bot,
            msg.chat.id,
            "Использование: /purgeproduct <id>",
            Some(keyboards::admin_menu()),
        )
        .await?;
        return Ok(());
    };

    let purged = match get_connection(&deps.db_pool) {
        Ok(mut conn) => purge_product(&mut conn, product_id).unwrap_or(false),
        Err(e) => {
            log::error!("No DB connection for purge of product {}: {}", product_id, e);
            false
        }
    };
    let reply = if purged {
        "Товар удалён безвозвратно"
    } else {
        "Товар не найден"
    };
    send_html(bot, msg.chat.id, reply, Some(keyboards::admin_menu())).await
}
