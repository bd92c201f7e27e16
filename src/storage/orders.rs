//! Корзина и заказы.
//!
//! Корзина — это заказ в статусе `new`: одна строка `orders` на
//! пользователя (частичный уникальный индекс `uq_orders_user_new`) плюс
//! строки `order_items`. Оформление переводит заказ в `submitted` ровно один
//! раз; после этого строки неизменяемы.
//!
//! Каждая операция открывает собственную короткую транзакцию
//! (`BEGIN IMMEDIATE`) — между взаимодействиями пользователя транзакций нет.

use rusqlite::OptionalExtension;

use crate::core::error::{AppError, AppResult};
use crate::core::pricing::unit_price;
use crate::storage::catalog::{tx_immediate, Product};
use crate::storage::db::DbConnection;

/// Строка корзины, соединённая с товаром и вкусом для отображения.
pub struct CartLine {
    pub product_id: i64,
    pub title: String,
    pub flavor: Option<String>,
    pub quantity: i64,
    /// Зафиксированная цена за единицу (снимок на момент добавления,
    /// см. политику переоценки в `add_cart_item`)
    pub unit_price: f64,
}

impl CartLine {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Корзина пользователя: заказ в статусе `new` со строками.
pub struct Cart {
    pub order_id: i64,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Итог корзины — всегда по зафиксированным ценам строк, без пересчёта
    /// через каталог.
    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }
}

/// Итог оформленного заказа для уведомления менеджеров.
pub struct OrderSummary {
    pub order_id: i64,
    pub customer_phone: String,
    pub lines: Vec<CartLine>,
}

impl OrderSummary {
    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }
}

fn load_product(conn: &rusqlite::Connection, product_id: i64) -> rusqlite::Result<Option<Product>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM products WHERE id = ?1 AND is_deleted = 0",
            crate::storage::catalog::PRODUCT_COLUMNS
        ),
        [product_id],
        crate::storage::catalog::product_from_row,
    )
    .optional()
}

/// Находит или создаёт корзину пользователя.
///
/// `INSERT OR IGNORE` против частичного уникального индекса: при гонке двух
/// одновременных добавлений вторая вставка молча проигрывает и оба запроса
/// видят одну и ту же строку.
fn ensure_cart(conn: &rusqlite::Connection, user_id: i64) -> rusqlite::Result<i64> {
    conn.execute("INSERT OR IGNORE INTO users (id) VALUES (?1)", [user_id])?;
    conn.execute(
        "INSERT OR IGNORE INTO orders (user_id, status) VALUES (?1, 'new')",
        [user_id],
    )?;
    conn.query_row(
        "SELECT id FROM orders WHERE user_id = ?1 AND status = 'new'",
        [user_id],
        |row| row.get(0),
    )
}

/// Добавляет товар в корзину пользователя.
///
/// Правила:
/// - товар должен существовать и не быть в архиве — иначе `NotFound`;
/// - у товара с доступными вкусами вкус обязателен — иначе `FlavorRequired`
///   без каких-либо изменений;
/// - переданный вкус должен принадлежать товару и быть доступным;
/// - строка на (заказ, товар, вкус) одна: повторное добавление увеличивает
///   количество и переоценивает строку по суммарному количеству, так что
///   оптовый порог, набранный несколькими добавлениями, даёт оптовую цену.
///   После этого цена строки заморожена: изменения цены товара на уже
///   набранные строки не влияют.
pub fn add_cart_item(
    conn: &mut DbConnection,
    user_id: i64,
    product_id: i64,
    flavor_id: Option<i64>,
    quantity: i64,
) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::InvalidInput(format!("quantity {quantity}")));
    }

    let tx = tx_immediate(conn)?;

    let product = load_product(&tx, product_id)?.ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let available_flavors: i64 = tx.query_row(
        "SELECT COUNT(*) FROM flavors WHERE product_id = ?1 AND is_available = 1",
        [product_id],
        |row| row.get(0),
    )?;

    match flavor_id {
        None if available_flavors > 0 => return Err(AppError::FlavorRequired),
        None => {}
        Some(fid) => {
            let belongs: i64 = tx.query_row(
                "SELECT COUNT(*) FROM flavors WHERE id = ?1 AND product_id = ?2 AND is_available = 1",
                [fid, product_id],
                |row| row.get(0),
            )?;
            if belongs == 0 {
                return Err(AppError::NotFound(format!("flavor {fid}")));
            }
        }
    }

    let order_id = ensure_cart(&tx, user_id)?;

    let existing: Option<(i64, i64)> = tx
        .query_row(
            "SELECT id, quantity FROM order_items
             WHERE order_id = ?1 AND product_id = ?2 AND COALESCE(flavor_id, 0) = COALESCE(?3, 0)",
            (order_id, product_id, flavor_id),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match existing {
        Some((item_id, old_qty)) => {
            let new_qty = old_qty + quantity;
            let price = unit_price(&product, new_qty);
            tx.execute(
                "UPDATE order_items SET quantity = ?1, unit_price = ?2 WHERE id = ?3",
                (new_qty, price, item_id),
            )?;
        }
        None => {
            let price = unit_price(&product, quantity);
            tx.execute(
                "INSERT INTO order_items (order_id, product_id, flavor_id, quantity, unit_price)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (order_id, product_id, flavor_id, quantity, price),
            )?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Загружает корзину пользователя со строками.
///
/// `Ok(None)` — корзины ещё нет. Пустая корзина (заказ есть, строк нет)
/// возвращается как `Cart` с пустым списком.
pub fn load_cart(conn: &DbConnection, user_id: i64) -> rusqlite::Result<Option<Cart>> {
    let order_id: Option<i64> = conn
        .query_row(
            "SELECT id FROM orders WHERE user_id = ?1 AND status = 'new'",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(order_id) = order_id else {
        return Ok(None);
    };

    Ok(Some(Cart {
        order_id,
        lines: load_lines(conn, order_id)?,
    }))
}

fn load_lines(conn: &rusqlite::Connection, order_id: i64) -> rusqlite::Result<Vec<CartLine>> {
    let mut stmt = conn.prepare(
        "SELECT oi.product_id, p.title, f.name, oi.quantity, oi.unit_price
         FROM order_items oi
         JOIN products p ON p.id = oi.product_id
         LEFT JOIN flavors f ON f.id = oi.flavor_id
         WHERE oi.order_id = ?1
         ORDER BY oi.id",
    )?;
    let rows = stmt.query_map([order_id], |row| {
        Ok(CartLine {
            product_id: row.get(0)?,
            title: row.get(1)?,
            flavor: row.get(2)?,
            quantity: row.get(3)?,
            unit_price: row.get(4)?,
        })
    })?;
    rows.collect()
}

/// Очищает корзину: строки удаляются, сама строка заказа остаётся и
/// переиспользуется при следующем добавлении.
pub fn clear_cart(conn: &DbConnection, user_id: i64) -> rusqlite::Result<()> {
    let order_id: Option<i64> = conn
        .query_row(
            "SELECT id FROM orders WHERE user_id = ?1 AND status = 'new'",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(order_id) = order_id {
        conn.execute("DELETE FROM order_items WHERE order_id = ?1", [order_id])?;
    }
    Ok(())
}

/// Оформляет корзину: единственная многошаговая операция, и она атомарна.
///
/// В одной транзакции перечитывает корзину; нет заказа или нет строк —
/// `EmptyCart`. Иначе `UPDATE ... WHERE id = ? AND status = 'new'`: страж по
/// статусу делает повторное подтверждение безвредным — второй вызов не
/// найдёт `new`-заказа и тоже получит `EmptyCart`. Доступность и цены при
/// оформлении не перепроверяются: действует то, что снято в строки.
pub fn finalize_order(conn: &mut DbConnection, user_id: i64, phone: &str) -> AppResult<OrderSummary> {
    let tx = tx_immediate(conn)?;

    let order_id: Option<i64> = tx
        .query_row(
            "SELECT id FROM orders WHERE user_id = ?1 AND status = 'new'",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(order_id) = order_id else {
        return Err(AppError::EmptyCart);
    };

    let lines = load_lines(&tx, order_id)?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let updated = tx.execute(
        "UPDATE orders SET status = 'submitted', customer_phone = ?1, customer_name = NULL
         WHERE id = ?2 AND status = 'new'",
        (phone, order_id),
    )?;
    if updated == 0 {
        return Err(AppError::EmptyCart);
    }

    tx.commit()?;

    Ok(OrderSummary {
        order_id,
        customer_phone: phone.to_string(),
        lines,
    })
}

/// Статус заказа (для проверок и тестов).
pub fn get_order_status(conn: &DbConnection, order_id: i64) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT status FROM orders WHERE id = ?1", [order_id], |row| row.get(0))
        .optional()
}

/// Количество оформленных заказов пользователя.
pub fn count_submitted_orders(conn: &DbConnection, user_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE user_id = ?1 AND status = 'submitted'",
        [user_id],
        |row| row.get(0),
    )
}
