//! Каталог: категории, товары и вкусы.
//!
//! Чтение идёт из пользовательских обработчиков и корзины, запись — из
//! админских форм. Мягкое удаление (`is_deleted`) скрывает товар из
//! каталога, не ломая ссылки из строк заказов.

use rusqlite::{OptionalExtension, Result};

use super::db::DbConnection;

pub struct Category {
    pub id: i64,
    pub name: String,
}

pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub bulk_threshold: Option<i64>,
    pub bulk_price: Option<f64>,
    pub stock_qty: i64,
    pub in_stock: bool,
    pub is_deleted: bool,
    pub photo_file_id: Option<String>,
    pub category_id: Option<i64>,
}

pub struct Flavor {
    pub id: i64,
    pub name: String,
    pub product_id: i64,
    pub is_available: bool,
}

pub(crate) const PRODUCT_COLUMNS: &str = "id, title, description, price, bulk_threshold, bulk_price, \
     stock_qty, in_stock, is_deleted, photo_file_id, category_id";

pub(crate) fn product_from_row(row: &rusqlite::Row<'_>) -> Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        bulk_threshold: row.get(4)?,
        bulk_price: row.get(5)?,
        stock_qty: row.get(6)?,
        in_stock: row.get::<_, i64>(7)? != 0,
        is_deleted: row.get::<_, i64>(8)? != 0,
        photo_file_id: row.get(9)?,
        category_id: row.get(10)?,
    })
}

// --- Категории ---

/// Создаёт категорию. Возвращает `Ok(None)`, если имя уже занято.
pub fn create_category(conn: &DbConnection, name: &str) -> Result<Option<i64>> {
    let inserted = conn.execute("INSERT OR IGNORE INTO categories (name) VALUES (?1)", [name])?;
    if inserted == 0 {
        return Ok(None);
    }
    Ok(Some(conn.last_insert_rowid()))
}

/// Список категорий, отсортированный по имени.
pub fn list_categories(conn: &DbConnection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

pub fn get_category(conn: &DbConnection, id: i64) -> Result<Option<Category>> {
    conn.query_row("SELECT id, name FROM categories WHERE id = ?1", [id], |row| {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })
    .optional()
}

// --- Товары ---

/// Получает товар по ID. Мягко удалённые товары не возвращаются.
pub fn get_product(conn: &DbConnection, id: i64) -> Result<Option<Product>> {
    conn.query_row(
        &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_deleted = 0"),
        [id],
        product_from_row,
    )
    .optional()
}

/// Товары категории, доступные покупателю (в наличии, не удалённые).
pub fn list_products_by_category(conn: &DbConnection, category_id: i64) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products
         WHERE category_id = ?1 AND in_stock = 1 AND is_deleted = 0
         ORDER BY title"
    ))?;
    let rows = stmt.query_map([category_id], product_from_row)?;
    rows.collect()
}

/// Все неудалённые товары (админский список).
pub fn list_products(conn: &DbConnection) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_deleted = 0 ORDER BY title"
    ))?;
    let rows = stmt.query_map([], product_from_row)?;
    rows.collect()
}

/// Архив: мягко удалённые товары.
pub fn list_archived_products(conn: &DbConnection) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_deleted = 1 ORDER BY title"
    ))?;
    let rows = stmt.query_map([], product_from_row)?;
    rows.collect()
}

pub struct NewProduct<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub price: f64,
    pub photo_file_id: Option<&'a str>,
    pub in_stock: bool,
    pub category_id: Option<i64>,
}

pub fn create_product(conn: &DbConnection, product: &NewProduct<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO products (title, description, price, photo_file_id, in_stock, category_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            product.title,
            product.description,
            product.price,
            product.photo_file_id,
            product.in_stock as i64,
            product.category_id,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_product_title(conn: &DbConnection, id: i64, title: &str) -> Result<usize> {
    conn.execute("UPDATE products SET title = ?1 WHERE id = ?2", (title, id))
}

pub fn update_product_description(conn: &DbConnection, id: i64, description: Option<&str>) -> Result<usize> {
    conn.execute("UPDATE products SET description = ?1 WHERE id = ?2", (description, id))
}

pub fn update_product_price(conn: &DbConnection, id: i64, price: f64) -> Result<usize> {
    conn.execute("UPDATE products SET price = ?1 WHERE id = ?2", (price, id))
}

pub fn update_product_stock_qty(conn: &DbConnection, id: i64, qty: i64) -> Result<usize> {
    conn.execute("UPDATE products SET stock_qty = ?1 WHERE id = ?2", (qty, id))
}

pub fn update_product_bulk_price(conn: &DbConnection, id: i64, bulk_price: Option<f64>) -> Result<usize> {
    conn.execute("UPDATE products SET bulk_price = ?1 WHERE id = ?2", (bulk_price, id))
}

pub fn update_product_bulk_threshold(conn: &DbConnection, id: i64, threshold: Option<i64>) -> Result<usize> {
    conn.execute("UPDATE products SET bulk_threshold = ?1 WHERE id = ?2", (threshold, id))
}

pub fn update_product_photo(conn: &DbConnection, id: i64, photo_file_id: &str) -> Result<usize> {
    conn.execute("UPDATE products SET photo_file_id = ?1 WHERE id = ?2", (photo_file_id, id))
}

pub fn update_product_category(conn: &DbConnection, id: i64, category_id: i64) -> Result<usize> {
    conn.execute("UPDATE products SET category_id = ?1 WHERE id = ?2", (category_id, id))
}

/// Переключает флаг наличия. Возвращает новое значение.
pub fn toggle_product_in_stock(conn: &DbConnection, id: i64) -> Result<Option<bool>> {
    conn.execute("UPDATE products SET in_stock = NOT in_stock WHERE id = ?1", [id])?;
    conn.query_row("SELECT in_stock FROM products WHERE id = ?1", [id], |row| {
        Ok(row.get::<_, i64>(0)? != 0)
    })
    .optional()
}

/// Мягкое удаление: товар уходит в архив, строки заказов остаются валидными.
pub fn archive_product(conn: &DbConnection, id: i64) -> Result<usize> {
    conn.execute("UPDATE products SET is_deleted = 1 WHERE id = ?1", [id])
}

/// Возвращает товар из архива.
pub fn restore_product(conn: &DbConnection, id: i64) -> Result<usize> {
    conn.execute("UPDATE products SET is_deleted = 0 WHERE id = ?1", [id])
}

/// Жёсткое удаление: сперва строки заказов и вкусы, затем сам товар.
/// Одна транзакция, чтобы не оставить заказы с битой ссылкой.
pub fn purge_product(conn: &mut DbConnection, id: i64) -> Result<bool> {
    let tx = tx_immediate(conn)?;
    tx.execute("DELETE FROM order_items WHERE product_id = ?1", [id])?;
    tx.execute("DELETE FROM flavors WHERE product_id = ?1", [id])?;
    let deleted = tx.execute("DELETE FROM products WHERE id = ?1", [id])?;
    tx.commit()?;
    Ok(deleted > 0)
}

// --- Вкусы ---

/// Доступные вкусы товара. Непустой список делает выбор вкуса обязательным
/// перед добавлением в корзину.
pub fn list_available_flavors(conn: &DbConnection, product_id: i64) -> Result<Vec<Flavor>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, product_id, is_available FROM flavors
         WHERE product_id = ?1 AND is_available = 1
         ORDER BY id",
    )?;
    let rows = stmt.query_map([product_id], flavor_from_row)?;
    rows.collect()
}

/// Все вкусы товара, включая отключённые (админский список).
pub fn list_flavors(conn: &DbConnection, product_id: i64) -> Result<Vec<Flavor>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, product_id, is_available FROM flavors WHERE product_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([product_id], flavor_from_row)?;
    rows.collect()
}

fn flavor_from_row(row: &rusqlite::Row<'_>) -> Result<Flavor> {
    Ok(Flavor {
        id: row.get(0)?,
        name: row.get(1)?,
        product_id: row.get(2)?,
        is_available: row.get::<_, i64>(3)? != 0,
    })
}

pub fn get_flavor(conn: &DbConnection, id: i64) -> Result<Option<Flavor>> {
    conn.query_row(
        "SELECT id, name, product_id, is_available FROM flavors WHERE id = ?1",
        [id],
        flavor_from_row,
    )
    .optional()
}

pub fn create_flavor(conn: &DbConnection, product_id: i64, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO flavors (product_id, name) VALUES (?1, ?2)",
        (product_id, name),
    )?;
    Ok(conn.last_insert_rowid())
}

/// Переключает доступность вкуса. Возвращает новое значение.
pub fn toggle_flavor_availability(conn: &DbConnection, id: i64) -> Result<Option<bool>> {
    conn.execute("UPDATE flavors SET is_available = NOT is_available WHERE id = ?1", [id])?;
    conn.query_row("SELECT is_available FROM flavors WHERE id = ?1", [id], |row| {
        Ok(row.get::<_, i64>(0)? != 0)
    })
    .optional()
}

/// Удаляет вкусы товара, на которые не ссылаются строки заказов; остальные
/// только отключает, чтобы не ломать историю заказов.
pub fn delete_flavors(conn: &mut DbConnection, product_id: i64) -> Result<()> {
    let tx = tx_immediate(conn)?;
    tx.execute(
        "DELETE FROM flavors
         WHERE product_id = ?1
           AND id NOT IN (SELECT flavor_id FROM order_items WHERE flavor_id IS NOT NULL)",
        [product_id],
    )?;
    tx.execute("UPDATE flavors SET is_available = 0 WHERE product_id = ?1", [product_id])?;
    tx.commit()?;
    Ok(())
}

pub(crate) fn tx_immediate(conn: &mut DbConnection) -> Result<rusqlite::Transaction<'_>> {
    conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
}
