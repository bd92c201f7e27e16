use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Result;

/// Структура, представляющая пользователя в базе данных.
pub struct User {
    /// Telegram ID пользователя (совпадает с chat id)
    pub id: i64,
    /// Имя пользователя из профиля Telegram
    pub first_name: Option<String>,
    /// Фамилия пользователя из профиля Telegram
    pub last_name: Option<String>,
    /// Телефон, указанный при оформлении заказа
    pub phone: Option<String>,
    /// Информационный флаг администратора (авторизация идёт через allow-list)
    pub is_admin: bool,
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and runs schema
/// migrations on the first connection.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
pub fn create_pool(database_path: &str) -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    let mut conn = pool.get()?;
    crate::storage::migrations::run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Создаёт пользователя, если его ещё нет, и обновляет имя из профиля.
///
/// Вызывается на /start и перед привязкой заказа — заказ всегда ссылается
/// на существующую строку пользователя.
pub fn upsert_user(conn: &DbConnection, id: i64, first_name: Option<&str>, last_name: Option<&str>) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, first_name, last_name) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
             first_name = COALESCE(excluded.first_name, first_name),
             last_name = COALESCE(excluded.last_name, last_name)",
        (id, first_name, last_name),
    )?;
    Ok(())
}

/// Получает пользователя по Telegram ID.
///
/// Возвращает `Ok(Some(User))` если пользователь найден, `Ok(None)` если нет.
pub fn get_user(conn: &DbConnection, id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare("SELECT id, first_name, last_name, phone, is_admin FROM users WHERE id = ?1")?;
    let mut rows = stmt.query([id])?;

    if let Some(row) = rows.next()? {
        Ok(Some(User {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            phone: row.get(3)?,
            is_admin: row.get::<_, i64>(4)? != 0,
        }))
    } else {
        Ok(None)
    }
}

/// Сохраняет телефон пользователя (шаг оформления заказа).
///
/// Пользователь может ещё не существовать, если оформление началось в обход
/// /start — тогда строка создаётся.
pub fn set_user_phone(conn: &DbConnection, id: i64, phone: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, phone) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET phone = excluded.phone",
        (id, phone),
    )?;
    Ok(())
}
