//! Реестр менеджеров — получателей уведомлений о заказах.

use rusqlite::Result;

use super::db::DbConnection;

pub struct Manager {
    pub id: i64,
    pub user_id: i64,
}

/// Список менеджеров в порядке добавления.
pub fn list_managers(conn: &DbConnection) -> Result<Vec<Manager>> {
    let mut stmt = conn.prepare("SELECT id, user_id FROM managers ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Manager {
            id: row.get(0)?,
            user_id: row.get(1)?,
        })
    })?;
    rows.collect()
}

/// Chat id всех менеджеров (адресаты рассылки уведомлений).
pub fn list_manager_ids(conn: &DbConnection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT user_id FROM managers ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

/// Добавляет менеджера. Возвращает `false`, если такой уже есть.
pub fn add_manager(conn: &DbConnection, user_id: i64) -> Result<bool> {
    let inserted = conn.execute("INSERT OR IGNORE INTO managers (user_id) VALUES (?1)", [user_id])?;
    Ok(inserted > 0)
}

/// Удаляет менеджера. Возвращает `false`, если такого не было.
pub fn remove_manager(conn: &DbConnection, user_id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM managers WHERE user_id = ?1", [user_id])?;
    Ok(deleted > 0)
}
