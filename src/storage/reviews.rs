//! Отзывы: фото или видео с подписью, добавляются администратором.

use rusqlite::Result;

use super::db::DbConnection;

pub struct Review {
    pub id: i64,
    /// 'photo' | 'video'
    pub media_type: String,
    pub file_id: String,
    pub caption: Option<String>,
}

pub fn create_review(conn: &DbConnection, media_type: &str, file_id: &str, caption: Option<&str>) -> Result<i64> {
    conn.execute(
        "INSERT INTO reviews (media_type, file_id, caption) VALUES (?1, ?2, ?3)",
        (media_type, file_id, caption),
    )?;
    Ok(conn.last_insert_rowid())
}

/// Последние отзывы, новые первыми.
pub fn list_recent_reviews(conn: &DbConnection, limit: i64) -> Result<Vec<Review>> {
    let mut stmt = conn.prepare(
        "SELECT id, media_type, file_id, caption FROM reviews ORDER BY created_at DESC, id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok(Review {
            id: row.get(0)?,
            media_type: row.get(1)?,
            file_id: row.get(2)?,
            caption: row.get(3)?,
        })
    })?;
    rows.collect()
}
