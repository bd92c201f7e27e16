//! Строка брендинга — синглтон с id = 1.

use rusqlite::{OptionalExtension, Result};

use super::db::DbConnection;

pub struct BrandingRow {
    pub logo_file_id: Option<String>,
    pub welcome_text: Option<String>,
}

pub fn get_branding(conn: &DbConnection) -> Result<Option<BrandingRow>> {
    conn.query_row(
        "SELECT logo_file_id, welcome_text FROM branding WHERE id = 1",
        [],
        |row| {
            Ok(BrandingRow {
                logo_file_id: row.get(0)?,
                welcome_text: row.get(1)?,
            })
        },
    )
    .optional()
}

pub fn set_logo(conn: &DbConnection, file_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO branding (id, logo_file_id) VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET logo_file_id = excluded.logo_file_id",
        [file_id],
    )?;
    Ok(())
}

pub fn set_welcome_text(conn: &DbConnection, text: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO branding (id, welcome_text) VALUES (1, ?1)
         ON CONFLICT(id) DO UPDATE SET welcome_text = excluded.welcome_text",
        [text],
    )?;
    Ok(())
}
