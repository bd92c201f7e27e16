//! Two-tier branding resolver.
//!
//! Precedence, per field: branding DB row (admin override) → config default
//! from the environment → built-in welcome text. Call sites get one resolved
//! value instead of re-implementing the fallback chain.

use crate::core::config;
use crate::storage::branding::get_branding;
use crate::storage::DbConnection;

pub const DEFAULT_WELCOME_TEXT: &str = "Добро пожаловать! Выберите раздел ниже, чтобы начать покупки.";

/// Resolved branding values for the /start screen.
pub struct Branding {
    pub logo_file_id: Option<String>,
    pub welcome_text: String,
}

/// Resolves branding with the DB override applied on top of config defaults.
/// A failed DB read degrades to the defaults.
pub fn resolve(conn: &DbConnection) -> Branding {
    let row = match get_branding(conn) {
        Ok(row) => row,
        Err(e) => {
            log::warn!("Failed to read branding row, using defaults: {}", e);
            None
        }
    };

    let logo_file_id = row
        .as_ref()
        .and_then(|r| r.logo_file_id.clone())
        .or_else(|| config::branding::LOGO_FILE_ID.clone());
    let welcome_text = row
        .as_ref()
        .and_then(|r| r.welcome_text.clone())
        .or_else(|| config::branding::WELCOME_TEXT.clone())
        .unwrap_or_else(|| DEFAULT_WELCOME_TEXT.to_string());

    Branding {
        logo_file_id,
        welcome_text,
    }
}
