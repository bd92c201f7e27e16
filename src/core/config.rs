use once_cell::sync::Lazy;
use std::env;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: database.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Fallback chat for order notifications when no managers are registered
/// Read from MANAGER_CHAT_ID environment variable
pub static MANAGER_CHAT_ID: Lazy<Option<i64>> =
    Lazy::new(|| env::var("MANAGER_CHAT_ID").ok().and_then(|s| s.parse().ok()));

/// Branding defaults, overridden by the branding table row when present
/// (see `core::branding::resolve`)
pub mod branding {
    use super::*;

    /// Default logo file_id shown on /start
    pub static LOGO_FILE_ID: Lazy<Option<String>> = Lazy::new(|| env::var("LOGO_FILE_ID").ok());

    /// Default welcome text shown on /start
    pub static WELCOME_TEXT: Lazy<Option<String>> = Lazy::new(|| env::var("WELCOME_TEXT").ok());
}

/// Admin allow-list.
///
/// Parsed once from the ADMIN_IDS environment variable (comma-separated
/// Telegram user ids) into a set; the set is then the single source of truth
/// for authorization checks. Manager management mutates it through
/// `grant`/`revoke` — never by re-parsing a string at check time.
pub mod admin {
    use super::*;
    use std::collections::HashSet;
    use std::sync::RwLock;

    static STATIC_ADMIN_IDS: Lazy<HashSet<i64>> = Lazy::new(|| parse_ids(&env::var("ADMIN_IDS").unwrap_or_default()));

    static ADMIN_IDS: Lazy<RwLock<HashSet<i64>>> = Lazy::new(|| RwLock::new(STATIC_ADMIN_IDS.clone()));

    fn parse_ids(raw: &str) -> HashSet<i64> {
        raw.split(',').filter_map(|part| part.trim().parse::<i64>().ok()).collect()
    }

    /// Returns true if the user is allowed to use the admin panel.
    pub fn is_admin(user_id: i64) -> bool {
        ADMIN_IDS.read().map(|ids| ids.contains(&user_id)).unwrap_or(false)
    }

    /// Grants admin access at runtime (used when a manager is registered).
    pub fn grant(user_id: i64) {
        if let Ok(mut ids) = ADMIN_IDS.write() {
            ids.insert(user_id);
        }
    }

    /// Revokes runtime admin access. Ids listed in ADMIN_IDS itself are
    /// permanent and survive revocation.
    pub fn revoke(user_id: i64) {
        if STATIC_ADMIN_IDS.contains(&user_id) {
            return;
        }
        if let Ok(mut ids) = ADMIN_IDS.write() {
            ids.remove(&user_id);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_ids_handles_spaces_and_junk() {
            let ids = parse_ids(" 1, 22 ,abc,,333 ");
            assert!(ids.contains(&1));
            assert!(ids.contains(&22));
            assert!(ids.contains(&333));
            assert_eq!(ids.len(), 3);
        }

        #[test]
        fn test_grant_and_revoke() {
            assert!(!is_admin(987_654_321));
            grant(987_654_321);
            assert!(is_admin(987_654_321));
            revoke(987_654_321);
            assert!(!is_admin(987_654_321));
        }
    }
}
