//! Lavka — Telegram storefront bot
//!
//! This library provides all the functionality for the Lavka bot: catalog
//! browsing, per-user carts, chat-driven checkout and the admin panel.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, pricing and branding
//! - `storage`: SQLite pool, migrations and per-table queries
//! - `telegram`: bot integration, dispatcher schema and handlers

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use crate::storage::{create_pool, get_connection, DbConnection, DbPool};
pub use crate::telegram::{schema, HandlerDeps};
