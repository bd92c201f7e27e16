//! Database access: pool, schema migrations and per-table queries

pub mod branding;
pub mod catalog;
pub mod db;
pub mod managers;
pub mod migrations;
pub mod orders;
pub mod reviews;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
