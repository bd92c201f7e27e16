//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod branding;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod html;
pub mod keyboards;
pub mod managers;
pub mod notifications;
pub mod reviews;
pub mod schema;
pub mod types;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use checkout::CheckoutFlow;
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
