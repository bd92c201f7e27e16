use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display
/// formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Add-to-cart attempted on a flavor-bearing product without a flavor
    #[error("Flavor selection required")]
    FlavorRequired,

    /// Requested entity does not exist (or is soft-deleted)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Checkout confirmation attempted with no lines in the cart
    #[error("Cart is empty")]
    EmptyCart,

    /// User input that cannot be parsed (price, quantity, phone)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
