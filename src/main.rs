use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use lavka::cli::{Cli, Commands};
use lavka::core::{config, init_logger};
use lavka::storage::managers::list_manager_ids;
use lavka::storage::{create_pool, get_connection};
use lavka::telegram::admin::AdminFlow;
use lavka::telegram::{create_bot, schema, setup_bot_commands, CheckoutFlow, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Migrate) => run_migrate(),
        Some(Commands::Run) | None => run_bot().await,
    }
}

/// Apply migrations and exit — useful for deploy hooks.
fn run_migrate() -> Result<()> {
    let _pool = create_pool(&config::DATABASE_PATH)?;
    log::info!("Migrations applied to {}", config::DATABASE_PATH.as_str());
    Ok(())
}

/// Run the Telegram bot in long polling mode.
async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");

    // Create database connection pool (runs migrations)
    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    // Managers registered in the DB get runtime admin access on top of the
    // ADMIN_IDS allow-list.
    match get_connection(&db_pool) {
        Ok(conn) => match list_manager_ids(&conn) {
            Ok(ids) => {
                for id in ids {
                    config::admin::grant(id);
                }
            }
            Err(e) => log::warn!("Failed to load managers for allow-list seeding: {}", e),
        },
        Err(e) => log::warn!("No DB connection for allow-list seeding: {}", e),
    }

    let bot = create_bot()?;

    let me = bot.get_me().await?;
    log::info!("Bot username: {:?}, Bot ID: {}", me.username, me.id);

    setup_bot_commands(&bot).await?;

    let handler_deps = HandlerDeps::new(
        Arc::clone(&db_pool),
        Arc::new(CheckoutFlow::new()),
        Arc::new(AdminFlow::new()),
    );
    let handler = schema(handler_deps);

    log::info!("Starting bot in long polling mode");

    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
