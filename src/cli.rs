use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lavka")]
#[command(author, version, about = "Telegram storefront bot — catalog, cart and checkout", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot
    Run,

    /// Apply database migrations and exit
    Migrate,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
