//! Bot initialization and command definitions

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "показывает главное меню")]
    Start,
    #[command(description = "панель администратора")]
    Admin,
}

/// Creates a Bot instance from the BOT_TOKEN/TELOXIDE_TOKEN environment.
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = crate::core::config::BOT_TOKEN.clone();
    if token.is_empty() {
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }
    Ok(Bot::new(token))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![BotCommand::new("start", "показывает главное меню")])
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_descriptions() {
        let commands = Command::descriptions();
        let command_list = format!("{}", commands);

        assert!(command_list.contains("Я умею"));
        assert!(command_list.contains("start"));
    }
}
