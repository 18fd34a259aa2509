//! Wraps teloxide::Bot and implements [`relay_core::Bot`]. Production code talks to Telegram; tests substitute another Bot impl.

use anyhow::Context;
use async_trait::async_trait;
use relay_core::{
    parse_message_id, quote_target, Bot as CoreBot, Chat, Message, RelayError, Result,
};
use teloxide::{
    payloads::SendMessageSetters,
    prelude::*,
    types::{ChatAction, ChatId, MessageId, ReplyParameters},
};
use tracing::{info, warn};

/// Builds the teloxide client. `api_url` (e.g. a mock server) replaces the default Bot API URL.
pub fn build_teloxide_bot(token: &str, api_url: Option<&str>) -> anyhow::Result<teloxide::Bot> {
    let bot = teloxide::Bot::new(token);
    match api_url {
        Some(url) => {
            let url = reqwest::Url::parse(url)
                .with_context(|| format!("invalid Telegram API URL: {}", url))?;
            Ok(bot.set_api_url(url))
        }
        None => Ok(bot),
    }
}

/// Calls getMe and returns the bot's username; `None` (logged) when the call fails.
pub async fn fetch_bot_username(bot: &teloxide::Bot) -> Option<String> {
    match bot.get_me().await {
        Ok(me) => {
            let username = me.user.username.clone();
            if let Some(username) = &username {
                info!(username = %username, "Bot username resolved");
            }
            username
        }
        Err(e) => {
            warn!(error = %e, "getMe failed; command mentions will not be checked");
            None
        }
    }
}

/// Thin wrapper around teloxide::Bot that implements the core Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }

    async fn send_answer(&self, message: &Message, text: &str) -> Result<teloxide::types::Message> {
        let request = self
            .bot
            .send_message(ChatId(message.chat.id), text.to_string());
        let request = match quote_target(message) {
            Some(id) => {
                let quoted = MessageId(parse_message_id(id)?);
                request.reply_parameters(ReplyParameters::new(quoted))
            }
            None => request,
        };
        request.await.map_err(bot_error)
    }
}

fn bot_error(e: teloxide::RequestError) -> RelayError {
    RelayError::Bot(e.to_string())
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(bot_error)?;
        Ok(())
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String> {
        let sent = self
            .bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(bot_error)?;
        Ok(sent.id.0.to_string())
    }

    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        self.send_answer(message, text).await?;
        Ok(())
    }

    async fn reply_to_and_return_id(&self, message: &Message, text: &str) -> Result<String> {
        let sent = self.send_answer(message, text).await?;
        Ok(sent.id.0.to_string())
    }

    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> Result<()> {
        let id = parse_message_id(message_id)?;
        self.bot
            .edit_message_text(ChatId(chat.id), MessageId(id), text.to_string())
            .await
            .map_err(bot_error)?;
        Ok(())
    }

    async fn delete_message(&self, chat: &Chat, message_id: &str) -> Result<()> {
        let id = parse_message_id(message_id)?;
        self.bot
            .delete_message(ChatId(chat.id), MessageId(id))
            .await
            .map_err(bot_error)?;
        Ok(())
    }

    async fn send_typing(&self, chat: &Chat) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat.id), ChatAction::Typing)
            .await
            .map_err(bot_error)?;
        Ok(())
    }
}
