//! `/start` handler: sends a fixed greeting.

use async_trait::async_trait;
use relay_core::{Bot, Handler, HandlerResponse, Message, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const GREETING: &str =
    "Hello! Send me a message (e.g., 'Hi how are you'), and I'll process it with the API.";

pub struct StartHandler {
    bot: Arc<dyn Bot>,
}

impl StartHandler {
    pub fn new(bot: Arc<dyn Bot>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Handler for StartHandler {
    async fn handle(&self, message: &Message, _cancel: &CancellationToken) -> Result<HandlerResponse> {
        self.bot.reply_to(message, GREETING).await?;
        info!(user_id = message.user.id, chat_id = message.chat.id, "Sent greeting");
        Ok(HandlerResponse::Reply(GREETING.to_string()))
    }
}
