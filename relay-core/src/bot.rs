//! Bot abstraction for sending, editing and deleting messages.
//!
//! [`Bot`] is transport-agnostic; relay-telegram implements it via teloxide and tests substitute a recorder.

use crate::error::{RelayError, Result};
use crate::types::{Chat, Message};
use async_trait::async_trait;

/// Abstraction for the outbound side of a chat. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;
    /// Sends a message and returns its id for later `edit_message` / `delete_message`.
    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String>;
    /// Answers `message` in its chat, quoting it where [`quote_target`] says so.
    async fn reply_to(&self, message: &Message, text: &str) -> Result<()>;
    /// Like [`Bot::reply_to`], returning the id of the sent message.
    async fn reply_to_and_return_id(&self, message: &Message, text: &str) -> Result<String>;
    /// Replaces the text of an already-sent message. `message_id` is transport-specific (Telegram numeric string).
    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> Result<()>;
    /// Deletes an already-sent message.
    async fn delete_message(&self, chat: &Chat, message_id: &str) -> Result<()>;
    /// Shows the "typing…" indicator in the chat.
    async fn send_typing(&self, chat: &Chat) -> Result<()>;
}

/// Message id an answer to `message` should quote: the message itself outside private chats, nothing in them.
pub fn quote_target(message: &Message) -> Option<&str> {
    (message.chat.chat_type != "private").then_some(message.id.as_str())
}

/// Parses a message id string into an i32.
pub fn parse_message_id(s: &str) -> Result<i32> {
    s.parse()
        .map_err(|_| RelayError::Bot(format!("Invalid message_id: {}", s)))
}
