//! # Router
//!
//! Maps the shape of an incoming message to one handler: a registered `/command`, or free text.
//! Unknown commands, commands addressed to another bot, and empty messages are ignored.

use crate::types::{Handler, HandlerResponse, Message};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Shape of a message as far as routing is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    /// `/name[@bot] args…`; `name` has the leading slash stripped.
    Command {
        name: &'a str,
        mention: Option<&'a str>,
        args: &'a str,
    },
    /// Any text that is not a command.
    Text(&'a str),
    /// No text at all (e.g. stickers, photos without caption).
    Empty,
}

/// Classifies message content.
pub fn parse_route(content: &str) -> Route<'_> {
    if content.trim().is_empty() {
        return Route::Empty;
    }
    let Some(rest) = content.strip_prefix('/') else {
        return Route::Text(content);
    };
    let (head, args) = match rest.find(char::is_whitespace) {
        Some(i) => (&rest[..i], rest[i..].trim_start()),
        None => (rest, ""),
    };
    if head.is_empty() {
        return Route::Text(content);
    }
    let (name, mention) = match head.split_once('@') {
        Some((name, bot)) => (name, Some(bot)),
        None => (head, None),
    };
    Route::Command {
        name,
        mention,
        args,
    }
}

/// Dispatch table: command name → handler, plus an optional free-text handler.
#[derive(Clone, Default)]
pub struct Router {
    commands: HashMap<String, Arc<dyn Handler>>,
    text: Option<Arc<dyn Handler>>,
    bot_username: Option<String>,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `/name` (matched case-insensitively, without the slash).
    pub fn command(mut self, name: &str, handler: Arc<dyn Handler>) -> Self {
        self.commands.insert(name.to_ascii_lowercase(), handler);
        self
    }

    /// Registers the handler for non-command text.
    pub fn text(mut self, handler: Arc<dyn Handler>) -> Self {
        self.text = Some(handler);
        self
    }

    /// Commands mentioning another bot (`/start@other_bot`) are ignored once the username is known.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    fn command_handler(&self, name: &str, mention: Option<&str>) -> Option<&Arc<dyn Handler>> {
        if let (Some(mention), Some(own)) = (mention, self.bot_username.as_deref()) {
            if !mention.eq_ignore_ascii_case(own) {
                return None;
            }
        }
        self.commands.get(&name.to_ascii_lowercase())
    }

    /// Routes one message to its handler. Returns [`HandlerResponse::Ignore`] when nothing matches.
    #[instrument(skip(self, message, cancel), fields(chat_id = message.chat.id, message_id = %message.id))]
    pub async fn dispatch(
        &self,
        message: &Message,
        cancel: &CancellationToken,
    ) -> Result<HandlerResponse> {
        let handler = match parse_route(&message.content) {
            Route::Command { name, mention, .. } => match self.command_handler(name, mention) {
                Some(handler) => {
                    info!(user_id = message.user.id, command = %name, "step: routing command");
                    handler
                }
                None => {
                    debug!(user_id = message.user.id, command = %name, "Ignoring unhandled command");
                    return Ok(HandlerResponse::Ignore);
                }
            },
            Route::Text(_) => match &self.text {
                Some(handler) => {
                    info!(user_id = message.user.id, "step: routing text");
                    handler
                }
                None => return Ok(HandlerResponse::Ignore),
            },
            Route::Empty => {
                debug!(user_id = message.user.id, "Ignoring message without text");
                return Ok(HandlerResponse::Ignore);
            }
        };

        handler.handle(message, cancel).await
    }
}
