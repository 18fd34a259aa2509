//! Typing-effect renderer: reveals a finished reply two words at a time by editing (or resending) one message.
//!
//! # Entry points
//!
//! - **[`TypingEffect::reveal`]** – Drives a [`MessageSink`] through every prefix of the reply.
//! - **[`reveal_steps`]** – The prefix sequence alone, without any I/O.
//! - **[`ChatSink`]** – [`MessageSink`] bound to one chat of a [`Bot`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::bot::Bot;
use crate::error::{RelayError, Result};
use crate::types::{Chat, Message};

/// Words added to the displayed prefix per reveal step.
pub const WORDS_PER_STEP: usize = 2;
/// Pause between two reveal steps.
pub const DEFAULT_TYPING_INTERVAL: Duration = Duration::from_millis(500);

/// Transport id of a message sent through a [`MessageSink`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub String);

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where reveal steps are delivered.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<MessageHandle>;
    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<()>;
    async fn delete(&self, handle: &MessageHandle) -> Result<()>;
}

/// [`MessageSink`] that delivers into one chat through a [`Bot`], optionally as answers to one message.
pub struct ChatSink {
    bot: Arc<dyn Bot>,
    chat: Chat,
    answering: Option<Message>,
}

impl ChatSink {
    pub fn new(bot: Arc<dyn Bot>, chat: Chat) -> Self {
        Self {
            bot,
            chat,
            answering: None,
        }
    }

    /// Sends go out through [`Bot::reply_to_and_return_id`] for `message`.
    pub fn replying_to(bot: Arc<dyn Bot>, message: &Message) -> Self {
        Self {
            bot,
            chat: message.chat.clone(),
            answering: Some(message.clone()),
        }
    }
}

#[async_trait]
impl MessageSink for ChatSink {
    async fn send(&self, text: &str) -> Result<MessageHandle> {
        let id = match &self.answering {
            Some(message) => self.bot.reply_to_and_return_id(message, text).await?,
            None => self.bot.send_message_and_return_id(&self.chat, text).await?,
        };
        Ok(MessageHandle(id))
    }

    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<()> {
        self.bot.edit_message(&self.chat, &handle.0, text).await
    }

    async fn delete(&self, handle: &MessageHandle) -> Result<()> {
        self.bot.delete_message(&self.chat, &handle.0).await
    }
}

/// How each step after the first replaces the displayed prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealMode {
    /// Edit the first message in place.
    #[default]
    Edit,
    /// Send the longer prefix as a new message, then delete the one sent before it.
    Resend,
}

impl FromStr for RevealMode {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edit" => Ok(Self::Edit),
            "resend" => Ok(Self::Resend),
            other => Err(RelayError::Config(format!(
                "unknown typing mode '{}', expected 'edit' or 'resend'",
                other
            ))),
        }
    }
}

/// How a reveal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Every prefix was delivered; `steps` is 0 for an empty reply.
    Completed { steps: usize },
    /// Stopped by the cancellation token after `steps_delivered` steps.
    Cancelled { steps_delivered: usize },
}

/// Splits `text` on whitespace and returns every displayed prefix, growing by [`WORDS_PER_STEP`] words.
///
/// The last element is the whole word sequence joined by single spaces. Empty input yields no steps.
pub fn reveal_steps(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    (0..words.len())
        .step_by(WORDS_PER_STEP)
        .map(|k| words[..(k + WORDS_PER_STEP).min(words.len())].join(" "))
        .collect()
}

/// Paced renderer; one instance can serve any number of turns.
#[derive(Debug, Clone)]
pub struct TypingEffect {
    mode: RevealMode,
    interval: Duration,
}

impl Default for TypingEffect {
    fn default() -> Self {
        Self::new(RevealMode::default(), DEFAULT_TYPING_INTERVAL)
    }
}

impl TypingEffect {
    pub fn new(mode: RevealMode, interval: Duration) -> Self {
        Self { mode, interval }
    }

    pub fn mode(&self) -> RevealMode {
        self.mode
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reveals `text` through `sink`: the first step is sent, later steps edit it (or resend and delete
    /// the previous message), pausing `interval` between steps.
    ///
    /// Sink errors are returned as-is; whatever was delivered before the error stays on screen.
    /// `cancel` is checked before every step and during every pause.
    pub async fn reveal(
        &self,
        text: &str,
        sink: &dyn MessageSink,
        cancel: &CancellationToken,
    ) -> Result<RevealOutcome> {
        let steps = reveal_steps(text);
        let total = steps.len();
        let mut handle: Option<MessageHandle> = None;

        for (index, prefix) in steps.iter().enumerate() {
            if index > 0 {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Ok(RevealOutcome::Cancelled { steps_delivered: index });
                    }
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            if cancel.is_cancelled() {
                return Ok(RevealOutcome::Cancelled {
                    steps_delivered: index,
                });
            }

            let next = match handle.take() {
                None => sink.send(prefix).await?,
                Some(current) => match self.mode {
                    RevealMode::Edit => {
                        sink.edit(&current, prefix).await?;
                        current
                    }
                    RevealMode::Resend => {
                        let fresh = sink.send(prefix).await?;
                        sink.delete(&current).await?;
                        fresh
                    }
                },
            };
            debug!(
                step = index + 1,
                total = total,
                message_id = %next,
                mode = ?self.mode,
                "step: reveal prefix delivered"
            );
            handle = Some(next);
        }

        Ok(RevealOutcome::Completed { steps: total })
    }
}
