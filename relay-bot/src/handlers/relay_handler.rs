//! Text relay handler: shows "typing…", fetches the reply for the user's text, and reveals it with the
//! typing effect. Reply API failures end the turn with a fixed apology; Telegram failures propagate.

use async_trait::async_trait;
use relay_core::{
    Bot, ChatSink, Handler, HandlerError, HandlerResponse, Message, Result, RevealOutcome,
    TypingEffect,
};
use reply_client::{ReplyClient, ReplyClientError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

pub const NETWORK_APOLOGY: &str = "Sorry, there was an error connecting to the API.";
pub const MALFORMED_RESPONSE_APOLOGY: &str = "Sorry, the API returned an invalid response.";
pub const EMPTY_REPLY_APOLOGY: &str = "Sorry, I got an empty reply from the API.";

/// User-facing text for a failed reply fetch.
pub fn apology_for(err: &ReplyClientError) -> &'static str {
    match err {
        ReplyClientError::MalformedResponse(_) => MALFORMED_RESPONSE_APOLOGY,
        ReplyClientError::EmptyReply => EMPTY_REPLY_APOLOGY,
        ReplyClientError::Network(_)
        | ReplyClientError::Client(_)
        | ReplyClientError::InvalidTemplate(_) => NETWORK_APOLOGY,
    }
}

pub struct RelayHandler {
    bot: Arc<dyn Bot>,
    client: ReplyClient,
    typing: TypingEffect,
}

impl RelayHandler {
    pub fn new(bot: Arc<dyn Bot>, client: ReplyClient, typing: TypingEffect) -> Self {
        Self {
            bot,
            client,
            typing,
        }
    }
}

#[async_trait]
impl Handler for RelayHandler {
    #[instrument(skip(self, message, cancel), fields(user_id = message.user.id, chat_id = message.chat.id))]
    async fn handle(&self, message: &Message, cancel: &CancellationToken) -> Result<HandlerResponse> {
        if message.content.trim().is_empty() {
            return Err(HandlerError::NoText.into());
        }

        if let Err(e) = self.bot.send_typing(&message.chat).await {
            warn!(error = %e, "Failed to send typing action");
        }

        let reply = match self.client.fetch_reply(&message.content).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Reply API request failed");
                let apology = apology_for(&e);
                self.bot.reply_to(message, apology).await?;
                return Ok(HandlerResponse::Reply(apology.to_string()));
            }
        };
        info!(reply_len = reply.len(), "step: reply received, revealing");

        let sink = ChatSink::replying_to(self.bot.clone(), message);
        match self.typing.reveal(&reply, &sink, cancel).await? {
            RevealOutcome::Completed { steps } => {
                info!(steps = steps, "step: reply revealed");
                Ok(HandlerResponse::Reply(reply))
            }
            RevealOutcome::Cancelled { steps_delivered } => {
                warn!(steps_delivered = steps_delivered, "Reveal cancelled");
                Ok(HandlerResponse::Cancelled)
            }
        }
    }
}
