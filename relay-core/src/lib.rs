//! # relay-core
//!
//! Core types and traits for the reply relay bot: [`Bot`], [`Handler`], [`Router`], the message model,
//! the typing-effect renderer ([`TypingEffect`]) and tracing initialization. Transport-agnostic; used by
//! relay-telegram and relay-bot.

pub mod bot;
pub mod error;
pub mod logger;
pub mod router;
pub mod types;
pub mod typing;

pub use bot::{parse_message_id, quote_target, Bot};
pub use error::{HandlerError, RelayError, Result};
pub use logger::init_tracing;
pub use router::{parse_route, Route, Router};
pub use types::{
    Chat, Handler, HandlerResponse, Message, MessageDirection, ToCoreMessage, ToCoreUser, User,
};
pub use typing::{
    reveal_steps, ChatSink, MessageHandle, MessageSink, RevealMode, RevealOutcome, TypingEffect,
    DEFAULT_TYPING_INTERVAL, WORDS_PER_STEP,
};
