//! # relay-telegram
//!
//! Telegram layer: adapters from teloxide types, the [`relay_core::Bot`] implementation, and the dispatcher
//! runner with its global error handler. No HTTP reply logic lives here.

mod adapters;
mod bot_adapter;
mod runner;

pub use adapters::{chat_type_name, TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::{build_teloxide_bot, fetch_bot_username, TelegramBotAdapter};
pub use runner::{cancel_then_stop, run_dispatcher, UpdateError, UpdateErrorHandler};
