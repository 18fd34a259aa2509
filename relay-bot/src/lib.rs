//! # Reply relay bot
//!
//! Wires the reply API client, the typing-effect renderer and the Telegram dispatcher. Loads config from
//! env and runs the dispatcher.

pub mod cli;
pub mod config;
pub mod handlers;
pub mod runner;

pub use cli::{load_config, Cli, Commands};
pub use config::{mask_token, BotConfig};
pub use handlers::{apology_for, RelayHandler, StartHandler};
pub use runner::{build_router, run_bot};
