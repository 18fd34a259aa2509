use anyhow::{Context, Result};
use relay_core::{init_tracing, Bot, Router, TypingEffect};
use relay_telegram::{build_teloxide_bot, fetch_bot_username, run_dispatcher, TelegramBotAdapter};
use reply_client::ReplyClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::config::BotConfig;
use crate::handlers::{RelayHandler, StartHandler};

/// Builds the dispatch table: `/start` → greeting, free text → relay. `bot_username` enables the
/// `/start@other_bot` check.
pub fn build_router(
    config: &BotConfig,
    bot: Arc<dyn Bot>,
    bot_username: Option<String>,
) -> Result<Router> {
    let client = ReplyClient::new(config.reply_api_url.clone(), config.reply_api_timeout())
        .context("Failed to build reply API client")?;
    let typing = TypingEffect::new(config.typing_mode, config.typing_interval());

    let router = Router::new()
        .command("start", Arc::new(StartHandler::new(bot.clone())))
        .text(Arc::new(RelayHandler::new(bot, client, typing)));

    Ok(match bot_username {
        Some(username) => router.with_bot_username(username),
        None => router,
    })
}

/// Main entry: validate config, init logging, build the router, then poll Telegram until Ctrl-C.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(&config.log_file)?;

    info!(
        bot_token = %config.masked_token(),
        reply_api_url = %config.reply_api_url,
        typing_mode = ?config.typing_mode,
        typing_interval_ms = config.typing_interval_ms,
        alternate_transport_configured = config.api_id.is_some() && config.api_hash.is_some(),
        "Initializing bot"
    );

    let teloxide_bot = build_teloxide_bot(&config.bot_token, config.telegram_api_url.as_deref())?;
    let bot_username = fetch_bot_username(&teloxide_bot).await;
    let adapter: Arc<dyn Bot> = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));
    let router = build_router(&config, adapter, bot_username)?;

    info!("Bot started successfully");

    run_dispatcher(teloxide_bot, Arc::new(router), CancellationToken::new()).await
}
