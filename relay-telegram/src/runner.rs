//! Dispatcher runner: converts teloxide messages to core::Message and routes them through [`Router`].
//!
//! Updates are handled concurrently across chats and sequentially within one chat (teloxide's default
//! distribution). Errors escaping a turn reach [`UpdateErrorHandler`], which logs them with the update.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use relay_core::{RelayError, Router, ToCoreMessage};
use teloxide::{error_handlers::ErrorHandler, prelude::*};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::adapters::TelegramMessageWrapper;

/// A turn that failed after routing; carries the update for the error log.
#[derive(Error, Debug)]
#[error("update for message {message_id} in chat {chat_id} failed: {source}")]
pub struct UpdateError {
    pub chat_id: i64,
    pub message_id: String,
    /// Debug rendering of the incoming Telegram message.
    pub update: String,
    #[source]
    pub source: RelayError,
}

/// Global error handler: logs the update and the error; nothing is sent to the user.
pub struct UpdateErrorHandler;

impl ErrorHandler<UpdateError> for UpdateErrorHandler {
    fn handle_error(
        self: Arc<Self>,
        error: UpdateError,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        Box::pin(async move {
            error!(
                chat_id = error.chat_id,
                message_id = %error.message_id,
                update = %error.update,
                error = %error.source,
                "Update caused error"
            );
        })
    }
}

async fn handle_message(
    msg: teloxide::types::Message,
    router: Arc<Router>,
    shutdown: CancellationToken,
) -> Result<(), UpdateError> {
    let core_msg = TelegramMessageWrapper(&msg).to_core();

    match msg.text() {
        Some(text) => info!(
            user_id = core_msg.user.id,
            chat_id = core_msg.chat.id,
            message_content = %text,
            "Received message"
        ),
        None => debug!(
            user_id = core_msg.user.id,
            chat_id = core_msg.chat.id,
            "Received non-text message"
        ),
    }

    let cancel = shutdown.child_token();
    match router.dispatch(&core_msg, &cancel).await {
        Ok(response) => {
            debug!(
                user_id = core_msg.user.id,
                chat_id = core_msg.chat.id,
                response = ?response,
                "step: turn finished"
            );
            Ok(())
        }
        Err(source) => Err(UpdateError {
            chat_id: core_msg.chat.id,
            message_id: core_msg.id.clone(),
            update: format!("{:?}", msg),
            source,
        }),
    }
}

/// Waits for `trigger`, cancels every in-flight turn through `turns`, then runs `stop`.
///
/// Turns are cancelled before `stop` starts so a dispatcher that drains its workers on shutdown does not
/// wait out whole reveals.
pub async fn cancel_then_stop<T, S, F>(trigger: T, turns: CancellationToken, stop: S)
where
    T: Future<Output = ()>,
    S: FnOnce() -> F,
    F: Future<Output = ()>,
{
    trigger.await;
    info!("Shutdown requested, cancelling in-flight turns");
    turns.cancel();
    stop().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C; shutdown only by process termination");
        std::future::pending::<()>().await;
    }
}

/// Polls Telegram and dispatches messages until Ctrl-C. On Ctrl-C, `shutdown` is cancelled first so
/// in-flight reveals stop at their next step, then the dispatcher is told to stop and drain.
#[instrument(skip(bot, router, shutdown))]
pub async fn run_dispatcher(
    bot: teloxide::Bot,
    router: Arc<Router>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let handler = Update::filter_message().endpoint(handle_message);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router, shutdown.clone()])
        .default_handler(|update| async move {
            debug!(update_id = ?update.id, "Ignoring non-message update");
        })
        .error_handler(Arc::new(UpdateErrorHandler))
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(cancel_then_stop(ctrl_c(), shutdown.clone(), move || async move {
        match token.shutdown() {
            Ok(drained) => drained.await,
            Err(e) => warn!(error = %e, "Dispatcher was not running at shutdown"),
        }
    }));

    info!("Dispatcher started polling");
    dispatcher.dispatch().await;
    shutdown.cancel();
    info!("Dispatcher stopped");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use relay_core::{MessageHandle, MessageSink, RevealMode, RevealOutcome, TypingEffect};
    use tokio::sync::oneshot;

    /// Counts sends; edits and deletes succeed silently.
    #[derive(Default)]
    struct CountingSink {
        sends: AtomicUsize,
    }

    #[async_trait]
    impl MessageSink for CountingSink {
        async fn send(&self, _text: &str) -> relay_core::Result<MessageHandle> {
            let n = self.sends.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(MessageHandle(n.to_string()))
        }

        async fn edit(&self, _handle: &MessageHandle, _text: &str) -> relay_core::Result<()> {
            Ok(())
        }

        async fn delete(&self, _handle: &MessageHandle) -> relay_core::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_cancel_then_stop_cancels_turns_before_stopping() {
        let turns = CancellationToken::new();
        let (tx, rx) = oneshot::channel::<()>();
        let observed = turns.clone();
        let stopper = tokio::spawn(cancel_then_stop(
            async move {
                let _ = rx.await;
            },
            turns.clone(),
            move || async move {
                assert!(observed.is_cancelled(), "turns must be cancelled before stop runs");
            },
        ));

        tokio::task::yield_now().await;
        assert!(!turns.is_cancelled());
        tx.send(()).unwrap();
        stopper.await.unwrap();
        assert!(turns.is_cancelled());
    }

    /// A stop that waits for in-flight turns (as the dispatcher's drain does) returns promptly:
    /// the reveal ends at its current pause instead of running to completion.
    #[tokio::test(start_paused = true)]
    async fn test_shutdown_does_not_wait_out_inflight_reveal() {
        let turns = CancellationToken::new();
        let turn = turns.child_token();
        let sink = Arc::new(CountingSink::default());
        let typing = TypingEffect::new(RevealMode::Edit, Duration::from_secs(10));
        let reveal = {
            let sink = sink.clone();
            tokio::spawn(async move {
                typing
                    .reveal("one two three four five six", sink.as_ref(), &turn)
                    .await
            })
        };
        while sink.sends.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let (tx, rx) = oneshot::channel::<()>();
        let started = tokio::time::Instant::now();
        let stopper = tokio::spawn(cancel_then_stop(
            async move {
                let _ = rx.await;
            },
            turns,
            move || async move {
                let outcome = reveal.await.unwrap().unwrap();
                assert_eq!(outcome, RevealOutcome::Cancelled { steps_delivered: 1 });
            },
        ));
        tx.send(()).unwrap();
        stopper.await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(sink.sends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_update_error_display_names_message_and_chat() {
        let err = UpdateError {
            chat_id: 456,
            message_id: "42".to_string(),
            update: "Message { .. }".to_string(),
            source: RelayError::Bot("Forbidden: bot was blocked by the user".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "update for message 42 in chat 456 failed: Bot error: Forbidden: bot was blocked by the user"
        );
    }

    #[tokio::test]
    async fn test_update_error_handler_completes() {
        let err = UpdateError {
            chat_id: 1,
            message_id: "2".to_string(),
            update: String::new(),
            source: RelayError::Config("x".to_string()),
        };
        Arc::new(UpdateErrorHandler).handle_error(err).await;
    }
}
