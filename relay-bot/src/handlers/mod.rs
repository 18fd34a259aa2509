//! Handlers routed by the bot: `/start` greeting and the text relay.

mod relay_handler;
mod start_handler;

pub use relay_handler::{
    apology_for, RelayHandler, EMPTY_REPLY_APOLOGY, MALFORMED_RESPONSE_APOLOGY, NETWORK_APOLOGY,
};
pub use start_handler::{StartHandler, GREETING};
