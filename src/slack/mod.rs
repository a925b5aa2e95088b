//! Slack bridge layer modules.
//!
//! [`ChatChannel`] is the seam between the purge workflow and Slack: the
//! command handler and the batch dispatcher only ever post plain text
//! through it.

pub mod client;
pub mod events;
pub mod messages;
pub mod roster;

use std::future::Future;
use std::pin::Pin;

use crate::Result;

/// A chat message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Sender's user id.
    pub user_id: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Raw message text.
    pub text: String,
}

/// Outbound plain-text delivery.
pub trait ChatChannel: Send + Sync {
    /// Post `text` into `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the message cannot be queued for delivery.
    fn post(
        &self,
        channel_id: &str,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
