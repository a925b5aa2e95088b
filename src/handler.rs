//! Chat command consumer.
//!
//! The single task that reads incoming chat messages. It owns the
//! [`PendingStore`] outright and is the only producer into the dispatcher's
//! handoff queue.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::command::{Command, CommandParser};
use crate::dispatch::DispatchHandle;
use crate::models::request::{PendingRequest, PurgeScope};
use crate::pending::PendingStore;
use crate::slack::roster::AccessPolicy;
use crate::slack::{messages, ChatChannel, IncomingMessage};
use crate::{AppError, Result};

/// What handling one message amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Not addressed to the bot, or posted by the bot itself.
    Ignored,
    /// Restricted channel, unauthorised sender.
    Rejected,
    /// Usage text sent.
    Help,
    /// Confirmation requested; the scope is now pending.
    Prompted(PurgeScope),
    /// Request expanded past the URL limit; nothing stored.
    TooLarge,
    /// Pending request handed to the dispatcher.
    Confirmed,
    /// Pending request discarded.
    Cancelled,
    /// `yes` or `no` with nothing pending; no reply sent.
    NothingPending,
}

/// Turns chat messages into pending requests and queued jobs.
pub struct CommandHandler {
    parser: CommandParser,
    access: AccessPolicy,
    bot_user_id: String,
    pending: PendingStore,
    dispatch: DispatchHandle,
    chat: Arc<dyn ChatChannel>,
}

impl CommandHandler {
    /// Create a handler with an empty pending store.
    #[must_use]
    pub fn new(
        parser: CommandParser,
        access: AccessPolicy,
        bot_user_id: impl Into<String>,
        dispatch: DispatchHandle,
        chat: Arc<dyn ChatChannel>,
    ) -> Self {
        Self {
            parser,
            access,
            bot_user_id: bot_user_id.into(),
            pending: PendingStore::new(),
            dispatch,
            chat,
        }
    }

    /// Read-only view of the requests awaiting confirmation.
    #[must_use]
    pub fn pending(&self) -> &PendingStore {
        &self.pending
    }

    /// Handle one incoming message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if a reply cannot be posted, or
    /// `AppError::QueueFull` if a confirmed job could not be handed off
    /// (the requester is told in that case).
    pub async fn handle(&mut self, message: &IncomingMessage) -> Result<Disposition> {
        if message.user_id == self.bot_user_id {
            return Ok(Disposition::Ignored);
        }

        let parsed = self.parser.parse(&message.text);
        if matches!(parsed, Ok(Command::Ignore)) {
            return Ok(Disposition::Ignored);
        }

        let user = message.user_id.as_str();
        let channel = message.channel_id.as_str();

        if !self.access.allows(user, channel) {
            warn!(user, channel, "unauthorised command in restricted channel");
            self.reply(channel, messages::restricted(user)).await?;
            return Ok(Disposition::Rejected);
        }

        let command = match parsed {
            Ok(command) => command,
            Err(AppError::RequestTooLarge(reason)) => {
                info!(user, %reason, "purge request rejected");
                self.reply(channel, messages::too_large(user)).await?;
                return Ok(Disposition::TooLarge);
            }
            Err(err) => return Err(err),
        };

        match command {
            Command::Ignore => Ok(Disposition::Ignored),
            Command::Help => {
                self.reply(channel, messages::help(user)).await?;
                Ok(Disposition::Help)
            }
            Command::Purge(scope) => {
                // Stored before prompting: a failed prompt still leaves the
                // request confirmable.
                let request =
                    PendingRequest::new(user.to_owned(), channel.to_owned(), scope.clone());
                if self.pending.set(request).is_some() {
                    info!(user, "earlier pending request replaced");
                }
                info!(user, urls = scope.len(), "purge awaiting confirmation");
                self.reply(channel, messages::confirm_prompt(user, &scope))
                    .await?;
                Ok(Disposition::Prompted(scope))
            }
            Command::Confirm => {
                let Some(request) = self.pending.take(user) else {
                    debug!(user, "yes with nothing pending");
                    return Ok(Disposition::NothingPending);
                };
                let job = request.confirm();
                let job_id = job.id.clone();
                if let Err(err) = self.dispatch.enqueue(job).await {
                    self.reply(channel, messages::not_queued(user, &err.to_string()))
                        .await?;
                    return Err(err);
                }
                info!(user, %job_id, "purge confirmed and queued");
                self.reply(channel, messages::confirmed(user)).await?;
                Ok(Disposition::Confirmed)
            }
            Command::Cancel => {
                if self.pending.take(user).is_none() {
                    debug!(user, "no with nothing pending");
                    return Ok(Disposition::NothingPending);
                }
                info!(user, "pending purge cancelled");
                self.reply(channel, messages::cancelled(user)).await?;
                Ok(Disposition::Cancelled)
            }
        }
    }

    async fn reply(&self, channel: &str, text: String) -> Result<()> {
        self.chat.post(channel, text).await
    }

    /// Consume messages until `cancel` fires or the sender side closes.
    ///
    /// Pending confirmations are not persisted and are dropped on exit.
    pub async fn run(mut self, mut rx: mpsc::Receiver<IncomingMessage>, cancel: CancellationToken) {
        loop {
            let message = tokio::select! {
                () = cancel.cancelled() => {
                    info!(dropped = self.pending.len(), "command consumer shutting down");
                    break;
                }
                maybe_message = rx.recv() => {
                    if let Some(m) = maybe_message { m } else {
                        info!("message channel closed");
                        break;
                    }
                }
            };

            let span = info_span!(
                "chat_message",
                user = %message.user_id,
                channel = %message.channel_id
            );
            match self.handle(&message).instrument(span).await {
                Ok(disposition) => debug!(?disposition, "message handled"),
                Err(err) => warn!(%err, "message handling failed"),
            }
        }
    }
}

/// Spawn the command consumer as a background task.
#[must_use]
pub fn spawn_command_consumer(
    handler: CommandHandler,
    rx: mpsc::Receiver<IncomingMessage>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(handler.run(rx, cancel))
}
