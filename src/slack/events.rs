//! Slack push event intake.
//!
//! Socket Mode callbacks may run concurrently, so they do no command work
//! themselves. Channel messages are reduced to [`IncomingMessage`] and
//! forwarded to the single command consumer through the channel stored in
//! the listener's user state.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackEventCallbackBody, SlackMessageEvent, SlackPushEventCallback,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::slack::IncomingMessage;

/// Reduce a Slack message event to the fields the bot acts on.
///
/// Edits, deletions, joins and other subtyped events are dropped, as are
/// messages posted by bots.
#[must_use]
pub fn incoming_from_event(event: &SlackMessageEvent) -> Option<IncomingMessage> {
    if event.subtype.is_some() || event.sender.bot_id.is_some() {
        return None;
    }
    let user_id = event.sender.user.as_ref()?.to_string();
    let channel_id = event.origin.channel.as_ref()?.to_string();
    let text = event.content.as_ref()?.text.clone()?;
    Some(IncomingMessage {
        user_id,
        channel_id,
        text,
    })
}

/// Handle push events delivered via Socket Mode.
///
/// # Errors
///
/// Never fails; undeliverable messages are logged and dropped.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let SlackEventCallbackBody::Message(message) = &event.event else {
        debug!("non-message push event ignored");
        return Ok(());
    };

    let Some(incoming) = incoming_from_event(message) else {
        debug!("message event without actionable content ignored");
        return Ok(());
    };

    let events_tx: Option<mpsc::Sender<IncomingMessage>> = {
        let guard = state.read().await;
        guard.get_user_state::<mpsc::Sender<IncomingMessage>>().cloned()
    };

    let Some(events_tx) = events_tx else {
        warn!("message sink not available; dropping message");
        return Ok(());
    };

    if let Err(err) = events_tx.send(incoming).await {
        warn!(%err, "command consumer gone; dropping message");
    }
    Ok(())
}
