//! Slack Socket Mode client with a small buffered send queue.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use slack_morphism::prelude::{
    SlackApiAppsConnectionOpenRequest, SlackApiChatPostMessageRequest, SlackApiConversationsListRequest, SlackApiToken,
    SlackApiTokenType, SlackApiTokenValue, SlackApiUsersListRequest, SlackChannelId, SlackClient,
    SlackClientEventsListenerEnvironment, SlackClientHyperHttpsConnector, SlackClientSession,
    SlackClientSocketModeConfig, SlackClientSocketModeListener, SlackMessageContent,
    SlackSocketModeListenerCallbacks,
};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, error, info, warn};

use crate::slack::roster::{ChannelRef, Roster, UserRef};
use crate::slack::{events, ChatChannel, IncomingMessage};
use crate::{config::SlackConfig, AppError, Result};

const QUEUE_CAPACITY: usize = 256;
const PAGE_LIMIT: u16 = 200;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Message to be delivered to Slack via chat.postMessage.
#[derive(Debug, Clone)]
pub struct SlackMessage {
    pub channel: SlackChannelId,
    pub text: String,
}

impl SlackMessage {
    /// Create a plain-text message for a channel.
    pub fn plain(channel: SlackChannelId, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
        }
    }

    fn into_request(self) -> SlackApiChatPostMessageRequest {
        SlackApiChatPostMessageRequest::new(
            self.channel,
            SlackMessageContent::new().with_text(self.text),
        )
        .with_link_names(true)
    }
}

/// Slack Socket Mode wrapper that owns a rate-limited outgoing queue.
pub struct SlackService {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
    queue_tx: mpsc::Sender<SlackMessage>,
}

/// Join handles for Slack background tasks.
pub struct SlackRuntime {
    pub queue_task: JoinHandle<()>,
    pub socket_task: JoinHandle<()>,
}

impl SlackService {
    /// Start the Slack client, the background sender task and the Socket
    /// Mode listener. Incoming channel messages are forwarded to `events_tx`.
    ///
    /// Nothing is spawned until Slack has accepted the app token for a
    /// Socket Mode connection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created or
    /// Slack refuses to open a Socket Mode connection.
    pub async fn start(
        config: &SlackConfig,
        events_tx: mpsc::Sender<IncomingMessage>,
    ) -> Result<(Self, SlackRuntime)> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?
            .with_slack_api_url(&config.api_url);
        let client = Arc::new(SlackClient::new(connector));
        let bot_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.bot_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::Bot),
        };
        let app_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.app_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::App),
        };

        Self::open_socket_mode(&client, &app_token).await?;

        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue_task = Self::spawn_worker(client.clone(), bot_token.clone(), queue_rx);
        let socket_task = Self::spawn_socket_mode(&client, app_token, events_tx);

        info!("slack service started with buffered queue and socket mode");

        Ok((
            Self {
                client,
                bot_token,
                queue_tx,
            },
            SlackRuntime {
                queue_task,
                socket_task,
            },
        ))
    }

    /// Enqueue a message for async delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the sender task has gone away.
    pub async fn enqueue(&self, message: SlackMessage) -> Result<()> {
        self.queue_tx
            .send(message)
            .await
            .map_err(|err| AppError::Slack(format!("failed to enqueue slack message: {err}")))
    }

    fn spawn_worker(
        client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
        token: SlackApiToken,
        mut queue_rx: mpsc::Receiver<SlackMessage>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let session = client.open_session(&token);
            while let Some(message) = queue_rx.recv().await {
                let request = message.into_request();
                let mut backoff = INITIAL_RETRY_DELAY;
                loop {
                    match session.chat_post_message(&request).await {
                        Ok(_) => {
                            debug!("sent slack message");
                            break;
                        }
                        Err(error) => {
                            let delay = match &error {
                                slack_morphism::errors::SlackClientError::RateLimitError(rate) => {
                                    rate.retry_after.unwrap_or(backoff)
                                }
                                _ => backoff,
                            };
                            warn!(?error, delay=?delay, "slack post failed; retrying");
                            sleep(delay).await;
                            backoff = (backoff * 2).min(MAX_RETRY_DELAY);
                        }
                    }
                }
            }
            info!("slack sender task exiting");
        })
    }

    /// Ask Slack for a Socket Mode connection with the app token.
    ///
    /// The listener only registers the token and reconnects on failure, so a
    /// revoked or mistyped token would otherwise go unnoticed. The returned
    /// WSS URL is discarded; the listener opens its own.
    async fn open_socket_mode(
        client: &SlackClient<SlackClientHyperHttpsConnector>,
        app_token: &SlackApiToken,
    ) -> Result<()> {
        client
            .open_session(app_token)
            .apps_connections_open(&SlackApiAppsConnectionOpenRequest::new())
            .await
            .map_err(|err| AppError::Slack(format!("socket mode connection refused: {err}")))?;
        debug!("socket mode connection accepted");
        Ok(())
    }

    fn spawn_socket_mode(
        client: &Arc<SlackClient<SlackClientHyperHttpsConnector>>,
        app_token: SlackApiToken,
        events_tx: mpsc::Sender<IncomingMessage>,
    ) -> JoinHandle<()> {
        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(client))
                .with_error_handler(|err, _client, _state| {
                    error!(?err, "socket mode error");
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR
                })
                .with_user_state(events_tx),
        );
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_hello_events(|event, _client, _state| async move {
                info!(?event, "socket hello");
            })
            .with_push_events(events::handle_push_event);
        let config = SlackClientSocketModeConfig {
            max_connections_count: SlackClientSocketModeConfig::DEFAULT_CONNECTIONS_COUNT,
            debug_connections: SlackClientSocketModeConfig::DEFAULT_DEBUG_CONNECTIONS,
            initial_backoff_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_INITIAL_BACKOFF_IN_SECONDS,
            reconnect_timeout_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_RECONNECT_TIMEOUT_IN_SECONDS,
            ping_interval_in_seconds: SlackClientSocketModeConfig::DEFAULT_PING_INTERVAL_IN_SECONDS,
            ping_failure_threshold_times:
                SlackClientSocketModeConfig::DEFAULT_PING_FAILURE_THRESHOLD_TIMES,
        };

        let listener = SlackClientSocketModeListener::new(&config, listener_env, callbacks);
        tokio::spawn(async move {
            if let Err(error) = listener.listen_for(&app_token).await {
                error!(?error, "socket mode listen failed");
                return;
            }

            listener.serve().await;
            info!("socket mode listener exited");
        })
    }

    /// Create an HTTP session for direct API calls using the bot token.
    #[must_use]
    pub fn http_session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.bot_token)
    }

    /// Resolve the bot identity, its member channels and the workspace users.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if any of the underlying API calls fail.
    pub async fn fetch_roster(&self) -> Result<Roster> {
        let session = self.http_session();

        let auth = session
            .auth_test()
            .await
            .map_err(|err| AppError::Slack(format!("auth test failed: {err}")))?;

        let mut seen = 0usize;
        let mut channels = Vec::new();
        let mut request = SlackApiConversationsListRequest::new()
            .with_exclude_archived(true)
            .with_limit(PAGE_LIMIT);
        loop {
            let page = session
                .conversations_list(&request)
                .await
                .map_err(|err| AppError::Slack(format!("failed to list conversations: {err}")))?;
            seen += page.channels.len();
            channels.extend(
                page.channels
                    .into_iter()
                    .filter(|c| c.flags.is_channel.unwrap_or(false))
                    .filter(|c| c.flags.is_member.unwrap_or(false))
                    .map(|c| ChannelRef {
                        id: c.id.to_string(),
                        name: c.name.unwrap_or_default(),
                    }),
            );
            match page.response_metadata.and_then(|m| m.next_cursor) {
                Some(cursor) if !cursor.0.is_empty() => request.cursor = Some(cursor),
                _ => break,
            }
        }
        info!(member = channels.len(), seen, "resolved member channels");

        let mut users = Vec::new();
        let mut request = SlackApiUsersListRequest::new().with_limit(PAGE_LIMIT);
        loop {
            let page = session
                .users_list(&request)
                .await
                .map_err(|err| AppError::Slack(format!("failed to list users: {err}")))?;
            users.extend(page.members.into_iter().map(|u| UserRef {
                id: u.id.to_string(),
                name: u.name.unwrap_or_default(),
            }));
            match page.response_metadata.and_then(|m| m.next_cursor) {
                Some(cursor) if !cursor.0.is_empty() => request.cursor = Some(cursor),
                _ => break,
            }
        }
        info!(users = users.len(), "resolved workspace users");

        Ok(Roster {
            bot_user_id: auth.user_id.to_string(),
            channels,
            users,
        })
    }
}

impl ChatChannel for SlackService {
    fn post(
        &self,
        channel_id: &str,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let message = SlackMessage::plain(SlackChannelId(channel_id.to_owned()), text);
        Box::pin(self.enqueue(message))
    }
}
