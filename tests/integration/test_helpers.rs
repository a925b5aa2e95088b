//! Shared test doubles for the chat channel and the purge executor.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cache_intercom::command::{CommandParser, UriNormalizer};
use cache_intercom::dispatch::DispatchHandle;
use cache_intercom::handler::CommandHandler;
use cache_intercom::models::outcome::PurgeOutcome;
use cache_intercom::models::request::PurgeScope;
use cache_intercom::purge::PurgeExecutor;
use cache_intercom::slack::roster::AccessPolicy;
use cache_intercom::slack::{ChatChannel, IncomingMessage};
use cache_intercom::{AppError, Result};

pub const BOT: &str = "UBOT";

/// Captures every posted message instead of sending it.
#[derive(Default)]
pub struct RecordingChat {
    posts: Mutex<Vec<(String, String)>>,
}

impl RecordingChat {
    /// Every `(channel, text)` posted so far.
    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }

    /// Texts only.
    pub fn texts(&self) -> Vec<String> {
        self.posts().into_iter().map(|(_, text)| text).collect()
    }
}

impl ChatChannel for RecordingChat {
    fn post(
        &self,
        channel_id: &str,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.posts
            .lock()
            .unwrap()
            .push((channel_id.to_owned(), text));
        Box::pin(async { Ok(()) })
    }
}

/// Refuses every post, as Slack does while unreachable.
pub struct UnreachableChat;

impl ChatChannel for UnreachableChat {
    fn post(
        &self,
        _channel_id: &str,
        _text: String,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async { Err(AppError::Slack("slack unreachable".into())) })
    }
}

/// Returns queued outcomes in order, then `Success`; records every scope.
#[derive(Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<PurgeScope>>,
    outcomes: Mutex<VecDeque<PurgeOutcome>>,
}

impl ScriptedExecutor {
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = PurgeOutcome>) -> Self {
        Self {
            calls: Mutex::default(),
            outcomes: Mutex::new(outcomes.into_iter().collect()),
        }
    }

    pub fn calls(&self) -> Vec<PurgeScope> {
        self.calls.lock().unwrap().clone()
    }
}

impl PurgeExecutor for ScriptedExecutor {
    fn purge<'a>(
        &'a self,
        scope: &'a PurgeScope,
    ) -> Pin<Box<dyn Future<Output = PurgeOutcome> + Send + 'a>> {
        self.calls.lock().unwrap().push(scope.clone());
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PurgeOutcome::Success);
        Box::pin(async move { outcome })
    }
}

/// Parser over one base and one suffix with the default trigger.
pub fn test_parser() -> CommandParser {
    CommandParser::new(
        "clear cache",
        UriNormalizer::new(vec!["https://a.com".into()], vec!["index.html".into()]),
        30,
    )
    .unwrap()
}

/// Handler wired to a recording chat channel.
pub fn test_handler(
    access: AccessPolicy,
    dispatch: DispatchHandle,
    chat: &Arc<RecordingChat>,
) -> CommandHandler {
    let chat: Arc<dyn ChatChannel> = chat.clone();
    CommandHandler::new(test_parser(), access, BOT, dispatch, chat)
}

pub fn message(user: &str, channel: &str, text: &str) -> IncomingMessage {
    IncomingMessage {
        user_id: user.to_owned(),
        channel_id: channel.to_owned(),
        text: text.to_owned(),
    }
}

/// Poll `condition` every few milliseconds until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
