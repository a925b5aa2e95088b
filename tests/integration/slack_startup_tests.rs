//! Slack service startup: a refused Socket Mode connection is fatal.

use cache_intercom::config::SlackConfig;
use cache_intercom::slack::client::SlackService;
use cache_intercom::slack::IncomingMessage;
use cache_intercom::AppError;
use tokio::sync::mpsc;

fn unreachable_slack() -> SlackConfig {
    SlackConfig {
        api_url: "http://127.0.0.1:9/api".into(),
        app_token: "xapp-revoked".into(),
        bot_token: "xoxb-unused".into(),
    }
}

#[tokio::test]
async fn start_fails_when_socket_mode_cannot_be_opened() {
    let (events_tx, _events_rx) = mpsc::channel::<IncomingMessage>(1);

    let result = SlackService::start(&unreachable_slack(), events_tx).await;

    match result {
        Err(AppError::Slack(msg)) => assert!(!msg.is_empty()),
        Err(other) => panic!("expected slack error, got {other}"),
        Ok(_) => panic!("start must fail when socket mode is refused"),
    }
}

#[tokio::test]
async fn failed_start_spawns_no_listener() {
    let (events_tx, mut events_rx) = mpsc::channel::<IncomingMessage>(1);

    let result = SlackService::start(&unreachable_slack(), events_tx).await;

    assert!(result.is_err());
    // The only sender went down with the failed start.
    assert!(events_rx.recv().await.is_none());
}
