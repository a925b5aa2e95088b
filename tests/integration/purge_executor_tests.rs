//! Cloudflare client against a local stub of the `purge_cache` endpoint.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;

use cache_intercom::config::CdnConfig;
use cache_intercom::models::outcome::PurgeOutcome;
use cache_intercom::models::request::PurgeScope;
use cache_intercom::purge::cloudflare::CloudflareClient;
use cache_intercom::purge::PurgeExecutor;

/// What the stub saw for one call.
#[derive(Debug, Clone)]
struct Received {
    zone: String,
    authorization: Option<String>,
    body: serde_json::Value,
}

#[derive(Clone)]
struct StubState {
    received: Arc<Mutex<Vec<Received>>>,
    status: StatusCode,
    reply: String,
}

async fn purge_cache(
    State(state): State<StubState>,
    Path(zone): Path<String>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    state.received.lock().unwrap().push(Received {
        zone,
        authorization,
        body,
    });
    (state.status, state.reply.clone())
}

/// Serve the stub on an ephemeral port and return its API base.
async fn spawn_stub(
    status: StatusCode,
    reply: &str,
) -> (String, Arc<Mutex<Vec<Received>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        received: Arc::clone(&received),
        status,
        reply: reply.to_owned(),
    };
    let app = Router::new()
        .route("/client/v4/zones/{zone}/purge_cache", post(purge_cache))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}/client/v4"), received)
}

fn cdn_config(api_base: String) -> CdnConfig {
    CdnConfig {
        zone_id: "zone-123".into(),
        api_base,
        request_timeout_seconds: 5,
        api_token: "secret-token".into(),
    }
}

const OK_BODY: &str = r#"{"success":true,"errors":[],"messages":[],"result":{"id":"purge-1"}}"#;

#[tokio::test]
async fn purge_everything_sends_flag_and_bearer_token() {
    let (base, received) = spawn_stub(StatusCode::OK, OK_BODY).await;
    let client = CloudflareClient::new(&cdn_config(base)).unwrap();

    let outcome = client.purge(&PurgeScope::Everything).await;

    assert_eq!(outcome, PurgeOutcome::Success);
    let calls = received.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].zone, "zone-123");
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer secret-token"));
    assert_eq!(calls[0].body, serde_json::json!({ "purge_everything": true }));
}

#[tokio::test]
async fn purge_files_sends_file_list() {
    let (base, received) = spawn_stub(StatusCode::OK, OK_BODY).await;
    let client = CloudflareClient::new(&cdn_config(base)).unwrap();
    let scope = PurgeScope::Uris(vec![
        "https://a.com/x".into(),
        "https://a.com/x/index.html".into(),
    ]);

    let outcome = client.purge(&scope).await;

    assert!(outcome.is_success());
    let calls = received.lock().unwrap().clone();
    assert_eq!(
        calls[0].body,
        serde_json::json!({ "files": ["https://a.com/x", "https://a.com/x/index.html"] })
    );
}

#[tokio::test]
async fn unsuccessful_response_is_a_failure() {
    let body = r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}],"messages":[],"result":null}"#;
    let (base, received) = spawn_stub(StatusCode::FORBIDDEN, body).await;
    let client = CloudflareClient::new(&cdn_config(base)).unwrap();

    let outcome = client.purge(&PurgeScope::Everything).await;

    let PurgeOutcome::Failure(reason) = outcome else {
        panic!("expected failure");
    };
    assert!(reason.starts_with("purge protocol:"), "{reason}");
    assert!(reason.contains("Authentication error"), "{reason}");
    assert_eq!(received.lock().unwrap().len(), 1, "exactly one attempt");
}

#[tokio::test]
async fn undecodable_response_is_a_failure() {
    let (base, _received) = spawn_stub(StatusCode::OK, "<html>oops</html>").await;
    let client = CloudflareClient::new(&cdn_config(base)).unwrap();

    let outcome = client.purge(&PurgeScope::Everything).await;

    assert!(
        matches!(outcome, PurgeOutcome::Failure(ref reason) if reason.contains("error parsing response")),
        "{outcome:?}"
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let client = CloudflareClient::new(&cdn_config(format!("http://{addr}/client/v4"))).unwrap();

    let outcome = client.purge(&PurgeScope::Everything).await;

    assert!(
        matches!(outcome, PurgeOutcome::Failure(ref reason) if reason.starts_with("purge transport:")),
        "{outcome:?}"
    );
}

#[test]
fn purge_url_targets_zone() {
    let client = CloudflareClient::new(&cdn_config("https://api.example.com/client/v4".into()))
        .unwrap();
    assert_eq!(
        client.purge_url(),
        "https://api.example.com/client/v4/zones/zone-123/purge_cache"
    );
}
