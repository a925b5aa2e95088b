//! At-most-one pending confirmation per requester.

use cache_intercom::models::request::{PendingRequest, PurgeScope};
use cache_intercom::pending::PendingStore;

fn request(user: &str, scope: PurgeScope) -> PendingRequest {
    PendingRequest::new(user.to_owned(), "C1".to_owned(), scope)
}

#[test]
fn set_then_get_leaves_request_in_place() {
    let mut store = PendingStore::new();
    assert!(store.set(request("U1", PurgeScope::Everything)).is_none());

    assert_eq!(
        store.get("U1").map(|r| &r.scope),
        Some(&PurgeScope::Everything)
    );
    assert_eq!(store.len(), 1);
}

#[test]
fn second_set_replaces_without_merging() {
    let mut store = PendingStore::new();
    store.set(request("U1", PurgeScope::Uris(vec!["https://a.com/x".into()])));
    let replaced = store.set(request("U1", PurgeScope::Uris(vec!["https://a.com/y".into()])));

    assert_eq!(
        replaced.map(|r| r.scope),
        Some(PurgeScope::Uris(vec!["https://a.com/x".into()]))
    );
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get("U1").map(|r| r.scope.clone()),
        Some(PurgeScope::Uris(vec!["https://a.com/y".into()]))
    );
}

#[test]
fn take_removes_exactly_once() {
    let mut store = PendingStore::new();
    store.set(request("U1", PurgeScope::Everything));

    assert!(store.take("U1").is_some());
    assert!(store.take("U1").is_none());
    assert!(store.is_empty());
}

#[test]
fn requesters_are_isolated() {
    let mut store = PendingStore::new();
    store.set(request("U1", PurgeScope::Everything));
    store.set(request("U2", PurgeScope::Uris(vec!["https://a.com/z".into()])));

    assert!(store.take("U1").is_some());
    assert!(store.get("U2").is_some());
    assert!(store.take("U3").is_none());
}
