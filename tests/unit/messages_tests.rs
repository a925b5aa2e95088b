//! Reply texts.

use cache_intercom::models::outcome::PurgeOutcome;
use cache_intercom::models::request::PurgeScope;
use cache_intercom::slack::messages;

#[test]
fn every_reply_mentions_the_requester() {
    let scope = PurgeScope::Everything;
    for text in [
        messages::help("U1"),
        messages::confirm_prompt("U1", &scope),
        messages::confirmed("U1"),
        messages::cancelled("U1"),
        messages::too_large("U1"),
        messages::restricted("U1"),
        messages::not_queued("U1", "queue full"),
        messages::outcome("U1", &scope, &PurgeOutcome::Success),
    ] {
        assert!(text.starts_with("<@U1> "), "{text}");
    }
}

#[test]
fn everything_prompt_warns_about_traffic() {
    let text = messages::confirm_prompt("U1", &PurgeScope::Everything);
    assert!(text.contains("entire cache"));
    assert!(text.contains("*Warning*"));
}

#[test]
fn uri_prompt_lists_each_url_in_backticks() {
    let scope = PurgeScope::Uris(vec!["https://a.com/x".into(), "https://a.com/y".into()]);
    let text = messages::confirm_prompt("U1", &scope);
    assert!(text.ends_with("`https://a.com/x`\n`https://a.com/y`"), "{text}");
}

#[test]
fn success_report_lists_cleared_urls() {
    let scope = PurgeScope::Uris(vec!["https://a.com/x".into()]);
    let text = messages::outcome("U1", &scope, &PurgeOutcome::Success);
    assert!(text.contains("have been cleared"));
    assert!(text.contains("`https://a.com/x`"));

    let text = messages::outcome("U1", &PurgeScope::Everything, &PurgeOutcome::Success);
    assert!(text.contains("entire cache has been cleared"));
}

#[test]
fn failure_report_carries_reason() {
    let text = messages::outcome(
        "U1",
        &PurgeScope::Everything,
        &PurgeOutcome::Failure("purge protocol: nope".into()),
    );
    assert!(text.contains("didn't work"));
    assert!(text.ends_with("*Error*: purge protocol: nope"));
}

#[test]
fn help_lists_examples() {
    let text = messages::help("U1");
    assert!(text.contains("`clear cache for /some/uri`"));
    assert!(text.contains("`yes` or `no`"));
}
