//! Reply texts posted back to requesters.
//!
//! Every reply opens with a mention of the requester so it stands out in a
//! busy channel.

use crate::models::outcome::PurgeOutcome;
use crate::models::request::PurgeScope;

/// Greeting posted into member channels at startup.
pub const READY: &str = "I'm ready! Say `help` for more information.";

/// Usage text returned for `help`.
pub const HELP: &str = "Here are some examples of how to clear the cache:\n\
    `clear cache`\n\
    `clear cache for /some/uri`\n\
    `clear cache for /some/uri and /another/uri`\n\
    If I ask you to confirm, reply with `yes` or `no`!";

/// Slack mention markup for a user id.
#[must_use]
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Render URLs one per line, each in backticks.
#[must_use]
pub fn code_list(uris: &[String]) -> String {
    uris.iter()
        .map(|uri| format!("`{uri}`"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reply to `help`.
#[must_use]
pub fn help(user_id: &str) -> String {
    format!("{} {HELP}", mention(user_id))
}

/// Confirmation prompt for a freshly parsed purge request.
#[must_use]
pub fn confirm_prompt(user_id: &str, scope: &PurgeScope) -> String {
    match scope {
        PurgeScope::Everything => format!(
            "{} I'm about to clear the entire cache, are you sure?\n\
             *Warning*: This will cause a spike in traffic to the production environment!",
            mention(user_id)
        ),
        PurgeScope::Uris(uris) => format!(
            "{} I'm about to clear the following cache items, are you sure?\n{}",
            mention(user_id),
            code_list(uris)
        ),
    }
}

/// Reply to `yes` when something was pending.
#[must_use]
pub fn confirmed(user_id: &str) -> String {
    format!("{} Ok, I'll let you know when it's done.", mention(user_id))
}

/// Reply to `no` when something was pending.
#[must_use]
pub fn cancelled(user_id: &str) -> String {
    format!("{} Ok, I'll cancel that!", mention(user_id))
}

/// Rejection for a request that expanded past the URL limit.
#[must_use]
pub fn too_large(user_id: &str) -> String {
    format!(
        "{} That's too much for one request - try again with less URIs",
        mention(user_id)
    )
}

/// Rejection for an unauthorised user in a restricted channel.
#[must_use]
pub fn restricted(user_id: &str) -> String {
    format!(
        "{} Sorry, cachebot is restricted to authorised users",
        mention(user_id)
    )
}

/// Reply when the confirmed request could not be handed to the dispatcher.
#[must_use]
pub fn not_queued(user_id: &str, reason: &str) -> String {
    format!(
        "{} Sorry, I couldn't queue that...\n*Error*: {reason}",
        mention(user_id)
    )
}

/// Final report for an executed job.
#[must_use]
pub fn outcome(user_id: &str, scope: &PurgeScope, outcome: &PurgeOutcome) -> String {
    match (outcome, scope) {
        (PurgeOutcome::Failure(reason), _) => format!(
            "{} Sorry, that didn't work...\n*Error*: {reason}",
            mention(user_id)
        ),
        (PurgeOutcome::Success, PurgeScope::Uris(uris)) if !uris.is_empty() => format!(
            "{} That's done, the following items have been cleared:\n{}",
            mention(user_id),
            code_list(uris)
        ),
        (PurgeOutcome::Success, _) => format!(
            "{} That's done, the entire cache has been cleared",
            mention(user_id)
        ),
    }
}
