//! Purge requests: awaiting confirmation, and confirmed and queued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a purge request covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "uris")]
pub enum PurgeScope {
    /// The whole zone.
    Everything,
    /// Explicit absolute URLs, in derivation order. Duplicates are kept.
    Uris(Vec<String>),
}

impl PurgeScope {
    /// Number of URLs carried; zero for [`PurgeScope::Everything`].
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Everything => 0,
            Self::Uris(uris) => uris.len(),
        }
    }

    /// Whether this is an explicit list with no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Uris(uris) if uris.is_empty())
    }
}

/// A purge request waiting for its requester to answer `yes` or `no`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PendingRequest {
    /// Slack user that issued the command.
    pub requester_id: String,
    /// Channel the command arrived in; replies go here.
    pub channel_id: String,
    /// Requested purge scope.
    pub scope: PurgeScope,
    /// When the confirmation prompt was issued. Not used for expiry.
    pub created_at: DateTime<Utc>,
}

impl PendingRequest {
    /// Construct a pending request stamped with the current time.
    #[must_use]
    pub fn new(requester_id: String, channel_id: String, scope: PurgeScope) -> Self {
        Self {
            requester_id,
            channel_id,
            scope,
            created_at: Utc::now(),
        }
    }

    /// Promote into a job owned by the dispatcher.
    #[must_use]
    pub fn confirm(self) -> QueuedJob {
        QueuedJob {
            id: Uuid::new_v4().to_string(),
            requester_id: self.requester_id,
            channel_id: self.channel_id,
            scope: self.scope,
            queued_at: Utc::now(),
        }
    }
}

/// A confirmed purge request owned by the batch dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct QueuedJob {
    /// Unique job identifier used for log correlation.
    pub id: String,
    /// Slack user to report back to.
    pub requester_id: String,
    /// Channel to report back in.
    pub channel_id: String,
    /// Purge scope to execute.
    pub scope: PurgeScope,
    /// Time of confirmation.
    pub queued_at: DateTime<Utc>,
}
