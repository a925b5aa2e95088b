//! Result of a single purge call.

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Outcome reported back to the requester after a purge attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status", content = "message")]
pub enum PurgeOutcome {
    /// The CDN accepted the purge.
    Success,
    /// The purge did not happen; carries a human-readable reason.
    Failure(String),
}

impl PurgeOutcome {
    /// Whether the purge succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<crate::Result<()>> for PurgeOutcome {
    fn from(result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(err) => Self::from(err),
        }
    }
}

impl From<AppError> for PurgeOutcome {
    fn from(err: AppError) -> Self {
        Self::Failure(err.to_string())
    }
}
