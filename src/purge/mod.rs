//! Purge execution against the CDN.
//!
//! The [`PurgeExecutor`] trait decouples the batch dispatcher from the HTTP
//! call so the flush cycle can run against a test double.

pub mod cloudflare;

use std::future::Future;
use std::pin::Pin;

use crate::models::outcome::PurgeOutcome;
use crate::models::request::PurgeScope;

/// Issues exactly one purge call per invocation.
pub trait PurgeExecutor: Send + Sync {
    /// Purge `scope` and classify the result.
    ///
    /// Never retries. Transport failures, undecodable responses and responses
    /// marked unsuccessful all come back as [`PurgeOutcome::Failure`].
    fn purge<'a>(
        &'a self,
        scope: &'a PurgeScope,
    ) -> Pin<Box<dyn Future<Output = PurgeOutcome> + Send + 'a>>;
}
