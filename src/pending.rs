//! Per-requester store of purge requests awaiting confirmation.
//!
//! Owned by the chat-event consumer, which is its only reader and writer,
//! so plain `&mut self` access is all the synchronization it needs.

use std::collections::HashMap;

use crate::models::request::PendingRequest;

/// At most one [`PendingRequest`] per requester.
#[derive(Debug, Default)]
pub struct PendingStore {
    requests: HashMap<String, PendingRequest>,
}

impl PendingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `request` for its requester, replacing any earlier one.
    ///
    /// Returns the request that was replaced, if any.
    pub fn set(&mut self, request: PendingRequest) -> Option<PendingRequest> {
        self.requests.insert(request.requester_id.clone(), request)
    }

    /// Look at the requester's pending request without removing it.
    #[must_use]
    pub fn get(&self, requester_id: &str) -> Option<&PendingRequest> {
        self.requests.get(requester_id)
    }

    /// Remove and return the requester's pending request.
    pub fn take(&mut self, requester_id: &str) -> Option<PendingRequest> {
        self.requests.remove(requester_id)
    }

    /// Number of requesters with something pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
