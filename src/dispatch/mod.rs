//! Confirmed-job dispatch.

pub mod dispatcher;

pub use dispatcher::{handoff, spawn_dispatcher, BatchDispatcher, DispatchHandle, FlushReport};
