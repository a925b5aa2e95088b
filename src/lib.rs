#![forbid(unsafe_code)]

//! Slack-driven CDN cache purging with explicit confirmation and batched
//! dispatch.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod handler;
pub mod models;
pub mod pending;
pub mod purge;
pub mod slack;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
