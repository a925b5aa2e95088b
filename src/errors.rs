//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Slack API or Socket Mode failure.
    Slack(String),
    /// A purge command expanded to more URLs than one request may carry.
    RequestTooLarge(String),
    /// The purge call never produced a response body.
    PurgeTransport(String),
    /// The CDN answered, but with an undecodable or unsuccessful body.
    PurgeProtocol(String),
    /// The dispatch handoff queue cannot take another job right now.
    QueueFull(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::RequestTooLarge(msg) => write!(f, "request too large: {msg}"),
            Self::PurgeTransport(msg) => write!(f, "purge transport: {msg}"),
            Self::PurgeProtocol(msg) => write!(f, "purge protocol: {msg}"),
            Self::QueueFull(msg) => write!(f, "queue full: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::PurgeTransport(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::PurgeProtocol(err.to_string())
    }
}
