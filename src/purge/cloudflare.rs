//! Cloudflare `purge_cache` client.

use std::future::Future;
use std::pin::Pin;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::PurgeExecutor;
use crate::config::CdnConfig;
use crate::models::outcome::PurgeOutcome;
use crate::models::request::PurgeScope;
use crate::{AppError, Result};

/// JSON body of a purge call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PurgeRequestBody {
    /// `{"purge_everything": true}`
    Everything {
        /// Always `true`.
        purge_everything: bool,
    },
    /// `{"files": [...]}`
    Files {
        /// Absolute URLs to purge.
        files: Vec<String>,
    },
}

impl From<&PurgeScope> for PurgeRequestBody {
    fn from(scope: &PurgeScope) -> Self {
        match scope {
            PurgeScope::Everything => Self::Everything {
                purge_everything: true,
            },
            PurgeScope::Uris(uris) => Self::Files {
                files: uris.clone(),
            },
        }
    }
}

/// Envelope returned by the Cloudflare v4 API.
#[derive(Debug, Clone, Deserialize)]
pub struct PurgeResponseBody {
    /// Whether the purge was accepted.
    pub success: bool,
    /// Error objects, usually `{code, message}`.
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    /// Informational messages.
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    /// Operation result, typically `{id}`.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl PurgeResponseBody {
    /// Human-readable summary of the `errors` array.
    #[must_use]
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|err| match err.get("message").and_then(serde_json::Value::as_str) {
                Some(message) => match err.get("code") {
                    Some(code) => format!("{message} ({code})"),
                    None => message.to_owned(),
                },
                None => err.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Decide whether a raw purge response means success.
///
/// # Errors
///
/// Returns `AppError::PurgeProtocol` if the body cannot be decoded or
/// reports `success: false`.
pub fn classify_response(status: StatusCode, body: &str) -> Result<PurgeResponseBody> {
    let decoded: PurgeResponseBody = serde_json::from_str(body).map_err(|err| {
        AppError::PurgeProtocol(format!(
            "error parsing response from CDN (HTTP {status}): {err}"
        ))
    })?;

    if !decoded.success {
        let summary = decoded.error_summary();
        let detail = if summary.is_empty() {
            String::new()
        } else {
            format!(": {summary}")
        };
        return Err(AppError::PurgeProtocol(format!(
            "CDN returned an unsuccessful response (HTTP {status}){detail}"
        )));
    }

    Ok(decoded)
}

/// [`PurgeExecutor`] backed by the Cloudflare HTTP API.
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http: reqwest::Client,
    purge_url: String,
    token: String,
}

impl CloudflareClient {
    /// Build a client for the configured zone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn new(config: &CdnConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            purge_url: config.purge_url(),
            token: config.api_token.clone(),
        })
    }

    /// Endpoint this client posts to.
    #[must_use]
    pub fn purge_url(&self) -> &str {
        &self.purge_url
    }

    async fn send(&self, scope: &PurgeScope) -> Result<()> {
        let body = PurgeRequestBody::from(scope);
        match scope {
            PurgeScope::Everything => info!("clearing everything"),
            PurgeScope::Uris(uris) => info!(files = uris.len(), "clearing files"),
        }

        let response = self
            .http
            .post(&self.purge_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                AppError::PurgeTransport(format!("error sending request to CDN: {err}"))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            AppError::PurgeTransport(format!("error reading response from CDN: {err}"))
        })?;

        match classify_response(status, &text) {
            Ok(decoded) => {
                info!(result = ?decoded.result, "purge completed without errors");
                Ok(())
            }
            Err(err) => {
                warn!(%status, body = %text, "purge rejected by CDN");
                Err(err)
            }
        }
    }
}

impl PurgeExecutor for CloudflareClient {
    fn purge<'a>(
        &'a self,
        scope: &'a PurgeScope,
    ) -> Pin<Box<dyn Future<Output = PurgeOutcome> + Send + 'a>> {
        Box::pin(async move { PurgeOutcome::from(self.send(scope).await) })
    }
}
