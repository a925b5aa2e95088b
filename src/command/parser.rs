//! Free-text command recognition.
//!
//! Whole-message shortcuts (`help`, `yes`, `no`) are matched exactly and
//! case-insensitively. Anything containing the trigger phrase becomes a purge
//! request whose scope is derived from the path-like tokens in the text; no
//! tokens at all means the whole zone.

use regex::Regex;

use crate::command::uri::UriNormalizer;
use crate::config::GlobalConfig;
use crate::models::request::PurgeScope;
use crate::{AppError, Result};

/// Matches `[scheme://host]/path`, capturing only the path.
///
/// Pasted links arrive as `<http://addr>` or `<http://addr|label>`, so the
/// path stops at `|`, `>` and `?` as well as whitespace.
const PATH_PATTERN: &str = r"(?:https?://[^/\s]+)?(/[^\s|>?]*)";

/// A recognized chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show usage.
    Help,
    /// Confirm the requester's pending purge.
    Confirm,
    /// Discard the requester's pending purge.
    Cancel,
    /// Ask for confirmation of a purge with this scope.
    Purge(PurgeScope),
    /// Nothing for the bot to do.
    Ignore,
}

/// Turns message text into a [`Command`].
#[derive(Debug, Clone)]
pub struct CommandParser {
    trigger: String,
    max_uris: usize,
    normalizer: UriNormalizer,
    path_pattern: Regex,
}

impl CommandParser {
    /// Build a parser for the given trigger phrase and URL limit.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the path pattern fails to compile.
    pub fn new(
        trigger: impl Into<String>,
        normalizer: UriNormalizer,
        max_uris: usize,
    ) -> Result<Self> {
        let path_pattern = Regex::new(PATH_PATTERN)
            .map_err(|err| AppError::Config(format!("invalid path pattern: {err}")))?;
        Ok(Self {
            trigger: trigger.into(),
            max_uris,
            normalizer,
            path_pattern,
        })
    }

    /// Build a parser from the global configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the path pattern fails to compile.
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        Self::new(
            config.trigger_phrase.clone(),
            UriNormalizer::new(config.url_bases.clone(), config.url_suffixes.clone()),
            config.max_uris,
        )
    }

    /// The phrase that marks a purge request.
    #[must_use]
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Classify a message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::RequestTooLarge` when the derived URL list exceeds
    /// the configured maximum. Nothing should be stored for such a request.
    pub fn parse(&self, text: &str) -> Result<Command> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("help") {
            return Ok(Command::Help);
        }
        if trimmed.eq_ignore_ascii_case("yes") {
            return Ok(Command::Confirm);
        }
        if trimmed.eq_ignore_ascii_case("no") {
            return Ok(Command::Cancel);
        }

        if !text.contains(self.trigger.as_str()) {
            return Ok(Command::Ignore);
        }

        self.scope_for(text).map(Command::Purge)
    }

    /// Derive the purge scope from a message already known to contain the trigger.
    ///
    /// # Errors
    ///
    /// Returns `AppError::RequestTooLarge` when more than `max_uris` URLs result.
    pub fn scope_for(&self, text: &str) -> Result<PurgeScope> {
        let fragments = self.path_fragments(text);
        if fragments.is_empty() {
            return Ok(PurgeScope::Everything);
        }

        let uris: Vec<String> = fragments
            .iter()
            .flat_map(|fragment| self.normalizer.expand(fragment))
            .collect();

        if uris.len() > self.max_uris {
            return Err(AppError::RequestTooLarge(format!(
                "{} urls derived, at most {} allowed",
                uris.len(),
                self.max_uris
            )));
        }

        Ok(PurgeScope::Uris(uris))
    }

    /// Path tokens found in `text`, in encounter order.
    ///
    /// Every fragment starts with `/`. A single trailing comma is dropped so
    /// "a, b and c" phrasing works.
    #[must_use]
    pub fn path_fragments(&self, text: &str) -> Vec<String> {
        self.path_pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| {
                let raw = m.as_str();
                raw.strip_suffix(',').unwrap_or(raw).to_owned()
            })
            .collect()
    }
}
