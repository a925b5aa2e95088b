//! Startup roster and the channel restriction policy derived from it.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::config::GlobalConfig;

/// A channel the bot is a member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: String,
    pub name: String,
}

/// A workspace user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

/// Identities resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    /// The bot's own user id; its messages are never handled.
    pub bot_user_id: String,
    /// Channels the bot belongs to.
    pub channels: Vec<ChannelRef>,
    /// Known workspace users.
    pub users: Vec<UserRef>,
}

/// Who may issue commands where.
///
/// In a restricted channel only authorised users are served; every other
/// channel is open to everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    restricted_channel_ids: HashSet<String>,
    authorised_user_ids: HashSet<String>,
}

impl AccessPolicy {
    /// Build a policy from already-resolved ids.
    #[must_use]
    pub fn new(
        restricted_channel_ids: impl IntoIterator<Item = String>,
        authorised_user_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            restricted_channel_ids: restricted_channel_ids.into_iter().collect(),
            authorised_user_ids: authorised_user_ids.into_iter().collect(),
        }
    }

    /// Map configured channel and user names onto roster ids.
    ///
    /// Names that match nothing are logged and skipped.
    #[must_use]
    pub fn resolve(config: &GlobalConfig, roster: &Roster) -> Self {
        let channels: Vec<String> = roster
            .channels
            .iter()
            .filter(|c| config.restricted_channels.contains(&c.name))
            .map(|c| c.id.clone())
            .collect();
        let users: Vec<String> = roster
            .users
            .iter()
            .filter(|u| config.authorised_users.contains(&u.name))
            .map(|u| u.id.clone())
            .collect();

        for name in &config.restricted_channels {
            if !roster.channels.iter().any(|c| &c.name == name) {
                warn!(channel = %name, "restricted channel not found among member channels");
            }
        }
        for name in &config.authorised_users {
            if !roster.users.iter().any(|u| &u.name == name) {
                warn!(user = %name, "authorised user not found in workspace");
            }
        }

        info!(
            restricted = channels.len(),
            authorised = users.len(),
            "access policy resolved"
        );
        Self::new(channels, users)
    }

    /// Whether `user_id` may issue commands in `channel_id`.
    #[must_use]
    pub fn allows(&self, user_id: &str, channel_id: &str) -> bool {
        !self.restricted_channel_ids.contains(channel_id)
            || self.authorised_user_ids.contains(user_id)
    }
}
