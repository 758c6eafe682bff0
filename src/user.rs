//! User struct definition
//!
//! Represents a registered user and the channel they currently occupy.

use serde::{Deserialize, Serialize};

use crate::registry::{Identified, Identity};
use crate::types::{ChannelKey, UserKey};

/// Registered user
///
/// A user occupies at most one channel at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Nickname, suffix and unique key
    #[serde(flatten)]
    pub identity: Identity,
    /// Channel currently joined (None before the first join)
    #[serde(default)]
    pub connection: Option<ChannelKey>,
}

impl User {
    /// Create a user that has not joined any channel yet
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            connection: None,
        }
    }

    /// Display name as requested at registration
    pub fn nickname(&self) -> &str {
        &self.identity.name
    }

    /// Check if the user is connected to the given channel
    pub fn is_connected_to(&self, channel: &ChannelKey) -> bool {
        self.connection.as_ref() == Some(channel)
    }
}

impl Identified for User {
    type Key = UserKey;

    fn identity(&self) -> &Identity {
        &self.identity
    }
}
