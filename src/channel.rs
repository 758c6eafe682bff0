//! Channel struct definition
//!
//! Represents a chat channel with its operators and connected users.

use serde::{Deserialize, Serialize};

use crate::message::ChatMessage;
use crate::registry::{Identified, Identity};
use crate::types::{ChannelKey, UserKey};

/// Chat channel
///
/// `connected` never holds the same user twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel name, suffix and unique key
    #[serde(flatten)]
    pub identity: Identity,
    /// Display names of channel operators
    #[serde(default)]
    pub operators: Vec<String>,
    /// Users currently in the channel
    #[serde(default)]
    pub connected: Vec<UserKey>,
}

impl Channel {
    /// Create an empty channel; duplicate operator names are dropped
    pub fn new(identity: Identity, operators: Vec<String>) -> Self {
        let mut unique = Vec::with_capacity(operators.len());
        for op in operators {
            if !unique.contains(&op) {
                unique.push(op);
            }
        }

        Self {
            identity,
            operators: unique,
            connected: Vec::new(),
        }
    }

    /// Check if a user is in this channel
    pub fn contains(&self, user: &UserKey) -> bool {
        self.connected.contains(user)
    }

    /// Add a user to the channel
    ///
    /// Returns false if the user was already connected.
    pub fn connect(&mut self, user: UserKey) -> bool {
        if self.contains(&user) {
            false
        } else {
            self.connected.push(user);
            true
        }
    }

    /// Remove a user from the channel without preserving order
    ///
    /// Returns false if the user was not connected.
    pub fn disconnect(&mut self, user: &UserKey) -> bool {
        match self.connected.iter().position(|u| u == user) {
            Some(index) => {
                self.connected.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Get the number of connected users
    pub fn user_count(&self) -> usize {
        self.connected.len()
    }
}

impl Identified for Channel {
    type Key = ChannelKey;

    fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// A channel together with its message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChannel {
    pub channel: Channel,
    #[serde(default)]
    pub chats: Vec<ChatMessage>,
}
