//! Chat state store
//!
//! Owns the user and channel registries and the message storage, and
//! implements the operations that touch more than one of them: channel
//! membership changes and routed sends. Not synchronized by itself; the
//! [`ChatServer`](crate::server::ChatServer) actor is its only owner.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChatChannel};
use crate::error::StoreError;
use crate::message::ChatMessage;
use crate::messages::{Mailbox, MessageStore};
use crate::registry::{Identified, Registry};
use crate::types::{Address, ChannelKey, Timestamp, UserKey};
use crate::user::User;

/// Point-in-time copy of the whole store, as persisted on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: BTreeMap<UserKey, User>,
    pub channels: BTreeMap<ChannelKey, ChatChannel>,
    pub mailbox: Mailbox,
}

/// Users, channels and messages
#[derive(Debug, Clone, Default)]
pub struct Store {
    users: Registry<User>,
    channels: Registry<Channel>,
    messages: MessageStore,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot
    ///
    /// Membership is repaired so that every user connection points at an
    /// existing channel and every channel lists exactly its connected users.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            users,
            channels,
            mailbox,
        } = snapshot;

        // records are keyed by their own identity, whatever the map said
        let mut users: BTreeMap<UserKey, User> = users
            .into_iter()
            .map(|(key, user)| {
                if key.as_str() != user.identity.key {
                    warn!("User stored under {} has key {}, rekeying", key, user.identity.key);
                }
                (user.key(), user)
            })
            .collect();

        let mut logs = BTreeMap::new();
        let mut registered = BTreeMap::new();
        for (key, ChatChannel { mut channel, chats }) in channels {
            if key.as_str() != channel.identity.key {
                warn!(
                    "Channel stored under {} has key {}, rekeying",
                    key, channel.identity.key
                );
            }
            channel.connected.clear();
            logs.insert(channel.key(), chats);
            registered.insert(channel.key(), channel);
        }

        for (user_key, user) in users.iter_mut() {
            let Some(channel_key) = user.connection.clone() else {
                continue;
            };
            match registered.get_mut(&channel_key) {
                Some(channel) => {
                    channel.connect(user_key.clone());
                }
                None => {
                    warn!(
                        "User {} connected to missing channel {}, clearing",
                        user_key, channel_key
                    );
                    user.connection = None;
                }
            }
        }

        Self {
            users: Registry::from_entries(users),
            channels: Registry::from_entries(registered),
            messages: MessageStore::from_parts(logs, mailbox),
        }
    }

    /// Copy the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.entries().clone(),
            channels: self.channel_logs(),
            mailbox: self.messages.mailbox().clone(),
        }
    }

    /// Register a user; a taken nickname gets a numeric suffix
    pub fn register_user(&mut self, nickname: &str) -> User {
        let user = self.users.register(nickname, User::new).clone();
        info!("Registered user {} (nickname '{}')", user.identity.key, user.nickname());
        user
    }

    /// Register a channel with an empty log
    pub fn register_channel(&mut self, name: &str, operators: Vec<String>) -> Channel {
        let channel = self
            .channels
            .register(name, |identity| Channel::new(identity, operators))
            .clone();
        self.messages.open_log(channel.key());
        info!("Registered channel {} (name '{}')", channel.identity.key, name);
        channel
    }

    pub fn user(&self, key: &str) -> Result<&User, StoreError> {
        self.users
            .find(key)
            .ok_or_else(|| StoreError::UserNotFound(key.to_string()))
    }

    pub fn channel(&self, key: &str) -> Result<&Channel, StoreError> {
        self.channels
            .find(key)
            .ok_or_else(|| StoreError::ChannelNotFound(key.to_string()))
    }

    pub fn users(&self) -> &BTreeMap<UserKey, User> {
        self.users.entries()
    }

    /// All channels in key order
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.values().cloned().collect()
    }

    /// Move a user into a channel, leaving their previous channel
    ///
    /// Both keys are checked before anything is modified. Re-joining the
    /// current channel changes nothing.
    pub fn join(&mut self, user_key: &str, channel_key: &str) -> Result<Channel, StoreError> {
        let user = self.user(user_key)?;
        let channel = self.channel(channel_key)?;

        let user_key = user.key();
        let channel_key = channel.key();

        if user.is_connected_to(&channel_key) {
            debug!("User {} already in channel {}", user_key, channel_key);
            return Ok(channel.clone());
        }

        let previous = user.connection.clone();
        if let Some(old_key) = previous {
            if let Some(old) = self.channels.find_mut(old_key.as_str()) {
                old.disconnect(&user_key);
            }
            info!("User {} left channel {}", user_key, old_key);
        }

        if let Some(user) = self.users.find_mut(user_key.as_str()) {
            user.connection = Some(channel_key.clone());
        }

        let channel = self
            .channels
            .find_mut(channel_key.as_str())
            .ok_or_else(|| StoreError::ChannelNotFound(channel_key.to_string()))?;
        channel.connect(user_key.clone());

        info!(
            "User {} joined channel {} ({} connected)",
            user_key,
            channel_key,
            channel.user_count()
        );
        Ok(channel.clone())
    }

    /// Store a message and echo it back
    ///
    /// The sender must be registered, and so must the receiving channel or
    /// user; otherwise nothing is stored.
    pub fn send(&mut self, msg: ChatMessage) -> Result<ChatMessage, StoreError> {
        self.user(msg.sender.as_str())?;

        match &msg.receiver {
            Address::Channel(key) => {
                self.channel(key.as_str())?;
                debug!("Message from {} to channel {}", msg.sender, key);
                self.messages.append_channel(key, msg.clone());
            }
            Address::User(key) => {
                self.user(key.as_str())?;
                debug!("Private message from {} to {}", msg.sender, key);
                self.messages.append_private(&msg.sender, key, msg.clone());
            }
        }

        Ok(msg)
    }

    /// Messages newer than `cursor` for a channel or a user's mailbox
    ///
    /// Unknown keys read as empty.
    pub fn receive(&self, address: &Address, cursor: Timestamp) -> Vec<ChatMessage> {
        match address {
            Address::Channel(key) => self.messages.read_channel(key.as_str(), cursor),
            Address::User(key) => self.messages.read_private(key.as_str(), cursor),
        }
    }

    /// Every channel with its full log
    pub fn channel_logs(&self) -> BTreeMap<ChannelKey, ChatChannel> {
        self.channels
            .iter()
            .map(|(key, channel)| {
                let chat = ChatChannel {
                    channel: channel.clone(),
                    chats: self.messages.log(key.as_str()).to_vec(),
                };
                (key.clone(), chat)
            })
            .collect()
    }

    /// One channel with its full log
    pub fn channel_log(&self, key: &str) -> Result<ChatChannel, StoreError> {
        let channel = self.channel(key)?;
        Ok(ChatChannel {
            channel: channel.clone(),
            chats: self.messages.log(key).to_vec(),
        })
    }

    pub fn mailbox(&self) -> &Mailbox {
        self.messages.mailbox()
    }

    /// Messages sent from `sender` to `recipient`
    pub fn conversation(&self, sender: &str, recipient: &str) -> Vec<ChatMessage> {
        self.messages.conversation(sender, recipient).to_vec()
    }

    /// (users, channels, messages) counts
    pub fn stats(&self) -> (usize, usize, usize) {
        (
            self.users.len(),
            self.channels.len(),
            self.messages.message_count(),
        )
    }
}
