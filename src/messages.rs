//! Message storage
//!
//! Append-only channel logs and the sender x recipient mailbox matrix,
//! both read through a timestamp cursor.

use std::collections::BTreeMap;

use crate::message::ChatMessage;
use crate::types::{ChannelKey, Timestamp, UserKey};

/// Private messages: sender -> recipient -> messages in arrival order
pub type Mailbox = BTreeMap<UserKey, BTreeMap<UserKey, Vec<ChatMessage>>>;

/// Channel logs and private mailboxes
///
/// Knows nothing about registries; callers validate keys first.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    logs: BTreeMap<ChannelKey, Vec<ChatMessage>>,
    mailbox: Mailbox,
}

impl MessageStore {
    /// Build from persisted logs and mailbox
    pub fn from_parts(logs: BTreeMap<ChannelKey, Vec<ChatMessage>>, mailbox: Mailbox) -> Self {
        Self { logs, mailbox }
    }

    /// Make sure a (possibly empty) log exists for the channel
    pub fn open_log(&mut self, channel: ChannelKey) {
        self.logs.entry(channel).or_default();
    }

    /// Append to a channel log
    pub fn append_channel(&mut self, channel: &ChannelKey, msg: ChatMessage) {
        self.logs.entry(channel.clone()).or_default().push(msg);
    }

    /// Append to `mailbox[sender][recipient]`, creating entries on demand
    pub fn append_private(&mut self, sender: &UserKey, recipient: &UserKey, msg: ChatMessage) {
        self.mailbox
            .entry(sender.clone())
            .or_default()
            .entry(recipient.clone())
            .or_default()
            .push(msg);
    }

    /// Messages of a channel newer than `cursor`, in log order
    pub fn read_channel(&self, channel: &str, cursor: Timestamp) -> Vec<ChatMessage> {
        self.log(channel)
            .iter()
            .filter(|msg| msg.timestamp > cursor)
            .cloned()
            .collect()
    }

    /// Private messages to `recipient` newer than `cursor`, from every sender
    ///
    /// Sorted by timestamp; messages with equal timestamps keep sender key
    /// order, then arrival order.
    pub fn read_private(&self, recipient: &str, cursor: Timestamp) -> Vec<ChatMessage> {
        let mut msgs: Vec<ChatMessage> = self
            .mailbox
            .values()
            .filter_map(|inbox| inbox.get(recipient))
            .flatten()
            .filter(|msg| msg.timestamp > cursor)
            .cloned()
            .collect();

        msgs.sort_by_key(|msg| msg.timestamp);
        msgs
    }

    /// Full log of a channel (empty if unknown)
    pub fn log(&self, channel: &str) -> &[ChatMessage] {
        self.logs.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Messages sent from one user to another (empty if none)
    pub fn conversation(&self, sender: &str, recipient: &str) -> &[ChatMessage] {
        self.mailbox
            .get(sender)
            .and_then(|inbox| inbox.get(recipient))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Total number of stored messages
    pub fn message_count(&self) -> usize {
        let channel: usize = self.logs.values().map(Vec::len).sum();
        let private: usize = self
            .mailbox
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum();
        channel + private
    }
}
