//! Message protocol definitions
//!
//! JSON request and response bodies of the HTTP interface, and the
//! chat message record kept in channel logs and mailboxes.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{Address, Timestamp, UserKey};

/// A chat message as sent by a client and stored by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender-supplied time in seconds, used as the polling cursor
    pub timestamp: Timestamp,
    /// Key of the sending user
    pub sender: UserKey,
    /// Channel or user the message is routed to
    pub receiver: Address,
    /// Message body
    pub text: String,
}

impl ChatMessage {
    pub fn new(
        timestamp: Timestamp,
        sender: impl Into<UserKey>,
        receiver: Address,
        text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            sender: sender.into(),
            receiver,
            text: text.into(),
        }
    }
}

/// `POST /user` body
#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub nickname: String,
}

/// `POST /channel` body
#[derive(Debug, Deserialize)]
pub struct RegisterChannel {
    pub channelname: String,
    #[serde(default)]
    pub operators: Vec<String>,
}

/// `POST /join` body
#[derive(Debug, Deserialize)]
pub struct JoinChannel {
    pub user: String,
    pub channel: String,
}

/// `POST /chat/send` body
///
/// The receiver stays a raw string here so an unknown sigil is reported
/// as an invalid address instead of a malformed body.
#[derive(Debug, Deserialize)]
pub struct SendChat {
    pub timestamp: Timestamp,
    pub sender: String,
    pub receiver: String,
    pub text: String,
}

impl SendChat {
    pub fn into_message(self) -> Result<ChatMessage, StoreError> {
        let receiver: Address = self.receiver.parse()?;
        Ok(ChatMessage::new(self.timestamp, self.sender, receiver, self.text))
    }
}

/// Error codes carried in error responses
///
/// Represents different error scenarios that can be communicated to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Unknown user or channel key
    NotFound,
    /// Request body or path could not be decoded
    Malformed,
    /// Address without a `#` or `@` sigil
    InvalidAddress,
    /// Server-side failure
    Internal,
}

/// Error response body: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            error: ErrorDetail { code, message },
        }
    }
}
