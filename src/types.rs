//! Basic type definitions for the chat server
//!
//! Provides newtype wrappers for type safety:
//! - `UserKey`: unique lookup key of a registered user
//! - `ChannelKey`: unique lookup key of a registered channel
//! - `Address`: routed message destination (`#channel` or `@user`)

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Message timestamp in seconds, supplied by the sender
pub type Timestamp = i64;

/// Sigil marking a channel address
pub const CHANNEL_SIGIL: char = '#';

/// Sigil marking a private (user) address
pub const USER_SIGIL: char = '@';

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

key_type!(
    /// Unique user identifier (newtype pattern)
    ///
    /// Either the bare nickname or nickname plus the allocated suffix.
    UserKey
);

key_type!(
    /// Unique channel identifier (newtype pattern)
    ChannelKey
);

/// Message destination
///
/// Only the transport boundary deals with sigils: serde encodes an address
/// as `#key` / `@key`, and everything behind it matches on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Address {
    /// Channel log of the given channel
    Channel(ChannelKey),
    /// Private mailbox of the given user
    User(UserKey),
}

impl FromStr for Address {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let sigil = chars.next();
        let key = chars.as_str();

        if key.is_empty() {
            return Err(StoreError::InvalidAddress(s.to_string()));
        }

        match sigil {
            Some(CHANNEL_SIGIL) => Ok(Address::Channel(key.into())),
            Some(USER_SIGIL) => Ok(Address::User(key.into())),
            _ => Err(StoreError::InvalidAddress(s.to_string())),
        }
    }
}

impl TryFrom<String> for Address {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Channel(key) => write!(f, "{}{}", CHANNEL_SIGIL, key),
            Address::User(key) => write!(f, "{}{}", USER_SIGIL, key),
        }
    }
}
