//! Polling Chat Server Library
//!
//! A multi-user chat server with channels and private messages. Clients
//! never get pushes: they poll with a timestamp cursor and receive every
//! message newer than it.
//!
//! # Features
//! - User and channel registration with collision-free keys
//!   (`matt`, `matt0`, `matt1`, ...)
//! - Exclusive channel membership (a user is in at most one channel)
//! - Per-channel message logs
//! - Private messages indexed by sender and recipient
//! - Cursor-based incremental reads, plus a cancellable [`Poller`]
//! - JSON snapshots loaded at startup and saved at shutdown
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the whole [`Store`]
//! - HTTP handlers hold a `ServerHandle` and await oneshot replies
//! - No locks needed - all state access goes through message passing
//!
//! Addresses are written `#channel` or `@user`; the sigil is only parsed at
//! the HTTP boundary into an [`Address`].
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use polling_chat::{handler, ChatServer, Store};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ChatServer::spawn(Store::new(), 256);
//!     let listener = TcpListener::bind("127.0.0.1:7777").await.unwrap();
//!     axum::serve(listener, handler::router(server)).await.unwrap();
//! }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod messages;
pub mod poller;
pub mod registry;
pub mod server;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod user;

// Re-export main types for convenience
pub use channel::{Channel, ChatChannel};
pub use config::Config;
pub use error::{AppError, StoreError};
pub use handler::router;
pub use message::{ChatMessage, ErrorCode};
pub use messages::Mailbox;
pub use poller::{Poller, PollerGuard};
pub use registry::Identity;
pub use server::{ChatServer, ServerCommand, ServerHandle};
pub use snapshot::SaveMode;
pub use store::{Snapshot, Store};
pub use types::{Address, ChannelKey, Timestamp, UserKey};
pub use user::User;
