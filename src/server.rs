//! ChatServer Actor implementation
//!
//! The central actor that owns the whole [`Store`]: users, channels and
//! messages. Handlers talk to it through a cloneable [`ServerHandle`];
//! every command carries a oneshot channel for its reply. Commands are
//! applied one at a time, so a join touching two registries is never
//! observed half-done.

use std::collections::BTreeMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::channel::{Channel, ChatChannel};
use crate::error::{AppError, StoreError};
use crate::message::ChatMessage;
use crate::messages::Mailbox;
use crate::store::{Snapshot, Store};
use crate::types::{Address, ChannelKey, Timestamp, UserKey};
use crate::user::User;

type Reply<T> = oneshot::Sender<T>;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Register a user
    RegisterUser {
        nickname: String,
        respond_to: Reply<User>,
    },
    /// Register a channel
    RegisterChannel {
        name: String,
        operators: Vec<String>,
        respond_to: Reply<Channel>,
    },
    /// All users by key
    ListUsers {
        respond_to: Reply<BTreeMap<UserKey, User>>,
    },
    /// One user
    GetUser {
        key: String,
        respond_to: Reply<Option<User>>,
    },
    /// All channels
    ListChannels { respond_to: Reply<Vec<Channel>> },
    /// One channel
    GetChannel {
        key: String,
        respond_to: Reply<Option<Channel>>,
    },
    /// Move a user into a channel
    Join {
        user: String,
        channel: String,
        respond_to: Reply<Result<Channel, StoreError>>,
    },
    /// Store a chat message
    Send {
        message: ChatMessage,
        respond_to: Reply<Result<ChatMessage, StoreError>>,
    },
    /// Read messages newer than a cursor
    Receive {
        address: Address,
        cursor: Timestamp,
        respond_to: Reply<Vec<ChatMessage>>,
    },
    /// All channels with their logs
    ChannelLogs {
        respond_to: Reply<BTreeMap<ChannelKey, ChatChannel>>,
    },
    /// One channel with its log
    ChannelLog {
        key: String,
        respond_to: Reply<Option<ChatChannel>>,
    },
    /// The whole mailbox matrix
    Mailbox { respond_to: Reply<Mailbox> },
    /// Private messages from one user to another
    Conversation {
        from: String,
        to: String,
        respond_to: Reply<Vec<ChatMessage>>,
    },
    /// Copy of the entire state for persistence
    Snapshot { respond_to: Reply<Snapshot> },
}

/// The main ChatServer actor
///
/// Owns all state and processes commands from request handlers.
pub struct ChatServer {
    /// Users, channels and messages
    store: Store,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a ChatServer around existing state (e.g. a loaded snapshot)
    pub fn with_store(receiver: mpsc::Receiver<ServerCommand>, store: Store) -> Self {
        Self { store, receiver }
    }

    /// Spawn an actor on the current runtime and return its handle
    pub fn spawn(store: Store, buffer: usize) -> ServerHandle {
        let (sender, receiver) = mpsc::channel(buffer);
        tokio::spawn(Self::with_store(receiver, store).run());
        ServerHandle { sender }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        let (users, channels, messages) = self.store.stats();
        info!(
            "ChatServer started ({} users, {} channels, {} messages)",
            users, channels, messages
        );

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    ///
    /// A dropped reply receiver only means the requester went away.
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::RegisterUser {
                nickname,
                respond_to,
            } => {
                let _ = respond_to.send(self.store.register_user(&nickname));
            }
            ServerCommand::RegisterChannel {
                name,
                operators,
                respond_to,
            } => {
                let _ = respond_to.send(self.store.register_channel(&name, operators));
            }
            ServerCommand::ListUsers { respond_to } => {
                let _ = respond_to.send(self.store.users().clone());
            }
            ServerCommand::GetUser { key, respond_to } => {
                let _ = respond_to.send(self.store.user(&key).ok().cloned());
            }
            ServerCommand::ListChannels { respond_to } => {
                let _ = respond_to.send(self.store.channels());
            }
            ServerCommand::GetChannel { key, respond_to } => {
                let _ = respond_to.send(self.store.channel(&key).ok().cloned());
            }
            ServerCommand::Join {
                user,
                channel,
                respond_to,
            } => {
                let _ = respond_to.send(self.store.join(&user, &channel));
            }
            ServerCommand::Send {
                message,
                respond_to,
            } => {
                let _ = respond_to.send(self.store.send(message));
            }
            ServerCommand::Receive {
                address,
                cursor,
                respond_to,
            } => {
                let msgs = self.store.receive(&address, cursor);
                debug!("Receive {} after {}: {} messages", address, cursor, msgs.len());
                let _ = respond_to.send(msgs);
            }
            ServerCommand::ChannelLogs { respond_to } => {
                let _ = respond_to.send(self.store.channel_logs());
            }
            ServerCommand::ChannelLog { key, respond_to } => {
                let _ = respond_to.send(self.store.channel_log(&key).ok());
            }
            ServerCommand::Mailbox { respond_to } => {
                let _ = respond_to.send(self.store.mailbox().clone());
            }
            ServerCommand::Conversation { from, to, respond_to } => {
                let _ = respond_to.send(self.store.conversation(&from, &to));
            }
            ServerCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.store.snapshot());
            }
        }
    }
}

/// Cloneable client of the ChatServer actor
#[derive(Debug, Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    pub fn new(sender: mpsc::Sender<ServerCommand>) -> Self {
        Self { sender }
    }

    /// Send a command built around a fresh reply channel and await the reply
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> ServerCommand,
    ) -> Result<T, AppError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| AppError::ChannelSend)?;
        response.await.map_err(|_| AppError::ChannelSend)
    }

    pub async fn register_user(&self, nickname: String) -> Result<User, AppError> {
        self.request(|respond_to| ServerCommand::RegisterUser {
            nickname,
            respond_to,
        })
        .await
    }

    pub async fn register_channel(
        &self,
        name: String,
        operators: Vec<String>,
    ) -> Result<Channel, AppError> {
        self.request(|respond_to| ServerCommand::RegisterChannel {
            name,
            operators,
            respond_to,
        })
        .await
    }

    pub async fn list_users(&self) -> Result<BTreeMap<UserKey, User>, AppError> {
        self.request(|respond_to| ServerCommand::ListUsers { respond_to })
            .await
    }

    pub async fn get_user(&self, key: String) -> Result<Option<User>, AppError> {
        self.request(|respond_to| ServerCommand::GetUser { key, respond_to })
            .await
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>, AppError> {
        self.request(|respond_to| ServerCommand::ListChannels { respond_to })
            .await
    }

    pub async fn get_channel(&self, key: String) -> Result<Option<Channel>, AppError> {
        self.request(|respond_to| ServerCommand::GetChannel { key, respond_to })
            .await
    }

    pub async fn join(&self, user: String, channel: String) -> Result<Channel, AppError> {
        let joined = self
            .request(|respond_to| ServerCommand::Join {
                user,
                channel,
                respond_to,
            })
            .await?;
        Ok(joined?)
    }

    pub async fn send(&self, message: ChatMessage) -> Result<ChatMessage, AppError> {
        let sent = self
            .request(|respond_to| ServerCommand::Send {
                message,
                respond_to,
            })
            .await?;
        Ok(sent?)
    }

    pub async fn receive(
        &self,
        address: Address,
        cursor: Timestamp,
    ) -> Result<Vec<ChatMessage>, AppError> {
        self.request(|respond_to| ServerCommand::Receive {
            address,
            cursor,
            respond_to,
        })
        .await
    }

    pub async fn channel_logs(&self) -> Result<BTreeMap<ChannelKey, ChatChannel>, AppError> {
        self.request(|respond_to| ServerCommand::ChannelLogs { respond_to })
            .await
    }

    pub async fn channel_log(&self, key: String) -> Result<Option<ChatChannel>, AppError> {
        self.request(|respond_to| ServerCommand::ChannelLog { key, respond_to })
            .await
    }

    pub async fn mailbox(&self) -> Result<Mailbox, AppError> {
        self.request(|respond_to| ServerCommand::Mailbox { respond_to })
            .await
    }

    pub async fn conversation(&self, from: String, to: String) -> Result<Vec<ChatMessage>, AppError> {
        self.request(|respond_to| ServerCommand::Conversation { from, to, respond_to })
            .await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, AppError> {
        self.request(|respond_to| ServerCommand::Snapshot { respond_to })
            .await
    }
}
