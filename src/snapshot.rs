//! Snapshot persistence
//!
//! Loads and saves the store as three JSON documents in a data directory:
//! - `users.json`: user key -> user
//! - `channels.json`: channel key -> channel with its log
//! - `messages.json`: sender -> recipient -> private messages
//!
//! Each file is written to a temporary path and renamed into place.

use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::error::AppError;
use crate::messages::Mailbox;
use crate::store::Snapshot;

pub const USERS_FILE: &str = "users.json";
pub const CHANNELS_FILE: &str = "channels.json";
pub const MESSAGES_FILE: &str = "messages.json";

/// How [`save`] treats documents already on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Overwrite with the in-memory state
    Truncate,
    /// Union with what is on disk, in-memory entries winning
    Append,
}

impl FromStr for SaveMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "truncate" | "t" => Ok(SaveMode::Truncate),
            "append" | "a" => Ok(SaveMode::Append),
            other => Err(AppError::Config(format!("unknown save mode {:?}", other))),
        }
    }
}

/// Load a snapshot from `dir`; missing files load as empty
pub async fn load(dir: &Path) -> Result<Snapshot, AppError> {
    let snapshot = Snapshot {
        users: read_document(&dir.join(USERS_FILE)).await?,
        channels: read_document(&dir.join(CHANNELS_FILE)).await?,
        mailbox: read_document(&dir.join(MESSAGES_FILE)).await?,
    };

    info!(
        "Loaded snapshot from {}: {} users, {} channels, {} mailboxes",
        dir.display(),
        snapshot.users.len(),
        snapshot.channels.len(),
        snapshot.mailbox.len()
    );
    Ok(snapshot)
}

/// Save a snapshot into `dir`, creating it if needed
pub async fn save(dir: &Path, snapshot: Snapshot, mode: SaveMode) -> Result<(), AppError> {
    fs::create_dir_all(dir).await?;

    let snapshot = match mode {
        SaveMode::Truncate => snapshot,
        SaveMode::Append => merge(load(dir).await?, snapshot),
    };

    write_document(&dir.join(USERS_FILE), &snapshot.users).await?;
    write_document(&dir.join(CHANNELS_FILE), &snapshot.channels).await?;
    write_document(&dir.join(MESSAGES_FILE), &snapshot.mailbox).await?;

    info!(
        "Saved snapshot to {} ({:?}): {} users, {} channels",
        dir.display(),
        mode,
        snapshot.users.len(),
        snapshot.channels.len()
    );
    Ok(())
}

/// Union of a persisted and an in-memory snapshot
///
/// Users and channels are merged by key with the in-memory value winning.
/// The mailbox is merged per (sender, recipient) list, again preferring the
/// in-memory list; list contents are never combined.
pub fn merge(persisted: Snapshot, current: Snapshot) -> Snapshot {
    let mut users = persisted.users;
    users.extend(current.users);

    let mut channels = persisted.channels;
    channels.extend(current.channels);

    Snapshot {
        users,
        channels,
        mailbox: merge_mailbox(persisted.mailbox, current.mailbox),
    }
}

fn merge_mailbox(mut persisted: Mailbox, current: Mailbox) -> Mailbox {
    for (sender, inbox) in current {
        persisted.entry(sender).or_default().extend(inbox);
    }
    persisted
}

async fn read_document<T>(path: &Path) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    match fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} not found, starting empty", path.display());
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let data = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
