//! Cursor-based polling
//!
//! A background task that periodically asks the ChatServer for messages
//! newer than its cursor and forwards them to a channel. The cursor is the
//! largest timestamp seen so far and is handed back on cancellation, so a
//! caller can resume where it left off.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::message::ChatMessage;
use crate::server::ServerHandle;
use crate::types::{Address, Timestamp};

/// Default delay between two receive calls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Polling configuration for one address
#[derive(Debug, Clone)]
pub struct Poller {
    server: ServerHandle,
    address: Address,
    cursor: Timestamp,
    interval: Duration,
}

impl Poller {
    /// Poll `address` starting after `cursor`
    pub fn new(server: ServerHandle, address: Address, cursor: Timestamp) -> Self {
        Self {
            server,
            address,
            cursor,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start polling; new messages are sent to `out` in receive order
    ///
    /// The task stops when cancelled, when `out` is closed, or when the
    /// server is gone.
    pub fn spawn(self, out: mpsc::Sender<ChatMessage>) -> PollerGuard {
        let (cancel, cancelled) = oneshot::channel();
        let task = tokio::spawn(self.run(out, cancelled));
        PollerGuard { cancel, task }
    }

    async fn run(
        mut self,
        out: mpsc::Sender<ChatMessage>,
        mut cancelled: oneshot::Receiver<()>,
    ) -> Timestamp {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut cancelled => break,
                _ = ticker.tick() => {
                    if !self.poll_once(&out, &mut cancelled).await {
                        break;
                    }
                }
            }
        }

        debug!("Poller for {} stopped at {}", self.address, self.cursor);
        self.cursor
    }

    /// One receive round; false when polling should stop
    ///
    /// Each delivery races the cancel signal, so a consumer that stops
    /// draining `out` cannot keep the task alive.
    async fn poll_once(
        &mut self,
        out: &mpsc::Sender<ChatMessage>,
        cancelled: &mut oneshot::Receiver<()>,
    ) -> bool {
        let msgs = match self.server.receive(self.address.clone(), self.cursor).await {
            Ok(msgs) => msgs,
            Err(e) => {
                warn!("Poller for {} stopping: {}", self.address, e);
                return false;
            }
        };

        for msg in msgs {
            let timestamp = msg.timestamp;
            tokio::select! {
                _ = &mut *cancelled => return false,
                sent = out.send(msg) => {
                    if sent.is_err() {
                        debug!("Poller for {} lost its receiver", self.address);
                        return false;
                    }
                }
            }
            self.cursor = self.cursor.max(timestamp);
        }
        true
    }
}

/// Handle to a running poller
#[derive(Debug)]
pub struct PollerGuard {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<Timestamp>,
}

impl PollerGuard {
    /// Stop polling and return the last cursor
    pub async fn cancel(self) -> Option<Timestamp> {
        let _ = self.cancel.send(());
        self.task.await.ok()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
