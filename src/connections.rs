//! Outbound frame queues, one per open socket.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::ids::ConnectionId;

/// A serialized event, shared by every recipient of one fan-out.
pub type Frame = Arc<str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("unknown connection")]
    Unknown,

    #[error("connection closed")]
    Closed,

    #[error("send queue full")]
    Full,
}

pub struct Connections {
    senders: DashMap<ConnectionId, mpsc::Sender<Frame>>,
    max_send_queue: usize,
}

impl Connections {
    pub fn new(max_send_queue: usize) -> Self {
        Self {
            senders: DashMap::new(),
            max_send_queue: max_send_queue.max(1),
        }
    }

    /// Opens a connection and hands back the receiving end of its queue.
    pub fn open(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.max_send_queue);
        self.senders.insert(id, tx);
        (id, rx)
    }

    /// Returns whether the connection was open.
    pub fn close(&self, id: ConnectionId) -> bool {
        self.senders.remove(&id).is_some()
    }

    /// Queues a frame without waiting. A full queue drops the frame.
    pub fn send(&self, id: ConnectionId, frame: Frame) -> Result<(), DeliveryError> {
        // clone the sender so the shard lock is not held during try_send
        let tx = self
            .senders
            .get(&id)
            .map(|tx| tx.value().clone())
            .ok_or(DeliveryError::Unknown)?;

        tx.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
