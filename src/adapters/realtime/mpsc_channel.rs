//! Tokio mpsc implementation of the DeliveryChannel port.
//!
//! The registry holds the sending half; the socket task owns the receiver
//! and forwards each message to the client. Closing drops the sender, which
//! ends the receiver stream and lets the socket task shut down.

use std::sync::Mutex;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::realtime::BroadcastMessage;
use crate::ports::{ChannelError, DeliveryChannel};

/// Default per-connection buffer before a slow client is treated as gone.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Bounded mpsc-backed delivery channel.
pub struct MpscDeliveryChannel {
    sender: Mutex<Option<mpsc::Sender<BroadcastMessage>>>,
}

impl MpscDeliveryChannel {
    /// Create a channel and the receiver the socket task should drain.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<BroadcastMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Create with default capacity (256 messages).
    pub fn with_default_capacity() -> (Self, mpsc::Receiver<BroadcastMessage>) {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl DeliveryChannel for MpscDeliveryChannel {
    fn send(&self, message: &BroadcastMessage) -> Result<(), ChannelError> {
        let guard = self.sender.lock().map_err(|_| ChannelError::Closed)?;
        let sender = guard.as_ref().ok_or(ChannelError::Closed)?;

        sender.try_send(message.clone()).map_err(|e| match e {
            TrySendError::Full(_) => ChannelError::Full,
            TrySendError::Closed(_) => ChannelError::Closed,
        })
    }

    fn close(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
    }

    fn is_closed(&self) -> bool {
        match self.sender.lock() {
            Ok(guard) => guard.as_ref().map_or(true, |sender| sender.is_closed()),
            Err(_) => true,
        }
    }
}
