//! DeliveryChannel port - Send handle for one live client connection.
//!
//! The session layer owns the socket; it hands the registry a channel that
//! forwards messages to that socket. Sends are fire-and-forget: a channel
//! must never block the router waiting on a slow client.

use crate::domain::realtime::BroadcastMessage;

/// Errors a channel reports on send.
///
/// Either one means the connection can no longer be trusted and the
/// recipient is treated as offline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The connection was closed (client gone or replaced).
    #[error("channel closed")]
    Closed,

    /// The client is not draining its buffer.
    #[error("channel buffer full")]
    Full,
}

/// Port for pushing messages to a single live connection.
///
/// # Example
///
/// ```ignore
/// let (channel, mut rx) = MpscDeliveryChannel::new(256);
/// registry.register(user_id, Arc::new(channel));
///
/// // socket task
/// while let Some(message) = rx.recv().await {
///     socket.send(Message::Text(message.to_json()?)).await?;
/// }
/// ```
pub trait DeliveryChannel: Send + Sync {
    /// Push a message without waiting for the client.
    fn send(&self, message: &BroadcastMessage) -> Result<(), ChannelError>;

    /// Close the channel. Further sends fail with [`ChannelError::Closed`].
    ///
    /// Must be idempotent.
    fn close(&self);

    /// Whether the channel has been closed, by either side.
    fn is_closed(&self) -> bool;
}
