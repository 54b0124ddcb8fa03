//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the sync core to external systems:
//! - `realtime` - Connection registry, offline queues, broadcast routing,
//!   and in-process implementations of the delivery/membership/sleeper ports

pub mod realtime;

pub use realtime::{
    BroadcastRouter, ConnectionRegistry, InMemoryMembershipResolver, MpscDeliveryChannel,
    OfflineQueue, TokioSleeper,
};
