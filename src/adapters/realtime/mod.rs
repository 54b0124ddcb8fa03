//! Realtime adapters: live connections, offline queues and routing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        BroadcastRouter                               │
//! │   - Resolves recipients (user, list, participants, space members)   │
//! │   - Excludes the sender                                              │
//! │   - Chooses live delivery or queueing per recipient                  │
//! └─────────────────────────────────────────────────────────────────────┘
//!              │                                        │
//!              │ online                                 │ offline
//!              ▼                                        ▼
//! ┌──────────────────────────────┐      ┌──────────────────────────────┐
//! │     ConnectionRegistry       │      │        OfflineQueue          │
//! │  user → one live channel     │      │  user → FIFO (cap 100)       │
//! └──────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`connection_registry`] - One live connection per user
//! - [`offline_queue`] - Bounded per-user buffers
//! - [`broadcast_router`] - Recipient resolution and delivery
//! - [`mpsc_channel`] - Tokio mpsc delivery channel
//! - [`in_memory_membership`] - Membership resolver for dev/tests
//! - [`tokio_sleeper`] - Backoff sleeper on the tokio timer

pub mod broadcast_router;
pub mod connection_registry;
pub mod in_memory_membership;
pub mod mpsc_channel;
pub mod offline_queue;
pub mod tokio_sleeper;

pub use broadcast_router::BroadcastRouter;
pub use connection_registry::{Connection, ConnectionRegistry, SendOutcome};
pub use in_memory_membership::InMemoryMembershipResolver;
pub use mpsc_channel::{MpscDeliveryChannel, DEFAULT_CHANNEL_CAPACITY};
pub use offline_queue::{OfflineQueue, QueuedEntry, DEFAULT_OFFLINE_QUEUE_CAPACITY};
pub use tokio_sleeper::TokioSleeper;
