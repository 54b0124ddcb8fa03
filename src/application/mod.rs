//! Application layer - Services composed from ports and adapters.
//!
//! - `sync` - Serialized, versioned writes per Builder Space
//! - `presence` - Connect/disconnect lifecycle and presence fan-out

pub mod presence;
pub mod sync;

pub use presence::{ConnectResult, PresenceService};
pub use sync::StateSyncCoordinator;
