//! Space state synchronization.
//!
//! - [`StateSyncCoordinator`] - Per-space serialization, retry and versioning

mod state_sync_coordinator;

pub use state_sync_coordinator::StateSyncCoordinator;
