//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the sync core and the outside world. Adapters implement these ports.
//!
//! ## Delivery Ports
//!
//! - `DeliveryChannel` - Send handle for one live connection
//!
//! ## Data Layer Ports
//!
//! - `MembershipResolver` - Member set of a Builder Space
//! - `FullStateProvider` - Full snapshot contents of a space
//!
//! ## Runtime Ports
//!
//! - `Sleeper` - Backoff delay, swappable in tests

mod delivery_channel;
mod full_state_provider;
mod membership_resolver;
mod sleeper;

pub use delivery_channel::{ChannelError, DeliveryChannel};
pub use full_state_provider::FullStateProvider;
pub use membership_resolver::MembershipResolver;
pub use sleeper::Sleeper;
