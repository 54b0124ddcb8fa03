//! Domain layer - Pure types with no I/O.

pub mod foundation;
pub mod realtime;
