//! Builder Sync - Real-time broadcast and state synchronization
//!
//! This crate keeps Builder Space clients in sync: it routes realtime
//! messages to connected users, buffers them for offline users, and
//! serializes concurrent writes per space with versioning and retry.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
