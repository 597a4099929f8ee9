//! DriveSync Core - Domain types and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RemoteItem`, `RemoteId`, `ManifestEntry`, timestamp helpers
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `ILocalStore`
//! - **Configuration** - YAML-backed [`config::Config`] with validation
//!
//! # Architecture
//!
//! The domain module contains pure data and comparisons with no I/O.
//! Ports define trait interfaces that adapter crates implement
//! (`drivesync-drive` for the remote side, `drivesync-sync` for the local side).
//! The sync engine in `drivesync-sync` orchestrates everything through the ports.

pub mod config;
pub mod domain;
pub mod ports;
