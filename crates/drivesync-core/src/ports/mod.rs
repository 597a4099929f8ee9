//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync engine
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote drive listing, transfers and trash
//! - [`ILocalStore`] - Local directory tree below the sync root

pub mod local_store;
pub mod remote_store;

pub use local_store::{is_staging_file, ILocalStore, STAGING_SUFFIX};
pub use remote_store::{IRemoteStore, ListFilter, RemotePage};
