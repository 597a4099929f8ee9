//! DriveSync Conflict - Update decisions for files present on both sides
//!
//! Provides:
//! - The closed set of conflict strategies and their configuration labels
//! - A pure decision function from four timestamps and a strategy to an action

pub mod error;
pub mod resolver;
pub mod strategy;

pub use error::ConflictError;
pub use resolver::{ConflictResolver, Decision, VersionTimes};
pub use strategy::ConflictStrategy;
