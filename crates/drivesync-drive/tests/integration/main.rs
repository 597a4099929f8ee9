//! Integration tests for drivesync-drive
//!
//! Uses wiremock to simulate the Google Drive API and verifies end-to-end
//! behavior of listing, metadata lookups, uploads, downloads, trashing and
//! retry handling.

mod common;

mod test_files;
mod test_retry;
mod test_sync_operations;
