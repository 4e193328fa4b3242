//! Error types for menagerie-hub
//!
//! Almost nothing here escapes to callers: handler and storage faults are
//! logged and surfaced to the player as a generic failure outcome. The
//! exceptions are construction-time conditions the process cannot continue
//! from.

use thiserror::Error;

/// Result type for menagerie-hub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in menagerie-hub
#[derive(Debug, Error)]
pub enum Error {
    /// Another instance of the process already owns the store
    ///
    /// Fatal: running two writers against the same store would break the
    /// single-writer guarantee. Callers are expected to terminate.
    #[error("another instance is already running against this store")]
    AlreadyRunning,

    /// Core engine error
    #[error("core error: {0}")]
    Core(#[from] menagerie_core::Error),
}

// Compile-time check that Error is Send + Sync for thread-safe error propagation.
// This function is never called but will fail to compile if the bound is not satisfied.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
