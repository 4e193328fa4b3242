//! Menagerie DB - storage executor using native_db
//!
//! Provides persistent storage for the engine's logical tables:
//! - `players`, `catches`, `catch_payloads`
//! - `daycare`, `buddy`, `items`, `dex`, `perks`
//!
//! [`Store`] implements `menagerie_core::StorageExecutor`: each mutation
//! batch is applied inside a single read-write transaction, which is what
//! gives the dispatcher its all-or-nothing commit.

mod error;
mod models;
mod store;

pub use error::{Error, Result};
pub use store::Store;
