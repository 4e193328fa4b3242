//! Menagerie Hub - single-writer dispatcher for the collection game
//!
//! This crate provides the coordination layer around `menagerie-core`:
//!
//! ```text
//! front end ──► Hub::execute (global lock)
//!               │
//!               ├── PlayerCache (read-through, write-back)
//!               ├── PendingTrades (one marker per player)
//!               ├── handlers::dispatch (menagerie-core)
//!               └── StorageExecutor (menagerie-db or any other impl)
//! ```
//!
//! ## Design principles
//!
//! 1. **One lock** - every state-changing command serializes on the hub's
//!    mutex; there is no per-player or per-entity locking anywhere
//! 2. **Handlers never write** - the hub alone touches storage and the
//!    cache, and only after a handler succeeds
//! 3. **menagerie-core is standalone** - it does not know about the hub

mod cache;
mod config;
mod error;
mod hub;
mod instance;

pub use cache::{PendingTrades, PlayerCache};
pub use config::HubConfig;
pub use error::{Error, Result};
pub use hub::Hub;
pub use instance::{InstanceGuard, Unguarded};
