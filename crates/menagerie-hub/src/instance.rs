//! Single-instance process guard
//!
//! Two dispatchers writing to the same store would silently corrupt it, so
//! hub construction refuses to proceed unless the guard acquires. The
//! mechanism (file lock, socket bind, ...) is the deployment's choice; the
//! hub only cares about the yes/no answer.

/// External single-instance guard
pub trait InstanceGuard: Send + Sync {
    /// Try to become the sole running instance
    ///
    /// Returns false when another instance already holds the guard. The
    /// guard is expected to stay held for the life of the process.
    fn acquire(&self) -> bool;
}

/// A guard for deployments that manage exclusivity externally
#[derive(Debug, Clone, Copy, Default)]
pub struct Unguarded;

impl InstanceGuard for Unguarded {
    fn acquire(&self) -> bool {
        true
    }
}
