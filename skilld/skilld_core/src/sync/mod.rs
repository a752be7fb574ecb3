//! Synchronization primitives.

mod lock;

pub use lock::{LockError, LockStats, TrackedMutex, TrackedMutexGuard};
