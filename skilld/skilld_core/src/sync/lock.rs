//! An instrumented exclusive lock.
//!
//! `TrackedMutex` wraps a `parking_lot::Mutex` and records how often it is
//! taken, how long callers waited and how long it was held. Holds longer
//! than an optional threshold are reported with `warn!`.

use log::{trace, warn};
use parking_lot::{Mutex, MutexGuard};
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error when acquiring a lock
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The lock could not be acquired within the specified timeout
    #[error("lock {name} not acquired within {timeout:?}")]
    Timeout { name: String, timeout: Duration },
}

/// Snapshot of lock usage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LockStats {
    /// Number of successful acquisitions
    pub acquisition_count: u64,

    /// Number of timed acquisitions that gave up
    pub failed_count: u64,

    /// Total time spent waiting for the lock (microseconds)
    pub total_wait_time_us: u64,

    /// Total time the lock was held (microseconds)
    pub total_hold_time_us: u64,

    /// Longest wait (microseconds)
    pub max_wait_time_us: u64,

    /// Longest hold (microseconds)
    pub max_hold_time_us: u64,

    /// Number of holds longer than the slow threshold
    pub slow_hold_count: u64,
}

#[derive(Debug, Default)]
struct Counters {
    acquisition_count: AtomicU64,
    failed_count: AtomicU64,
    total_wait_time_us: AtomicU64,
    total_hold_time_us: AtomicU64,
    max_wait_time_us: AtomicU64,
    max_hold_time_us: AtomicU64,
    slow_hold_count: AtomicU64,
}

impl Counters {
    fn record_wait(&self, wait: Duration) {
        let us = wait.as_micros() as u64;
        self.acquisition_count.fetch_add(1, Ordering::Relaxed);
        self.total_wait_time_us.fetch_add(us, Ordering::Relaxed);
        self.max_wait_time_us.fetch_max(us, Ordering::Relaxed);
    }

    fn record_hold(&self, hold: Duration) {
        let us = hold.as_micros() as u64;
        self.total_hold_time_us.fetch_add(us, Ordering::Relaxed);
        self.max_hold_time_us.fetch_max(us, Ordering::Relaxed);
    }
}

/// A mutex with usage statistics.
pub struct TrackedMutex<T> {
    mutex: Mutex<T>,
    counters: Counters,
    name: String,
    slow_threshold: Option<Duration>,
}

/// Guard returned by [`TrackedMutex::lock`]; releases the lock on drop.
///
/// The lock is released before the hold is logged, so a logger may take
/// the same lock again.
pub struct TrackedMutexGuard<'a, T> {
    guard: ManuallyDrop<MutexGuard<'a, T>>,
    acquired_at: Instant,
    owner: &'a TrackedMutex<T>,
}

impl<T> TrackedMutex<T> {
    /// Create a new tracked mutex with a name for diagnostics.
    pub fn new(value: T, name: impl Into<String>) -> Self {
        Self {
            mutex: Mutex::new(value),
            counters: Counters::default(),
            name: name.into(),
            slow_threshold: None,
        }
    }

    /// Warn whenever the lock is held for longer than `threshold`.
    pub fn with_slow_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Block until the lock is acquired.
    pub fn lock(&self) -> TrackedMutexGuard<'_, T> {
        let start = Instant::now();
        let guard = self.mutex.lock();
        self.acquired(guard, start.elapsed())
    }

    /// Acquire the lock if it is free right now.
    pub fn try_lock(&self) -> Option<TrackedMutexGuard<'_, T>> {
        let start = Instant::now();
        let guard = self.mutex.try_lock()?;
        Some(self.acquired(guard, start.elapsed()))
    }

    /// Acquire the lock, giving up after `timeout`.
    pub fn try_lock_for(&self, timeout: Duration) -> Result<TrackedMutexGuard<'_, T>, LockError> {
        let start = Instant::now();
        match self.mutex.try_lock_for(timeout) {
            Some(guard) => Ok(self.acquired(guard, start.elapsed())),
            None => {
                self.counters.failed_count.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Lock timeout: {} (waited: {:.2}ms)",
                    self.name,
                    start.elapsed().as_secs_f64() * 1000.0
                );
                Err(LockError::Timeout {
                    name: self.name.clone(),
                    timeout,
                })
            }
        }
    }

    /// Get the statistics for this mutex.
    pub fn stats(&self) -> LockStats {
        let c = &self.counters;
        LockStats {
            acquisition_count: c.acquisition_count.load(Ordering::Relaxed),
            failed_count: c.failed_count.load(Ordering::Relaxed),
            total_wait_time_us: c.total_wait_time_us.load(Ordering::Relaxed),
            total_hold_time_us: c.total_hold_time_us.load(Ordering::Relaxed),
            max_wait_time_us: c.max_wait_time_us.load(Ordering::Relaxed),
            max_hold_time_us: c.max_hold_time_us.load(Ordering::Relaxed),
            slow_hold_count: c.slow_hold_count.load(Ordering::Relaxed),
        }
    }

    /// Get the name of this mutex.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn acquired<'a>(&'a self, guard: MutexGuard<'a, T>, wait: Duration) -> TrackedMutexGuard<'a, T> {
        self.counters.record_wait(wait);
        trace!(
            "Lock acquired: {} (wait time: {:.2}ms)",
            self.name,
            wait.as_secs_f64() * 1000.0
        );
        TrackedMutexGuard {
            guard: ManuallyDrop::new(guard),
            acquired_at: Instant::now(),
            owner: self,
        }
    }
}

impl<T> Drop for TrackedMutexGuard<'_, T> {
    fn drop(&mut self) {
        let held = self.acquired_at.elapsed();
        // SAFETY: `guard` is never touched again after this point.
        unsafe { ManuallyDrop::drop(&mut self.guard) };

        let owner = self.owner;
        owner.counters.record_hold(held);

        match owner.slow_threshold {
            Some(threshold) if held > threshold => {
                owner.counters.slow_hold_count.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Lock {} held for {:.2}ms (threshold {:.2}ms)",
                    owner.name,
                    held.as_secs_f64() * 1000.0,
                    threshold.as_secs_f64() * 1000.0
                );
            }
            _ => trace!(
                "Lock released: {} (held for: {:.2}ms)",
                owner.name,
                held.as_secs_f64() * 1000.0
            ),
        }
    }
}

impl<T> std::ops::Deref for TrackedMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T> std::ops::DerefMut for TrackedMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}
