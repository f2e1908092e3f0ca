// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write serializer: one spinning flag shared by every writer of a store.
//!
//! # Memory Ordering
//!
//! - **Acquire** on the successful compare-exchange: the new holder sees every
//!   buffer write and selector store made by the previous holder.
//! - **Release** when the guard drops: publishes this holder's writes to the
//!   next one.
//!
//! The lock is not re-entrant. Acquiring it again from code that already holds
//! it (e.g. writing to the store from inside an `update` closure) spins forever.

use crossbeam::utils::Backoff;
use std::sync::atomic::{AtomicBool, Ordering};

/// Spin-based mutual exclusion for the writer path.
#[derive(Debug, Default)]
pub struct WriteLock {
    locked: AtomicBool,
}

impl WriteLock {
    /// Create an unlocked serializer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Spin until the flag is clear, then claim it.
    pub fn lock(&self) -> WriteGuard<'_> {
        let backoff = Backoff::new();
        loop {
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return WriteGuard { lock: self };
            }
            // Test-and-test-and-set: wait on a plain load so contending writers
            // don't bounce the cache line with failed CAS attempts.
            while self.locked.load(Ordering::Relaxed) {
                backoff.snooze();
            }
        }
    }

    /// Claim the flag if it is clear, without spinning.
    pub fn try_lock(&self) -> Option<WriteGuard<'_>> {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| WriteGuard { lock: self })
    }

    /// Returns true while some writer holds the flag.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// Proof that the holder is the only active writer. Clears the flag on drop.
#[must_use = "dropping the guard releases the write lock immediately"]
#[derive(Debug)]
pub struct WriteGuard<'a> {
    lock: &'a WriteLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}
