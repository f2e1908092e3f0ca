// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Store metrics.
//!
//! Atomic counters for the write path and for rare events on the read path.
//! Successful uncontended reads are not counted: a shared counter bumped by
//! every reader would turn the read path into a cache-line ping-pong.
//!
//! # Tracked Metrics
//!
//! - `writes`: Whole-record publishes (`write_all`, `update`, restores, loads)
//! - `field_writes`: Single-field publishes (`write_field`, `restore_field`)
//! - `read_retries`: Read attempts discarded because a writer overlapped
//! - `notifications`: Change callbacks invoked
//! - `refused_registrations`: Callback registrations refused (table full)

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-store counters.
///
/// All counters use `Relaxed` ordering; values are eventually consistent.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    writes: AtomicU64,
    field_writes: AtomicU64,
    read_retries: AtomicU64,
    notifications: AtomicU64,
    refused_registrations: AtomicU64,
}

impl StoreMetrics {
    /// Create new metrics instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            writes: AtomicU64::new(0),
            field_writes: AtomicU64::new(0),
            read_retries: AtomicU64::new(0),
            notifications: AtomicU64::new(0),
            refused_registrations: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn inc_writes(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_field_writes(&self) {
        self.field_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_read_retries(&self, retries: u32) {
        if retries > 0 {
            self.read_retries
                .fetch_add(u64::from(retries), Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn add_notifications(&self, fired: usize) {
        if fired > 0 {
            self.notifications.fetch_add(fired as u64, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn inc_refused_registrations(&self) {
        self.refused_registrations.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.writes.store(0, Ordering::Relaxed);
        self.field_writes.store(0, Ordering::Relaxed);
        self.read_retries.store(0, Ordering::Relaxed);
        self.notifications.store(0, Ordering::Relaxed);
        self.refused_registrations.store(0, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            field_writes: self.field_writes.load(Ordering::Relaxed),
            read_retries: self.read_retries.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
            refused_registrations: self.refused_registrations.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of store metrics (non-atomic, for reporting).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetricsSnapshot {
    /// Whole-record publishes
    pub writes: u64,
    /// Single-field publishes
    pub field_writes: u64,
    /// Discarded read attempts
    pub read_retries: u64,
    /// Callbacks invoked
    pub notifications: u64,
    /// Registrations refused because the table was full
    pub refused_registrations: u64,
}

impl StoreMetricsSnapshot {
    /// Total publishes of any kind.
    #[must_use]
    pub fn total_writes(&self) -> u64 {
        self.writes + self.field_writes
    }

    /// Average callbacks fired per publish.
    ///
    /// Returns 0.0 if nothing was written.
    #[must_use]
    pub fn notifications_per_write(&self) -> f64 {
        let total = self.total_writes();
        if total == 0 {
            0.0
        } else {
            self.notifications as f64 / total as f64
        }
    }
}

impl std::fmt::Display for StoreMetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Store[writes={}, field_writes={}, read_retries={}, notifications={}, refused={}]",
            self.writes,
            self.field_writes,
            self.read_retries,
            self.notifications,
            self.refused_registrations
        )
    }
}
