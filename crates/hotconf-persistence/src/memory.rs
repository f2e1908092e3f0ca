// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory backend

use hotconf::PersistenceBackend;
use parking_lot::Mutex;

/// Keeps the last saved record in memory.
///
/// `load` fails until something has been saved.
#[derive(Debug)]
pub struct MemoryBackend<R> {
    saved: Mutex<Option<R>>,
}

impl<R> Default for MemoryBackend<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> MemoryBackend<R> {
    /// Empty backend
    pub fn new() -> Self {
        Self {
            saved: Mutex::new(None),
        }
    }

    /// Backend pre-seeded with `record`, as if it had been saved.
    pub fn with_record(record: R) -> Self {
        Self {
            saved: Mutex::new(Some(record)),
        }
    }

    /// Forget the saved record.
    pub fn clear(&self) {
        *self.saved.lock() = None;
    }

    /// Returns true if a record has been saved.
    pub fn is_empty(&self) -> bool {
        self.saved.lock().is_none()
    }
}

impl<R: Copy> MemoryBackend<R> {
    /// The saved record, if any.
    pub fn saved(&self) -> Option<R> {
        *self.saved.lock()
    }
}

impl<R: Copy + Send> PersistenceBackend<R> for MemoryBackend<R> {
    fn save(&self, record: &R) -> bool {
        *self.saved.lock() = Some(*record);
        true
    }

    fn load(&self, out: &mut R) -> bool {
        match *self.saved.lock() {
            Some(record) => {
                *out = record;
                true
            }
            None => false,
        }
    }
}
