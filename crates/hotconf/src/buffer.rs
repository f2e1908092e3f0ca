// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Seqlock-protected double buffer.
//!
//! Two versioned copies of the record and an atomic selector naming the
//! published one. Writers (serialized by [`WriteLock`]) build the next record
//! in the inactive copy and flip the selector; readers copy whichever copy is
//! published and retry if a writer touched it meanwhile.
//!
//! # Sequence Protocol
//!
//! Each buffer carries its own `seq`:
//! - `seq` even -> stable, safe to copy
//! - `seq` odd  -> writer in progress on this buffer
//!
//! Writer (holding the write lock):
//! 1. `old = buffers[active]` (nobody else writes the active copy)
//! 2. `target = buffers[active ^ 1]`, `seq += 1` (odd)
//! 3. copy the new record into `target`
//! 4. `seq += 1` (even), Release
//! 5. `active = target`, Release
//! 6. release the write lock
//!
//! Reader:
//! 1. `idx = active` (Acquire)
//! 2. `s1 = buffers[idx].seq` (Acquire); odd -> back off, retry
//! 3. volatile copy of `buffers[idx].record` as `MaybeUninit<R>`
//! 4. Acquire fence, `s2 = buffers[idx].seq`
//! 5. `s1 == s2` -> the copy came from exactly one publish and is assumed
//!    initialised; otherwise it is dropped unread and the reader retries
//!
//! # Memory Ordering
//!
//! - The Release fence after the odd store keeps the payload writes from
//!   being reordered before it, so a reader that sees any new byte also sees
//!   an odd or advanced `seq` on its second load.
//! - The Acquire fence after the copy keeps the second `seq` load from being
//!   hoisted above the copy.
//! - The selector store (Release) pairs with the reader's Acquire load: a read
//!   that starts after the flip sees the completed record or a later one.
//!
//! A reader holding a stale index may land on the buffer the next writer is
//! filling; the `seq` check catches that and the retry re-reads the selector.

use crate::serializer::WriteLock;
use crossbeam::utils::{Backoff, CachePadded};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{fence, AtomicU64, AtomicUsize, Ordering};

/// One versioned copy of the record.
struct VersionedBuffer<R> {
    /// Even = stable, odd = writer in progress
    seq: AtomicU64,
    record: UnsafeCell<R>,
}

impl<R: Copy> VersionedBuffer<R> {
    fn new(record: R) -> Self {
        Self {
            seq: AtomicU64::new(0),
            record: UnsafeCell::new(record),
        }
    }
}

/// Old and new record of one publish, both owned copies.
#[derive(Debug, Clone, Copy)]
pub struct Published<R> {
    /// Record that was active before the write
    pub old: R,
    /// Record that is active after the write
    pub new: R,
}

/// Two cache-padded versioned buffers, an active selector and the writer lock.
pub struct DoubleBuffer<R> {
    buffers: [CachePadded<VersionedBuffer<R>>; 2],
    active: CachePadded<AtomicUsize>,
    writer: WriteLock,
}

// SAFETY: readers only ever take bitwise copies of `R` out of the buffers,
// validated by the per-buffer sequence. Mutation of a buffer happens only
// under `writer`, and only on the buffer that is not published.
unsafe impl<R: Copy + Send> Sync for DoubleBuffer<R> {}

impl<R: Copy> DoubleBuffer<R> {
    /// Both buffers hold `initial` at version 0; buffer 0 is published.
    pub fn new(initial: R) -> Self {
        Self {
            buffers: [
                CachePadded::new(VersionedBuffer::new(initial)),
                CachePadded::new(VersionedBuffer::new(initial)),
            ],
            active: CachePadded::new(AtomicUsize::new(0)),
            writer: WriteLock::new(),
        }
    }

    /// Re-initialise both buffers with `record`.
    ///
    /// `&mut self` guarantees no reader or writer is running.
    pub fn reset(&mut self, record: R) {
        for buf in &mut self.buffers {
            *buf.seq.get_mut() = 0;
            *buf.record.get_mut() = record;
        }
        *self.active.get_mut() = 0;
    }

    /// Copy the published record. Never blocks; retries on collision.
    #[inline]
    pub fn read(&self) -> R {
        self.read_with_retries().0
    }

    /// Like [`read`](Self::read), also returning how many attempts were
    /// discarded because a writer overlapped the copy.
    pub fn read_with_retries(&self) -> (R, u32) {
        let backoff = Backoff::new();
        let mut retries = 0u32;
        loop {
            let idx = self.active.load(Ordering::Acquire);
            let buf = &self.buffers[idx];

            let s1 = buf.seq.load(Ordering::Acquire);
            if s1 & 1 == 1 {
                // Writer mid-copy on this buffer
                retries = retries.saturating_add(1);
                backoff.spin();
                continue;
            }

            // SAFETY: a writer may be overwriting the buffer concurrently, so
            // the bytes are copied as `MaybeUninit<R>`: a torn copy is never
            // materialised as an `R` and is discarded below unless `seq` did
            // not move.
            let copy = unsafe {
                ptr::read_volatile(buf.record.get().cast::<MaybeUninit<R>>())
            };

            fence(Ordering::Acquire);
            let s2 = buf.seq.load(Ordering::Relaxed);
            if s1 == s2 {
                // SAFETY: `seq` was even and unchanged across the copy, so the
                // bytes are exactly one completed publish (or the initial
                // record), which is a valid `R`.
                return (unsafe { copy.assume_init() }, retries);
            }

            retries = retries.saturating_add(1);
            backoff.spin();
        }
    }

    /// Run one serialized write.
    ///
    /// `build` receives the currently published record and returns the next
    /// one. It runs with the write lock held: it must not write to this
    /// buffer again. The lock is released before this returns, so callers can
    /// notify subscribers without holding it.
    pub fn publish<F>(&self, build: F) -> Published<R>
    where
        F: FnOnce(&R) -> R,
    {
        let guard = self.writer.lock();

        let active = self.active.load(Ordering::Relaxed);
        let inactive = active ^ 1;

        // SAFETY: only the lock holder writes buffers, and it never writes the
        // active one. Concurrent readers only read.
        let old = unsafe { *self.buffers[active].record.get() };
        let new = build(&old);

        let target = &self.buffers[inactive];
        let seq = target.seq.load(Ordering::Relaxed);
        target.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        // SAFETY: the write lock gives exclusive write access to the inactive
        // buffer; readers that race with this store see an odd or advanced
        // `seq` and discard their copy.
        unsafe { ptr::write_volatile(target.record.get(), new) };

        target.seq.store(seq.wrapping_add(2), Ordering::Release);
        self.active.store(inactive, Ordering::Release);

        drop(guard);
        Published { old, new }
    }

    /// Index of the published buffer (0 or 1).
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Current sequence of buffer `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > 1`.
    #[must_use]
    pub fn version(&self, index: usize) -> u64 {
        self.buffers[index].seq.load(Ordering::Acquire)
    }

    /// Returns true while a writer holds the write lock.
    #[must_use]
    pub fn is_writing(&self) -> bool {
        self.writer.is_locked()
    }
}
