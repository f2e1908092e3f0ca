// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Configuration store: the public face of the engine.
//!
//! `ConfigStore` ties together the double buffer (lock-free reads, serialized
//! writes), the callback table and the persistence hooks.
//!
//! # Write Path
//!
//! ```text
//! write_all / write_field / update
//!     |
//!     v
//! DoubleBuffer::publish  (write lock held: build -> seq odd -> copy -> seq even -> flip)
//!     |  lock released
//!     v
//! detect::notify_*       (old vs new, PartialEq per field)
//!     |
//!     v
//! handlers               (writer's thread, no lock held)
//! ```
//!
//! # Read Path
//!
//! `read_all` and `read_field` never block and never allocate. They touch the
//! selector and one buffer's sequence counter, copy the record, and retry if a
//! writer overlapped the copy.

use crate::buffer::DoubleBuffer;
use crate::config::DEFAULT_CALLBACK_CAPACITY;
use crate::detect;
use crate::error::{Error, Result};
use crate::field::{Field, Record};
use crate::metrics::{StoreMetrics, StoreMetricsSnapshot};
use crate::persist::{PersistenceBackend, PersistenceHooks};
use crate::registry::{CallbackRegistry, Registration, SlotKey};
use std::fmt;
use std::sync::Arc;

/// Double-buffered configuration store for record `R` with room for `N`
/// field callbacks.
///
/// Share it between threads with `Arc`. Reads are wait-free in the absence
/// of writers and lock-free otherwise; writers are serialized against each
/// other but never wait for readers.
///
/// # Example
///
/// ```
/// use hotconf::{ConfigStore, Record};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Record)]
/// struct Settings {
///     volume: u8,
///     muted: bool,
/// }
///
/// let store: ConfigStore<Settings> = ConfigStore::new(Settings { volume: 5, muted: false });
/// store
///     .on_change(Settings::VOLUME, |v| println!("volume -> {v}"))
///     .expect("callback slot");
///
/// store.write_field(Settings::VOLUME, 9);
/// assert_eq!(store.read_field(Settings::VOLUME), 9);
///
/// store.restore_all();
/// assert_eq!(store.read_all().volume, 5);
/// ```
pub struct ConfigStore<R: Record, const N: usize = { DEFAULT_CALLBACK_CAPACITY }> {
    buffer: DoubleBuffer<R>,
    default: R,
    callbacks: CallbackRegistry<R, N>,
    persistence: PersistenceHooks<R>,
    metrics: StoreMetrics,
}

impl<R: Record, const N: usize> ConfigStore<R, N> {
    /// Create a store whose default and current record are `default`.
    #[must_use]
    pub fn new(default: R) -> Self {
        Self {
            buffer: DoubleBuffer::new(default),
            default,
            callbacks: CallbackRegistry::new(),
            persistence: PersistenceHooks::new(),
            metrics: StoreMetrics::new(),
        }
    }

    /// Replace the default record and reinitialise both buffers with it.
    ///
    /// Registered callbacks and persistence hooks are kept; no callback fires.
    /// `&mut self` guarantees nobody else is using the store.
    pub fn setup(&mut self, default: R) {
        self.default = default;
        self.buffer.reset(default);
        log::debug!(
            "[hotconf] {}: setup, buffers reinitialised",
            R::layout().type_name
        );
    }

    /// The default record given at construction or to [`setup`](Self::setup).
    #[inline]
    #[must_use]
    pub fn get_default(&self) -> &R {
        &self.default
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Consistent snapshot of the whole current record.
    #[inline]
    #[must_use]
    pub fn read_all(&self) -> R {
        let (record, retries) = self.buffer.read_with_retries();
        self.metrics.add_read_retries(retries);
        record
    }

    /// Current value of one field.
    ///
    /// Reads the whole record and projects it, so the cost is that of
    /// [`read_all`](Self::read_all).
    #[inline]
    #[must_use]
    pub fn read_field<V: Copy>(&self, field: Field<R, V>) -> V {
        *field.get(&self.read_all())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Publish `record` and fire the callbacks of every field it changed.
    pub fn write_all(&self, record: R) {
        let published = self.buffer.publish(|_| record);
        self.metrics.inc_writes();
        let fired = detect::notify_changes(&self.callbacks, &published.old, &published.new);
        self.metrics.add_notifications(fired);
    }

    /// Publish the current record with one field replaced.
    ///
    /// Only that field's callback can fire, and only if `value` differs from
    /// what the field held.
    pub fn write_field<V: Copy + PartialEq>(&self, field: Field<R, V>, value: V) {
        let published = self.buffer.publish(|current| {
            let mut next = *current;
            field.set(&mut next, value);
            next
        });
        self.metrics.inc_field_writes();
        let fired = detect::notify_field(&self.callbacks, &field, &published.old, &published.new);
        self.metrics.add_notifications(fired);
    }

    /// Store `value` into a fixed-size text field as a NUL-terminated string.
    ///
    /// At most `L - 1` bytes are kept, cut back to a `char` boundary, and the
    /// rest of the array is zeroed. Goes through
    /// [`write_field`](Self::write_field), so the field's callback fires only
    /// if the stored bytes changed.
    pub fn write_str<const L: usize>(&self, field: Field<R, [u8; L]>, value: &str) {
        self.write_field(field, c_str_bytes(value));
    }

    /// Text of a fixed-size field up to its first NUL byte.
    ///
    /// Invalid UTF-8 is replaced with `U+FFFD`.
    #[must_use]
    pub fn read_str<const L: usize>(&self, field: Field<R, [u8; L]>) -> String {
        let bytes = self.read_field(field);
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(L);
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }

    /// Read-modify-write: apply `f` to a copy of the current record and
    /// publish the result, atomically with respect to other writers.
    ///
    /// `f` runs with the write lock held and must not write to this store.
    /// Returns the published record.
    pub fn update<F: FnOnce(&mut R)>(&self, f: F) -> R {
        let published = self.buffer.publish(|current| {
            let mut next = *current;
            f(&mut next);
            next
        });
        self.metrics.inc_writes();
        let fired = detect::notify_changes(&self.callbacks, &published.old, &published.new);
        self.metrics.add_notifications(fired);
        published.new
    }

    /// Publish the default record.
    pub fn restore_all(&self) {
        log::debug!("[hotconf] {}: restoring defaults", R::layout().type_name);
        self.write_all(self.default);
    }

    /// Publish the default value of one field.
    pub fn restore_field<V: Copy + PartialEq>(&self, field: Field<R, V>) {
        self.write_field(field, *field.get(&self.default));
    }

    // ========================================================================
    // Callbacks
    // ========================================================================

    /// Call `handler` with the new value whenever `field` changes.
    ///
    /// Replaces any handler already registered on `field`. Returns `self` so
    /// registrations can be chained with `?`.
    ///
    /// # Errors
    ///
    /// - [`Error::CapacityExceeded`] if `N` other fields already own a slot
    /// - [`Error::UnknownField`] if `field` is not a field of `R`
    pub fn on_change<V, F>(&self, field: Field<R, V>, handler: F) -> Result<&Self>
    where
        V: PartialEq + 'static,
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.on_change_with(field, (), move |value: &V, _: &()| handler(value))
    }

    /// Like [`on_change`](Self::on_change), with a context value handed to
    /// `handler` on every call.
    ///
    /// # Errors
    ///
    /// Same as [`on_change`](Self::on_change).
    pub fn on_change_with<V, C, F>(&self, field: Field<R, V>, context: C, handler: F) -> Result<&Self>
    where
        V: PartialEq + 'static,
        C: Send + Sync + 'static,
        F: Fn(&V, &C) + Send + Sync + 'static,
    {
        let type_name = R::layout().type_name;
        match self.callbacks.register(field, context, handler) {
            Ok(outcome) => {
                let action = match outcome {
                    Registration::Added => "registered",
                    Registration::Replaced => "replaced",
                    Registration::Revived => "re-registered",
                };
                log::debug!("[hotconf] {}.{}: callback {}", type_name, field.name(), action);
                Ok(self)
            }
            Err(err) => {
                if matches!(err, Error::CapacityExceeded { .. }) {
                    self.metrics.inc_refused_registrations();
                }
                log::warn!(
                    "[hotconf] {}.{}: callback refused: {}",
                    type_name,
                    field.name(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Remove the handler on `field`. Returns true if one was active.
    ///
    /// The slot stays reserved for `field`.
    pub fn remove_callback<V>(&self, field: Field<R, V>) -> bool {
        let removed = self.callbacks.unregister(SlotKey::of(&field));
        if removed {
            log::debug!(
                "[hotconf] {}.{}: callback removed",
                R::layout().type_name,
                field.name()
            );
        }
        removed
    }

    /// Remove every handler and release every slot.
    pub fn clear_callbacks(&self) {
        self.callbacks.clear();
    }

    /// Returns true if `field` has an active handler.
    #[must_use]
    pub fn has_callback<V>(&self, field: Field<R, V>) -> bool {
        self.callbacks.is_registered(SlotKey::of(&field))
    }

    /// Number of active handlers.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.active_count()
    }

    /// Number of slots reserved, removed handlers included.
    #[must_use]
    pub fn callback_slots_used(&self) -> usize {
        self.callbacks.slot_count()
    }

    /// Fixed size of the callback table (`N`).
    #[must_use]
    pub const fn callback_capacity(&self) -> usize {
        N
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Route [`save`](Self::save) and [`load`](Self::load) to `backend`.
    pub fn set_backend<B>(&self, backend: B)
    where
        B: PersistenceBackend<R> + 'static,
    {
        self.persistence.set_backend(Arc::new(backend));
    }

    /// Install the function [`save`](Self::save) calls.
    pub fn set_save_fn<F>(&self, save: F)
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.persistence.set_saver(Box::new(save));
    }

    /// Install the function [`load`](Self::load) calls.
    pub fn set_load_fn<F>(&self, load: F)
    where
        F: Fn(&mut R) -> bool + Send + Sync + 'static,
    {
        self.persistence.set_loader(Box::new(load));
    }

    /// Remove both persistence hooks.
    pub fn clear_persistence(&self) {
        self.persistence.clear();
    }

    /// Returns true if both a save and a load hook are installed.
    #[must_use]
    pub fn has_persistence(&self) -> bool {
        self.persistence.has_saver() && self.persistence.has_loader()
    }

    /// Hand a fresh snapshot to the save hook.
    ///
    /// Returns the hook's result, or false if none is installed.
    #[must_use]
    pub fn save(&self) -> bool {
        let snapshot = self.read_all();
        self.persistence.save(&snapshot).unwrap_or_else(|| {
            log::debug!("[hotconf] {}: save without a save hook", R::layout().type_name);
            false
        })
    }

    /// Ask the load hook for a record and publish it on success.
    ///
    /// On success the loaded record goes through [`write_all`](Self::write_all),
    /// so callbacks fire for the fields it changed. On failure, or without a
    /// load hook, the store is left untouched and false is returned.
    #[must_use]
    pub fn load(&self) -> bool {
        let mut loaded = self.read_all();
        match self.persistence.load(&mut loaded) {
            Some(true) => {
                self.write_all(loaded);
                true
            }
            Some(false) => {
                log::debug!("[hotconf] {}: load hook failed", R::layout().type_name);
                false
            }
            None => {
                log::debug!("[hotconf] {}: load without a load hook", R::layout().type_name);
                false
            }
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Snapshot of this store's counters.
    #[must_use]
    pub fn metrics(&self) -> StoreMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Reset this store's counters.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }
}

impl<R: Record + Default, const N: usize> Default for ConfigStore<R, N> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: Record + fmt::Debug, const N: usize> fmt::Debug for ConfigStore<R, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("current", &self.read_all())
            .field("default", &self.default)
            .field("callbacks", &self.callbacks.registered_fields())
            .field("capacity", &N)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

/// Zero-padded copy of `value` that always leaves room for a NUL terminator.
fn c_str_bytes<const L: usize>(value: &str) -> [u8; L] {
    let mut out = [0u8; L];
    let mut len = value.len().min(L.saturating_sub(1));
    while !value.is_char_boundary(len) {
        len -= 1;
    }
    out[..len].copy_from_slice(&value.as_bytes()[..len]);
    out
}
