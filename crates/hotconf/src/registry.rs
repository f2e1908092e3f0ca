// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-field change callback table.
//!
//! Fixed-capacity, ordered list of slots keyed by field offset and size, so a
//! zero-sized field never shares a slot with the field stored right after it.
//! One slot per field: registering again on the same field overwrites the handler in
//! place, unregistering leaves a tombstone that the next registration on that
//! field reuses. Slots are never compacted, so a tombstone still counts
//! against the capacity.
//!
//! # Type Erasure
//!
//! Handlers for fields of different types share one slot array. Each handler
//! is wrapped at registration, while its field type `V` and context type `C`
//! are still known, in a [`TypedHandler`] that implements the uniform
//! [`ErasedHandler`] interface. Dispatch calls through the trait object; the
//! wrapper projects the record back onto `&V` before calling the user's
//! strongly-typed callback.
//!
//! # Locking
//!
//! The table sits behind a `parking_lot::RwLock` that is only held long
//! enough to find or clone handlers. Handlers always run with the lock
//! released, so a handler may register, unregister or write to the store.

use crate::config::CapacityCheck;
use crate::error::{Error, Result};
use crate::field::{Field, Record};
use parking_lot::RwLock;
use std::sync::Arc;

/// Uniform invocation interface for a stored handler.
pub(crate) trait ErasedHandler<R>: Send + Sync {
    /// Returns true if this handler's field differs between the two records.
    fn changed(&self, old: &R, new: &R) -> bool;

    /// Call the user callback with this handler's field of `new`.
    fn invoke(&self, new: &R);
}

/// Trampoline restoring the concrete field type before calling the user.
struct TypedHandler<R, V, C, F> {
    field: Field<R, V>,
    context: C,
    callback: F,
}

impl<R, V, C, F> ErasedHandler<R> for TypedHandler<R, V, C, F>
where
    V: PartialEq,
    C: Send + Sync,
    F: Fn(&V, &C) + Send + Sync,
{
    #[inline]
    fn changed(&self, old: &R, new: &R) -> bool {
        self.field.differs(old, new)
    }

    #[inline]
    fn invoke(&self, new: &R) {
        (self.callback)(self.field.get(new), &self.context);
    }
}

type HandlerRef<R> = Arc<dyn ErasedHandler<R>>;

/// Identity of a field inside its record's callback table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotKey {
    offset: usize,
    size: usize,
}

impl SlotKey {
    pub(crate) const fn of<R, V>(field: &Field<R, V>) -> Self {
        Self {
            offset: field.offset(),
            size: field.size(),
        }
    }
}

struct CallbackSlot<R> {
    key: SlotKey,
    name: &'static str,
    /// `None` = tombstone
    handler: Option<HandlerRef<R>>,
}

/// What a successful registration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registration {
    /// A new slot was appended
    Added,
    /// An active handler on the same field was replaced
    Replaced,
    /// A tombstoned slot for the same field was reused
    Revived,
}

/// Active handlers cloned out of the table, in slot order.
pub(crate) struct HandlerSnapshot<R, const N: usize> {
    handlers: [Option<HandlerRef<R>>; N],
}

impl<R, const N: usize> HandlerSnapshot<R, N> {
    /// Snapshot slots; `None` entries are tombstones or unused capacity.
    pub(crate) fn handlers(&self) -> &[Option<HandlerRef<R>>] {
        &self.handlers
    }
}

/// Fixed-capacity callback table for record `R`.
pub(crate) struct CallbackRegistry<R, const N: usize> {
    slots: RwLock<Vec<CallbackSlot<R>>>,
}

impl<R: Record, const N: usize> CallbackRegistry<R, N> {
    pub(crate) fn new() -> Self {
        let () = CapacityCheck::<N>::OK;
        Self {
            slots: RwLock::new(Vec::with_capacity(N)),
        }
    }

    /// Install `callback` for `field`, replacing any previous handler on it.
    pub(crate) fn register<V, C, F>(
        &self,
        field: Field<R, V>,
        context: C,
        callback: F,
    ) -> Result<Registration>
    where
        V: PartialEq + 'static,
        C: Send + Sync + 'static,
        F: Fn(&V, &C) + Send + Sync + 'static,
    {
        let layout = R::layout();
        if !layout.contains(field.offset(), field.size()) {
            return Err(Error::UnknownField {
                record: layout.type_name,
                offset: field.offset(),
                size: field.size(),
            });
        }

        let handler: HandlerRef<R> = Arc::new(TypedHandler {
            field,
            context,
            callback,
        });

        let key = SlotKey::of(&field);
        let mut slots = self.slots.write();
        if let Some(slot) = slots.iter_mut().find(|s| s.key == key) {
            let outcome = if slot.handler.is_some() {
                Registration::Replaced
            } else {
                Registration::Revived
            };
            slot.name = field.name();
            // The replaced handler may be running on another thread right now;
            // its Arc keeps it alive until that call returns.
            slot.handler = Some(handler);
            return Ok(outcome);
        }

        if slots.len() >= N {
            return Err(Error::CapacityExceeded { capacity: N });
        }

        slots.push(CallbackSlot {
            key,
            name: field.name(),
            handler: Some(handler),
        });
        Ok(Registration::Added)
    }

    /// Tombstone the handler at `key`. Returns true if one was active.
    pub(crate) fn unregister(&self, key: SlotKey) -> bool {
        let mut slots = self.slots.write();
        slots
            .iter_mut()
            .find(|s| s.key == key)
            .and_then(|s| s.handler.take())
            .is_some()
    }

    /// Returns true if an active handler exists for `key`.
    pub(crate) fn is_registered(&self, key: SlotKey) -> bool {
        self.slots
            .read()
            .iter()
            .any(|s| s.key == key && s.handler.is_some())
    }

    /// Names of the fields with an active handler, in slot order.
    pub(crate) fn registered_fields(&self) -> Vec<&'static str> {
        self.slots
            .read()
            .iter()
            .filter(|s| s.handler.is_some())
            .map(|s| s.name)
            .collect()
    }

    /// Number of active handlers.
    pub(crate) fn active_count(&self) -> usize {
        self.slots
            .read()
            .iter()
            .filter(|s| s.handler.is_some())
            .count()
    }

    /// Number of slots in use, tombstones included.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.read().len()
    }

    /// Invoke the active handler at `key`, if any, with `new`.
    ///
    /// At most one handler fires. Returns true if it did.
    pub(crate) fn dispatch_one(&self, key: SlotKey, new: &R) -> bool {
        let handler = {
            let slots = self.slots.read();
            slots
                .iter()
                .find(|s| s.key == key)
                .and_then(|s| s.handler.clone())
        };
        match handler {
            Some(h) => {
                h.invoke(new);
                true
            }
            None => false,
        }
    }

    /// Clone every active handler out of the table.
    ///
    /// The table never holds more than `N` slots, so the snapshot lives on
    /// the caller's stack.
    pub(crate) fn snapshot(&self) -> HandlerSnapshot<R, N> {
        let mut handlers: [Option<HandlerRef<R>>; N] = std::array::from_fn(|_| None);
        let slots = self.slots.read();
        for (dst, slot) in handlers.iter_mut().zip(slots.iter()) {
            dst.clone_from(&slot.handler);
        }
        HandlerSnapshot { handlers }
    }

    /// Drop every handler and free every slot.
    pub(crate) fn clear(&self) {
        self.slots.write().clear();
    }
}
