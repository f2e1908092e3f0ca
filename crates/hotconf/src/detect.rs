// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Change detection: decide which callbacks a publish fires.
//!
//! Both entry points compare with the field type's own `PartialEq`:
//!
//! - [`notify_changes`] after a whole-record publish walks every active
//!   handler and fires the ones whose field differs.
//! - [`notify_field`] after a single-field publish compares that one field
//!   and fires only its handler, without scanning the table.
//!
//! Fields are never compared byte-wise. A byte compare would read padding and
//! would disagree with `PartialEq` on values such as `0.0` vs `-0.0`.

use crate::field::{Field, Record};
use crate::registry::{CallbackRegistry, SlotKey};

/// Fire every handler whose field differs between `old` and `new`.
///
/// Returns the number of handlers invoked.
pub(crate) fn notify_changes<R: Record, const N: usize>(
    registry: &CallbackRegistry<R, N>,
    old: &R,
    new: &R,
) -> usize {
    let snapshot = registry.snapshot();
    let mut fired = 0;
    for handler in snapshot.handlers().iter().flatten() {
        if handler.changed(old, new) {
            handler.invoke(new);
            fired += 1;
        }
    }
    fired
}

/// Fire the handler of `field` if its value differs between `old` and `new`.
///
/// Returns the number of handlers invoked (0 or 1).
pub(crate) fn notify_field<R: Record, V: PartialEq, const N: usize>(
    registry: &CallbackRegistry<R, N>,
    field: &Field<R, V>,
    old: &R,
    new: &R,
) -> usize {
    if field.differs(old, new) && registry.dispatch_one(SlotKey::of(field), new) {
        1
    } else {
        0
    }
}
