// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Store sizing constants.
//!
//! The callback table is sized by the caller through the `N` parameter of
//! [`ConfigStore`](crate::ConfigStore); these are the defaults and bounds.
//! Every instantiation is checked at compile time.

/// Callback slots when `N` is not given.
///
/// Covers a typical record of a dozen fields with room to spare.
pub const DEFAULT_CALLBACK_CAPACITY: usize = 16;

/// Largest accepted callback table.
///
/// Dispatch snapshots the table onto the writer's stack and scans it
/// linearly; past this size a map keyed by offset would be the better fit.
pub const MAX_CALLBACK_CAPACITY: usize = 64;

/// Returns true if `n` is an accepted callback capacity.
#[must_use]
pub const fn is_valid_capacity(n: usize) -> bool {
    n > 0 && n <= MAX_CALLBACK_CAPACITY
}

/// Compile-time capacity check, evaluated once per `N`.
pub(crate) struct CapacityCheck<const N: usize>;

impl<const N: usize> CapacityCheck<N> {
    pub(crate) const OK: () = assert!(
        is_valid_capacity(N),
        "callback capacity must be between 1 and MAX_CALLBACK_CAPACITY (64)"
    );
}
