// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors surfaced by the store.
//!
//! Only logical failures cross the API. Read/write collisions are absorbed by
//! retrying, and persistence outcomes are plain booleans from the backend.

/// Store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Every callback slot holds a different field; nothing was registered.
    #[error("callback table full: all {capacity} slots are in use")]
    CapacityExceeded {
        /// Fixed capacity of the table
        capacity: usize,
    },

    /// The field identity does not match any field of the record layout.
    #[error("no field at offset {offset} with size {size} in {record}")]
    UnknownField {
        /// Record type name
        record: &'static str,
        /// Offset carried by the identity
        offset: usize,
        /// Size carried by the identity
        size: usize,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
