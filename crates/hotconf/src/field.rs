// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural field identity.
//!
//! A field of a configuration record is addressed by its byte offset and size
//! inside the record, computed at compile time from the declared layout
//! (`core::mem::offset_of!`). The same identity keys both storage projection
//! and the callback table.
//!
//! # Layout
//!
//! ```text
//! Settings (RecordLayout)
//! +--------+--------+------+
//! | offset | size   | name |
//! +--------+--------+------+
//! | 0      | 4      | a    |  <- Settings::A : Field<Settings, u32>
//! | 4      | 4      | b    |  <- Settings::B : Field<Settings, i32>
//! | 8      | 1      | c    |  <- Settings::C : Field<Settings, bool>
//! +--------+--------+------+
//! ```
//!
//! Both tables are emitted by `#[derive(Record)]`; there is no runtime schema.

use std::fmt;

/// Static description of one field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    /// Field name as declared
    pub name: &'static str,
    /// Byte offset inside the record
    pub offset: usize,
    /// Size of the field type in bytes
    pub size: usize,
}

/// Static description of a record type.
#[derive(Debug)]
pub struct RecordLayout {
    /// Type name as declared
    pub type_name: &'static str,
    /// `size_of::<R>()`
    pub size: usize,
    /// Declared fields, in declaration order
    pub fields: &'static [FieldLayout],
}

impl RecordLayout {
    /// Number of declared fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Look up the field starting at `offset`.
    ///
    /// Zero-sized fields share their offset with the next field; the first
    /// declared one wins.
    #[must_use]
    pub fn field_at(&self, offset: usize) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.offset == offset)
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field_named(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if `(offset, size)` names a declared field.
    #[must_use]
    pub fn contains(&self, offset: usize, size: usize) -> bool {
        self.fields
            .iter()
            .any(|f| f.offset == offset && f.size == size)
    }
}

/// A configuration record that can live in a [`ConfigStore`](crate::ConfigStore).
///
/// The record is bit-copyable: no heap pointers, no `Drop`, no invariants
/// beyond its field values. Implement it with `#[derive(Record)]`.
pub trait Record: Copy + Send + Sync + 'static {
    /// Compile-time field table for this record.
    fn layout() -> &'static RecordLayout;
}

/// Typed identity of one field of record `R` with value type `V`.
///
/// Carries the field's offset plus two projection functions generated
/// alongside it, so the value can be read and written without any pointer
/// arithmetic at runtime.
pub struct Field<R, V> {
    name: &'static str,
    offset: usize,
    get: fn(&R) -> &V,
    get_mut: fn(&mut R) -> &mut V,
}

impl<R, V> Field<R, V> {
    /// Build a field identity. Normally only called from generated code.
    #[must_use]
    pub const fn new(
        name: &'static str,
        offset: usize,
        get: fn(&R) -> &V,
        get_mut: fn(&mut R) -> &mut V,
    ) -> Self {
        Self {
            name,
            offset,
            get,
            get_mut,
        }
    }

    /// Declared field name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Byte offset inside `R`.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Size of `V` in bytes.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        std::mem::size_of::<V>()
    }

    /// Project a record onto this field.
    #[inline]
    pub fn get<'a>(&self, record: &'a R) -> &'a V {
        (self.get)(record)
    }

    /// Mutable projection.
    #[inline]
    pub fn get_mut<'a>(&self, record: &'a mut R) -> &'a mut V {
        (self.get_mut)(record)
    }

    /// Overwrite this field in `record`.
    #[inline]
    pub fn set(&self, record: &mut R, value: V) {
        *(self.get_mut)(record) = value;
    }

    /// Copy this field from `src` into `dst`, leaving every other field of
    /// `dst` untouched.
    #[inline]
    pub fn copy_from(&self, dst: &mut R, src: &R)
    where
        V: Copy,
    {
        *(self.get_mut)(dst) = *(self.get)(src);
    }

    /// Returns true if the field value differs between two records.
    ///
    /// Uses `V`'s own equality. This is the only comparison the store ever
    /// makes, for whole-record and single-field writes alike.
    #[inline]
    pub fn differs(&self, old: &R, new: &R) -> bool
    where
        V: PartialEq,
    {
        self.get(old) != self.get(new)
    }
}

impl<R, V> Clone for Field<R, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, V> Copy for Field<R, V> {}

impl<R, V> PartialEq for Field<R, V> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl<R, V> Eq for Field<R, V> {}

impl<R, V> fmt::Debug for Field<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("size", &self.size())
            .finish()
    }
}
