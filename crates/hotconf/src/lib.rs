// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hotconf
//!
//! Double-buffered, lock-free-read configuration store with per-field change
//! notification.
//!
//! A process keeps its tunables in one plain `Copy` struct. Many threads read
//! it at high frequency without blocking; occasional writers replace the whole
//! record or a single field, and subscribers registered on individual fields
//! are told when, and only when, that field's value changed.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------------------------+
//! |                      ConfigStore<R, N>                    |
//! |  read_all / read_field     write_all / write_field        |
//! |        |                   update / restore_* / load      |
//! |        v                          |                       |
//! |  +-------------+   publish   +----v--------+              |
//! |  | DoubleBuffer|<------------| WriteLock   |              |
//! |  | seq + flip  |             +-------------+              |
//! |  +-------------+                  |  old, new             |
//! |                                   v                       |
//! |  +------------------+      +-------------+                |
//! |  | CallbackRegistry |----->| detect      |--> handlers    |
//! |  | N slots, offset  |      | PartialEq   |                |
//! |  +------------------+      +-------------+                |
//! |                                                           |
//! |  PersistenceHooks: save(&R) -> bool, load(&mut R) -> bool |
//! +-----------------------------------------------------------+
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use hotconf::{ConfigStore, Record};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Record)]
//! struct Tuning {
//!     threshold: i32,
//!     gain: f64,
//!     enabled: bool,
//! }
//!
//! let store = Arc::new(ConfigStore::<Tuning>::new(Tuning {
//!     threshold: 10,
//!     gain: 1.0,
//!     enabled: false,
//! }));
//!
//! store.on_change(Tuning::GAIN, |g| println!("gain is now {g}"))?;
//!
//! let reader = Arc::clone(&store);
//! std::thread::spawn(move || {
//!     let snapshot = reader.read_all();
//!     assert!(snapshot.threshold >= 10);
//! })
//! .join()
//! .unwrap();
//!
//! store.write_field(Tuning::GAIN, 2.5);
//! store.restore_field(Tuning::GAIN);
//! # Ok::<(), hotconf::Error>(())
//! ```
//!
//! ## Module Overview
//!
//! - [`field`] - `Record` trait, `Field` identities, compile-time layouts
//! - [`buffer`] - seqlock double buffer
//! - [`serializer`] - writer-side spin lock
//! - [`store`] - `ConfigStore` facade
//! - [`persist`] - save/load contract
//! - [`metrics`] - per-store counters
//! - [`config`] - capacity constants

// Lets `#[derive(Record)]` refer to `::hotconf` from inside this crate.
extern crate self as hotconf;

pub mod buffer;
pub mod config;
mod detect;
pub mod error;
pub mod field;
pub mod metrics;
pub mod persist;
mod registry;
pub mod serializer;
pub mod store;

pub use buffer::{DoubleBuffer, Published};
pub use config::{DEFAULT_CALLBACK_CAPACITY, MAX_CALLBACK_CAPACITY};
pub use error::{Error, Result};
pub use field::{Field, FieldLayout, Record, RecordLayout};
pub use metrics::{StoreMetrics, StoreMetricsSnapshot};
pub use persist::{LoadFn, PersistenceBackend, SaveFn};
pub use serializer::{WriteGuard, WriteLock};
pub use store::ConfigStore;

/// Derive [`Record`] and one [`Field`] constant per field.
///
/// ```
/// use hotconf::Record;
///
/// #[derive(Clone, Copy, PartialEq, Record)]
/// pub struct Limits {
///     pub max_conn: u32,
///     #[record(rename = "timeout")]
///     pub timeout_ms: u64,
/// }
///
/// assert_eq!(Limits::MAX_CONN.name(), "max_conn");
/// assert_eq!(Limits::TIMEOUT_MS.name(), "timeout");
/// assert_eq!(<Limits as hotconf::Record>::layout().field_count(), 2);
/// ```
pub use hotconf_codegen::Record;
