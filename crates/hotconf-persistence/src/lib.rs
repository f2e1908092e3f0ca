// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! hotconf Persistence Backends
//!
//! Ready-made implementations of [`hotconf::PersistenceBackend`]. The core
//! store only knows "save returned true/false" and "load returned
//! true/false"; this crate decides what is written and where.
//!
//! # Backends
//!
//! - **`JsonFileBackend`** -- One JSON document per store, atomically replaced
//! - **`MemoryBackend`** -- Last saved record kept in memory (tests, hosts without storage)
//!
//! # Example
//!
//! ```ignore
//! use hotconf::{ConfigStore, Record};
//! use hotconf_persistence::{FileBackendConfig, JsonFileBackend};
//!
//! let config = FileBackendConfig::builder()
//!     .path("/var/lib/app/tuning.json")
//!     .create_dirs(true)
//!     .build();
//!
//! let store = ConfigStore::<Tuning>::new(Tuning::default());
//! store.set_backend(JsonFileBackend::new(config));
//! if !store.load() {
//!     store.save();
//! }
//! ```

pub mod config;
pub mod json;
pub mod memory;

pub use config::{FileBackendConfig, FileBackendConfigBuilder};
pub use json::JsonFileBackend;
pub use memory::MemoryBackend;
