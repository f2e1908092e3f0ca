// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON file backend
//!
//! Save writes the whole record to a uniquely named sibling of `<path>` and
//! renames it over `<path>`, so a crash mid-save leaves either the previous
//! document or the new one, never a truncated file. Load parses `<path>` into a fresh record.

use crate::config::FileBackendConfig;
use anyhow::{Context, Result};
use hotconf::PersistenceBackend;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

/// Persists a record as one JSON document.
pub struct JsonFileBackend<R> {
    config: FileBackendConfig,
    _record: PhantomData<fn() -> R>,
}

impl<R> JsonFileBackend<R> {
    /// Create a backend from `config`. Touches nothing on disk.
    pub fn new(config: FileBackendConfig) -> Self {
        Self {
            config,
            _record: PhantomData,
        }
    }

    /// Backend with default settings writing to `path`.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self::new(FileBackendConfig::at(path.as_ref()))
    }

    /// Backend configuration
    pub fn config(&self) -> &FileBackendConfig {
        &self.config
    }

    /// Returns true if the target file exists.
    pub fn exists(&self) -> bool {
        self.config.path.is_file()
    }
}

impl<R: Serialize> JsonFileBackend<R> {
    /// Write `record`, reporting the failure cause.
    pub fn try_save(&self, record: &R) -> Result<()> {
        let path = &self.config.path;
        if self.config.create_dirs {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating directory {}", dir.display()))?;
            }
        }

        let dir = self.config.staging_dir();
        let prefix = self.config.staging_prefix();
        let staging = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(dir)
            .with_context(|| format!("creating staging file in {}", dir.display()))?;

        let mut writer = BufWriter::new(staging.as_file());
        let encoded = if self.config.pretty {
            serde_json::to_writer_pretty(&mut writer, record)
        } else {
            serde_json::to_writer(&mut writer, record)
        };
        encoded.context("encoding record")?;
        writer.write_all(b"\n")?;
        writer
            .flush()
            .with_context(|| format!("flushing {}", staging.path().display()))?;
        drop(writer);

        if self.config.sync_on_save {
            staging
                .as_file()
                .sync_all()
                .with_context(|| format!("syncing {}", staging.path().display()))?;
        }

        // Staging file is unique per save; concurrent saves only race here
        staging
            .persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("replacing {}", path.display()))?;

        tracing::debug!("Saved record to {}", path.display());
        Ok(())
    }
}

impl<R: DeserializeOwned> JsonFileBackend<R> {
    /// Read the record, reporting the failure cause.
    pub fn try_load(&self) -> Result<R> {
        let path = &self.config.path;
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let record = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("decoding {}", path.display()))?;

        tracing::debug!("Loaded record from {}", path.display());
        Ok(record)
    }
}

impl<R> PersistenceBackend<R> for JsonFileBackend<R>
where
    R: Serialize + DeserializeOwned,
{
    fn save(&self, record: &R) -> bool {
        match self.try_save(record) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Save failed: {:#}", e);
                false
            }
        }
    }

    fn load(&self, out: &mut R) -> bool {
        match self.try_load() {
            Ok(record) => {
                *out = record;
                true
            }
            Err(e) => {
                tracing::warn!("Load failed: {:#}", e);
                false
            }
        }
    }
}
