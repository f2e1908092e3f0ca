// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! File backend configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration of a [`JsonFileBackend`](crate::JsonFileBackend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Target file
    pub path: PathBuf,

    /// Indent the JSON document (default: true)
    pub pretty: bool,

    /// Create missing parent directories on save (default: false)
    pub create_dirs: bool,

    /// fsync the temporary file before renaming it over the target (default: true)
    pub sync_on_save: bool,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("hotconf.json"),
            pretty: true,
            create_dirs: false,
            sync_on_save: true,
        }
    }
}

impl FileBackendConfig {
    /// Create a new config builder
    pub fn builder() -> FileBackendConfigBuilder {
        FileBackendConfigBuilder::default()
    }

    /// Default configuration writing to `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Directory the document is staged in before the atomic rename.
    pub fn staging_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Name prefix of staging files, so they sort next to the target.
    pub fn staging_prefix(&self) -> String {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "hotconf".into(), |n| n.to_string_lossy());
        format!(".{name}.")
    }
}

/// Config builder for fluent API
#[derive(Debug, Default)]
pub struct FileBackendConfigBuilder {
    path: Option<PathBuf>,
    pretty: Option<bool>,
    create_dirs: Option<bool>,
    sync_on_save: Option<bool>,
}

impl FileBackendConfigBuilder {
    /// Set target file
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Indent the JSON document
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = Some(pretty);
        self
    }

    /// Create missing parent directories on save
    pub fn create_dirs(mut self, create: bool) -> Self {
        self.create_dirs = Some(create);
        self
    }

    /// fsync before rename
    pub fn sync_on_save(mut self, sync: bool) -> Self {
        self.sync_on_save = Some(sync);
        self
    }

    /// Build the configuration
    pub fn build(self) -> FileBackendConfig {
        let defaults = FileBackendConfig::default();

        FileBackendConfig {
            path: self.path.unwrap_or(defaults.path),
            pretty: self.pretty.unwrap_or(defaults.pretty),
            create_dirs: self.create_dirs.unwrap_or(defaults.create_dirs),
            sync_on_save: self.sync_on_save.unwrap_or(defaults.sync_on_save),
        }
    }
}
