// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Persistence contract.
//!
//! The store never encodes or stores anything itself. It hands a fresh
//! snapshot to a collaborator-supplied `save`, and asks a collaborator-supplied
//! `load` to fill a record, publishing it only when `load` reports success.
//! Both report a plain `bool` which the store returns unchanged.
//!
//! The hooks are swappable at any time; `ArcSwapOption` lets `save`/`load`
//! run without taking a lock that `set_*` would contend on.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Backend able to persist and restore a record.
///
/// Implementations choose the payload format. Return `false` for any failure;
/// the store treats a failed `load` as "leave the current record alone".
pub trait PersistenceBackend<R>: Send + Sync {
    /// Persist `record`. Returns true on success.
    fn save(&self, record: &R) -> bool;

    /// Fill `out` with the persisted record. Returns true on success.
    ///
    /// On `false` the contents of `out` are ignored.
    fn load(&self, out: &mut R) -> bool;
}

impl<R, B: PersistenceBackend<R> + ?Sized> PersistenceBackend<R> for Arc<B> {
    fn save(&self, record: &R) -> bool {
        (**self).save(record)
    }

    fn load(&self, out: &mut R) -> bool {
        (**self).load(out)
    }
}

/// Boxed save hook.
pub type SaveFn<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

/// Boxed load hook.
pub type LoadFn<R> = Box<dyn Fn(&mut R) -> bool + Send + Sync>;

/// The store's currently installed save/load hooks.
pub(crate) struct PersistenceHooks<R> {
    saver: ArcSwapOption<SaveFn<R>>,
    loader: ArcSwapOption<LoadFn<R>>,
}

impl<R: 'static> PersistenceHooks<R> {
    pub(crate) fn new() -> Self {
        Self {
            saver: ArcSwapOption::empty(),
            loader: ArcSwapOption::empty(),
        }
    }

    pub(crate) fn set_saver(&self, saver: SaveFn<R>) {
        self.saver.store(Some(Arc::new(saver)));
    }

    pub(crate) fn set_loader(&self, loader: LoadFn<R>) {
        self.loader.store(Some(Arc::new(loader)));
    }

    /// Route both hooks to `backend`.
    pub(crate) fn set_backend<B>(&self, backend: Arc<B>)
    where
        B: PersistenceBackend<R> + ?Sized + 'static,
    {
        let for_save = Arc::clone(&backend);
        self.set_saver(Box::new(move |record: &R| for_save.save(record)));
        self.set_loader(Box::new(move |out: &mut R| backend.load(out)));
    }

    pub(crate) fn clear(&self) {
        self.saver.store(None);
        self.loader.store(None);
    }

    pub(crate) fn has_saver(&self) -> bool {
        self.saver.load().is_some()
    }

    pub(crate) fn has_loader(&self) -> bool {
        self.loader.load().is_some()
    }

    /// `None` if no save hook is installed.
    pub(crate) fn save(&self, record: &R) -> Option<bool> {
        let saver = self.saver.load_full()?;
        Some((*saver)(record))
    }

    /// `None` if no load hook is installed.
    pub(crate) fn load(&self, out: &mut R) -> Option<bool> {
        let loader = self.loader.load_full()?;
        Some((*loader)(out))
    }
}
