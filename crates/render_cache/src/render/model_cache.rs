//! Shared model batches
//!
//! Models are keyed by resource identity. Every placement of the same
//! [`ModelId`] replays one batch; two resources with identical geometry are
//! still two entries.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::scene::{ModelId, Scene};
use super::backend::{BackendResult, BatchHandle, RenderBackend};
use super::batch::BatchCompiler;

/// A compiled model batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelBatchCacheEntry {
    /// Backend handle of the model batch
    pub batch: BatchHandle,
    /// Referenced by the most recent rebuild. Cleared at the start of every
    /// sweep; entries still unmarked at the end of it are evicted.
    pub live: bool,
}

/// Model batches staged by a rebuild that has not been committed yet
#[derive(Debug, Default)]
pub struct ModelRefresh {
    referenced: BTreeSet<ModelId>,
    compiled: Vec<(ModelId, BatchHandle)>,
}

impl ModelRefresh {
    /// Release everything compiled for a rebuild that is being abandoned
    pub fn abandon(self, backend: &mut dyn RenderBackend) {
        for (_, handle) in self.compiled {
            backend.release(handle);
        }
    }

    /// Number of batches compiled by this refresh
    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }
}

/// Cache of compiled model batches keyed by model identity
#[derive(Debug, Default)]
pub struct ModelBatchCache {
    entries: HashMap<ModelId, ModelBatchCacheEntry>,
}

impl ModelBatchCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile batches for referenced models that are not cached yet.
    ///
    /// Nothing in the cache changes until [`ModelBatchCache::commit`]. On
    /// error the batches compiled so far are released.
    pub fn prepare(
        &self,
        scene: &Scene,
        referenced: impl IntoIterator<Item = ModelId>,
        backend: &mut dyn RenderBackend,
    ) -> BackendResult<ModelRefresh> {
        let referenced: BTreeSet<ModelId> = referenced.into_iter().collect();
        let mut compiled = Vec::new();
        for &id in &referenced {
            if self.entries.contains_key(&id) {
                continue;
            }
            let Some(model) = scene.model(id) else {
                continue;
            };
            match backend.compile(&BatchCompiler::model_draw_list(model)) {
                Ok(handle) => {
                    debug!("Compiled model '{}' ({} faces) as {:?}", model.name, model.face_count(), handle);
                    compiled.push((id, handle));
                }
                Err(error) => {
                    ModelRefresh { referenced, compiled }.abandon(backend);
                    return Err(error);
                }
            }
        }
        Ok(ModelRefresh { referenced, compiled })
    }

    /// Apply a refresh: add the new batches, evict every entry the rebuild no
    /// longer references. Returns the number of evicted entries.
    pub fn commit(&mut self, refresh: ModelRefresh, backend: &mut dyn RenderBackend) -> usize {
        let ModelRefresh { referenced, compiled } = refresh;
        for (id, batch) in compiled {
            self.entries.insert(id, ModelBatchCacheEntry { batch, live: false });
        }
        self.mark_live(&referenced);
        self.evict_unmarked(backend)
    }

    /// Clear every liveness marker, then set it on the referenced entries
    fn mark_live(&mut self, referenced: &BTreeSet<ModelId>) {
        for entry in self.entries.values_mut() {
            entry.live = false;
        }
        for id in referenced {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.live = true;
            }
        }
    }

    fn evict_unmarked(&mut self, backend: &mut dyn RenderBackend) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, entry| {
            if !entry.live {
                debug!("Evicting model batch {:?} for {:?}", entry.batch, id);
                backend.release(entry.batch);
            }
            entry.live
        });
        before - self.entries.len()
    }

    /// Number of cached models
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no model is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `model` has a cached batch
    pub fn contains(&self, model: ModelId) -> bool {
        self.entries.contains_key(&model)
    }

    /// Cached entry for `model`
    pub fn get(&self, model: ModelId) -> Option<&ModelBatchCacheEntry> {
        self.entries.get(&model)
    }

    /// Release every cached batch
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        for (_, entry) in self.entries.drain() {
            backend.release(entry.batch);
        }
    }
}
