//! Render cache controller
//!
//! Owns the dirty flag and every compiled batch. Edits only mark the cache
//! dirty; the next draw call performs a single full rebuild (traverse,
//! partition, compile) and later draws replay the cached batches until the
//! next invalidation.
//!
//! A rebuild is all or nothing. Every batch and every missing model batch is
//! compiled before anything is swapped in, so a backend failure leaves the
//! previous frame's cache in place and the flag still dirty.

use crate::config::RenderCacheConfig;
use crate::foundation::math::Mat4;
use crate::scene::{ModelId, NodeId, Scene, SceneTraversal, VisibleNode};
use super::backend::{RenderBackend, RenderResult};
use super::batch::{Batch, BatchCompiler, BatchSet, BatchSlot, RenderStyle};
use super::draw_list::{DrawList, FillMode, PrimitiveId};
use super::grid::{grid_lines, GridSettings};
use super::model_cache::ModelBatchCache;
use super::overlay::SelectionTransformOverlay;
use super::partition::{ModelPlacement, Partitioner};
use super::view::{View2D, View3D};

/// What a draw call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// The cache was rebuilt before drawing
    pub rebuilt: bool,
    /// Cached slot batches submitted
    pub batches_submitted: usize,
    /// Model batches submitted
    pub models_submitted: usize,
    /// Models drawn as their bounding box because the camera is too far away
    pub models_as_bounds: usize,
    /// Grid lines drawn
    pub grid_lines: usize,
}

/// Caches the compiled batches of a scene and replays them every frame
pub struct RenderCacheController {
    config: RenderCacheConfig,
    dirty: bool,
    rebuild_count: u64,
    batches: Option<BatchSet>,
    placements: Vec<ModelPlacement>,
    model_cache: ModelBatchCache,
    selection_transform: Mat4,
    grid: GridSettings,
}

impl RenderCacheController {
    /// Create a controller. The cache starts dirty, so the first draw builds it.
    pub fn new(config: RenderCacheConfig) -> Self {
        Self {
            config,
            dirty: true,
            rebuild_count: 0,
            batches: None,
            placements: Vec::new(),
            model_cache: ModelBatchCache::new(),
            selection_transform: Mat4::identity(),
            grid: GridSettings::default(),
        }
    }

    /// Mark the whole cache stale
    pub fn invalidate(&mut self) {
        log::trace!("Render cache invalidated");
        self.dirty = true;
    }

    /// Mark the cache stale after nodes were added, removed or changed.
    ///
    /// The ids are only logged: any change triggers a full rebuild.
    pub fn invalidate_nodes(&mut self, nodes: &[NodeId]) {
        log::trace!("Render cache invalidated by {} node(s)", nodes.len());
        self.dirty = true;
    }

    /// Mark the cache stale after face selection or face properties changed
    pub fn invalidate_faces(&mut self, faces: &[PrimitiveId]) {
        log::trace!("Render cache invalidated by {} face(s)", faces.len());
        self.dirty = true;
    }

    /// Mark the cache stale after a document toggle (selection mode, face
    /// mask, model rendering) changed
    pub fn invalidate_toggles(&mut self) {
        log::trace!("Render cache invalidated by a toggle");
        self.dirty = true;
    }

    /// Replace the configuration and mark the cache stale
    pub fn set_config(&mut self, config: RenderCacheConfig) {
        self.config = config;
        self.invalidate_toggles();
    }

    /// Set the transform applied to the selection while it is being edited.
    /// Never rebuilds anything.
    pub fn set_selection_transform(&mut self, transform: Mat4) {
        log::trace!("Selection transform updated");
        self.selection_transform = transform;
    }

    /// Update the 2D grid. The grid is drawn immediately, so the cache stays valid.
    pub fn update_grid(&mut self, spacing: f64, show_in_2d: bool) {
        self.grid = GridSettings { spacing, show_in_2d };
    }

    /// Whether the next draw rebuilds the cache
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of successful rebuilds so far
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    /// Current selection transform
    pub fn selection_transform(&self) -> &Mat4 {
        &self.selection_transform
    }

    /// Compiled batch for a slot, once the cache has been built
    pub fn batch(&self, slot: BatchSlot) -> Option<&Batch> {
        self.batches.as_ref().map(|batches| batches.get(slot))
    }

    /// All compiled batches, once the cache has been built
    pub fn batches(&self) -> Option<&BatchSet> {
        self.batches.as_ref()
    }

    /// Model placements of the last rebuild
    pub fn placements(&self) -> &[ModelPlacement] {
        &self.placements
    }

    /// Shared model batches
    pub fn model_cache(&self) -> &ModelBatchCache {
        &self.model_cache
    }

    /// Active configuration
    pub fn config(&self) -> &RenderCacheConfig {
        &self.config
    }

    /// Active grid settings
    pub fn grid(&self) -> GridSettings {
        self.grid
    }

    /// Rebuild now if the cache is dirty. Returns whether a rebuild happened.
    pub fn ensure_fresh(&mut self, scene: &Scene, backend: &mut dyn RenderBackend) -> RenderResult<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.rebuild(scene, backend)?;
        Ok(true)
    }

    fn rebuild(&mut self, scene: &Scene, backend: &mut dyn RenderBackend) -> RenderResult<()> {
        let traversal = SceneTraversal::new(scene);
        let visible = traversal.visible_nodes();
        let partition = Partitioner::new(scene, &self.config).partition(&visible);

        let batches = BatchCompiler::new(&self.config.colours)
            .compile_all(&partition, backend)
            .map_err(|error| {
                log::warn!("Render cache rebuild failed, keeping previous batches: {}", error);
                error
            })?;

        let referenced = self.referenced_models(&traversal, &visible);
        let refresh = match self.model_cache.prepare(scene, referenced, backend) {
            Ok(refresh) => refresh,
            Err(error) => {
                log::warn!("Model batch compilation failed, keeping previous batches: {}", error);
                batches.release(backend);
                return Err(error);
            }
        };
        let compiled_models = refresh.compiled_count();

        if let Some(previous) = self.batches.replace(batches) {
            previous.release(backend);
        }
        let evicted = self.model_cache.commit(refresh, backend);
        self.placements = partition.models;
        self.dirty = false;
        self.rebuild_count += 1;

        log::debug!(
            "Rebuilt render cache #{}: {} visible nodes, {} primitives, {} model placements, {} models compiled, {} evicted",
            self.rebuild_count,
            visible.len(),
            self.batches.as_ref().map_or(0, |set| set.iter().map(|b| b.primitives().len()).sum::<usize>()),
            self.placements.len(),
            compiled_models,
            evicted
        );
        Ok(())
    }

    /// Models the cache should hold: those of visible model entities that
    /// resolve, or none when model rendering is off.
    fn referenced_models(&self, traversal: &SceneTraversal<'_>, visible: &[VisibleNode]) -> Vec<ModelId> {
        if !self.config.model_rendering {
            return Vec::new();
        }
        traversal.model_nodes(visible).into_iter().map(|(_, model)| model).collect()
    }

    /// Draw a 2D view: grid, static outlines, then the selection under the
    /// live selection transform.
    pub fn draw_2d(
        &mut self,
        scene: &Scene,
        view: &View2D,
        backend: &mut dyn RenderBackend,
    ) -> RenderResult<FrameStats> {
        let mut stats = FrameStats { rebuilt: self.ensure_fresh(scene, backend)?, ..FrameStats::default() };

        if self.grid.show_in_2d {
            let lines = grid_lines(&self.config.grid, self.grid.spacing, view.zoom);
            backend.draw_lines(&lines, &view.transforms.view())?;
            stats.grid_lines = lines.len();
        }

        let Some(batches) = self.batches.as_ref() else {
            return Ok(stats);
        };
        let overlay = SelectionTransformOverlay::new(view.transforms.base(), self.selection_transform);
        for slot in [BatchSlot::Untransformed2D, BatchSlot::Transformed2D] {
            overlay.submit(batches.get(slot), backend)?;
            stats.batches_submitted += 1;
        }
        Ok(stats)
    }

    /// Draw a 3D view in its render style
    pub fn draw_3d(
        &mut self,
        scene: &Scene,
        view: &View3D,
        backend: &mut dyn RenderBackend,
    ) -> RenderResult<FrameStats> {
        let mut stats = FrameStats { rebuilt: self.ensure_fresh(scene, backend)?, ..FrameStats::default() };

        let Some(batches) = self.batches.as_ref() else {
            return Ok(stats);
        };
        let overlay = SelectionTransformOverlay::new(view.transforms.base(), self.selection_transform);

        if view.style == RenderStyle::Wireframe {
            for slot in [BatchSlot::Untransformed2D, BatchSlot::Transformed2D] {
                overlay.submit(batches.get(slot), backend)?;
                stats.batches_submitted += 1;
            }
            return Ok(stats);
        }

        backend.set_lighting(true);
        let result = self.draw_shaded(batches, &overlay, view, backend, &mut stats);
        backend.set_lighting(false);
        result.map(|()| stats)
    }

    fn draw_shaded(
        &self,
        batches: &BatchSet,
        overlay: &SelectionTransformOverlay,
        view: &View3D,
        backend: &mut dyn RenderBackend,
        stats: &mut FrameStats,
    ) -> RenderResult<()> {
        let textured = view.style == RenderStyle::Textured;
        let (untransformed, transformed, decals) = if textured {
            (
                BatchSlot::Untransformed3DTextured,
                BatchSlot::Transformed3DTextured,
                BatchSlot::UntransformedDecals3DTextured,
            )
        } else {
            (
                BatchSlot::Untransformed3DFlat,
                BatchSlot::Transformed3DFlat,
                BatchSlot::UntransformedDecals3DFlat,
            )
        };

        for slot in [untransformed, BatchSlot::SelectedOutline3D] {
            overlay.submit(batches.get(slot), backend)?;
            stats.batches_submitted += 1;
        }

        if self.config.model_rendering {
            let mode = if textured { FillMode::TEXTURED } else { FillMode::FLAT };
            self.draw_models(overlay, view, mode, backend, stats)?;
        }

        for slot in [transformed, decals] {
            overlay.submit(batches.get(slot), backend)?;
            stats.batches_submitted += 1;
        }
        Ok(())
    }

    fn draw_models(
        &self,
        overlay: &SelectionTransformOverlay,
        view: &View3D,
        mode: FillMode,
        backend: &mut dyn RenderBackend,
        stats: &mut FrameStats,
    ) -> RenderResult<()> {
        for placement in self.placements.iter().filter(|placement| placement.in_3d) {
            let distance = (view.camera_position - placement.origin).norm();
            if placement.hide_distance <= distance {
                let mut list = DrawList::new();
                list.push_pass(mode, None, &placement.bounds);
                backend.draw_immediate(&list, &overlay.for_selection(placement.selected))?;
                stats.models_as_bounds += 1;
            } else if let Some(entry) = self.model_cache.get(placement.model) {
                backend.submit(entry.batch, &overlay.placement_transform(placement))?;
                stats.models_submitted += 1;
            }
        }
        Ok(())
    }

    /// Release every compiled batch and model batch.
    ///
    /// Consumes the controller: nothing can be drawn or disposed afterwards.
    pub fn dispose(mut self, backend: &mut dyn RenderBackend) {
        let batch_count = self.batches.as_ref().map_or(0, BatchSet::len);
        let model_count = self.model_cache.len();
        if let Some(batches) = self.batches.take() {
            batches.release(backend);
        }
        self.model_cache.clear(backend);
        self.placements.clear();
        log::debug!("Render cache disposed: released {} batches and {} model batches", batch_count, model_count);
    }
}

impl Default for RenderCacheController {
    fn default() -> Self {
        Self::new(RenderCacheConfig::default())
    }
}

impl Drop for RenderCacheController {
    fn drop(&mut self) {
        let batch_count = self.batches.as_ref().map_or(0, BatchSet::len);
        if batch_count > 0 || !self.model_cache.is_empty() {
            log::warn!(
                "RenderCacheController dropped without dispose: leaking {} batches and {} model batches",
                batch_count,
                self.model_cache.len()
            );
        }
    }
}
