//! Live selection transform
//!
//! While the user drags, rotates or scales a selection, the transformed
//! batches are replayed under `base * selection` instead of being rebuilt.
//! Nothing here mutates a batch.

use crate::foundation::math::{placement_matrix, Mat4, Mat4Ext, Vec3};
use super::backend::{BackendResult, RenderBackend};
use super::batch::Batch;
use super::partition::ModelPlacement;

/// Chooses the transform each batch is submitted under
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionTransformOverlay {
    base: Mat4,
    selection: Mat4,
}

impl SelectionTransformOverlay {
    /// Overlay for one draw call
    pub fn new(base: Mat4, selection: Mat4) -> Self {
        Self { base, selection }
    }

    /// Transform for static geometry
    pub fn base(&self) -> Mat4 {
        self.base
    }

    /// Transform for geometry that follows the selection
    pub fn transformed(&self) -> Mat4 {
        self.base * self.selection
    }

    /// `transformed()` for selected geometry, `base()` otherwise
    pub fn for_selection(&self, selected: bool) -> Mat4 {
        if selected {
            self.transformed()
        } else {
            self.base
        }
    }

    /// Submit a batch under the transform its slot asks for
    pub fn submit(&self, batch: &Batch, backend: &mut dyn RenderBackend) -> BackendResult<()> {
        backend.submit(batch.handle(), &self.for_selection(batch.slot().is_live_transformed()))
    }

    /// Origin a model is drawn at. Only the origin of a selected model
    /// follows the selection transform; its rotation does not.
    pub fn placement_origin(&self, placement: &ModelPlacement) -> Vec3 {
        if placement.selected {
            self.selection.transform_position(placement.origin)
        } else {
            placement.origin
        }
    }

    /// Full transform a model batch is submitted under
    pub fn placement_transform(&self, placement: &ModelPlacement) -> Mat4 {
        self.base * placement_matrix(self.placement_origin(placement), placement.angles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::scene::{ModelId, NodeId};

    fn placement(selected: bool) -> ModelPlacement {
        ModelPlacement {
            node: NodeId::default(),
            model: ModelId::default(),
            origin: Vec3::new(10.0, 0.0, 0.0),
            angles: Vec3::zeros(),
            hide_distance: 100.0,
            selected,
            in_2d: true,
            in_3d: true,
            bounds: Vec::new(),
        }
    }

    #[test]
    fn test_selection_applied_after_base() {
        let base = Mat4::new_scaling(2.0);
        let selection = Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0));
        let overlay = SelectionTransformOverlay::new(base, selection);

        assert_relative_eq!(overlay.transformed(), base * selection);
        assert_relative_eq!(overlay.for_selection(false), base);
    }

    #[test]
    fn test_only_selected_origin_moves() {
        let selection = Mat4::new_translation(&Vec3::new(0.0, 5.0, 0.0));
        let overlay = SelectionTransformOverlay::new(Mat4::identity(), selection);

        assert_relative_eq!(overlay.placement_origin(&placement(false)), Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(overlay.placement_origin(&placement(true)), Vec3::new(10.0, 5.0, 0.0));
        assert_relative_eq!(
            overlay.placement_transform(&placement(true)),
            Mat4::new_translation(&Vec3::new(10.0, 5.0, 0.0))
        );
    }
}
