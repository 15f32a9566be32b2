//! Batch slots and compilation
//!
//! Every rebuild produces exactly nine batches, one per [`BatchSlot`]. A
//! slot's contents are described by a pure [`DrawList`] built from the
//! [`Partition`]; the backend then compiles that list into an opaque handle.

use crate::config::OverlayColours;
use crate::foundation::colour::Colour;
use crate::scene::{ModelResource, NodeId};
use super::backend::{BackendResult, BatchHandle, RenderBackend};
use super::draw_list::{DrawList, FillMode, Primitive, PrimitiveId, PrimitiveSlot};
use super::partition::{in_2d, in_3d, model_bounds_2d, model_bounds_3d, Partition};

/// 2D orthographic views or 3D perspective views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimensionality {
    /// Top, front and side views
    TwoD,
    /// Camera view
    ThreeD,
}

/// Whether a batch follows the live selection transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformDependence {
    /// Drawn under the view transform only
    Static,
    /// Drawn under the view transform times the selection transform
    LiveTransformed,
}

/// Selection partition a batch draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionState {
    /// Unselected geometry
    Unselected,
    /// Selected geometry
    Selected,
}

/// How geometry is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum RenderStyle {
    /// Outlines only
    Wireframe,
    /// Filled with flat colour
    Flat,
    /// Filled with textures and lighting
    #[default]
    Textured,
}

/// Ordinary geometry or decal geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Brushes and entity bounds
    Geometry,
    /// Projected decals
    Decal,
}

/// Identifies what a batch slot contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    /// View dimensionality
    pub dimensionality: Dimensionality,
    /// Transform dependence
    pub transform: TransformDependence,
    /// Selection state
    pub selection: SelectionState,
    /// Render style
    pub style: RenderStyle,
    /// Geometry kind
    pub kind: GeometryKind,
}

/// The nine fixed batch slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BatchSlot {
    /// Unselected outlines at their stored position.
    ///
    /// Also holds a second pass: the selected outlines in the ghost colour,
    /// untransformed. [`BatchSlot::key`] still reports
    /// [`SelectionState::Unselected`] for this slot.
    Untransformed2D,
    /// Selection outlines that follow the selection transform
    Transformed2D,
    /// Selection outlines over shaded 3D views
    SelectedOutline3D,
    /// Unselected geometry, textured
    Untransformed3DTextured,
    /// Unselected geometry, flat
    Untransformed3DFlat,
    /// Selected geometry and decals, textured, following the selection transform
    Transformed3DTextured,
    /// Selected geometry and decals, flat, following the selection transform
    Transformed3DFlat,
    /// Unselected decals, textured
    UntransformedDecals3DTextured,
    /// Unselected decals, flat
    UntransformedDecals3DFlat,
}

impl BatchSlot {
    /// Every slot, in compilation order
    pub const ALL: [Self; 9] = [
        Self::Untransformed2D,
        Self::Transformed2D,
        Self::SelectedOutline3D,
        Self::Untransformed3DTextured,
        Self::Untransformed3DFlat,
        Self::Transformed3DTextured,
        Self::Transformed3DFlat,
        Self::UntransformedDecals3DTextured,
        Self::UntransformedDecals3DFlat,
    ];

    /// Position of the slot in [`BatchSlot::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The partition key this slot is compiled for.
    ///
    /// The key names the slot's primary content. [`BatchSlot::Untransformed2D`]
    /// carries selected geometry too, as its ghost pass.
    pub const fn key(self) -> PartitionKey {
        use Dimensionality::{ThreeD, TwoD};
        use GeometryKind::{Decal, Geometry};
        use RenderStyle::{Flat, Textured, Wireframe};
        use SelectionState::{Selected, Unselected};
        use TransformDependence::{LiveTransformed, Static};

        let (dimensionality, transform, selection, style, kind) = match self {
            Self::Untransformed2D => (TwoD, Static, Unselected, Wireframe, Geometry),
            Self::Transformed2D => (TwoD, LiveTransformed, Selected, Wireframe, Geometry),
            Self::SelectedOutline3D => (ThreeD, Static, Selected, Wireframe, Geometry),
            Self::Untransformed3DTextured => (ThreeD, Static, Unselected, Textured, Geometry),
            Self::Untransformed3DFlat => (ThreeD, Static, Unselected, Flat, Geometry),
            Self::Transformed3DTextured => (ThreeD, LiveTransformed, Selected, Textured, Geometry),
            Self::Transformed3DFlat => (ThreeD, LiveTransformed, Selected, Flat, Geometry),
            Self::UntransformedDecals3DTextured => (ThreeD, Static, Unselected, Textured, Decal),
            Self::UntransformedDecals3DFlat => (ThreeD, Static, Unselected, Flat, Decal),
        };
        PartitionKey { dimensionality, transform, selection, style, kind }
    }

    /// Whether the slot is drawn under the selection transform
    pub const fn is_live_transformed(self) -> bool {
        matches!(self.key().transform, TransformDependence::LiveTransformed)
    }
}

/// A compiled, immutable batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    slot: BatchSlot,
    handle: BatchHandle,
    primitives: Vec<PrimitiveId>,
}

impl Batch {
    /// Slot the batch was compiled for
    pub fn slot(&self) -> BatchSlot {
        self.slot
    }

    /// Partition key of the slot
    pub fn key(&self) -> PartitionKey {
        self.slot.key()
    }

    /// Backend handle
    pub fn handle(&self) -> BatchHandle {
        self.handle
    }

    /// Distinct primitives drawn by the batch, sorted
    pub fn primitives(&self) -> &[PrimitiveId] {
        &self.primitives
    }

    /// Whether the batch draws anything
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// The nine batches of one rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSet {
    batches: Vec<Batch>,
}

impl BatchSet {
    /// Batch for a slot
    pub fn get(&self, slot: BatchSlot) -> &Batch {
        &self.batches[slot.index()]
    }

    /// Batches in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    /// Number of batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// A batch set is never empty once built
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Release every batch
    pub fn release(self, backend: &mut dyn RenderBackend) {
        for batch in self.batches {
            backend.release(batch.handle);
        }
    }
}

/// Builds draw lists for the batch slots and compiles them
pub struct BatchCompiler<'a> {
    colours: &'a OverlayColours,
}

impl<'a> BatchCompiler<'a> {
    /// Create a compiler using the given selection tints
    pub fn new(colours: &'a OverlayColours) -> Self {
        Self { colours }
    }

    /// Describe a slot's contents. Pure: equal partitions give equal lists.
    pub fn draw_list(&self, slot: BatchSlot, partition: &Partition) -> DrawList {
        let p = partition;
        let mut list = DrawList::new();
        match slot {
            BatchSlot::Untransformed2D => {
                list.push_pass(
                    FillMode::Wireframe,
                    None,
                    in_2d(&p.unselected)
                        .chain(in_2d(&p.decals_unselected))
                        .chain(model_bounds_2d(&p.models, false)),
                );
                list.push_pass(FillMode::Wireframe, Some(self.colours.selection_ghost_2d), selected_2d(p));
            }
            BatchSlot::Transformed2D => {
                list.push_pass(FillMode::Wireframe, Some(self.colours.selection_2d), selected_2d(p));
            }
            BatchSlot::SelectedOutline3D => {
                list.push_pass(
                    FillMode::Wireframe,
                    Some(self.colours.selection_outline_3d),
                    in_3d(&p.selected)
                        .chain(in_3d(&p.decals_selected))
                        .chain(model_bounds_3d(&p.models, true)),
                );
            }
            BatchSlot::Untransformed3DTextured => {
                list.push_pass(FillMode::TEXTURED, None, in_3d(&p.unselected));
            }
            BatchSlot::Untransformed3DFlat => {
                list.push_pass(FillMode::FLAT, None, in_3d(&p.unselected));
            }
            BatchSlot::Transformed3DTextured => self.selected_3d(&mut list, FillMode::TEXTURED, p),
            BatchSlot::Transformed3DFlat => self.selected_3d(&mut list, FillMode::FLAT, p),
            BatchSlot::UntransformedDecals3DTextured => {
                list.push_pass(FillMode::TEXTURED, None, in_3d(&p.decals_unselected));
            }
            BatchSlot::UntransformedDecals3DFlat => {
                list.push_pass(FillMode::FLAT, None, in_3d(&p.decals_unselected));
            }
        }
        list
    }

    fn selected_3d(&self, list: &mut DrawList, mode: FillMode, p: &Partition) {
        list.push_pass(mode, None, in_3d(&p.selected).chain(in_3d(&p.decals_selected)));
        if p.face_mask {
            list.push_pass(
                mode,
                Some(self.colours.face_mask),
                in_3d(&p.selected).chain(in_3d(&p.decals_selected)),
            );
        }
    }

    /// Describe a shared model: every mesh, filled and textured, in model space.
    ///
    /// The batch is shared by every placement, so its primitives belong to no
    /// node and carry the null node id.
    pub fn model_draw_list(model: &ModelResource) -> DrawList {
        let primitives: Vec<Primitive> = model
            .meshes
            .iter()
            .zip(0u32..)
            .flat_map(|(mesh, mesh_index)| {
                mesh.iter().zip(0u32..).map(move |(face, face_index)| Primitive {
                    id: PrimitiveId { node: NodeId::default(), slot: PrimitiveSlot::Model(mesh_index, face_index) },
                    vertices: face.vertices.clone(),
                    texture: face.texture.clone(),
                    colour: Colour::WHITE,
                    opacity: 1.0,
                })
            })
            .collect();
        let mut list = DrawList::new();
        list.push_pass(FillMode::TEXTURED, None, &primitives);
        list
    }

    /// Compile a draw list into a batch for `slot`
    pub fn compile(
        slot: BatchSlot,
        list: &DrawList,
        backend: &mut dyn RenderBackend,
    ) -> BackendResult<Batch> {
        let handle = backend.compile(list)?;
        Ok(Batch { slot, handle, primitives: list.primitive_ids() })
    }

    /// Compile all nine slots.
    ///
    /// Either every slot compiles or nothing is kept: on failure the handles
    /// compiled so far are released before the error is returned.
    pub fn compile_all(
        &self,
        partition: &Partition,
        backend: &mut dyn RenderBackend,
    ) -> BackendResult<BatchSet> {
        let mut batches = Vec::with_capacity(BatchSlot::ALL.len());
        for slot in BatchSlot::ALL {
            let list = self.draw_list(slot, partition);
            match Self::compile(slot, &list, backend) {
                Ok(batch) => batches.push(batch),
                Err(error) => {
                    BatchSet { batches }.release(backend);
                    return Err(error);
                }
            }
        }
        Ok(BatchSet { batches })
    }
}

fn selected_2d(p: &Partition) -> impl Iterator<Item = &Primitive> {
    in_2d(&p.selected)
        .chain(in_2d(&p.decals_selected))
        .chain(model_bounds_2d(&p.models, true))
}
