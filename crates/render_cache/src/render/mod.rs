//! # Render batch cache
//!
//! Sits between the editable scene and a graphics backend. The scene is
//! traversed once per invalidation, visible geometry is partitioned into nine
//! fixed batch slots, and each slot is compiled into an opaque backend batch
//! that is replayed every frame until something changes.
//!
//! ## Pipeline
//!
//! ```text
//! invalidate*() ──> dirty flag
//!                      │ next draw_2d / draw_3d
//!                      ↓
//! SceneTraversal ──> Partitioner ──> BatchCompiler ──> RenderBackend::compile
//!                        │
//!                        └──> ModelBatchCache (one batch per shared model)
//!
//! draw: BatchSet ──> SelectionTransformOverlay ──> RenderBackend::submit
//! ```
//!
//! The live selection transform and the grid never touch the cache.

pub mod backend;
pub mod batch;
pub mod controller;
pub mod draw_list;
pub mod grid;
pub mod model_cache;
pub mod overlay;
pub mod partition;
pub mod recording;
pub mod view;


pub use backend::{BackendResult, BatchHandle, GridLine, RenderBackend, RenderError, RenderResult};
pub use batch::{
    Batch, BatchCompiler, BatchSet, BatchSlot, Dimensionality, GeometryKind, PartitionKey,
    RenderStyle, SelectionState, TransformDependence,
};
pub use controller::{FrameStats, RenderCacheController};
pub use draw_list::{DrawList, DrawPass, FillMode, Primitive, PrimitiveId, PrimitiveSlot};
pub use grid::GridSettings;
pub use model_cache::{ModelBatchCache, ModelBatchCacheEntry};
pub use overlay::SelectionTransformOverlay;
pub use partition::{ModelPlacement, Partition, Partitioner};
pub use recording::{RecordedCommand, RecordingBackend, Submission};
pub use view::{View2D, View3D, ViewStyle, ViewTransforms};
