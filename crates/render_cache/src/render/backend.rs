//! Backend abstraction for compiled batches
//!
//! The cache never rasterizes anything itself. A backend turns a
//! [`DrawList`] into an opaque [`BatchHandle`] (a display list, a recorded
//! command buffer, a pair of GPU buffers...), replays a handle under a
//! transform and frees it again.

use thiserror::Error;

use crate::foundation::colour::Colour;
use crate::foundation::math::Mat4;
use super::draw_list::DrawList;

/// Handle to a compiled batch owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchHandle(pub u64);

/// A coloured 2D line segment in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    /// Start point
    pub from: [f32; 2],
    /// End point
    pub to: [f32; 2],
    /// Line colour
    pub colour: Colour,
}

/// Rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The backend failed to compile or execute a batch
    #[error("Backend error: {0}")]
    Backend(String),

    /// A handle was used that the backend does not know about
    #[error("Unknown batch handle: {0:?}")]
    UnknownBatch(BatchHandle),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Result type for controller operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Operations a graphics backend provides to the batch cache
pub trait RenderBackend {
    /// Compile a draw list into a reusable batch
    fn compile(&mut self, list: &DrawList) -> BackendResult<BatchHandle>;

    /// Replay a compiled batch under `transform`
    fn submit(&mut self, handle: BatchHandle, transform: &Mat4) -> BackendResult<()>;

    /// Free a compiled batch. Releasing an unknown handle is a no-op.
    fn release(&mut self, handle: BatchHandle);

    /// Draw a list once without compiling it
    fn draw_immediate(&mut self, list: &DrawList, transform: &Mat4) -> BackendResult<()>;

    /// Draw coloured 2D lines once
    fn draw_lines(&mut self, lines: &[GridLine], transform: &Mat4) -> BackendResult<()>;

    /// Toggle lighting for subsequent draws
    fn set_lighting(&mut self, enabled: bool);
}
