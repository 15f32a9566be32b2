//! In-memory backend that records what it is asked to do
//!
//! Used by tests and the headless viewer. Compiled lists are kept by handle
//! and every command is appended to a log, so callers can assert draw order,
//! transforms and handle lifetimes without a GPU.

use std::collections::HashMap;

use log::warn;

use crate::foundation::math::Mat4;
use super::backend::{BackendResult, BatchHandle, GridLine, RenderBackend, RenderError};
use super::draw_list::DrawList;

/// A compiled batch replayed under a transform
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Batch that was replayed
    pub handle: BatchHandle,
    /// Transform it was replayed under
    pub transform: Mat4,
    /// Fingerprint of the compiled vertex payload
    pub fingerprint: u64,
}

/// One recorded backend command
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// A compiled batch was submitted
    Submit(Submission),
    /// A list was drawn without compiling it
    Immediate {
        /// Primitives drawn
        primitive_count: usize,
        /// Transform used
        transform: Mat4,
    },
    /// Grid or guide lines were drawn
    Lines {
        /// Lines drawn
        line_count: usize,
        /// Transform used
        transform: Mat4,
    },
    /// Lighting was switched
    Lighting(bool),
}

/// Backend recording compiles, submissions and releases
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_handle: u64,
    live: HashMap<BatchHandle, (DrawList, u64)>,
    released: Vec<BatchHandle>,
    double_releases: usize,
    compile_count: usize,
    compile_budget: Option<usize>,
    commands: Vec<RecordedCommand>,
}

impl RecordingBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the next `successes` compiles succeed and fail every one after
    pub fn fail_compile_after(&mut self, successes: usize) {
        self.compile_budget = Some(successes);
    }

    /// Stop failing compiles
    pub fn reset_failures(&mut self) {
        self.compile_budget = None;
    }

    /// Successful compiles so far
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    /// Batches compiled and not yet released
    pub fn live_batch_count(&self) -> usize {
        self.live.len()
    }

    /// Draw list a live handle was compiled from
    pub fn compiled(&self, handle: BatchHandle) -> Option<&DrawList> {
        self.live.get(&handle).map(|(list, _)| list)
    }

    /// Fingerprint of a live handle's payload
    pub fn fingerprint(&self, handle: BatchHandle) -> Option<u64> {
        self.live.get(&handle).map(|(_, fingerprint)| *fingerprint)
    }

    /// Number of successful releases
    pub fn released_count(&self) -> usize {
        self.released.len()
    }

    /// Whether `handle` has been released
    pub fn was_released(&self, handle: BatchHandle) -> bool {
        self.released.contains(&handle)
    }

    /// Releases of handles that were not live
    pub fn double_releases(&self) -> usize {
        self.double_releases
    }

    /// Commands recorded since the last [`RecordingBackend::take_commands`]
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Submitted handles in submission order
    pub fn submitted_handles(&self) -> Vec<BatchHandle> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                RecordedCommand::Submit(submission) => Some(submission.handle),
                _ => None,
            })
            .collect()
    }

    /// Submissions in order
    pub fn submissions(&self) -> Vec<&Submission> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                RecordedCommand::Submit(submission) => Some(submission),
                _ => None,
            })
            .collect()
    }
}

/// FNV-1a over the raw vertex bytes of every pass
fn payload_fingerprint(list: &DrawList) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for pass in list.passes() {
        for primitive in &pass.primitives {
            let positions: Vec<[f32; 3]> = primitive.vertices.iter().map(|v| [v.x, v.y, v.z]).collect();
            let tint = pass.tint.map_or([0.0; 4], |tint| tint.to_f32_array());
            for byte in bytemuck::cast_slice::<[f32; 3], u8>(&positions)
                .iter()
                .chain(bytemuck::cast_slice::<f32, u8>(&tint))
            {
                hash ^= u64::from(*byte);
                hash = hash.wrapping_mul(PRIME);
            }
        }
    }
    hash
}

impl RenderBackend for RecordingBackend {
    fn compile(&mut self, list: &DrawList) -> BackendResult<BatchHandle> {
        if let Some(budget) = self.compile_budget.as_mut() {
            if *budget == 0 {
                return Err(RenderError::Backend("out of batch memory".to_string()));
            }
            *budget -= 1;
        }
        self.next_handle += 1;
        let handle = BatchHandle(self.next_handle);
        self.live.insert(handle, (list.clone(), payload_fingerprint(list)));
        self.compile_count += 1;
        Ok(handle)
    }

    fn submit(&mut self, handle: BatchHandle, transform: &Mat4) -> BackendResult<()> {
        let fingerprint = self.fingerprint(handle).ok_or(RenderError::UnknownBatch(handle))?;
        self.commands.push(RecordedCommand::Submit(Submission {
            handle,
            transform: *transform,
            fingerprint,
        }));
        Ok(())
    }

    fn release(&mut self, handle: BatchHandle) {
        if self.live.remove(&handle).is_some() {
            self.released.push(handle);
        } else {
            warn!("{}", RenderError::UnknownBatch(handle));
            self.double_releases += 1;
        }
    }

    fn draw_immediate(&mut self, list: &DrawList, transform: &Mat4) -> BackendResult<()> {
        self.commands.push(RecordedCommand::Immediate {
            primitive_count: list.primitive_count(),
            transform: *transform,
        });
        Ok(())
    }

    fn draw_lines(&mut self, lines: &[GridLine], transform: &Mat4) -> BackendResult<()> {
        self.commands.push(RecordedCommand::Lines {
            line_count: lines.len(),
            transform: *transform,
        });
        Ok(())
    }

    fn set_lighting(&mut self, enabled: bool) {
        self.commands.push(RecordedCommand::Lighting(enabled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::colour::Colour;
    use crate::foundation::math::Vec3;
    use crate::render::draw_list::{FillMode, Primitive, PrimitiveId, PrimitiveSlot};
    use crate::scene::NodeId;

    fn list(x: f32) -> DrawList {
        let primitive = Primitive {
            id: PrimitiveId { node: NodeId::default(), slot: PrimitiveSlot::Face(0) },
            vertices: vec![Vec3::new(x, 0.0, 0.0), Vec3::x(), Vec3::y()],
            texture: None,
            colour: Colour::WHITE,
            opacity: 1.0,
        };
        let mut list = DrawList::new();
        list.push_pass(FillMode::FLAT, None, [&primitive]);
        list
    }

    #[test]
    fn test_compile_submit_release() {
        let mut backend = RecordingBackend::new();
        let handle = backend.compile(&list(0.0)).unwrap();
        backend.submit(handle, &Mat4::identity()).unwrap();
        backend.release(handle);

        assert_eq!(backend.submitted_handles(), vec![handle]);
        assert!(backend.was_released(handle));
        assert_eq!(backend.live_batch_count(), 0);
        assert_eq!(backend.double_releases(), 0);
    }

    #[test]
    fn test_unknown_handle() {
        let mut backend = RecordingBackend::new();
        let result = backend.submit(BatchHandle(42), &Mat4::identity());
        assert_eq!(result, Err(RenderError::UnknownBatch(BatchHandle(42))));

        backend.release(BatchHandle(42));
        assert_eq!(backend.double_releases(), 1);
    }

    #[test]
    fn test_fingerprint_follows_payload() {
        let mut backend = RecordingBackend::new();
        let a = backend.compile(&list(0.0)).unwrap();
        let b = backend.compile(&list(0.0)).unwrap();
        let c = backend.compile(&list(1.0)).unwrap();

        assert_ne!(a, b);
        assert_eq!(backend.fingerprint(a), backend.fingerprint(b));
        assert_ne!(backend.fingerprint(a), backend.fingerprint(c));
    }

    #[test]
    fn test_compile_failure_budget() {
        let mut backend = RecordingBackend::new();
        backend.fail_compile_after(1);
        assert!(backend.compile(&list(0.0)).is_ok());
        assert!(matches!(backend.compile(&list(0.0)), Err(RenderError::Backend(_))));

        backend.reset_failures();
        assert!(backend.compile(&list(0.0)).is_ok());
        assert_eq!(backend.compile_count(), 2);
    }
}
