//! Shared model resources
//!
//! Many entities can place the same model. The renderer caches one compiled
//! batch per resource, keyed by the resource's [`ModelId`](super::ModelId).

use super::node::Face;

/// Geometry shared by reference between model entities
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResource {
    /// Asset name, for logging
    pub name: String,
    /// Meshes in model space, each a list of faces
    pub meshes: Vec<Vec<Face>>,
}

impl ModelResource {
    /// Create a model resource from its meshes
    pub fn new(name: impl Into<String>, meshes: Vec<Vec<Face>>) -> Self {
        Self {
            name: name.into(),
            meshes,
        }
    }

    /// Total face count over every mesh
    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(Vec::len).sum()
    }
}
