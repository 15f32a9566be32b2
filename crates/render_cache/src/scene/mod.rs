//! Scene data consumed by the renderer
//!
//! The editing side owns and mutates the scene; the renderer only reads it
//! during a rebuild.
//!
//! ## Architecture
//!
//! ```text
//! Scene (arena of SceneNode, model library, document toggles)
//!      ↓
//! SceneTraversal (group hiding, filter hiding, effective selection)
//!      ↓
//! render::Partitioner
//! ```

mod node;
mod model;
mod scene_graph;
mod traversal;

pub use node::{EntityData, Face, ModelId, NodeFlags, NodeId, NodeKind, SceneNode};
pub use model::ModelResource;
pub use scene_graph::{Scene, SelectionMode};
pub use traversal::{SceneTraversal, VisibleNode};
