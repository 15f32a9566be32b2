//! # Render Cache
//!
//! Render-batch caching and invalidation for an editable level scene.
//!
//! ## Features
//!
//! - **Coalesced invalidation**: any number of edits between two frames cost one rebuild
//! - **Fixed batch slots**: 2D/3D, selected/unselected, textured/flat, decals
//! - **Live selection transform**: dragging a selection never recompiles anything
//! - **Shared model batches**: one compiled batch per model resource, evicted when unused
//! - **Backend agnostic**: batches are described as pure draw lists and compiled by a [`render::RenderBackend`]
//!
//! ## Quick Start
//!
//! ```rust
//! use render_cache::prelude::*;
//!
//! let mut scene = Scene::new();
//! let brush = scene
//!     .add_node(scene.root(), NodeKind::Solid {
//!         faces: vec![Face::new(vec![Vec3::zeros(), Vec3::x(), Vec3::y()])],
//!     })
//!     .unwrap();
//!
//! let mut backend = RecordingBackend::new();
//! let mut controller = RenderCacheController::new(RenderCacheConfig::default());
//!
//! controller.draw_3d(&scene, &View3D::default(), &mut backend).unwrap();
//!
//! scene.set_selected(brush, true);
//! controller.invalidate_nodes(&[brush]);
//! let stats = controller.draw_3d(&scene, &View3D::default(), &mut backend).unwrap();
//! assert!(stats.rebuilt);
//!
//! controller.dispose(&mut backend);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, GridConfig, OverlayColours, RenderCacheConfig},
        foundation::{
            colour::Colour,
            math::{Aabb, Mat4, Vec3},
        },
        render::{
            BatchSlot, FrameStats, RecordingBackend, RenderBackend, RenderCacheController,
            RenderError, View2D, View3D, ViewStyle, ViewTransforms,
        },
        scene::{EntityData, Face, ModelId, ModelResource, NodeFlags, NodeId, NodeKind, Scene, SelectionMode},
    };
}
