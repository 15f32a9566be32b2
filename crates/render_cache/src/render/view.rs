//! Per-frame view inputs

use crate::foundation::math::{Mat4, Vec3};

pub use super::batch::RenderStyle as ViewStyle;

/// The three matrices a viewport hands to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransforms {
    /// Viewport (projection) matrix
    pub viewport: Mat4,
    /// Camera matrix
    pub camera: Mat4,
    /// Model-view matrix of the viewport
    pub model_view: Mat4,
}

impl ViewTransforms {
    /// `viewport * camera`, the transform the grid is drawn under
    pub fn view(&self) -> Mat4 {
        self.viewport * self.camera
    }

    /// `viewport * camera * model_view`, the transform cached batches are drawn under
    pub fn base(&self) -> Mat4 {
        self.view() * self.model_view
    }
}

impl Default for ViewTransforms {
    fn default() -> Self {
        Self {
            viewport: Mat4::identity(),
            camera: Mat4::identity(),
            model_view: Mat4::identity(),
        }
    }
}

/// An orthographic 2D viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View2D {
    /// View matrices
    pub transforms: ViewTransforms,
    /// Pixels per world unit
    pub zoom: f64,
}

impl Default for View2D {
    fn default() -> Self {
        Self { transforms: ViewTransforms::default(), zoom: 1.0 }
    }
}

/// A perspective 3D viewport
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct View3D {
    /// View matrices
    pub transforms: ViewTransforms,
    /// How geometry is shaded
    pub style: ViewStyle,
    /// Camera location in world space
    pub camera_position: Vec3,
}
