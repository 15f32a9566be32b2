//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the few helpers the renderer needs for
//! placing entities and models in the level.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Extension trait for Mat4 with the transforms used by the draw passes
pub trait Mat4Ext {
    /// Transform a position (w = 1) and return the resulting point
    fn transform_position(&self, position: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn transform_position(&self, position: Vec3) -> Vec3 {
        self.transform_point(&Point3::from(position)).coords
    }
}

/// Rotation for entity angles stored as (pitch, yaw, roll) in degrees.
///
/// Level files keep angles in that order while the rotation is applied as
/// roll about X, pitch about Y and yaw about Z.
pub fn entity_rotation(angles: Vec3) -> Quat {
    Quat::from_euler_angles(
        angles.z.to_radians(),
        angles.x.to_radians(),
        angles.y.to_radians(),
    )
}

/// Placement matrix for an entity: rotate about its origin, then translate.
pub fn placement_matrix(origin: Vec3, angles: Vec3) -> Mat4 {
    Mat4::new_translation(&origin) * entity_rotation(angles).to_homogeneous()
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// The eight corners, bottom four first (counter-clockwise seen from +Z)
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }

    /// The six quads of the box, wound outwards.
    ///
    /// This is the bounding representation used for point entities and for
    /// models that are not substituted by their model batch.
    pub fn box_faces(&self) -> [[Vec3; 4]; 6] {
        let c = self.corners();
        [
            [c[0], c[3], c[2], c[1]], // bottom
            [c[4], c[5], c[6], c[7]], // top
            [c[0], c[1], c[5], c[4]], // front
            [c[2], c[3], c[7], c[6]], // back
            [c[0], c[4], c[7], c[3]], // left
            [c[1], c[2], c[6], c[5]], // right
        ]
    }
}
