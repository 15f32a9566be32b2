//! Scene node representation
//!
//! Nodes live in the [`Scene`](super::Scene) arena and refer to each other by
//! [`NodeId`]. The kind of a node is a closed set, so the partitioner matches
//! on [`NodeKind`] instead of dispatching through a trait object.

use bitflags::bitflags;

use crate::foundation::colour::Colour;
use crate::foundation::math::{Aabb, Vec3};

slotmap::new_key_type! {
    /// Stable handle to a node in the scene arena
    pub struct NodeId;

    /// Stable identity of a shared model resource
    pub struct ModelId;
}

bitflags! {
    /// Visibility and selection state of a node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// Hidden through a visgroup; hides the whole subtree
        const HIDDEN_BY_GROUP = 1 << 0;
        /// Hidden by a filter; hides only this node
        const HIDDEN_BY_FILTER = 1 << 1;
        /// Selected in the document
        const SELECTED = 1 << 2;
        /// Not drawn in 2D views
        const RENDER_HIDDEN_2D = 1 << 3;
        /// Not drawn in 3D views
        const RENDER_HIDDEN_3D = 1 << 4;
    }
}

/// A single polygon of brush, decal or model geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Polygon vertices in world space, wound counter-clockwise
    pub vertices: Vec<Vec3>,
    /// Texture name, if the face is textured
    pub texture: Option<String>,
    /// Face-level selection (face edit mode)
    pub selected: bool,
}

impl Face {
    /// Create an untextured, unselected face
    pub fn new(vertices: Vec<Vec3>) -> Self {
        Self {
            vertices,
            texture: None,
            selected: false,
        }
    }

    /// Builder-style texture assignment
    #[must_use]
    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }
}

/// Placement data shared by every entity kind
#[derive(Debug, Clone, PartialEq)]
pub struct EntityData {
    /// World-space origin
    pub origin: Vec3,
    /// World-space bounding box
    pub bounds: Aabb,
    /// (pitch, yaw, roll) in degrees
    pub angles: Vec3,
}

impl EntityData {
    /// Entity at `origin` with a cube of half-size `half_extent` around it
    pub fn at(origin: Vec3, half_extent: f32) -> Self {
        Self {
            origin,
            bounds: Aabb::from_center_extents(
                origin,
                Vec3::new(half_extent, half_extent, half_extent),
            ),
            angles: Vec3::zeros(),
        }
    }
}

/// What a node contributes to rendering
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Container without geometry of its own (world root, groups)
    Group,
    /// Brush geometry
    Solid {
        /// Faces of the brush
        faces: Vec<Face>,
    },
    /// Point entity, drawn as its bounding box
    Entity(EntityData),
    /// Entity that can be substituted by a shared model resource
    Model {
        /// Placement of the entity
        entity: EntityData,
        /// Shared model resource
        model: ModelId,
        /// Beyond this camera distance the bounding box is drawn instead
        hide_distance: f32,
    },
    /// Entity carrying projected decal geometry
    Decal {
        /// Placement of the entity
        entity: EntityData,
        /// Decal polygons, already projected onto the surrounding brushes
        geometry: Vec<Face>,
    },
}

impl NodeKind {
    /// Entity placement, for the entity kinds
    pub fn entity(&self) -> Option<&EntityData> {
        match self {
            Self::Entity(entity)
            | Self::Model { entity, .. }
            | Self::Decal { entity, .. } => Some(entity),
            Self::Group | Self::Solid { .. } => None,
        }
    }
}

/// Node of the level scene tree
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Visibility and selection flags
    pub flags: NodeFlags,
    /// Opacity in `[0, 1]`, inherited by the node's primitives
    pub opacity: f32,
    /// Base colour used for wireframes and untextured fills
    pub colour: Colour,
    /// What the node draws
    pub kind: NodeKind,
}

impl SceneNode {
    pub(crate) fn new(parent: Option<NodeId>, kind: NodeKind) -> Self {
        let colour = match kind {
            NodeKind::Entity(_) | NodeKind::Model { .. } | NodeKind::Decal { .. } => {
                Colour::DEFAULT_ENTITY
            }
            NodeKind::Group | NodeKind::Solid { .. } => Colour::WHITE,
        };
        Self {
            parent,
            children: Vec::new(),
            flags: NodeFlags::empty(),
            opacity: 1.0,
            colour,
            kind,
        }
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the node itself is selected (ignores ancestors)
    pub fn is_selected(&self) -> bool {
        self.flags.contains(NodeFlags::SELECTED)
    }

    /// Whether the node hides its subtree through a visgroup
    pub fn is_group_hidden(&self) -> bool {
        self.flags.contains(NodeFlags::HIDDEN_BY_GROUP)
    }

    /// Whether the node is hidden by a filter
    pub fn is_filter_hidden(&self) -> bool {
        self.flags.contains(NodeFlags::HIDDEN_BY_FILTER)
    }
}
