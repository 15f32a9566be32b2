//! Backend-agnostic draw lists
//!
//! A [`DrawList`] is what gets compiled into a batch: an ordered set of
//! passes, each drawing a group of primitives in one fill mode with an
//! optional tint. Building a draw list never touches the backend.

use crate::foundation::colour::Colour;
use crate::foundation::math::Vec3;
use crate::scene::NodeId;

/// Which polygon of a node a primitive came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveSlot {
    /// Face of a solid, by index
    Face(u32),
    /// Side of an entity's bounding box, by index
    Bounds(u8),
    /// Polygon of a decal's projected geometry, by index
    Decal(u32),
    /// Face of a model resource: mesh index, face index
    Model(u32, u32),
}

/// Identity of a primitive for the lifetime of one rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId {
    /// Owning node
    pub node: NodeId,
    /// Polygon within the node
    pub slot: PrimitiveSlot,
}

/// Flattened polygon ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Where the polygon came from
    pub id: PrimitiveId,
    /// Polygon vertices
    pub vertices: Vec<Vec3>,
    /// Texture name, if any
    pub texture: Option<String>,
    /// Base colour from the owning node
    pub colour: Colour,
    /// Opacity from the owning node
    pub opacity: f32,
}

/// How a pass rasterizes its primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    /// Polygon outlines
    Wireframe,
    /// Filled polygons
    Filled {
        /// Sample the primitive's texture
        textured: bool,
        /// Apply lighting
        shaded: bool,
    },
}

impl FillMode {
    /// Filled, textured and lit
    pub const TEXTURED: Self = Self::Filled { textured: true, shaded: true };
    /// Filled with flat colour, unlit
    pub const FLAT: Self = Self::Filled { textured: false, shaded: false };
}

/// One homogeneous group of primitives within a draw list
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPass {
    /// Rasterization mode
    pub mode: FillMode,
    /// Colour overriding the primitives' own colour
    pub tint: Option<Colour>,
    /// Primitives, in draw order
    pub primitives: Vec<Primitive>,
}

/// Ordered passes making up one batch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawList {
    passes: Vec<DrawPass>,
}

impl DrawList {
    /// Create an empty draw list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass. Empty groups are skipped.
    ///
    /// Primitives are ordered by texture and then by id so that the same
    /// group always produces the same list, whatever order it was collected in.
    pub fn push_pass<'a>(
        &mut self,
        mode: FillMode,
        tint: Option<Colour>,
        primitives: impl IntoIterator<Item = &'a Primitive>,
    ) {
        let mut primitives: Vec<Primitive> = primitives.into_iter().cloned().collect();
        if primitives.is_empty() {
            return;
        }
        primitives.sort_by(|a, b| a.texture.cmp(&b.texture).then(a.id.cmp(&b.id)));
        self.passes.push(DrawPass { mode, tint, primitives });
    }

    /// Passes in draw order
    pub fn passes(&self) -> &[DrawPass] {
        &self.passes
    }

    /// Whether nothing would be drawn
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Total primitive count over all passes
    pub fn primitive_count(&self) -> usize {
        self.passes.iter().map(|pass| pass.primitives.len()).sum()
    }

    /// Distinct primitive ids over all passes, sorted
    pub fn primitive_ids(&self) -> Vec<PrimitiveId> {
        let mut ids: Vec<PrimitiveId> = self
            .passes
            .iter()
            .flat_map(|pass| pass.primitives.iter().map(|primitive| primitive.id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn primitive(index: u32, texture: Option<&str>) -> Primitive {
        Primitive {
            id: PrimitiveId {
                node: NodeId::from(KeyData::from_ffi(1)),
                slot: PrimitiveSlot::Face(index),
            },
            vertices: vec![Vec3::zeros(), Vec3::x(), Vec3::y()],
            texture: texture.map(str::to_string),
            colour: Colour::WHITE,
            opacity: 1.0,
        }
    }

    #[test]
    fn test_empty_pass_is_skipped() {
        let mut list = DrawList::new();
        list.push_pass(FillMode::Wireframe, None, std::iter::empty());
        assert!(list.is_empty());
    }

    #[test]
    fn test_pass_order_is_independent_of_input_order() {
        let group = [primitive(2, Some("b")), primitive(1, Some("a")), primitive(0, Some("b"))];
        let reversed: Vec<_> = group.iter().rev().cloned().collect();

        let mut first = DrawList::new();
        first.push_pass(FillMode::TEXTURED, None, &group);
        let mut second = DrawList::new();
        second.push_pass(FillMode::TEXTURED, None, &reversed);

        assert_eq!(first, second);
        let order: Vec<_> = first.passes()[0].primitives.iter().map(|p| p.id.slot).collect();
        assert_eq!(order, vec![PrimitiveSlot::Face(1), PrimitiveSlot::Face(0), PrimitiveSlot::Face(2)]);
    }

    #[test]
    fn test_primitive_ids_are_distinct() {
        let group = [primitive(0, None), primitive(1, None)];
        let mut list = DrawList::new();
        list.push_pass(FillMode::FLAT, None, &group);
        list.push_pass(FillMode::FLAT, Some(Colour::RED), &group);

        assert_eq!(list.primitive_count(), 4);
        assert_eq!(list.primitive_ids().len(), 2);
    }
}
