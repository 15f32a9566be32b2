//! Partitioning visible geometry into draw groups
//!
//! Rules, in order of precedence:
//! 1. Primitives of nodes at or below the opacity threshold are dropped.
//! 2. The rest split into selected and unselected, where a face counts as
//!    selected if it is selected itself or its node is effectively selected.
//! 3. Decal geometry is kept apart from ordinary geometry.
//! 4. Model entities become [`ModelPlacement`]s when model rendering is on
//!    and their model resolves; otherwise they are drawn as their bounding box.
//!
//! Render style is not decided here: every group is drawn in whichever style
//! the view asks for.

use log::debug;

use crate::config::RenderCacheConfig;
use crate::foundation::math::{Aabb, Vec3};
use crate::scene::{
    EntityData, Face, ModelId, NodeFlags, NodeId, NodeKind, Scene, SceneNode, SelectionMode,
    VisibleNode,
};
use super::draw_list::{Primitive, PrimitiveId, PrimitiveSlot};

/// A primitive with the views it may appear in
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    /// The primitive
    pub primitive: Primitive,
    /// Drawn in 2D views
    pub in_2d: bool,
    /// Drawn in 3D views
    pub in_3d: bool,
}

/// A model entity that is drawn with its shared model batch
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPlacement {
    /// The entity node
    pub node: NodeId,
    /// The shared model
    pub model: ModelId,
    /// Entity origin
    pub origin: Vec3,
    /// Entity angles (pitch, yaw, roll) in degrees
    pub angles: Vec3,
    /// Camera distance from which the bounding box is drawn instead
    pub hide_distance: f32,
    /// Effective selection of the entity
    pub selected: bool,
    /// Drawn in 2D views
    pub in_2d: bool,
    /// Drawn in 3D views
    pub in_3d: bool,
    /// Bounding box faces, used for 2D outlines and the distance fallback
    pub bounds: Vec<Primitive>,
}

/// Visible geometry grouped for batch compilation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    /// Ordinary geometry that is not selected
    pub unselected: Vec<Classified>,
    /// Ordinary geometry that is selected
    pub selected: Vec<Classified>,
    /// Decal geometry that is not selected
    pub decals_unselected: Vec<Classified>,
    /// Decal geometry that is selected
    pub decals_selected: Vec<Classified>,
    /// Model entities drawn through the model cache
    pub models: Vec<ModelPlacement>,
    /// Draw the translucent mask over selected faces in 3D
    pub face_mask: bool,
}

impl Partition {
    /// Every distinct primitive id in the partition, sorted
    pub fn primitive_ids(&self) -> Vec<PrimitiveId> {
        let mut ids: Vec<PrimitiveId> = [
            &self.unselected,
            &self.selected,
            &self.decals_unselected,
            &self.decals_selected,
        ]
        .into_iter()
        .flatten()
        .map(|classified| classified.primitive.id)
        .chain(
            self.models
                .iter()
                .flat_map(|placement| placement.bounds.iter().map(|primitive| primitive.id)),
        )
        .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Primitives of `group` that are drawn in 2D
pub fn in_2d(group: &[Classified]) -> impl Iterator<Item = &Primitive> {
    group.iter().filter(|c| c.in_2d).map(|c| &c.primitive)
}

/// Primitives of `group` that are drawn in 3D
pub fn in_3d(group: &[Classified]) -> impl Iterator<Item = &Primitive> {
    group.iter().filter(|c| c.in_3d).map(|c| &c.primitive)
}

/// Bounding faces of the placements matching `selected` that are drawn in 2D
pub fn model_bounds_2d(
    models: &[ModelPlacement],
    selected: bool,
) -> impl Iterator<Item = &Primitive> {
    models
        .iter()
        .filter(move |p| p.selected == selected && p.in_2d)
        .flat_map(|p| p.bounds.iter())
}

/// Bounding faces of the placements matching `selected` that are drawn in 3D
pub fn model_bounds_3d(
    models: &[ModelPlacement],
    selected: bool,
) -> impl Iterator<Item = &Primitive> {
    models
        .iter()
        .filter(move |p| p.selected == selected && p.in_3d)
        .flat_map(|p| p.bounds.iter())
}

/// Classifies the output of a scene traversal
pub struct Partitioner<'a> {
    scene: &'a Scene,
    config: &'a RenderCacheConfig,
}

impl<'a> Partitioner<'a> {
    /// Create a partitioner over `scene` with the given settings
    pub fn new(scene: &'a Scene, config: &'a RenderCacheConfig) -> Self {
        Self { scene, config }
    }

    /// Partition the visible nodes
    pub fn partition(&self, visible: &[VisibleNode]) -> Partition {
        let mut partition = Partition {
            face_mask: !(self.scene.hide_face_mask()
                && self.scene.selection_mode() == SelectionMode::Faces),
            ..Partition::default()
        };

        for visible in visible {
            let Some(node) = self.scene.node(visible.id) else {
                continue;
            };
            if node.opacity <= self.config.opacity_threshold {
                continue;
            }
            self.classify(*visible, node, &mut partition);
        }

        partition
    }

    fn classify(&self, visible: VisibleNode, node: &SceneNode, partition: &mut Partition) {
        let in_2d = !node.flags.contains(NodeFlags::RENDER_HIDDEN_2D);
        let in_3d = !node.flags.contains(NodeFlags::RENDER_HIDDEN_3D);
        let push = |group: &mut Vec<Classified>, primitive: Primitive| {
            group.push(Classified { primitive, in_2d, in_3d });
        };

        match &node.kind {
            NodeKind::Group => {}
            NodeKind::Solid { faces } => {
                for (index, face) in faces.iter().enumerate() {
                    let primitive = face_primitive(visible.id, PrimitiveSlot::Face(slot_index(index)), face, node);
                    if visible.selected || face.selected {
                        push(&mut partition.selected, primitive);
                    } else {
                        push(&mut partition.unselected, primitive);
                    }
                }
            }
            NodeKind::Entity(entity) => {
                let group = if visible.selected { &mut partition.selected } else { &mut partition.unselected };
                for primitive in bounds_primitives(visible.id, &entity.bounds, node) {
                    push(group, primitive);
                }
            }
            NodeKind::Model { entity, model, hide_distance } => {
                if self.config.model_rendering && self.scene.model(*model).is_some() {
                    partition.models.push(ModelPlacement {
                        node: visible.id,
                        model: *model,
                        origin: entity.origin,
                        angles: entity.angles,
                        hide_distance: *hide_distance,
                        selected: visible.selected,
                        in_2d,
                        in_3d,
                        bounds: bounds_primitives(visible.id, &entity.bounds, node),
                    });
                } else {
                    if self.config.model_rendering {
                        debug!("Model {:?} of node {:?} does not resolve, drawing bounds", model, visible.id);
                    }
                    let group = if visible.selected { &mut partition.selected } else { &mut partition.unselected };
                    for primitive in bounds_primitives(visible.id, &entity.bounds, node) {
                        push(group, primitive);
                    }
                }
            }
            NodeKind::Decal { entity, geometry } => {
                let EntityData { bounds, .. } = entity;
                let (group, decals) = if visible.selected {
                    (&mut partition.selected, &mut partition.decals_selected)
                } else {
                    (&mut partition.unselected, &mut partition.decals_unselected)
                };
                for primitive in bounds_primitives(visible.id, bounds, node) {
                    push(group, primitive);
                }
                for (index, face) in geometry.iter().enumerate() {
                    push(decals, face_primitive(visible.id, PrimitiveSlot::Decal(slot_index(index)), face, node));
                }
            }
        }
    }
}

fn slot_index(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

fn face_primitive(node_id: NodeId, slot: PrimitiveSlot, face: &Face, node: &SceneNode) -> Primitive {
    Primitive {
        id: PrimitiveId { node: node_id, slot },
        vertices: face.vertices.clone(),
        texture: face.texture.clone(),
        colour: node.colour,
        opacity: node.opacity,
    }
}

fn bounds_primitives(node_id: NodeId, bounds: &Aabb, node: &SceneNode) -> Vec<Primitive> {
    bounds
        .box_faces()
        .into_iter()
        .zip(0u8..)
        .map(|(quad, index)| Primitive {
            id: PrimitiveId { node: node_id, slot: PrimitiveSlot::Bounds(index) },
            vertices: quad.to_vec(),
            texture: None,
            colour: node.colour,
            opacity: node.opacity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ModelResource, SceneTraversal};

    fn triangle() -> Face {
        Face::new(vec![Vec3::zeros(), Vec3::x(), Vec3::y()])
    }

    fn partition(scene: &Scene, config: &RenderCacheConfig) -> Partition {
        let visible = SceneTraversal::new(scene).visible_nodes();
        Partitioner::new(scene, config).partition(&visible)
    }

    fn nodes_of(group: &[Classified]) -> Vec<NodeId> {
        let mut nodes: Vec<_> = group.iter().map(|c| c.primitive.id.node).collect();
        nodes.dedup();
        nodes
    }

    #[test]
    fn test_opacity_threshold_excludes_everywhere() {
        let mut scene = Scene::new();
        let root = scene.root();
        let faint = scene.add_node(root, NodeKind::Solid { faces: vec![triangle()] }).unwrap();
        let edge = scene.add_node(root, NodeKind::Solid { faces: vec![triangle()] }).unwrap();
        let solid = scene.add_node(root, NodeKind::Solid { faces: vec![triangle()] }).unwrap();
        scene.set_opacity(faint, 0.05);
        scene.set_opacity(edge, 0.1);
        scene.set_selected(edge, true);

        let partition = partition(&scene, &RenderCacheConfig::default());
        let ids = partition.primitive_ids();
        assert!(ids.iter().all(|id| id.node != faint && id.node != edge));
        assert!(ids.iter().any(|id| id.node == solid));
        assert!(partition.selected.is_empty());
    }

    #[test]
    fn test_selection_inherited_from_grandparent() {
        let mut scene = Scene::new();
        let group = scene.add_node(scene.root(), NodeKind::Group).unwrap();
        let inner = scene.add_node(group, NodeKind::Group).unwrap();
        let brush = scene.add_node(inner, NodeKind::Solid { faces: vec![triangle()] }).unwrap();
        scene.set_selected(group, true);

        let partition = partition(&scene, &RenderCacheConfig::default());
        assert_eq!(nodes_of(&partition.selected), vec![brush]);
        assert!(partition.unselected.is_empty());
    }

    #[test]
    fn test_face_level_selection() {
        let mut scene = Scene::new();
        let mut picked = triangle();
        picked.selected = true;
        let brush = scene
            .add_node(scene.root(), NodeKind::Solid { faces: vec![triangle(), picked] })
            .unwrap();

        let partition = partition(&scene, &RenderCacheConfig::default());
        assert_eq!(partition.selected.len(), 1);
        assert_eq!(partition.selected[0].primitive.id, PrimitiveId { node: brush, slot: PrimitiveSlot::Face(1) });
        assert_eq!(partition.unselected.len(), 1);
    }

    #[test]
    fn test_entity_draws_bounding_box() {
        let mut scene = Scene::new();
        scene
            .add_node(scene.root(), NodeKind::Entity(EntityData::at(Vec3::zeros(), 8.0)))
            .unwrap();

        let partition = partition(&scene, &RenderCacheConfig::default());
        assert_eq!(partition.unselected.len(), 6);
        assert!(partition.unselected.iter().all(|c| c.primitive.vertices.len() == 4));
    }

    #[test]
    fn test_model_entity_becomes_placement() {
        let mut scene = Scene::new();
        let model = scene.add_model(ModelResource::new("chair", vec![vec![triangle()]]));
        let entity = scene
            .add_node(
                scene.root(),
                NodeKind::Model { entity: EntityData::at(Vec3::new(8.0, 0.0, 0.0), 8.0), model, hide_distance: 512.0 },
            )
            .unwrap();
        scene.set_selected(entity, true);

        let partition = partition(&scene, &RenderCacheConfig::default());
        assert!(partition.selected.is_empty());
        assert_eq!(partition.models.len(), 1);
        let placement = &partition.models[0];
        assert_eq!(placement.model, model);
        assert!(placement.selected);
        assert_eq!(placement.bounds.len(), 6);
    }

    #[test]
    fn test_model_falls_back_to_bounds() {
        let mut scene = Scene::new();
        let model = scene.add_model(ModelResource::new("chair", vec![vec![triangle()]]));
        let kind = NodeKind::Model { entity: EntityData::at(Vec3::zeros(), 8.0), model, hide_distance: 512.0 };
        scene.add_node(scene.root(), kind).unwrap();

        let disabled = RenderCacheConfig { model_rendering: false, ..RenderCacheConfig::default() };
        let partition_disabled = partition(&scene, &disabled);
        assert!(partition_disabled.models.is_empty());
        assert_eq!(partition_disabled.unselected.len(), 6);

        scene.remove_model(model);
        let partition_unresolved = partition(&scene, &RenderCacheConfig::default());
        assert!(partition_unresolved.models.is_empty());
        assert_eq!(partition_unresolved.unselected.len(), 6);
    }

    #[test]
    fn test_decals_partitioned_separately() {
        let mut scene = Scene::new();
        let root = scene.root();
        let kind = NodeKind::Decal {
            entity: EntityData::at(Vec3::zeros(), 4.0),
            geometry: vec![triangle().with_texture("{blood")],
        };
        let plain = scene.add_node(root, kind.clone()).unwrap();
        let picked = scene.add_node(root, kind).unwrap();
        scene.set_selected(picked, true);

        let partition = partition(&scene, &RenderCacheConfig::default());
        assert_eq!(nodes_of(&partition.decals_unselected), vec![plain]);
        assert_eq!(nodes_of(&partition.decals_selected), vec![picked]);
        // Decal entities still draw their bounding box as ordinary geometry
        assert_eq!(nodes_of(&partition.unselected), vec![plain]);
        assert_eq!(nodes_of(&partition.selected), vec![picked]);
    }

    #[test]
    fn test_render_hidden_flags() {
        let mut scene = Scene::new();
        let brush = scene.add_node(scene.root(), NodeKind::Solid { faces: vec![triangle()] }).unwrap();
        scene.set_flag(brush, NodeFlags::RENDER_HIDDEN_2D, true);

        let partition = partition(&scene, &RenderCacheConfig::default());
        assert_eq!(in_2d(&partition.unselected).count(), 0);
        assert_eq!(in_3d(&partition.unselected).count(), 1);
    }

    #[test]
    fn test_face_mask_hidden_only_in_face_mode() {
        let mut scene = Scene::new();
        scene.set_hide_face_mask(true);
        assert!(partition(&scene, &RenderCacheConfig::default()).face_mask);

        scene.set_selection_mode(SelectionMode::Faces);
        assert!(!partition(&scene, &RenderCacheConfig::default()).face_mask);

        scene.set_hide_face_mask(false);
        assert!(partition(&scene, &RenderCacheConfig::default()).face_mask);
    }
}
