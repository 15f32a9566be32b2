//! Visibility traversal
//!
//! Group hiding is structural: a hidden group prunes its whole subtree and no
//! descendant can override it. Filter hiding is a per-node override applied
//! to the collected set afterwards, so it neither resurrects children of a
//! hidden group nor hides the children of a filtered node.

use super::node::{ModelId, NodeId, NodeKind};
use super::scene_graph::Scene;

/// A node that survived both visibility passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleNode {
    /// The node
    pub id: NodeId,
    /// Effective selection: the node or any ancestor is selected
    pub selected: bool,
}

/// Depth-first visibility walk over a [`Scene`]
pub struct SceneTraversal<'a> {
    scene: &'a Scene,
}

impl<'a> SceneTraversal<'a> {
    /// Create a traversal over `scene`
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }

    /// Every visible node in depth-first pre-order, root first
    pub fn visible_nodes(&self) -> Vec<VisibleNode> {
        let mut collected = Vec::new();
        self.collect(self.scene.root(), false, &mut collected);
        collected.retain(|visible| {
            self.scene
                .node(visible.id)
                .is_some_and(|node| !node.is_filter_hidden())
        });
        collected
    }

    fn collect(&self, id: NodeId, inherited_selection: bool, out: &mut Vec<VisibleNode>) {
        let Some(node) = self.scene.node(id) else {
            return;
        };
        if node.is_group_hidden() {
            return;
        }
        let selected = inherited_selection || node.is_selected();
        out.push(VisibleNode { id, selected });
        for child in node.children() {
            self.collect(*child, selected, out);
        }
    }

    /// Model entities among `visible` whose model resolves, in traversal order
    pub fn model_nodes(&self, visible: &[VisibleNode]) -> Vec<(VisibleNode, ModelId)> {
        visible
            .iter()
            .filter_map(|visible| match self.scene.node(visible.id)?.kind {
                NodeKind::Model { model, .. } => Some((*visible, model)),
                _ => None,
            })
            .filter(|(_, model)| self.scene.model(*model).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::model::ModelResource;
    use crate::scene::node::{EntityData, NodeFlags};

    fn ids(nodes: &[VisibleNode]) -> Vec<NodeId> {
        nodes.iter().map(|visible| visible.id).collect()
    }

    #[test]
    fn test_all_nodes_visible_in_pre_order() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.add_node(root, NodeKind::Group).unwrap();
        let a1 = scene.add_node(a, NodeKind::Group).unwrap();
        let b = scene.add_node(root, NodeKind::Group).unwrap();

        let visible = SceneTraversal::new(&scene).visible_nodes();
        assert_eq!(ids(&visible), vec![root, a, a1, b]);
    }

    #[test]
    fn test_group_hidden_prunes_subtree() {
        let mut scene = Scene::new();
        let root = scene.root();
        let hidden = scene.add_node(root, NodeKind::Group).unwrap();
        let child = scene.add_node(hidden, NodeKind::Group).unwrap();
        scene.set_flag(hidden, NodeFlags::HIDDEN_BY_GROUP, true);
        // A filter flag on the child cannot bring it back either way
        scene.set_flag(child, NodeFlags::HIDDEN_BY_FILTER, false);

        let visible = SceneTraversal::new(&scene).visible_nodes();
        assert_eq!(ids(&visible), vec![root]);
    }

    #[test]
    fn test_filter_hidden_keeps_children() {
        let mut scene = Scene::new();
        let root = scene.root();
        let filtered = scene.add_node(root, NodeKind::Group).unwrap();
        let child = scene.add_node(filtered, NodeKind::Group).unwrap();
        let sibling = scene.add_node(root, NodeKind::Group).unwrap();
        scene.set_flag(filtered, NodeFlags::HIDDEN_BY_FILTER, true);

        let visible = SceneTraversal::new(&scene).visible_nodes();
        assert_eq!(ids(&visible), vec![root, child, sibling]);
    }

    #[test]
    fn test_effective_selection_flows_down() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.add_node(root, NodeKind::Group).unwrap();
        let inner = scene.add_node(group, NodeKind::Group).unwrap();
        let leaf = scene.add_node(inner, NodeKind::Group).unwrap();
        let other = scene.add_node(root, NodeKind::Group).unwrap();
        scene.set_selected(group, true);

        let visible = SceneTraversal::new(&scene).visible_nodes();
        let selected: Vec<_> = visible.iter().filter(|v| v.selected).map(|v| v.id).collect();
        assert_eq!(selected, vec![group, inner, leaf]);
        assert!(!visible.iter().any(|v| v.id == other && v.selected));
    }

    #[test]
    fn test_selection_inherited_through_filtered_parent() {
        let mut scene = Scene::new();
        let group = scene.add_node(scene.root(), NodeKind::Group).unwrap();
        let child = scene.add_node(group, NodeKind::Group).unwrap();
        scene.set_selected(group, true);
        scene.set_flag(group, NodeFlags::HIDDEN_BY_FILTER, true);

        let visible = SceneTraversal::new(&scene).visible_nodes();
        assert_eq!(visible.last(), Some(&VisibleNode { id: child, selected: true }));
    }

    #[test]
    fn test_model_nodes_from_visible_set() {
        let mut scene = Scene::new();
        let root = scene.root();
        let model = scene.add_model(ModelResource::new("crate", vec![]));
        let missing = scene.add_model(ModelResource::new("missing", vec![]));
        scene.remove_model(missing);
        let placed_at = |model| NodeKind::Model {
            entity: EntityData::at(Vec3::zeros(), 16.0),
            model,
            hide_distance: 1000.0,
        };
        let placed = scene.add_node(root, placed_at(model)).unwrap();
        scene.add_node(root, placed_at(missing)).unwrap();
        scene
            .add_node(
                root,
                NodeKind::Decal {
                    entity: EntityData::at(Vec3::zeros(), 4.0),
                    geometry: vec![],
                },
            )
            .unwrap();
        let hidden = scene.add_node(root, placed_at(model)).unwrap();
        scene.set_flag(hidden, NodeFlags::HIDDEN_BY_FILTER, true);

        let traversal = SceneTraversal::new(&scene);
        let visible = traversal.visible_nodes();
        let models = traversal.model_nodes(&visible);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].0.id, placed);
        assert_eq!(models[0].1, model);
    }
}
