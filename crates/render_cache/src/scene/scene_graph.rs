//! Scene arena
//!
//! The level document owns a tree of nodes. Nodes are stored in a
//! [`SlotMap`] and link to their parent by id, so there is no cyclic
//! ownership and removed ids never alias new nodes. The renderer only ever
//! reads a `Scene`; every mutation here belongs to the editing side.

use slotmap::SlotMap;

use super::model::ModelResource;
use super::node::{ModelId, NodeFlags, NodeId, NodeKind, SceneNode};

/// What the document currently selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Whole objects are selected
    #[default]
    Objects,
    /// Individual faces are selected (face edit tool)
    Faces,
}

/// Level scene: node tree, model library and document toggles
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: SlotMap<NodeId, SceneNode>,
    models: SlotMap<ModelId, ModelResource>,
    root: NodeId,
    selection_mode: SelectionMode,
    hide_face_mask: bool,
}

impl Scene {
    /// Create a scene with an empty world root
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new(None, NodeKind::Group));
        Self {
            nodes,
            models: SlotMap::with_key(),
            root,
            selection_mode: SelectionMode::default(),
            hide_face_mask: false,
        }
    }

    /// The world root
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a new node under `parent`.
    ///
    /// Returns `None` if `parent` does not exist.
    pub fn add_node(&mut self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let id = self.nodes.insert(SceneNode::new(Some(parent), kind));
        self.nodes[parent].children.push(id);
        Some(id)
    }

    /// Remove a node and its whole subtree. The root cannot be removed.
    ///
    /// Returns the number of nodes removed.
    pub fn remove_node(&mut self, id: NodeId) -> usize {
        if id == self.root {
            return 0;
        }
        let Some(parent) = self.nodes.get(id).and_then(SceneNode::parent) else {
            return 0;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|child| *child != id);
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(node.children);
                removed += 1;
            }
        }
        removed
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Mutably borrow a node
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Whether the node exists
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A scene always has its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(SceneNode::parent)
    }

    /// Children of a node, empty if the node does not exist
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(SceneNode::children).unwrap_or(&[])
    }

    /// Set or clear a flag. Returns `false` if the node does not exist.
    pub fn set_flag(&mut self, id: NodeId, flag: NodeFlags, value: bool) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.flags.set(flag, value);
                true
            }
            None => false,
        }
    }

    /// Select or deselect a node
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> bool {
        self.set_flag(id, NodeFlags::SELECTED, selected)
    }

    /// Set a node's opacity, clamped to `[0, 1]`
    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.opacity = opacity.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// Selection as seen by the renderer: the node or any ancestor is selected
    pub fn is_selected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(id)) {
            if node.is_selected() {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Add a model resource to the library
    pub fn add_model(&mut self, model: ModelResource) -> ModelId {
        self.models.insert(model)
    }

    /// Remove a model resource. Entities still referring to it fall back to
    /// their bounding box.
    pub fn remove_model(&mut self, id: ModelId) -> Option<ModelResource> {
        self.models.remove(id)
    }

    /// Resolve a model resource
    pub fn model(&self, id: ModelId) -> Option<&ModelResource> {
        self.models.get(id)
    }

    /// Current selection mode
    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    /// Switch between object and face selection
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.selection_mode = mode;
    }

    /// Whether the face mask is hidden while in face selection
    pub fn hide_face_mask(&self) -> bool {
        self.hide_face_mask
    }

    /// Document toggle: hide the face mask in face selection mode
    pub fn set_hide_face_mask(&mut self, hide: bool) {
        self.hide_face_mask = hide;
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::node::{EntityData, Face};

    fn solid() -> NodeKind {
        NodeKind::Solid {
            faces: vec![Face::new(vec![Vec3::zeros(), Vec3::x(), Vec3::y()])],
        }
    }

    #[test]
    fn test_add_node_links_parent_and_child() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.add_node(root, NodeKind::Group).unwrap();
        let brush = scene.add_node(group, solid()).unwrap();

        assert_eq!(scene.parent(brush), Some(group));
        assert_eq!(scene.children(root), &[group]);
        assert_eq!(scene.children(group), &[brush]);
        assert_eq!(scene.len(), 3);
    }

    #[test]
    fn test_remove_node_removes_subtree() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.add_node(root, NodeKind::Group).unwrap();
        let brush = scene.add_node(group, solid()).unwrap();
        let other = scene.add_node(root, solid()).unwrap();

        assert_eq!(scene.remove_node(group), 2);
        assert!(!scene.contains(brush));
        assert!(scene.contains(other));
        assert_eq!(scene.children(root), &[other]);
        assert!(scene.add_node(group, solid()).is_none());
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut scene = Scene::new();
        assert_eq!(scene.remove_node(scene.root()), 0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_selection_inherits_from_ancestors() {
        let mut scene = Scene::new();
        let group = scene.add_node(scene.root(), NodeKind::Group).unwrap();
        let entity = scene
            .add_node(group, NodeKind::Entity(EntityData::at(Vec3::zeros(), 8.0)))
            .unwrap();

        assert!(!scene.is_selected(entity));
        scene.set_selected(group, true);
        assert!(scene.is_selected(entity));
        assert!(!scene.node(entity).unwrap().is_selected());
    }

    #[test]
    fn test_opacity_is_clamped() {
        let mut scene = Scene::new();
        let brush = scene.add_node(scene.root(), solid()).unwrap();
        scene.set_opacity(brush, 3.0);
        assert_eq!(scene.node(brush).unwrap().opacity, 1.0);
        scene.set_opacity(brush, -1.0);
        assert_eq!(scene.node(brush).unwrap().opacity, 0.0);
    }

    #[test]
    fn test_removed_model_no_longer_resolves() {
        let mut scene = Scene::new();
        let id = scene.add_model(ModelResource::new("barrel", vec![]));
        assert!(scene.model(id).is_some());
        scene.remove_model(id);
        assert!(scene.model(id).is_none());
    }
}
