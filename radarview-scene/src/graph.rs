//! The scene graph: node ownership, tag lookup, transforms and per-frame traversal
//!
//! All nodes live in one arena owned by [`SceneGraph`]; parent/child links are
//! [`NodeId`]s into it. The tag index belongs to the graph, so every node added
//! at any depth is reachable from the root's lookup.

use crate::backend::{RenderBackend, Uniform};
use crate::node::{CameraState, NodeId, SceneNode};
use nalgebra::{Matrix4, Vector3};
use radarview_core::{Error, Result, Transform3D};
use std::collections::HashMap;

/// How far a broadcast property setter reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the addressed node
    Node,
    /// The addressed node and every current descendant
    Subtree,
}

/// An add-only tree of [`SceneNode`]s
#[derive(Debug)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    tags: HashMap<String, NodeId>,
    root: NodeId,
}

impl SceneGraph {
    /// Create a graph whose root is `root`
    pub fn new(root: SceneNode) -> Self {
        Self {
            nodes: vec![root],
            tags: HashMap::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode> {
        self.nodes.get(id.0).ok_or(Error::UnknownNode(id.0))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.nodes.get_mut(id.0).ok_or(Error::UnknownNode(id.0))
    }

    /// All nodes with their ids, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Attach `child` under `parent` and register it as `tag`.
    ///
    /// Children are drawn in insertion order. Registering a tag that is already
    /// in use replaces the previous entry.
    pub fn add_child(&mut self, parent: NodeId, tag: &str, mut child: SceneNode) -> Result<NodeId> {
        self.node(parent)?;
        if child.parent.is_some() || !child.children.is_empty() {
            return Err(Error::InvalidData(format!("node for tag '{}' is already part of a tree", tag)));
        }

        let id = NodeId(self.nodes.len());
        child.parent = Some(parent);
        child.world_resolved = false;
        self.nodes.push(child);
        self.nodes[parent.0].children.push(id);

        if let Some(previous) = self.tags.insert(tag.to_string(), id) {
            log::warn!("Tag '{}' re-registered, {} replaced by {}", tag, previous, id);
        }
        log::debug!("Added {} node '{}' as {} under {}", self.nodes[id.0].kind().name(), tag, id, parent);
        Ok(id)
    }

    /// Find a node by tag. A miss is an expected outcome, not an error.
    pub fn lookup_child(&self, tag: &str) -> Option<NodeId> {
        self.tags.get(tag).copied()
    }

    pub fn lookup_node(&self, tag: &str) -> Option<&SceneNode> {
        self.lookup_child(tag).and_then(|id| self.nodes.get(id.0))
    }

    pub fn lookup_node_mut(&mut self, tag: &str) -> Option<&mut SceneNode> {
        let id = self.lookup_child(tag)?;
        self.nodes.get_mut(id.0)
    }

    /// `id` followed by its descendants, depth first in draw order
    pub fn subtree(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.node(id)?;
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        Ok(order)
    }

    fn scope_nodes(&self, id: NodeId, scope: Scope) -> Result<Vec<NodeId>> {
        match scope {
            Scope::Node => self.node(id).map(|_| vec![id]),
            Scope::Subtree => self.subtree(id),
        }
    }

    // ---- local transforms ----

    /// Rotate by `degrees` around `axis`, after the existing local transform
    pub fn rotate_by(&mut self, id: NodeId, degrees: f32, axis: Vector3<f32>) -> Result<()> {
        self.apply_local(id, Transform3D::rotation_degrees(degrees, axis))
    }

    pub fn scale_by(&mut self, id: NodeId, x: f32, y: f32, z: f32) -> Result<()> {
        self.apply_local(id, Transform3D::scaling(Vector3::new(x, y, z)))
    }

    pub fn translate_by(&mut self, id: NodeId, x: f32, y: f32, z: f32) -> Result<()> {
        self.apply_local(id, Transform3D::translation(Vector3::new(x, y, z)))
    }

    pub fn set_local_transform(&mut self, id: NodeId, transform: Transform3D) -> Result<()> {
        self.node_mut(id)?.local = transform;
        self.invalidate(id)
    }

    fn apply_local(&mut self, id: NodeId, op: Transform3D) -> Result<()> {
        let node = self.node_mut(id)?;
        node.local = node.local.then(op);
        self.invalidate(id)
    }

    /// Mark the cached world transform of `id` and its subtree as stale
    fn invalidate(&mut self, id: NodeId) -> Result<()> {
        for n in self.subtree(id)? {
            self.nodes[n.0].world_resolved = false;
        }
        Ok(())
    }

    /// World transform of `id`: its local transform followed by its parent's
    /// world transform. Cached until the node or an ancestor changes, or the
    /// next `update()` pass starts.
    pub fn compute_world_transform(&mut self, id: NodeId) -> Result<Transform3D> {
        let node = self.node(id)?;
        if node.world_resolved {
            return Ok(node.world);
        }

        let base = match node.parent {
            Some(parent) => self.compute_world_transform(parent)?,
            None => Transform3D::identity(),
        };

        let node = &mut self.nodes[id.0];
        node.world = node.local.then(base);
        node.world_resolved = true;
        node.stats.world_recomputes += 1;
        Ok(node.world)
    }

    // ---- broadcast properties ----

    pub fn set_view<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: NodeId,
        view: Matrix4<f32>,
        scope: Scope,
    ) -> Result<()> {
        for n in self.scope_nodes(id, scope)? {
            let node = &mut self.nodes[n.0];
            node.camera.view = view;
            node.push_uniform(backend, Uniform::View(view))?;
        }
        Ok(())
    }

    pub fn set_projection<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: NodeId,
        projection: Matrix4<f32>,
        scope: Scope,
    ) -> Result<()> {
        for n in self.scope_nodes(id, scope)? {
            let node = &mut self.nodes[n.0];
            node.camera.projection = projection;
            node.push_uniform(backend, Uniform::Projection(projection))?;
        }
        Ok(())
    }

    pub fn set_uniform_scale<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: NodeId,
        scale: f32,
        scope: Scope,
    ) -> Result<()> {
        for n in self.scope_nodes(id, scope)? {
            let node = &mut self.nodes[n.0];
            node.camera.uniform_scale = scale;
            node.push_uniform(backend, Uniform::Scale(scale))?;
        }
        Ok(())
    }

    /// Set view, projection and scale together
    pub fn set_camera<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: NodeId,
        camera: CameraState,
        scope: Scope,
    ) -> Result<()> {
        self.set_view(backend, id, camera.view, scope)?;
        self.set_projection(backend, id, camera.projection, scope)?;
        self.set_uniform_scale(backend, id, camera.uniform_scale, scope)
    }

    /// Show or hide nodes. Children added later start out visible regardless.
    pub fn set_visible(&mut self, id: NodeId, visible: bool, scope: Scope) -> Result<()> {
        for n in self.scope_nodes(id, scope)? {
            self.nodes[n.0].visible = visible;
        }
        Ok(())
    }

    // ---- per-frame traversal ----

    /// Refresh every node and upload the vertex data of visible ones.
    ///
    /// Hidden nodes are still visited so their CPU-side data keeps up to date.
    pub fn update<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        log::trace!("update pass over {} nodes", self.nodes.len());
        self.update_node(backend, self.root)
    }

    fn update_node<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, id: NodeId) -> Result<()> {
        self.nodes[id.0].world_resolved = false;

        for i in 0..self.nodes[id.0].children.len() {
            let child = self.nodes[id.0].children[i];
            self.update_node(backend, child)?;
        }

        // Leaves derive their whole ancestor chain here; inner nodes were
        // resolved by their descendants and hit the cache.
        let world = self.compute_world_transform(id)?;

        let node = &mut self.nodes[id.0];
        if node.pushed_model != world.matrix {
            node.push_uniform(backend, Uniform::Model(world.matrix))?;
            node.pushed_model = world.matrix;
        }

        node.refresh();
        if node.visible {
            node.upload(backend)?;
        }
        Ok(())
    }

    /// Issue draw calls for visible nodes in draw order.
    ///
    /// Visibility is not inherited here: a visible child of a hidden node is drawn.
    pub fn draw<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        self.draw_node(backend, self.root)
    }

    fn draw_node<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, id: NodeId) -> Result<()> {
        if self.nodes[id.0].visible {
            self.nodes[id.0].draw(backend)?;
        }
        for i in 0..self.nodes[id.0].children.len() {
            let child = self.nodes[id.0].children[i];
            self.draw_node(backend, child)?;
        }
        Ok(())
    }

    /// Free the GPU resources of every node
    pub fn release<B: RenderBackend + ?Sized>(mut self, backend: &mut B) {
        for node in &mut self.nodes {
            node.release(backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::kind::NodeKind;

    fn group(backend: &mut RecordingBackend) -> SceneNode {
        SceneNode::new(backend, NodeKind::Group, 1).unwrap()
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut backend = RecordingBackend::new();
        let mut graph = SceneGraph::new(group(&mut backend));
        let root = graph.root();
        let a = graph.add_child(root, "a", group(&mut backend)).unwrap();
        let b = graph.add_child(root, "b", group(&mut backend)).unwrap();

        assert_eq!(graph.node(root).unwrap().children(), &[a, b]);
        assert_eq!(graph.node(a).unwrap().parent().unwrap(), root);
        assert_eq!(graph.subtree(root).unwrap(), vec![root, a, b]);
    }

    #[test]
    fn test_nested_tags_reach_root_index() {
        let mut backend = RecordingBackend::new();
        let mut graph = SceneGraph::new(group(&mut backend));
        let grid = graph.add_child(graph.root(), "grid", group(&mut backend)).unwrap();
        let ring = graph.add_child(grid, "ring", group(&mut backend)).unwrap();

        assert_eq!(graph.lookup_child("ring"), Some(ring));
        assert_eq!(graph.lookup_child("grid"), Some(grid));
        assert_eq!(graph.lookup_child("missing"), None);
    }

    #[test]
    fn test_add_to_unknown_parent_fails() {
        let mut backend = RecordingBackend::new();
        let mut graph = SceneGraph::new(group(&mut backend));
        let err = graph.add_child(NodeId(9), "x", group(&mut backend)).unwrap_err();
        assert!(matches!(err, Error::UnknownNode(9)));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_transform_mutation_invalidates_subtree() {
        let mut backend = RecordingBackend::new();
        let mut graph = SceneGraph::new(group(&mut backend));
        let child = graph.add_child(graph.root(), "child", group(&mut backend)).unwrap();

        graph.compute_world_transform(child).unwrap();
        assert!(graph.node(child).unwrap().is_world_resolved());

        graph.translate_by(graph.root(), 1.0, 0.0, 0.0).unwrap();
        assert!(!graph.node(child).unwrap().is_world_resolved());

        let world = graph.compute_world_transform(child).unwrap();
        assert_eq!(world.matrix[(0, 3)], 1.0);
    }

    #[test]
    fn test_node_scope_does_not_touch_children() {
        let mut backend = RecordingBackend::new();
        let mut graph = SceneGraph::new(group(&mut backend));
        let child = graph.add_child(graph.root(), "child", group(&mut backend)).unwrap();

        graph.set_uniform_scale(&mut backend, graph.root(), 0.5, Scope::Node).unwrap();
        assert_eq!(graph.node(graph.root()).unwrap().camera().uniform_scale, 0.5);
        assert_eq!(graph.node(child).unwrap().camera().uniform_scale, 1.0);

        graph.set_uniform_scale(&mut backend, graph.root(), 0.25, Scope::Subtree).unwrap();
        assert_eq!(graph.node(child).unwrap().camera().uniform_scale, 0.25);
        let program = graph.node(child).unwrap().program().unwrap();
        assert_eq!(backend.last_uniform(program, "u_scale"), Some(Uniform::Scale(0.25)));
    }

    #[test]
    fn test_released_node_reports_missing_program() {
        let mut backend = RecordingBackend::new();
        let mut graph = SceneGraph::new(group(&mut backend));
        let root = graph.root();
        graph.node_mut(root).unwrap().release(&mut backend);

        let err = graph.set_view(&mut backend, root, Matrix4::identity(), Scope::Node).unwrap_err();
        assert!(matches!(err, Error::NoShaderProgram));
    }
}
