//! Arena-backed forest of planetoids.
//!
//! Every node lives in one `Vec` and refers to its children by [`NodeId`].
//! `add_child` keeps the forest acyclic with at most one parent per node,
//! so a preorder walk visits each node once and always after its parent.

use glam::Vec3;

use crate::error::SceneError;
use crate::planetoid::Planetoid;
use crate::shader::ShaderContext;

/// Index of a node in its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Node {
    planetoid: Planetoid,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
/// Arena of planetoids linked parent to children.
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node. It is a root until attached with [`add_child`](Self::add_child).
    pub fn insert(&mut self, planetoid: Planetoid) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        log::debug!("scene: inserted {} as {id:?}", planetoid.name());
        self.nodes.push(Node {
            planetoid,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append `child` to `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check(parent)?;
        self.check(child)?;
        if parent == child {
            return Err(SceneError::SelfParent(child));
        }
        if let Some(existing) = self.nodes[child.index()].parent {
            return Err(SceneError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        // `child` is currently a root, so a cycle exists only if `parent`
        // already hangs somewhere below it.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(SceneError::Cycle { parent, child });
            }
            cursor = self.nodes[id.index()].parent;
        }

        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    /// Insert `planetoid` directly under `parent`.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        planetoid: Planetoid,
    ) -> Result<NodeId, SceneError> {
        self.check(parent)?;
        let id = self.insert(planetoid);
        self.add_child(parent, id)?;
        Ok(id)
    }

    fn check(&self, id: NodeId) -> Result<(), SceneError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(id))
        }
    }

    /// The planetoid at `id`, if it exists.
    pub fn get(&self, id: NodeId) -> Option<&Planetoid> {
        self.nodes.get(id.index()).map(|n| &n.planetoid)
    }

    /// Mutable access to the planetoid at `id`.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Planetoid> {
        self.nodes.get_mut(id.index()).map(|n| &mut n.planetoid)
    }

    /// First node with the given name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.planetoid.name() == name)
            .map(|i| NodeId(i as u32))
    }

    /// Parent of `id`, or `None` for roots.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map_or(&[], |n| n.children.as_slice())
    }

    /// Parentless nodes in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in traversal order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        self.walk(|id, _| order.push(id));
        order
    }

    /// Advance and render every node, parent strictly before children.
    ///
    /// Roots orbit `origin`; every other node receives its parent's
    /// position from this same frame.
    pub fn draw(
        &mut self,
        shader: &mut dyn ShaderContext,
        dt: f32,
        origin: Vec3,
        orbiting: bool,
    ) {
        self.walk_mut(origin, |planetoid, parent_position| {
            planetoid.draw(shader, dt, parent_position, orbiting)
        });
    }

    /// Advance every node without rendering.
    pub fn advance(&mut self, dt: f32, origin: Vec3, orbiting: bool) {
        self.walk_mut(origin, |planetoid, parent_position| {
            planetoid.advance(dt, parent_position, orbiting)
        });
    }

    /// Render every node with its current matrices.
    pub fn render(&self, shader: &mut dyn ShaderContext) {
        self.walk(|_, planetoid| planetoid.render(shader));
    }

    /// Render every node that can cast a shadow. Light sources are skipped
    /// but their children are not.
    pub fn render_shadow_casters(&self, shader: &mut dyn ShaderContext) {
        self.walk(|_, planetoid| {
            if !planetoid.is_luminous() {
                planetoid.render(shader);
            }
        });
    }

    fn walk(&self, mut visit: impl FnMut(NodeId, &Planetoid)) {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = self.roots().collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            debug_assert!(!std::mem::replace(&mut seen[id.index()], true), "{id:?} reached twice");
            let node = &self.nodes[id.index()];
            visit(id, &node.planetoid);
            stack.extend(node.children.iter().rev());
        }
    }

    fn walk_mut(&mut self, origin: Vec3, mut visit: impl FnMut(&mut Planetoid, Vec3) -> Vec3) {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<(NodeId, Vec3)> = self.roots().map(|id| (id, origin)).collect();
        stack.reverse();
        while let Some((id, parent_position)) = stack.pop() {
            debug_assert!(!std::mem::replace(&mut seen[id.index()], true), "{id:?} reached twice");
            let node = &mut self.nodes[id.index()];
            let position = visit(&mut node.planetoid, parent_position);
            stack.extend(node.children.iter().rev().map(|&child| (child, position)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::TextureSet;
    use crate::planetoid::OrbitParams;
    use crate::shader::Drawable;
    use std::sync::Arc;

    struct NoDraw;

    impl Drawable for NoDraw {
        fn draw(&self, _: &mut dyn ShaderContext, _: &TextureSet) {}
    }

    fn node(name: &str, params: OrbitParams) -> Planetoid {
        Planetoid::new(name, Arc::new(NoDraw), Arc::new(TextureSet::new()), params)
    }

    fn moon(name: &str) -> Planetoid {
        node(name, OrbitParams::satellite(1.0, 1.0, 1.0, 1.0))
    }

    #[test]
    fn test_rejects_unknown_and_self_parent() {
        let mut scene = SceneGraph::new();
        let a = scene.insert(moon("a"));
        assert_eq!(scene.add_child(a, a), Err(SceneError::SelfParent(a)));
        let ghost = NodeId(9);
        assert_eq!(scene.add_child(a, ghost), Err(SceneError::UnknownNode(ghost)));
    }

    #[test]
    fn test_rejects_second_parent() {
        let mut scene = SceneGraph::new();
        let a = scene.insert(moon("a"));
        let b = scene.insert(moon("b"));
        let c = scene.insert(moon("c"));
        scene.add_child(a, c).unwrap();
        assert_eq!(
            scene.add_child(b, c),
            Err(SceneError::AlreadyParented { child: c, parent: a })
        );
    }

    #[test]
    fn test_rejects_cycle() {
        let mut scene = SceneGraph::new();
        let a = scene.insert(moon("a"));
        let b = scene.insert_child(a, moon("b")).unwrap();
        let c = scene.insert_child(b, moon("c")).unwrap();
        assert_eq!(
            scene.add_child(c, a),
            Err(SceneError::Cycle { parent: c, child: a })
        );
        assert_eq!(scene.roots().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_preorder_keeps_sibling_order() {
        let mut scene = SceneGraph::new();
        let sun = scene.insert(node("sun", OrbitParams::luminous(3.0, 5.0)));
        let earth = scene.insert_child(sun, moon("earth")).unwrap();
        let luna = scene.insert_child(earth, moon("luna")).unwrap();
        let mars = scene.insert_child(sun, moon("mars")).unwrap();
        let phobos = scene.insert_child(mars, moon("phobos")).unwrap();
        assert_eq!(scene.preorder(), vec![sun, earth, luna, mars, phobos]);
        assert_eq!(scene.find("mars"), Some(mars));
        assert_eq!(scene.parent(phobos), Some(mars));
        assert_eq!(scene.children(sun), &[earth, mars]);
    }

    #[test]
    fn test_children_follow_moving_parent() {
        let mut scene = SceneGraph::new();
        let sun = scene.insert(node("sun", OrbitParams::luminous(1.0, 0.0)));
        let planet = scene
            .insert_child(sun, node("planet", OrbitParams::satellite(20.0, 1.0, 33.0, 0.0)))
            .unwrap();
        let satellite = scene
            .insert_child(planet, node("satellite", OrbitParams::satellite(4.0, 1.0, 71.0, 0.0)))
            .unwrap();

        for _ in 0..5 {
            scene.advance(0.7, Vec3::ZERO, true);
            let p = scene.get(planet).unwrap().world_position();
            let s = scene.get(satellite).unwrap().world_position();
            assert!((p.length() - 20.0).abs() < 1e-3);
            assert!(((s - p).length() - 4.0).abs() < 1e-3);
        }
    }
}
