/*
Arena representation of a loaded model's node hierarchy.

The viewer's scene library hands out nodes with live parent pointers.  Here the
graph owns every node in a `Vec` and nodes refer to each other by index, so a
"parent" is just an id used for upward walks (ancestor alias lookups, owner
resolution) and never keeps anything alive.  Children are kept in insertion
order, which is also document order for loaded assets; the tree builder's
sibling disambiguation depends on that order.
*/

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SceneNodeId(pub usize);

/// Display data computed by the tree builder and cached on the node.  Both
/// fields are write-once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeAnnotation {
    display_name: Option<String>,
    breadcrumb: Option<String>,
}

impl NodeAnnotation {
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn breadcrumb(&self) -> Option<&str> {
        self.breadcrumb.as_deref()
    }

    /// Returns true if the value was stored; an existing display name always
    /// wins.  Blank values are never stored.
    pub fn set_display_name_if_unset(&mut self, value: &str) -> bool {
        if self.display_name.is_some() || value.trim().is_empty() {
            return false;
        }
        self.display_name = Some(value.to_string());
        true
    }

    pub fn set_breadcrumb_if_unset(&mut self, value: &str) -> bool {
        if self.breadcrumb.is_some() {
            return false;
        }
        self.breadcrumb = Some(value.to_string());
        true
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub is_mesh: bool,
    pub annotation: NodeAnnotation,
    parent: Option<SceneNodeId>,
    children: Vec<SceneNodeId>,
}

#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

/// Hard stop for owner-mesh resolution so a pathological hierarchy can't turn
/// a hover into a full walk to the root.
const OWNER_SEARCH_DEPTH: usize = 10;

impl SceneGraph {
    pub fn new(root_name: &str) -> Self {
        SceneGraph {
            nodes: vec![SceneNode {
                name: root_name.to_string(),
                is_mesh: false,
                annotation: NodeAnnotation::default(),
                parent: None,
                children: vec![],
            }],
        }
    }

    pub fn root(&self) -> SceneNodeId {
        SceneNodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_child(&mut self, parent: SceneNodeId, name: &str, is_mesh: bool) -> SceneNodeId {
        let id = SceneNodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name: name.to_string(),
            is_mesh,
            annotation: NodeAnnotation::default(),
            parent: Some(parent),
            children: vec![],
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: SceneNodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: SceneNodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: SceneNodeId) -> Option<SceneNodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: SceneNodeId) -> &[SceneNodeId] {
        &self.nodes[id.0].children
    }

    /// Parent, grandparent, ... up to and including the root.
    pub fn ancestors(&self, id: SceneNodeId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.parent(id),
        }
    }

    /// Renderable nodes at or below `id`, pre-order.
    pub fn descendant_meshes(&self, id: SceneNodeId) -> Vec<SceneNodeId> {
        let mut out = vec![];
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let node = self.node(cur);
            if node.is_mesh {
                out.push(cur);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Nearest renderable node at or above `id`, not crossing `stop`.
    pub fn find_mesh_up(&self, id: SceneNodeId, stop: Option<SceneNodeId>) -> Option<SceneNodeId> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if Some(c) == stop {
                return None;
            }
            if self.node(c).is_mesh {
                return Some(c);
            }
            cur = self.parent(c);
        }
        None
    }

    /// Map a picked sub-mesh to the part it belongs to: the outermost
    /// renderable ancestor with a meaningful name, or the mesh itself.
    pub fn find_stable_owner_mesh(
        &self,
        mesh: SceneNodeId,
        stop: Option<SceneNodeId>,
        unstable_names: &[String],
    ) -> SceneNodeId {
        let has_good_name = |name: &str| {
            !name.trim().is_empty() && !unstable_names.iter().any(|bad| bad == name)
        };

        let mut best = mesh;
        for ancestor in self.ancestors(mesh).take(OWNER_SEARCH_DEPTH) {
            if Some(ancestor) == stop {
                break;
            }
            let node = self.node(ancestor);
            if node.is_mesh && has_good_name(&node.name) {
                best = ancestor;
            }
        }
        best
    }
}

/// A node together with the graph it lives in, for callers that need to look
/// at names up the parent chain.
#[derive(Clone, Copy)]
pub struct NodeRef<'g> {
    pub graph: &'g SceneGraph,
    pub id: SceneNodeId,
}

impl<'g> NodeRef<'g> {
    pub fn new(graph: &'g SceneGraph, id: SceneNodeId) -> Self {
        NodeRef { graph, id }
    }

    pub fn node(&self) -> &'g SceneNode {
        self.graph.node(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'g>> {
        self.graph.parent(self.id).map(|id| NodeRef::new(self.graph, id))
    }

    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'g>> + 'g {
        let graph = self.graph;
        graph.ancestors(self.id).map(move |id| NodeRef::new(graph, id))
    }
}

pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<SceneNodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = SceneNodeId;

    fn next(&mut self) -> Option<SceneNodeId> {
        let cur = self.next?;
        self.next = self.graph.parent(cur);
        Some(cur)
    }
}
