//! Show/hide bookkeeping for the side panel's eye toggles and group isolation.
//!
//! Two independent layers decide whether a mesh is drawn: a set of meshes the
//! user hid explicitly, and an optional isolate filter installed by clicking a
//! group header.  A mesh is visible when it isn't hidden and the filter, if
//! any, allows it.  Nothing here touches rendering.

use std::collections::HashSet;

use crate::scene_graph::{SceneGraph, SceneNodeId};

#[derive(Clone, Debug, PartialEq, Eq)]
struct IsolateFilter {
    allowed: HashSet<SceneNodeId>,
    owner_path: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct VisibilityState {
    hidden: HashSet<SceneNodeId>,
    filter: Option<IsolateFilter>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden(&self, mesh: SceneNodeId) -> bool {
        self.hidden.contains(&mesh)
    }

    /// Non-mesh nodes are ignored.
    pub fn set_hidden(&mut self, graph: &SceneGraph, mesh: SceneNodeId, hidden: bool) {
        if !graph.get(mesh).map_or(false, |n| n.is_mesh) {
            return;
        }
        if hidden {
            self.hidden.insert(mesh);
        } else {
            self.hidden.remove(&mesh);
        }
    }

    /// Flip the hidden flag; returns whether the mesh is now visible.
    pub fn toggle_hidden(&mut self, graph: &SceneGraph, mesh: SceneNodeId) -> bool {
        let next_hidden = !self.is_hidden(mesh);
        self.set_hidden(graph, mesh, next_hidden);
        !self.is_hidden(mesh)
    }

    pub fn set_many_hidden<I>(&mut self, graph: &SceneGraph, meshes: I, hidden: bool)
    where
        I: IntoIterator<Item = SceneNodeId>,
    {
        for mesh in meshes {
            self.set_hidden(graph, mesh, hidden);
        }
    }

    pub fn clear_hidden(&mut self) {
        self.hidden.clear();
    }

    /// Drop the isolate filter.  Explicitly hidden meshes stay hidden.
    pub fn show_all(&mut self) {
        self.filter = None;
    }

    /// Isolate `allowed`, remembering which tree path asked for it.  An empty
    /// set means "show everything".
    pub fn show_only(&mut self, allowed: HashSet<SceneNodeId>, owner_path: Option<&str>) {
        if allowed.is_empty() {
            self.show_all();
            return;
        }
        self.filter = Some(IsolateFilter {
            allowed,
            owner_path: owner_path.map(str::to_string),
        });
    }

    pub fn active_filter_owner_path(&self) -> Option<&str> {
        self.filter.as_ref().and_then(|f| f.owner_path.as_deref())
    }

    pub fn is_visible(&self, mesh: SceneNodeId) -> bool {
        if self.is_hidden(mesh) {
            return false;
        }
        match &self.filter {
            Some(filter) => filter.allowed.contains(&mesh),
            None => true,
        }
    }

    /// Drives a group's eye icon: on while anything in the group still shows.
    /// Only the hidden set counts here, the isolate filter doesn't.
    pub fn any_visible<'a, I>(&self, meshes: I) -> bool
    where
        I: IntoIterator<Item = &'a SceneNodeId>,
    {
        meshes.into_iter().any(|m| !self.is_hidden(*m))
    }

    pub fn visible_meshes(&self, graph: &SceneGraph) -> Vec<SceneNodeId> {
        graph
            .descendant_meshes(graph.root())
            .into_iter()
            .filter(|m| self.is_visible(*m))
            .collect()
    }
}
