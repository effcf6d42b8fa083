/*
Component tree construction.

A single pre-order walk over the scene graph assigns every node a path made of
its ancestors' names.  Sibling names are disambiguated with a ` #n` suffix so
paths are unique, which makes the path the stable identity the side panel and
the visibility filter use to talk about groups.  Along the way each node gets a
display name and a breadcrumb derived from its path, cached on the node itself
and never overwritten by later builds.

Structural wrappers exported by modelling tools (`Scene_Collection`,
`NamedViews`, ...) are transparent: they keep an entry so their subtree stays
reachable, but they don't contribute a path segment and aren't rendered.
*/

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::file_format::catalog::{CatalogError, PartCatalog};
use crate::normalize::ui_clean;
use crate::scene_graph::{SceneGraph, SceneNodeId};

/// What a tree entry stands for.  Only `Scene` entries are backed by a scene
/// node; the rest are synthesized by the sidebar and the spec sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum EntryKind {
    #[serde(rename = "scene")]
    Scene { node: SceneNodeId, mesh: bool },
    #[serde(rename = "ui:group")]
    Group { key: String, title: String },
    #[serde(rename = "spec:root")]
    SpecRoot { title: String },
    #[serde(rename = "spec:item")]
    SpecItem {
        key: String,
        label: String,
        value: String,
    },
    #[serde(rename = "spec:pdf")]
    SpecDocument { label: String, href: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct TreeEntry {
    #[serde(flatten)]
    pub kind: EntryKind,
    /// The de-duplicated name (`Bolt #2`), not the display name.
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skip_render: bool,
    pub children: Vec<TreeEntry>,
}

impl TreeEntry {
    pub fn scene_node(&self) -> Option<SceneNodeId> {
        match self.kind {
            EntryKind::Scene { node, .. } => Some(node),
            _ => None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, EntryKind::Scene { mesh: true, .. })
    }

    pub fn is_spec(&self) -> bool {
        matches!(
            self.kind,
            EntryKind::SpecRoot { .. } | EntryKind::SpecItem { .. } | EntryKind::SpecDocument { .. }
        )
    }

    /// Depth-first search for the entry with the given path.  Transparent
    /// wrappers share their parent's path, so the first (outermost) hit wins.
    pub fn find_path(&self, path: &str) -> Option<&TreeEntry> {
        if self.path == path && !self.skip_render {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_path(path))
    }
}

/// Renderable scene nodes under an entry, pre-order.
pub fn collect_meshes_in_subtree(entry: &TreeEntry) -> Vec<SceneNodeId> {
    let mut out = vec![];
    collect_meshes_into(entry, &mut out);
    out
}

fn collect_meshes_into(entry: &TreeEntry, out: &mut Vec<SceneNodeId>) {
    if let EntryKind::Scene { node, mesh: true } = entry.kind {
        out.push(node);
    }
    for child in &entry.children {
        collect_meshes_into(child, out);
    }
}

/// Result of one build.  The indexes are rebuilt from scratch every time.
#[derive(Clone, Debug)]
pub struct BuiltTree {
    pub tree: TreeEntry,
    /// Every registered path maps to exactly one node.
    pub path_index: BTreeMap<String, SceneNodeId>,
    /// Only renderable leaves are registered here.
    pub node_to_path: HashMap<SceneNodeId, String>,
}

impl BuiltTree {
    pub fn node_for_path(&self, path: &str) -> Option<SceneNodeId> {
        self.path_index.get(path).copied()
    }

    pub fn path_for_node(&self, node: SceneNodeId) -> Option<&str> {
        self.node_to_path.get(&node).map(|s| s.as_str())
    }

    pub fn entry_for_path(&self, path: &str) -> Option<&TreeEntry> {
        self.tree.find_path(path)
    }
}

pub struct TreeBuilder {
    hidden_wrappers: Vec<String>,
    unnamed: String,
    breadcrumb_parts: usize,
    bad_names: Vec<Regex>,
}

#[derive(Default)]
struct BuildState {
    sibling_counts: HashMap<(String, String), usize>,
    taken_paths: HashSet<String>,
    path_index: BTreeMap<String, SceneNodeId>,
    node_to_path: HashMap<SceneNodeId, String>,
}

impl BuildState {
    /// First occurrence keeps the bare name, later ones get ` #2`, ` #3`, ...
    /// A candidate whose path is already taken (say a raw sibling literally
    /// named `Bolt #2`) is skipped, so the counter only ever increases.
    fn unique_sibling_name(&mut self, parent_path: &str, base: &str) -> (String, String) {
        let counter = self
            .sibling_counts
            .entry((parent_path.to_string(), base.to_string()))
            .or_insert(0);
        loop {
            *counter += 1;
            let candidate = if *counter == 1 {
                base.to_string()
            } else {
                format!("{} #{}", base, counter)
            };
            let path = join_path(parent_path, &candidate);
            if self.taken_paths.insert(path.clone()) {
                return (candidate, path);
            }
        }
    }
}

fn join_path(parent_path: &str, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent_path, name)
    }
}

impl TreeBuilder {
    pub fn from_catalog(catalog: &PartCatalog) -> Result<Self, CatalogError> {
        Ok(TreeBuilder {
            hidden_wrappers: catalog.tree.hidden_wrappers.clone(),
            unnamed: catalog.tree.unnamed.clone(),
            breadcrumb_parts: catalog.tree.breadcrumb_parts,
            bad_names: catalog.bad_name_matchers()?,
        })
    }

    pub fn build(&self, graph: &mut SceneGraph) -> BuiltTree {
        let mut state = BuildState::default();
        let root = graph.root();
        let tree = self.build_entry(graph, root, "", &mut state);

        debug!(
            nodes = graph.len(),
            paths = state.path_index.len(),
            meshes = state.node_to_path.len(),
            "built component tree"
        );

        BuiltTree {
            tree,
            path_index: state.path_index,
            node_to_path: state.node_to_path,
        }
    }

    fn build_entry(
        &self,
        graph: &mut SceneGraph,
        id: SceneNodeId,
        parent_path: &str,
        state: &mut BuildState,
    ) -> TreeEntry {
        let base = self.clean_name(&graph.node(id).name);
        let mesh = graph.node(id).is_mesh;
        let children = graph.children(id).to_vec();

        if self.hidden_wrappers.iter().any(|w| *w == base) {
            let path = if parent_path.is_empty() {
                base.clone()
            } else {
                parent_path.to_string()
            };
            let children = children
                .into_iter()
                .map(|child| self.build_entry(graph, child, parent_path, state))
                .collect();
            return TreeEntry {
                kind: EntryKind::Scene { node: id, mesh },
                name: base,
                path,
                skip_render: true,
                children,
            };
        }

        let (unique, path) = state.unique_sibling_name(parent_path, &base);

        state.path_index.entry(path.clone()).or_insert(id);
        if mesh {
            state.node_to_path.insert(id, path.clone());
        }

        let display_name = self.best_name_from_path(&path);
        let breadcrumb = self.breadcrumb_from_path(&path);
        let annotation = &mut graph.node_mut(id).annotation;
        annotation.set_display_name_if_unset(&display_name);
        annotation.set_breadcrumb_if_unset(&breadcrumb);

        let children = children
            .into_iter()
            .map(|child| self.build_entry(graph, child, &path, state))
            .collect();

        TreeEntry {
            kind: EntryKind::Scene { node: id, mesh },
            name: unique,
            path,
            skip_render: false,
            children,
        }
    }

    fn clean_name(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.unnamed.clone()
        } else {
            trimmed.to_string()
        }
    }

    /// Generic exporter labels (`Object 3`, `Cube.002`, `12`) say nothing
    /// about the part and are skipped when picking names.
    pub fn is_bad_ui_name(&self, name: &str) -> bool {
        let cleaned = ui_clean(name);
        cleaned.is_empty() || self.bad_names.iter().any(|re| re.is_match(&cleaned))
    }

    fn clean_segments(path: &str) -> Vec<String> {
        path.split('/').map(ui_clean).filter(|s| !s.is_empty()).collect()
    }

    /// The segment closest to the leaf that isn't a generic label; the leaf
    /// itself if every segment is generic.
    pub fn best_name_from_path(&self, path: &str) -> String {
        let parts = Self::clean_segments(path);
        parts
            .iter()
            .rev()
            .find(|p| !self.is_bad_ui_name(p))
            .or_else(|| parts.last())
            .cloned()
            .unwrap_or_else(|| "Component".to_string())
    }

    pub fn breadcrumb_from_path(&self, path: &str) -> String {
        let parts: Vec<String> = Self::clean_segments(path)
            .into_iter()
            .filter(|p| !self.is_bad_ui_name(p))
            .collect();
        let skip = parts.len().saturating_sub(self.breadcrumb_parts);
        parts.iter().skip(skip).join(" / ")
    }
}

/// Indented plain-text rendering of a tree, one entry per line, with
/// transparent entries flattened into their parent.  Scene entries show their
/// cached display name and their path.
pub fn render_outline(entry: &TreeEntry, graph: &SceneGraph) -> String {
    let mut out = String::new();
    render_outline_into(entry, graph, 0, &mut out);
    out
}

fn render_outline_into(entry: &TreeEntry, graph: &SceneGraph, depth: usize, out: &mut String) {
    let child_depth = if entry.skip_render {
        depth
    } else {
        let label = match &entry.kind {
            EntryKind::Scene { node, mesh } => {
                let display = graph
                    .get(*node)
                    .and_then(|n| n.annotation.display_name())
                    .unwrap_or(entry.name.as_str());
                let marker = if *mesh { "* " } else { "" };
                format!("{}{}  [{}]", marker, display, entry.path)
            }
            EntryKind::Group { title, .. } => format!("{}/", title),
            EntryKind::SpecRoot { title } => format!("{}/", title),
            EntryKind::SpecItem { label, value, .. } => format!("{}: {}", label, value),
            EntryKind::SpecDocument { label, href } => format!("{} <{}>", label, href),
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&label);
        out.push('\n');
        depth + 1
    };
    for child in &entry.children {
        render_outline_into(child, graph, child_depth, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> TreeBuilder {
        TreeBuilder::from_catalog(&PartCatalog::builtin().unwrap()).unwrap()
    }

    fn names(entry: &TreeEntry) -> Vec<&str> {
        entry.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_sibling_names_get_counters() {
        let mut g = SceneGraph::new("Engine");
        let root = g.root();
        let a = g.add_child(root, "Bolt", true);
        let b = g.add_child(root, "Bolt", true);
        let c = g.add_child(root, "Bolt", true);
        g.add_child(root, "Nut", true);

        let built = builder().build(&mut g);
        assert_eq!(names(&built.tree), vec!["Bolt", "Bolt #2", "Bolt #3", "Nut"]);
        assert_eq!(built.node_for_path("Engine/Bolt"), Some(a));
        assert_eq!(built.node_for_path("Engine/Bolt #2"), Some(b));
        assert_eq!(built.path_for_node(c), Some("Engine/Bolt #3"));
        assert_eq!(built.path_index.len(), 5);
    }

    #[test]
    fn test_counter_skips_literal_collisions() {
        let mut g = SceneGraph::new("Engine");
        let root = g.root();
        g.add_child(root, "Bolt", true);
        g.add_child(root, "Bolt #2", true);
        g.add_child(root, "Bolt", true);

        let built = builder().build(&mut g);
        assert_eq!(names(&built.tree), vec!["Bolt", "Bolt #2", "Bolt #3"]);
        assert_eq!(built.path_index.len(), 4);
    }

    #[test]
    fn test_same_name_under_different_parents_is_not_renamed() {
        let mut g = SceneGraph::new("Engine");
        let root = g.root();
        let left = g.add_child(root, "Left", false);
        let right = g.add_child(root, "Right", false);
        g.add_child(left, "Bolt", true);
        g.add_child(right, "Bolt", true);

        let built = builder().build(&mut g);
        assert!(built.path_index.contains_key("Engine/Left/Bolt"));
        assert!(built.path_index.contains_key("Engine/Right/Bolt"));
    }

    #[test]
    fn test_hidden_wrappers_are_transparent() {
        let mut g = SceneGraph::new("Scene");
        let root = g.root();
        let wrapper = g.add_child(root, "Scene_Collection", false);
        g.add_child(wrapper, "Gear", true);
        g.add_child(root, "Gear", true);

        let built = builder().build(&mut g);
        let wrapper_entry = &built.tree.children[0];
        assert!(wrapper_entry.skip_render);
        assert_eq!(wrapper_entry.path, "Scene");
        assert_eq!(wrapper_entry.children[0].path, "Scene/Gear");
        // The wrapper shares its parent's sibling counter.
        assert_eq!(built.tree.children[1].path, "Scene/Gear #2");
        assert!(!built.path_index.values().any(|n| *n == wrapper));
    }

    #[test]
    fn test_unnamed_nodes() {
        let mut g = SceneGraph::new("  ");
        let root = g.root();
        g.add_child(root, "", true);
        let built = builder().build(&mut g);
        assert_eq!(built.tree.path, "(unnamed)");
        assert_eq!(built.tree.children[0].path, "(unnamed)/(unnamed)");
    }

    #[test]
    fn test_display_names_skip_generic_segments() {
        let mut g = SceneGraph::new("Scene");
        let root = g.root();
        let engine = g.add_child(root, "Engine", false);
        let hose = g.add_child(engine, "Turbo_hose", true);
        let cube = g.add_child(hose, "Cube.002", true);
        let object = g.add_child(engine, "Object 3", true);

        builder().build(&mut g);
        let cube_ann = &g.node(cube).annotation;
        assert_eq!(cube_ann.display_name(), Some("Turbo hose"));
        assert_eq!(cube_ann.breadcrumb(), Some("Scene / Engine / Turbo hose"));
        assert_eq!(g.node(object).annotation.display_name(), Some("Engine"));
        assert_eq!(g.node(hose).annotation.display_name(), Some("Turbo hose"));
    }

    #[test]
    fn test_all_generic_path_uses_leaf() {
        let b = builder();
        assert_eq!(b.best_name_from_path("Mesh12/Cube.001"), "Cube.001");
        assert_eq!(b.best_name_from_path(""), "Component");
        assert_eq!(b.breadcrumb_from_path("Mesh12/Cube.001"), "");
        assert_eq!(b.breadcrumb_from_path("A/B/C/D/Sphere"), "B / C / D");
        assert!(b.is_bad_ui_name("OBJECT 7"));
        assert!(b.is_bad_ui_name("42"));
        assert!(b.is_bad_ui_name("   "));
        assert!(!b.is_bad_ui_name("Cube adapter"));
    }

    #[test]
    fn test_annotations_survive_rebuilds() {
        let mut g = SceneGraph::new("Scene");
        let root = g.root();
        let part = g.add_child(root, "Gear", true);
        g.node_mut(part).annotation.set_display_name_if_unset("Authored Gear");

        let first = builder().build(&mut g);
        let second = builder().build(&mut g);
        assert_eq!(g.node(part).annotation.display_name(), Some("Authored Gear"));
        assert_eq!(g.node(part).annotation.breadcrumb(), Some("Scene / Gear"));
        assert_eq!(first.path_index, second.path_index);
    }

    #[test]
    fn test_collect_meshes_and_lookup() {
        let mut g = SceneGraph::new("Scene");
        let root = g.root();
        let group = g.add_child(root, "Exhaust", false);
        let a = g.add_child(group, "Pipe", true);
        let b = g.add_child(group, "Muffler", true);

        let built = builder().build(&mut g);
        let entry = built.entry_for_path("Scene/Exhaust").unwrap();
        assert_eq!(collect_meshes_in_subtree(entry), vec![a, b]);
        assert!(built.entry_for_path("Scene/Nope").is_none());
    }
}
