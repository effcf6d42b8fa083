//! Reads the node hierarchy out of a glTF / GLB asset.
//!
//! Only names and structure are needed, so buffers and images are never
//! loaded.  The scene itself becomes the graph's root, named after the glTF
//! scene (or `Scene` when it has none), and its root nodes hang below it.  A
//! node counts as a mesh when it references one.  An author-supplied
//! `extras.displayName` pre-seeds the node's display name, which the tree
//! builder then leaves alone.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::scene_graph::{SceneGraph, SceneNodeId};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("asset contains no scene")]
    NoScene,
}

#[derive(Debug, Default, Deserialize)]
struct NodeExtras {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

fn extras_display_name(node: &gltf::Node<'_>) -> Option<String> {
    let raw = node.extras().as_ref()?;
    match serde_json::from_str::<NodeExtras>(raw.get()) {
        Ok(extras) => extras.display_name,
        Err(e) => {
            warn!(node = node.index(), error = %e, "ignoring unreadable node extras");
            None
        }
    }
}

pub fn load_scene_graph(bytes: &[u8]) -> Result<SceneGraph, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or(LoadError::NoScene)?;

    let mut graph = SceneGraph::new(scene.name().unwrap_or("Scene"));
    let root = graph.root();
    let mut visited = HashSet::new();
    for node in scene.nodes() {
        add_node(&mut graph, root, &node, &mut visited);
    }

    debug!(
        scene = scene.index(),
        nodes = graph.len(),
        "loaded scene graph"
    );
    Ok(graph)
}

pub fn load_scene_graph_from_path(path: &Path) -> Result<SceneGraph, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_scene_graph(&bytes)
}

fn add_node(
    graph: &mut SceneGraph,
    parent: SceneNodeId,
    node: &gltf::Node<'_>,
    visited: &mut HashSet<usize>,
) {
    // glTF forbids shared or cyclic children, but validation doesn't catch it.
    if !visited.insert(node.index()) {
        warn!(node = node.index(), "node reachable twice; skipping");
        return;
    }

    let id = graph.add_child(parent, node.name().unwrap_or(""), node.mesh().is_some());
    if let Some(display_name) = extras_display_name(node) {
        graph.node_mut(id).annotation.set_display_name_if_unset(&display_name);
    }

    for child in node.children() {
        add_node(graph, id, &child, visited);
    }
}
