/*
Side panel grouping.

Exported assets tend to bury the actual part list under a few wrapper levels,
and the part list itself is flat and long.  The regrouper finds the "dense"
level (skipping single-child chains), then sorts every entry on it into one of
a small fixed set of top-level groups using keyword rules, and hands back a
synthetic tree shaped for the panel:

    <root, skip_render>
      Main engine        (ui:group)
      Engine parts       (ui:group)
      Engine accessories (ui:group)
      Exhaust system     (ui:group)
      [spec sheet]       (spec:root, opt-in)

The entries themselves are moved over unchanged, so paths in the regrouped
tree still resolve through the original `BuiltTree` indexes.
*/

use std::collections::HashMap;

use lexical_sort::lexical_cmp;

use crate::file_format::catalog::SidebarGroupConfig;
use crate::normalize::normalize_key;
use crate::resolver::NameResolver;
use crate::scene_graph::{NodeRef, SceneGraph, SceneNodeId};
use crate::spec_sheet::create_spec_sheet_entry;
use crate::tree::{collect_meshes_in_subtree, EntryKind, TreeEntry};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidebarOptions {
    pub min_children: usize,
    pub max_depth: usize,
    /// Groups to emit, in order.  Entries whose rule names a group missing
    /// from this list go to the catalog's default group, or to the first
    /// group when that one is missing too.
    pub top_groups: Vec<SidebarGroupConfig>,
    pub include_spec_sheet: bool,
}

impl SidebarOptions {
    pub fn from_catalog(resolver: &NameResolver<'_>) -> Self {
        let sidebar = &resolver.catalog().sidebar;
        SidebarOptions {
            min_children: sidebar.min_children,
            max_depth: sidebar.max_depth,
            top_groups: sidebar.groups.clone(),
            include_spec_sheet: false,
        }
    }
}

/// A clickable row inside a group panel.
#[derive(Debug)]
pub enum SidebarRow<'t> {
    Spec(&'t TreeEntry),
    Part {
        entry: &'t TreeEntry,
        mesh: SceneNodeId,
        label: String,
    },
}

pub struct SidebarRegrouper<'r, 'c> {
    resolver: &'r NameResolver<'c>,
    default_group: &'c str,
    rules: Vec<(String, Vec<String>)>,
    options: SidebarOptions,
}

impl<'r, 'c> SidebarRegrouper<'r, 'c> {
    pub fn new(resolver: &'r NameResolver<'c>, options: SidebarOptions) -> Self {
        let catalog = resolver.catalog();
        SidebarRegrouper {
            resolver,
            default_group: &catalog.sidebar.default_group,
            rules: catalog.normalized_sidebar_rules(),
            options,
        }
    }

    pub fn options(&self) -> &SidebarOptions {
        &self.options
    }

    /// Title an entry is shown and sorted under.
    pub fn sidebar_title(&self, entry: &TreeEntry, graph: &SceneGraph) -> String {
        match &entry.kind {
            EntryKind::Scene { node, .. } => {
                if let Some(display) = graph.node(*node).annotation.display_name() {
                    return display.to_string();
                }
                let pretty = self.resolver.pretty_node_name(&entry.name);
                if !pretty.is_empty() {
                    pretty
                } else {
                    entry.name.clone()
                }
            }
            EntryKind::Group { title, .. } | EntryKind::SpecRoot { title } => title.clone(),
            EntryKind::SpecItem { label, .. } | EntryKind::SpecDocument { label, .. } => label.clone(),
        }
    }

    /// Follow single-child chains down from the root until a level is big
    /// enough, branches, or the hop limit is hit.  That level's children are
    /// what gets regrouped.
    pub fn pick_dense_level<'t>(&self, root: &'t TreeEntry) -> &'t [TreeEntry] {
        let mut cur = root;
        let mut hops = 0;
        while cur.children.len() < self.options.min_children && hops < self.options.max_depth {
            match cur.children.as_slice() {
                [only] if !only.children.is_empty() => {
                    cur = only;
                    hops += 1;
                }
                _ => break,
            }
        }
        debug!(hops, level = %cur.path, count = cur.children.len(), "picked dense level");
        &cur.children
    }

    /// Key of the first rule with a word occurring in the entry's normalized
    /// title, path or breadcrumb.
    pub fn pick_group_key(&self, entry: &TreeEntry, graph: &SceneGraph) -> &str {
        let mut haystacks = vec![
            normalize_key(&self.sidebar_title(entry, graph)),
            normalize_key(&entry.path),
        ];
        if let Some(node) = entry.scene_node() {
            if let Some(breadcrumb) = graph.node(node).annotation.breadcrumb() {
                haystacks.push(normalize_key(breadcrumb));
            }
        }

        for (key, words) in &self.rules {
            let hit = words
                .iter()
                .any(|w| haystacks.iter().any(|h| h.contains(w.as_str())));
            if hit {
                return key;
            }
        }
        self.default_group
    }

    /// Where entries go when their group isn't among `top_groups`.
    fn fallback_group(&self) -> &str {
        let groups = &self.options.top_groups;
        if groups.iter().any(|g| g.key == self.default_group) {
            return self.default_group;
        }
        groups.first().map_or(self.default_group, |g| g.key.as_str())
    }

    pub fn regroup(&self, root: &TreeEntry, graph: &SceneGraph) -> TreeEntry {
        let base_path = if root.path.is_empty() { "root" } else { root.path.as_str() };

        let groups = &self.options.top_groups;
        let fallback = self.fallback_group();
        let mut buckets: HashMap<&str, Vec<TreeEntry>> =
            groups.iter().map(|g| (g.key.as_str(), vec![])).collect();
        for entry in self.pick_dense_level(root) {
            let mut key = self.pick_group_key(entry, graph);
            if !buckets.contains_key(key) {
                key = fallback;
            }
            if let Some(bucket) = buckets.get_mut(key) {
                bucket.push(entry.clone());
            }
        }

        let mut children: Vec<TreeEntry> = groups
            .iter()
            .map(|group| {
                let members = buckets.remove(group.key.as_str()).unwrap_or_default();
                let mut keyed: Vec<(String, TreeEntry)> = members
                    .into_iter()
                    .map(|e| (self.sidebar_title(&e, graph), e))
                    .collect();
                keyed.sort_by(|(a, _), (b, _)| lexical_cmp(a, b));
                TreeEntry {
                    kind: EntryKind::Group {
                        key: group.key.clone(),
                        title: group.title.clone(),
                    },
                    name: group.title.clone(),
                    path: format!("{}__sidebar/{}", base_path, group.key),
                    skip_render: false,
                    children: keyed.into_iter().map(|(_, e)| e).collect(),
                }
            })
            .collect();

        if self.options.include_spec_sheet {
            if let Some(sheet) = &self.resolver.catalog().spec_sheet {
                children.push(create_spec_sheet_entry(sheet));
            }
        }

        TreeEntry {
            kind: root.kind.clone(),
            name: root.name.clone(),
            path: base_path.to_string(),
            skip_render: true,
            children,
        }
    }

    /// Rows a group panel lists directly: spec rows, meshes, and any child
    /// whose subtree holds exactly one mesh.
    pub fn mesh_rows<'t>(&self, group: &'t TreeEntry, graph: &SceneGraph) -> Vec<SidebarRow<'t>> {
        let mut rows = vec![];
        for child in &group.children {
            if child.is_spec() {
                rows.push(SidebarRow::Spec(child));
                continue;
            }
            let meshes = collect_meshes_in_subtree(child);
            if !child.is_mesh() && meshes.len() != 1 {
                continue;
            }
            let mesh = match meshes.first() {
                Some(mesh) => *mesh,
                None => continue,
            };
            let label = match graph.node(mesh).annotation.display_name() {
                Some(display) => display.to_string(),
                None => self
                    .resolver
                    .resolve_display_name("", Some(NodeRef::new(graph, mesh))),
            };
            rows.push(SidebarRow::Part {
                entry: child,
                mesh,
                label,
            });
        }
        rows
    }

    /// Children rendered as nested collapsible groups rather than rows.
    pub fn nested_groups<'t>(&self, group: &'t TreeEntry) -> Vec<&'t TreeEntry> {
        group
            .children
            .iter()
            .filter(|c| !c.is_spec() && !c.is_mesh())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_format::catalog::PartCatalog;
    use crate::tree::TreeBuilder;

    fn names(entry: &TreeEntry) -> Vec<&str> {
        entry.children.iter().map(|c| c.name.as_str()).collect()
    }

    fn group<'t>(root: &'t TreeEntry, key: &str) -> &'t TreeEntry {
        root.children
            .iter()
            .find(|c| matches!(&c.kind, EntryKind::Group { key: k, .. } if k == key))
            .unwrap()
    }

    fn options(resolver: &NameResolver<'_>, min_children: usize) -> SidebarOptions {
        SidebarOptions {
            min_children,
            max_depth: 5,
            ..SidebarOptions::from_catalog(resolver)
        }
    }

    fn engine_graph(parts: &[&str]) -> SceneGraph {
        let mut g = SceneGraph::new("Scene");
        let engine = g.add_child(g.root(), "Engine", false);
        for part in parts {
            g.add_child(engine, part, true);
        }
        g
    }

    #[test]
    fn test_three_part_engine() {
        let catalog = PartCatalog::builtin().unwrap();
        let resolver = NameResolver::new(&catalog);
        let mut g = engine_graph(&["Exhaust filter", "Turbo hose", "Engine screws #"]);
        let built = TreeBuilder::from_catalog(&catalog).unwrap().build(&mut g);

        let regrouper = SidebarRegrouper::new(&resolver, options(&resolver, 3));
        let sidebar = regrouper.regroup(&built.tree, &g);

        assert!(sidebar.skip_render);
        assert_eq!(sidebar.path, "Scene");
        assert_eq!(
            names(&sidebar),
            vec!["Main engine", "Engine parts", "Engine accessories", "Exhaust system"]
        );
        assert!(group(&sidebar, "main").children.is_empty());
        assert_eq!(names(group(&sidebar, "parts")), vec!["Engine screws #"]);
        assert_eq!(names(group(&sidebar, "addons")), vec!["Turbo hose"]);
        assert_eq!(names(group(&sidebar, "exhaust")), vec!["Exhaust filter"]);
        assert_eq!(group(&sidebar, "exhaust").path, "Scene__sidebar/exhaust");
    }

    #[test]
    fn test_rule_priority() {
        let catalog = PartCatalog::builtin().unwrap();
        let resolver = NameResolver::new(&catalog);
        let mut g = engine_graph(&["Turbo Screw Bracket", "Muffler turbo shield"]);
        let built = TreeBuilder::from_catalog(&catalog).unwrap().build(&mut g);
        let regrouper = SidebarRegrouper::new(&resolver, options(&resolver, 2));

        let engine = &built.tree.children[0];
        assert_eq!(regrouper.pick_group_key(&engine.children[0], &g), "addons");
        assert_eq!(regrouper.pick_group_key(&engine.children[1], &g), "exhaust");
    }

    #[test]
    fn test_every_entry_lands_in_one_bucket() {
        let catalog = PartCatalog::builtin().unwrap();
        let resolver = NameResolver::new(&catalog);
        let labels: Vec<String> = (0..12)
            .flat_map(|i| {
                vec![
                    format!("Bolt {}", i),
                    format!("Widget {}", i),
                    format!("Exhaust pipe {}", i),
                ]
            })
            .collect();
        let refs: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
        let mut g = engine_graph(&refs);
        let built = TreeBuilder::from_catalog(&catalog).unwrap().build(&mut g);

        let regrouper = SidebarRegrouper::new(&resolver, SidebarOptions::from_catalog(&resolver));
        let sidebar = regrouper.regroup(&built.tree, &g);

        let mut seen: Vec<&str> = sidebar
            .children
            .iter()
            .flat_map(|group| group.children.iter().map(|c| c.path.as_str()))
            .collect();
        seen.sort();
        let mut expected: Vec<&str> = built.tree.children[0]
            .children
            .iter()
            .map(|c| c.path.as_str())
            .collect();
        expected.sort();
        assert_eq!(seen, expected);
        assert_eq!(group(&sidebar, "main").children.len(), 12);
        assert_eq!(group(&sidebar, "parts").children.len(), 12);
        assert_eq!(group(&sidebar, "exhaust").children.len(), 12);
    }

    #[test]
    fn test_dense_level_stops_at_branching() {
        let catalog = PartCatalog::builtin().unwrap();
        let resolver = NameResolver::new(&catalog);
        let mut g = SceneGraph::new("Scene");
        let wrapper = g.add_child(g.root(), "Model", false);
        let left = g.add_child(wrapper, "Left", false);
        g.add_child(left, "Lamella", true);
        g.add_child(wrapper, "Right bolt", true);
        let built = TreeBuilder::from_catalog(&catalog).unwrap().build(&mut g);

        let regrouper = SidebarRegrouper::new(&resolver, options(&resolver, 18));
        let level = regrouper.pick_dense_level(&built.tree);
        let level_names: Vec<&str> = level.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(level_names, vec!["Left", "Right bolt"]);

        let shallow = SidebarRegrouper::new(
            &resolver,
            SidebarOptions {
                max_depth: 0,
                ..options(&resolver, 18)
            },
        );
        assert_eq!(shallow.pick_dense_level(&built.tree)[0].name, "Model");
    }

    #[test]
    fn test_top_groups_override() {
        let catalog = PartCatalog::builtin().unwrap();
        let resolver = NameResolver::new(&catalog);
        let mut g = engine_graph(&["Exhaust filter", "Turbo hose", "Engine screws #", "Widget"]);
        let built = TreeBuilder::from_catalog(&catalog).unwrap().build(&mut g);
        let group_config = |key: &str, title: &str| SidebarGroupConfig {
            key: key.to_string(),
            title: title.to_string(),
        };

        // Reordered and retitled; "parts" entries fall back to "main".
        let sidebar = SidebarRegrouper::new(
            &resolver,
            SidebarOptions {
                top_groups: vec![group_config("exhaust", "Exhaust"), group_config("main", "Other")],
                ..options(&resolver, 4)
            },
        )
        .regroup(&built.tree, &g);
        assert_eq!(names(&sidebar), vec!["Exhaust", "Other"]);
        assert_eq!(names(group(&sidebar, "exhaust")), vec!["Exhaust filter"]);
        assert_eq!(names(group(&sidebar, "main")), vec!["Engine screws #", "Turbo hose", "Widget"]);
        assert_eq!(group(&sidebar, "main").path, "Scene__sidebar/main");

        // Without the default group, the first group takes the leftovers.
        let sidebar = SidebarRegrouper::new(
            &resolver,
            SidebarOptions {
                top_groups: vec![group_config("addons", "Add-ons"), group_config("exhaust", "Exhaust")],
                ..options(&resolver, 4)
            },
        )
        .regroup(&built.tree, &g);
        assert_eq!(names(group(&sidebar, "addons")), vec!["Engine screws #", "Turbo hose", "Widget"]);
        assert_eq!(names(group(&sidebar, "exhaust")), vec!["Exhaust filter"]);
    }

    #[test]
    fn test_groups_sorted_case_insensitively() {
        let catalog = PartCatalog::builtin().unwrap();
        let resolver = NameResolver::new(&catalog);
        let mut g = engine_graph(&["gamma", "Alpha", "beta"]);
        let built = TreeBuilder::from_catalog(&catalog).unwrap().build(&mut g);
        let sidebar = SidebarRegrouper::new(&resolver, options(&resolver, 3)).regroup(&built.tree, &g);
        assert_eq!(names(group(&sidebar, "main")), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_empty_tree_yields_empty_groups() {
        let catalog = PartCatalog::builtin().unwrap();
        let resolver = NameResolver::new(&catalog);
        let mut g = SceneGraph::new("");
        let built = TreeBuilder::from_catalog(&catalog).unwrap().build(&mut g);
        let sidebar = SidebarRegrouper::new(&resolver, options(&resolver, 18)).regroup(&built.tree, &g);
        assert_eq!(sidebar.children.len(), 4);
        assert!(sidebar.children.iter().all(|c| c.children.is_empty()));
        assert_eq!(sidebar.children[0].path, "(unnamed)__sidebar/main");
    }

    #[test]
    fn test_spec_sheet_is_opt_in() {
        let catalog = PartCatalog::builtin().unwrap();
        let resolver = NameResolver::new(&catalog);
        let mut g = engine_graph(&["Gear"]);
        let built = TreeBuilder::from_catalog(&catalog).unwrap().build(&mut g);

        let without = SidebarRegrouper::new(&resolver, options(&resolver, 18)).regroup(&built.tree, &g);
        assert_eq!(without.children.len(), 4);

        let with = SidebarRegrouper::new(
            &resolver,
            SidebarOptions {
                include_spec_sheet: true,
                ..options(&resolver, 18)
            },
        )
        .regroup(&built.tree, &g);
        assert_eq!(with.children.len(), 5);
        assert_eq!(with.children[4].path, "eco-cube/boat-specifications");
    }

    #[test]
    fn test_mesh_rows() {
        let catalog = PartCatalog::builtin().unwrap();
        let resolver = NameResolver::new(&catalog);
        let mut g = SceneGraph::new("Scene");
        let engine = g.add_child(g.root(), "Engine", false);
        let hose = g.add_child(engine, "Turbo_hose", true);
        let holder = g.add_child(engine, "Holder", false);
        let pump = g.add_child(holder, "Mesh12", true);
        let pair = g.add_child(engine, "Pair", false);
        g.add_child(pair, "Left", true);
        g.add_child(pair, "Right", true);
        let built = TreeBuilder::from_catalog(&catalog).unwrap().build(&mut g);

        let regrouper = SidebarRegrouper::new(&resolver, options(&resolver, 18));
        let engine_entry = &built.tree.children[0];
        let rows = regrouper.mesh_rows(engine_entry, &g);
        let summary: Vec<(SceneNodeId, &str)> = rows
            .iter()
            .filter_map(|row| match row {
                SidebarRow::Part { mesh, label, .. } => Some((*mesh, label.as_str())),
                SidebarRow::Spec(_) => None,
            })
            .collect();
        // "Mesh12" is a generic name, so its display name comes from the path.
        assert_eq!(summary, vec![(hose, "Turbo hose"), (pump, "Holder")]);

        let nested: Vec<&str> = regrouper
            .nested_groups(engine_entry)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(nested, vec!["Holder", "Pair"]);
    }
}
