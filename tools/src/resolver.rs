//! Turns raw asset labels into catalog part names.
//!
//! Canonical keys and display names are resolved through the same ladder of
//! tiers; the first tier that produces something wins:
//!
//! 1. The label, the node's display name and name, and then the same for up to
//!    six ancestors, looked up verbatim in the raw alias table.
//! 2. The same candidates normalized and looked up in the normalized index.
//! 3. Normalized containment in either direction against the catalog, in
//!    catalog order.  Display names first retry the normalized lookup with an
//!    exporter duplicate suffix (`_01`, `.001`) removed.
//! 4. Keyword guesses on the normalized label.
//! 5. A fallback: the catalog's sentinel part for canonical keys, the
//!    humanized label for display names.
//!
//! Nothing here fails.  A label that falls all the way through is logged,
//! because it usually means the catalog needs a new alias.

use std::collections::HashMap;

use serde::Serialize;

use crate::file_format::catalog::PartCatalog;
use crate::normalize::{humanize_label, normalize_key, strip_articles, strip_export_suffix};
use crate::scene_graph::NodeRef;

/// How far up the parent chain candidate labels are collected.
const ANCESTOR_DEPTH: usize = 6;

/// What the info panel shows for a focused part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartInfo {
    pub title: String,
    pub canonical_key: String,
    pub description: String,
    pub document: Option<String>,
}

/// Lookup tables derived from a `PartCatalog`, built once up front.
pub struct NameResolver<'c> {
    catalog: &'c PartCatalog,
    raw_to_canonical: HashMap<String, String>,
    /// normalized label -> canonical key; first insertion wins.
    info_index: HashMap<String, String>,
    doc_index: HashMap<String, String>,
    /// (canonical, normalized) in catalog order.
    canonical_norm: Vec<(String, String)>,
    raw_to_pretty: HashMap<String, String>,
    pretty_index: HashMap<String, String>,
    /// (pretty, normalized raw) in catalog order.
    pretty_norm: Vec<(String, String)>,
}

fn index_insert(index: &mut HashMap<String, String>, key: &str, value: &str) {
    let normalized = normalize_key(key);
    if normalized.is_empty() {
        return;
    }
    index.entry(normalized).or_insert_with(|| value.to_string());
}

/// First containment hit, trying "candidate contains key" over the whole list
/// before "key contains candidate".
fn containment_match<'a>(candidate: &str, table: &'a [(String, String)]) -> Option<&'a str> {
    let forward = table
        .iter()
        .find(|(_, norm)| !norm.is_empty() && candidate.contains(norm.as_str()));
    let backward = || {
        table
            .iter()
            .find(|(_, norm)| !norm.is_empty() && norm.contains(candidate))
    };
    forward.or_else(backward).map(|(value, _)| value.as_str())
}

impl<'c> NameResolver<'c> {
    pub fn new(catalog: &'c PartCatalog) -> Self {
        let mut info_index = HashMap::new();
        let mut doc_index = HashMap::new();

        for part in &catalog.parts {
            index_insert(&mut info_index, &part.name, &part.name);
        }
        for part in &catalog.parts {
            index_insert(&mut info_index, &strip_articles(&part.name), &part.name);
        }
        for alias in &catalog.aliases {
            index_insert(&mut info_index, &alias.raw, &alias.canonical);
            index_insert(&mut info_index, &strip_articles(&alias.raw), &alias.canonical);
        }

        for part in catalog.parts.iter().filter(|p| p.doc.is_some()) {
            index_insert(&mut doc_index, &part.name, &part.name);
            index_insert(&mut doc_index, &strip_articles(&part.name), &part.name);
        }
        for alias in &catalog.aliases {
            if catalog.document(&alias.canonical).is_some() {
                index_insert(&mut doc_index, &alias.raw, &alias.canonical);
            }
        }

        let mut raw_to_canonical = HashMap::new();
        for alias in &catalog.aliases {
            raw_to_canonical
                .entry(alias.raw.clone())
                .or_insert_with(|| alias.canonical.clone());
        }

        let mut raw_to_pretty = HashMap::new();
        let mut pretty_index = HashMap::new();
        for entry in &catalog.display_names {
            raw_to_pretty
                .entry(entry.raw.clone())
                .or_insert_with(|| entry.pretty.clone());
            index_insert(&mut pretty_index, &entry.raw, &entry.pretty);
        }

        NameResolver {
            catalog,
            raw_to_canonical,
            info_index,
            doc_index,
            canonical_norm: catalog
                .parts
                .iter()
                .map(|p| (p.name.clone(), normalize_key(&p.name)))
                .collect(),
            raw_to_pretty,
            pretty_index,
            pretty_norm: catalog
                .display_names
                .iter()
                .map(|d| (d.pretty.clone(), normalize_key(&d.raw)))
                .collect(),
        }
    }

    pub fn catalog(&self) -> &'c PartCatalog {
        self.catalog
    }

    pub fn fallback_key(&self) -> &'c str {
        &self.catalog.fallback
    }

    /// Raw candidate labels in precedence order: the label, the node's own
    /// display name and name, then each ancestor's.
    fn candidates<'a>(&self, label: &'a str, node: Option<NodeRef<'a>>) -> Vec<&'a str> {
        let mut out = vec![];
        if !label.is_empty() {
            out.push(label);
        }
        if let Some(node) = node {
            let ancestors = node.ancestors().take(ANCESTOR_DEPTH);
            for n in std::iter::once(node).chain(ancestors) {
                let scene_node = n.node();
                if let Some(display) = scene_node.annotation.display_name() {
                    out.push(display);
                }
                if !scene_node.name.is_empty() {
                    out.push(scene_node.name.as_str());
                }
            }
        }
        out
    }

    fn normalized_candidates(candidates: &[&str]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| normalize_key(c))
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// The label the heuristics look at: the label itself, or the node's name
    /// when no label was given.
    fn primary_label<'a>(label: &'a str, node: Option<NodeRef<'a>>) -> &'a str {
        if !label.trim().is_empty() {
            return label;
        }
        node.map(|n| n.node().name.as_str()).unwrap_or("")
    }

    /// Display-map hit for a candidate with its export suffix removed.
    fn pretty_for_base(&self, candidate: &str) -> Option<&String> {
        let base = strip_export_suffix(candidate);
        if base.len() == candidate.len() {
            return None;
        }
        self.pretty_index.get(&normalize_key(base))
    }

    /// First keyword guess whose words occur in the normalized label.
    pub fn guess(&self, normalized: &str) -> Option<&'c str> {
        if normalized.is_empty() {
            return None;
        }
        self.catalog
            .guesses
            .iter()
            .find(|rule| rule.matches(normalized))
            .map(|rule| rule.name.as_str())
    }

    pub fn resolve_canonical_key(&self, label: &str, node: Option<NodeRef<'_>>) -> String {
        let candidates = self.candidates(label, node);

        for c in &candidates {
            if let Some(hit) = self.raw_to_canonical.get(*c) {
                return hit.clone();
            }
        }

        let normalized = Self::normalized_candidates(&candidates);
        for nc in &normalized {
            if let Some(hit) = self.info_index.get(nc) {
                return hit.clone();
            }
        }

        for nc in &normalized {
            if let Some(hit) = containment_match(nc, &self.canonical_norm) {
                return hit.to_string();
            }
        }

        let primary = normalize_key(Self::primary_label(label, node));
        if let Some(guess) = self.guess(&primary) {
            if self.catalog.is_part(guess) {
                return guess.to_string();
            }
        }

        let scene_node = node.map(|n| n.node());
        warn!(
            label,
            node_name = scene_node.map(|n| n.name.as_str()).unwrap_or(""),
            display_name = scene_node.and_then(|n| n.annotation.display_name()).unwrap_or(""),
            parent_name = node
                .and_then(|n| n.parent())
                .map(|p| p.node().name.as_str())
                .unwrap_or(""),
            "no catalog part for label; using fallback"
        );
        self.catalog.fallback.clone()
    }

    pub fn resolve_display_name(&self, label: &str, node: Option<NodeRef<'_>>) -> String {
        let candidates = self.candidates(label, node);

        for c in &candidates {
            if let Some(hit) = self.raw_to_pretty.get(*c) {
                return hit.clone();
            }
        }

        let normalized = Self::normalized_candidates(&candidates);
        for nc in &normalized {
            if let Some(hit) = self.pretty_index.get(nc) {
                return hit.clone();
            }
        }

        for c in &candidates {
            if let Some(hit) = self.pretty_for_base(c) {
                return hit.clone();
            }
        }

        for nc in &normalized {
            if let Some(hit) = containment_match(nc, &self.pretty_norm) {
                return hit.to_string();
            }
        }

        let primary = Self::primary_label(label, node);
        if let Some(guess) = self.guess(&normalize_key(primary)) {
            return guess.to_string();
        }

        let humanized = humanize_label(primary);
        if humanized.is_empty() {
            self.catalog.fallback.clone()
        } else {
            humanized
        }
    }

    /// Display name for a bare node name, as used for tree group titles.
    /// Skips the containment tier since there is no node context to rank.
    pub fn pretty_node_name(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return self.catalog.tree.unnamed.clone();
        }
        if let Some(hit) = self.raw_to_pretty.get(raw) {
            return hit.clone();
        }
        let normalized = normalize_key(raw);
        if let Some(hit) = self
            .pretty_index
            .get(&normalized)
            .or_else(|| self.pretty_for_base(raw))
        {
            return hit.clone();
        }
        if let Some(guess) = self.guess(&normalized) {
            return guess.to_string();
        }
        humanize_label(raw)
    }

    /// Catalog key whose document should be offered for a canonical key.
    pub fn resolve_doc_key(&self, canonical: &str) -> String {
        if self.catalog.document(canonical).is_some() {
            return canonical.to_string();
        }
        match self.doc_index.get(&normalize_key(canonical)) {
            Some(hit) => hit.clone(),
            None => self.catalog.fallback.clone(),
        }
    }

    pub fn describe_part(&self, label: &str, node: Option<NodeRef<'_>>) -> PartInfo {
        let title = if !label.trim().is_empty() {
            label.trim().to_string()
        } else if let Some(display) = node.and_then(|n| n.node().annotation.display_name()) {
            display.to_string()
        } else if let Some(name) = node.map(|n| n.node().name.as_str()).filter(|n| !n.is_empty()) {
            name.to_string()
        } else {
            "Component".to_string()
        };

        let canonical_key = self.resolve_canonical_key(label, node);
        let description = self.catalog.description(&canonical_key).to_string();
        let document = self
            .catalog
            .document(&self.resolve_doc_key(&canonical_key))
            .map(str::to_string);

        PartInfo {
            title,
            canonical_key,
            description,
            document,
        }
    }
}
