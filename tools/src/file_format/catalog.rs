use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::normalize::normalize_key;
use crate::spec_sheet::SpecSheet;

/// The catalog shipped with the crate, used when no catalog file is given.
pub const DEFAULT_CATALOG: &str = include_str!("../../../config_defaults/engine_catalog.toml");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("bad name pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// Schema for the part catalog TOML.  Every list is an array of tables so that
/// declaration order survives deserialization; several consumers are
/// first-match-wins over these lists.
#[derive(Clone, Debug, Deserialize)]
pub struct PartCatalog {
    /// Canonical key that unresolvable labels end up at.  Must be a `part`.
    pub fallback: String,
    #[serde(default, rename = "part")]
    pub parts: Vec<PartEntry>,
    /// Raw asset label -> canonical part key, matched verbatim first and then
    /// through the normalized index.
    #[serde(default, rename = "alias")]
    pub aliases: Vec<AliasEntry>,
    /// Raw asset label -> pretty display name.
    #[serde(default, rename = "display_name")]
    pub display_names: Vec<DisplayNameEntry>,
    #[serde(default, rename = "guess")]
    pub guesses: Vec<GuessRule>,
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub sidebar: SidebarConfig,
    #[serde(default)]
    pub spec_sheet: Option<SpecSheet>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PartEntry {
    pub name: String,
    pub description: String,
    /// Link to a document (usually a PDF) describing the part.
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AliasEntry {
    pub raw: String,
    pub canonical: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DisplayNameEntry {
    pub raw: String,
    pub pretty: String,
}

/// Keyword heuristic.  Matches a normalized label when at least one `any` word
/// occurs in it (or `any` is empty) and every `all` word occurs in it.  A rule
/// with neither list never matches.
#[derive(Clone, Debug, Deserialize)]
pub struct GuessRule {
    pub name: String,
    #[serde(default)]
    pub any: Vec<String>,
    #[serde(default)]
    pub all: Vec<String>,
}

impl GuessRule {
    pub fn matches(&self, normalized: &str) -> bool {
        if self.any.is_empty() && self.all.is_empty() {
            return false;
        }
        let any_ok = self.any.is_empty() || self.any.iter().any(|w| normalized.contains(w.as_str()));
        any_ok && self.all.iter().all(|w| normalized.contains(w.as_str()))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Structural wrapper nodes that are transparent for path purposes.
    pub hidden_wrappers: Vec<String>,
    /// Names that never make a good owner part when resolving a picked mesh.
    pub unstable_owner_names: Vec<String>,
    /// Placeholder for nodes without a name.
    pub unnamed: String,
    pub breadcrumb_parts: usize,
    /// Case-insensitive patterns for auto-generated labels like `Cube.002`.
    pub bad_name_patterns: Vec<String>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            hidden_wrappers: vec![
                "Scene_Collection".to_string(),
                "NamedViews".to_string(),
                "Layers".to_string(),
            ],
            unstable_owner_names: vec![
                "Scene".to_string(),
                "Scene_Collection".to_string(),
                "RootNode".to_string(),
                "NamedViews".to_string(),
                "Layers".to_string(),
            ],
            unnamed: "(unnamed)".to_string(),
            breadcrumb_parts: 3,
            bad_name_patterns: vec![],
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// A level with at least this many children is "dense" enough to regroup.
    pub min_children: usize,
    /// How many single-child hops the dense-level search may take.
    pub max_depth: usize,
    /// Group receiving entries that match no rule.
    pub default_group: String,
    #[serde(rename = "group")]
    pub groups: Vec<SidebarGroupConfig>,
    /// Checked in order; the first rule with a matching word decides.
    #[serde(rename = "rule")]
    pub rules: Vec<SidebarRuleConfig>,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        let group = |key: &str, title: &str| SidebarGroupConfig {
            key: key.to_string(),
            title: title.to_string(),
        };
        SidebarConfig {
            min_children: 18,
            max_depth: 5,
            default_group: "main".to_string(),
            groups: vec![
                group("main", "Main engine"),
                group("parts", "Engine parts"),
                group("addons", "Engine accessories"),
                group("exhaust", "Exhaust system"),
            ],
            rules: vec![],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SidebarGroupConfig {
    pub key: String,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SidebarRuleConfig {
    pub key: String,
    pub words: Vec<String>,
}

impl PartCatalog {
    pub fn from_toml_str(config_str: &str) -> Result<Self, CatalogError> {
        let catalog: PartCatalog = toml::from_str(config_str)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(DEFAULT_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let config_str = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&config_str)
    }

    /// Read the given catalog, or the built-in one if no path was supplied.  A
    /// path that can't be read is an error rather than a silent fallback.
    pub fn load_with_default(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.part(&self.fallback).is_none() {
            return Err(CatalogError::Invalid(format!(
                "fallback {:?} is not a declared part",
                self.fallback
            )));
        }

        for alias in &self.aliases {
            if self.part(&alias.canonical).is_none() {
                // The shipped catalog has one of these ("Engine parts"); it only
                // matters for description lookups, which fall back anyway.
                warn!(raw = %alias.raw, canonical = %alias.canonical, "alias target has no part entry");
            }
        }

        let group_keys: HashSet<&str> = self.sidebar.groups.iter().map(|g| g.key.as_str()).collect();
        if group_keys.len() != self.sidebar.groups.len() {
            return Err(CatalogError::Invalid("duplicate sidebar group key".to_string()));
        }
        if !group_keys.contains(self.sidebar.default_group.as_str()) {
            return Err(CatalogError::Invalid(format!(
                "default sidebar group {:?} is not declared",
                self.sidebar.default_group
            )));
        }
        for rule in &self.sidebar.rules {
            if !group_keys.contains(rule.key.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "sidebar rule refers to undeclared group {:?}",
                    rule.key
                )));
            }
        }

        self.bad_name_matchers()?;
        Ok(())
    }

    pub fn part(&self, name: &str) -> Option<&PartEntry> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn is_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Description for a canonical key, falling back to the fallback part's.
    pub fn description(&self, key: &str) -> &str {
        self.part(key)
            .or_else(|| self.part(&self.fallback))
            .map(|p| p.description.as_str())
            .unwrap_or("")
    }

    pub fn document(&self, key: &str) -> Option<&str> {
        self.part(key).and_then(|p| p.doc.as_deref())
    }

    pub fn bad_name_matchers(&self) -> Result<Vec<Regex>, CatalogError> {
        self.tree
            .bad_name_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| CatalogError::Pattern {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Sidebar rules with their words run through `normalize_key`, because the
    /// text they are matched against is normalized too.
    pub fn normalized_sidebar_rules(&self) -> Vec<(String, Vec<String>)> {
        self.sidebar
            .rules
            .iter()
            .map(|rule| {
                let words = rule
                    .words
                    .iter()
                    .map(|w| normalize_key(w))
                    .filter(|w| !w.is_empty())
                    .collect();
                (rule.key.clone(), words)
            })
            .collect()
    }
}
