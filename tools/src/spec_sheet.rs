//! Static data sheet shown next to the model tree (dimensions, displacement,
//! ...).  It isn't backed by any scene node; the sidebar mounts it as its own
//! top-level entry when asked to.

use serde::{Deserialize, Serialize};

use crate::normalize::make_path_safe;
use crate::tree::{EntryKind, TreeEntry};

fn default_base_path() -> String {
    "eco-cube".to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpecSheet {
    pub title: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default)]
    pub items: Vec<SpecItem>,
    #[serde(default)]
    pub document: Option<SpecDocument>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpecItem {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpecDocument {
    pub label: String,
    pub href: String,
}

impl SpecSheet {
    /// Returns false if there is no item with that key.
    pub fn set_value(&mut self, key: &str, value: &str) -> bool {
        match self.items.iter_mut().find(|item| item.key == key) {
            Some(item) => {
                item.value = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn root_path(&self) -> String {
        format!("{}/{}", self.base_path, make_path_safe(&self.title))
    }
}

pub fn create_spec_sheet_entry(sheet: &SpecSheet) -> TreeEntry {
    let root_path = sheet.root_path();

    let mut children: Vec<TreeEntry> = sheet
        .items
        .iter()
        .map(|item| TreeEntry {
            kind: EntryKind::SpecItem {
                key: item.key.clone(),
                label: item.label.clone(),
                value: item.value.clone(),
            },
            name: item.label.clone(),
            path: format!("{}/{}", root_path, make_path_safe(&item.key)),
            skip_render: false,
            children: vec![],
        })
        .collect();

    if let Some(doc) = &sheet.document {
        children.push(TreeEntry {
            kind: EntryKind::SpecDocument {
                label: doc.label.clone(),
                href: doc.href.clone(),
            },
            name: doc.label.clone(),
            path: format!("{}/pdf", root_path),
            skip_render: false,
            children: vec![],
        });
    }

    TreeEntry {
        kind: EntryKind::SpecRoot {
            title: sheet.title.clone(),
        },
        name: sheet.title.clone(),
        path: root_path,
        skip_render: false,
        children,
    }
}
