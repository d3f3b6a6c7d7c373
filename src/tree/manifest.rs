//! Tree manifest loading
//!
//! Describes a page tree in YAML or JSON, picked by file extension.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::WikiTree;
use crate::models::{PagePath, PageType};

/// Full manifest file structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TreeManifest {
    #[serde(default)]
    pub pages: Vec<ManifestPage>,
}

/// One page entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManifestPage {
    /// Absolute dot-delimited path
    pub path: PagePath,

    /// Page type (suite, test, static)
    #[serde(default, rename = "type")]
    pub page_type: PageType,

    /// Extra attributes set on the page
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl ManifestPage {
    pub fn new(path: &str, page_type: PageType) -> Self {
        Self {
            path: PagePath::parse(path),
            page_type,
            attributes: Vec::new(),
        }
    }
}

impl TreeManifest {
    /// Load a manifest from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tree manifest: {}", path.display()))?;

        let manifest: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML manifest: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON manifest: {}", path.display()))?
        };

        debug!(
            "Loaded tree manifest {} ({} pages)",
            path.display(),
            manifest.pages.len()
        );
        Ok(manifest)
    }

    /// Build the page tree. Entries may come in any order; missing
    /// ancestors are created as static pages and retyped if listed later.
    pub fn build(&self) -> Result<WikiTree> {
        let mut tree = WikiTree::new();
        for entry in &self.pages {
            let page = tree
                .add_path(&entry.path, entry.page_type)
                .with_context(|| format!("Invalid manifest entry: '{}'", entry.path))?;
            for attribute in &entry.attributes {
                tree.set_attribute(&page, attribute);
            }
        }
        Ok(tree)
    }
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
