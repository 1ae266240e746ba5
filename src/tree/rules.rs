//! Inclusion rules for the asset selector
//!
//! A file is skipped if ANY rule matches:
//! - its file name is in the aggregate-index denylist, or
//! - its top-level directory under the asset root is an excluded category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Component, Path};

/// Aggregate index files that are regenerated upstream and never addressed individually
const DEFAULT_EXCLUDED_FILE_NAMES: &[&str] = &[
    "_list.json",
    "sounds.json",
    "_all.json",
    "regional_compliancies.json",
    "gpu_warnlist.json",
];

/// Asset categories that are not long-term cacheable binary/media assets
const DEFAULT_EXCLUDED_CATEGORIES: &[&str] = &[
    "atlases",
    "equipment",
    "font",
    "items",
    "particles",
    "post_effect",
    "resourcepacks",
    "shaders",
    "texts",
];

/// Declarative selection rules (exact, case-sensitive matching)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRules {
    #[serde(default = "default_excluded_file_names")]
    pub excluded_file_names: BTreeSet<String>,

    #[serde(default = "default_excluded_categories")]
    pub excluded_categories: BTreeSet<String>,
}

fn default_excluded_file_names() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_FILE_NAMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_excluded_categories() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_CATEGORIES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            excluded_file_names: default_excluded_file_names(),
            excluded_categories: default_excluded_categories(),
        }
    }
}

impl SelectionRules {
    pub fn excludes_file_name(&self, name: &str) -> bool {
        self.excluded_file_names.contains(name)
    }

    pub fn excludes_category(&self, name: &str) -> bool {
        self.excluded_categories.contains(name)
    }

    /// Decide on a path relative to the asset root
    pub fn is_excluded(&self, relative: &Path) -> bool {
        // Only a directory can be a category, so a lone file name never matches here.
        let mut components = relative.components();
        if let (Some(Component::Normal(top)), Some(_)) = (components.next(), components.next()) {
            if top.to_str().is_some_and(|t| self.excludes_category(t)) {
                return true;
            }
        }

        relative
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| self.excludes_file_name(n))
            .unwrap_or(false)
    }
}
