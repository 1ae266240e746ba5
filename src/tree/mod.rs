//! Extracted asset tree
//!
//! Path handling for the extracted archive and the selector that decides which
//! files under the asset root get content-addressed.

pub mod path;
pub mod rules;
pub mod walker;

pub use rules::SelectionRules;
pub use walker::{AssetSelector, SelectedFile};
