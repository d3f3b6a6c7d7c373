//! Lowest common root resolution
//!
//! Finds the deepest page that is an ancestor of (or equal to) every page in
//! a set, optionally restricted to suite pages. Used as the reporting root
//! of an execution context.

use crate::error::{PartitionError, Result};
use crate::models::{Page, PagePath};
use crate::tree::PageTree;

/// Resolves common roots against one tree
pub struct CommonRootResolver<'t, T> {
    tree: &'t T,
}

impl<'t, T: PageTree> CommonRootResolver<'t, T> {
    pub fn new(tree: &'t T) -> Self {
        Self { tree }
    }

    /// Lowest page common to all `pages`.
    ///
    /// Returns `Ok(None)` for an empty set. With `enforce_suite` the result
    /// is the closest suite page at or above the common root.
    pub fn lowest_common_root(&self, pages: &[Page], enforce_suite: bool) -> Result<Option<Page>> {
        let Some(path) = common_path(pages) else {
            return Ok(None);
        };

        let root = self
            .tree
            .resolve(&path)
            .ok_or_else(|| PartitionError::common_root_not_found(path, pages))?;

        if !enforce_suite {
            return Ok(Some(root));
        }

        self.tree
            .lineage(&root)
            .find(|page| self.tree.is_suite(page))
            .map(Some)
            .ok_or_else(|| PartitionError::suite_root_not_found(pages))
    }
}

/// Longest shared path prefix, narrowed page by page
fn common_path(pages: &[Page]) -> Option<PagePath> {
    let (first, rest) = pages.split_first()?;
    let mut common = first.path().clone();
    for page in rest {
        if common.is_root() {
            break;
        }
        common = common.common_prefix(page.path());
    }
    Some(common)
}
