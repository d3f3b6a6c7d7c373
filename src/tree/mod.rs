//! Read-only page tree navigation
//!
//! The partitioning core only needs to resolve paths, walk towards the root
//! and check attributes. `WikiTree` is the in-memory implementation used by
//! the CLI and tests.

mod manifest;
mod wiki;

pub use manifest::{ManifestPage, TreeManifest};
pub use wiki::WikiTree;

use crate::models::{Page, PagePath, PageType};

/// Navigation over a single rooted page tree
pub trait PageTree {
    /// The absolute root page
    fn root(&self) -> Page;

    /// Resolve an absolute path; the empty path resolves to the root
    fn resolve(&self, path: &PagePath) -> Option<Page>;

    /// Parent of a page, `None` for the root
    fn parent(&self, page: &Page) -> Option<Page>;

    fn has_attribute(&self, page: &Page, name: &str) -> bool;

    fn is_root(&self, page: &Page) -> bool {
        self.parent(page).is_none()
    }

    fn full_path(&self, page: &Page) -> PagePath {
        page.path().clone()
    }

    /// Direct child with the given name
    fn child(&self, page: &Page, name: &str) -> Option<Page> {
        self.resolve(&page.path().child(name))
    }

    fn is_suite(&self, page: &Page) -> bool {
        self.has_attribute(page, PageType::Suite.attribute())
    }

    /// Strict ancestors, nearest first
    fn ancestors(&self, page: &Page) -> Lineage<'_, Self>
    where
        Self: Sized,
    {
        Lineage {
            tree: self,
            next: self.parent(page),
        }
    }

    /// The page itself followed by its ancestors, nearest first
    fn lineage(&self, page: &Page) -> Lineage<'_, Self>
    where
        Self: Sized,
    {
        Lineage {
            tree: self,
            next: Some(page.clone()),
        }
    }

    /// Page named `name` inherited by `page`: the child of that name on the
    /// closest page of the lineage that has one.
    fn closest_inherited(&self, page: &Page, name: &str) -> Option<Page>
    where
        Self: Sized,
    {
        self.lineage(page).find_map(|p| self.child(&p, name))
    }
}

/// Iterative walk towards the root
pub struct Lineage<'a, T: PageTree + ?Sized> {
    tree: &'a T,
    next: Option<Page>,
}

impl<T: PageTree + ?Sized> Iterator for Lineage<'_, T> {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        let current = self.next.take()?;
        self.next = self.tree.parent(&current);
        Some(current)
    }
}

impl<T: PageTree + ?Sized> PageTree for &T {
    fn root(&self) -> Page {
        (**self).root()
    }

    fn resolve(&self, path: &PagePath) -> Option<Page> {
        (**self).resolve(path)
    }

    fn parent(&self, page: &Page) -> Option<Page> {
        (**self).parent(page)
    }

    fn has_attribute(&self, page: &Page, name: &str) -> bool {
        (**self).has_attribute(page, name)
    }

    fn child(&self, page: &Page, name: &str) -> Option<Page> {
        (**self).child(page, name)
    }
}
