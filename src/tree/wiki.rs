//! In-memory page tree
//!
//! Nodes live in an arena with explicit parent indices, so every walk is
//! iterative regardless of tree depth.

use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::PageTree;
use crate::models::{Page, PageId, PagePath, PageType};

#[derive(Clone, Debug)]
struct Node {
    path: PagePath,
    parent: Option<PageId>,
    children: BTreeMap<String, PageId>,
    attributes: BTreeSet<String>,
}

impl Node {
    fn new(path: PagePath, parent: Option<PageId>) -> Self {
        Self {
            path,
            parent,
            children: BTreeMap::new(),
            attributes: BTreeSet::new(),
        }
    }
}

/// Arena-backed page tree with a single root
#[derive(Clone, Debug)]
pub struct WikiTree {
    nodes: Vec<Node>,
    index: HashMap<PagePath, PageId>,
}

impl Default for WikiTree {
    fn default() -> Self {
        Self::new()
    }
}

impl WikiTree {
    /// Create a tree holding only the root page
    pub fn new() -> Self {
        let root = Node::new(PagePath::root(), None);
        let mut index = HashMap::new();
        index.insert(PagePath::root(), PageId(0));
        Self {
            nodes: vec![root],
            index,
        }
    }

    /// Number of pages, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Add a child page, or retype it if it already exists
    pub fn add_page(&mut self, parent: &Page, name: &str, page_type: PageType) -> Result<Page> {
        let name = name.trim();
        if name.is_empty()
            || name.contains(PagePath::SEPARATOR)
            || name.contains(|c: char| c == '/' || c == '\\')
        {
            bail!("Invalid page name '{name}' under '{parent}'");
        }

        let Some(parent_id) = self.lookup(parent) else {
            bail!("Parent page '{parent}' is not part of this tree");
        };

        let existing = self.nodes[parent_id.0].children.get(name).copied();
        let page = match existing {
            Some(id) => Page::new(id, self.nodes[id.0].path.clone()),
            None => {
                let id = PageId(self.nodes.len());
                let path = self.nodes[parent_id.0].path.child(name);
                self.nodes.push(Node::new(path.clone(), Some(parent_id)));
                self.nodes[parent_id.0]
                    .children
                    .insert(name.to_string(), id);
                self.index.insert(path.clone(), id);
                Page::new(id, path)
            }
        };

        self.set_type(&page, page_type);
        Ok(page)
    }

    /// Add a page by absolute path, creating missing ancestors as static pages
    pub fn add_path(&mut self, path: &PagePath, page_type: PageType) -> Result<Page> {
        if path.is_root() {
            bail!("Cannot add the root page");
        }

        let mut current = self.root();
        let last = path.depth() - 1;
        for (depth, segment) in path.segments().iter().enumerate() {
            current = if depth == last {
                self.add_page(&current, segment, page_type)?
            } else if let Some(existing) = self.child(&current, segment) {
                existing
            } else {
                self.add_page(&current, segment, PageType::Static)?
            };
        }
        Ok(current)
    }

    /// Replace the page type attribute of a page
    pub fn set_type(&mut self, page: &Page, page_type: PageType) {
        if let Some(id) = self.lookup(page) {
            let attributes = &mut self.nodes[id.0].attributes;
            for t in PageType::all() {
                attributes.remove(t.attribute());
            }
            attributes.insert(page_type.attribute().to_string());
        }
    }

    pub fn set_attribute(&mut self, page: &Page, name: &str) {
        if let Some(id) = self.lookup(page) {
            self.nodes[id.0].attributes.insert(name.to_string());
        }
    }

    pub fn page_type(&self, page: &Page) -> PageType {
        PageType::all()
            .into_iter()
            .find(|t| self.has_attribute(page, t.attribute()))
            .unwrap_or_default()
    }

    /// All strict descendants in canonical (path) order
    pub fn descendants(&self, page: &Page) -> Vec<Page> {
        let Some(id) = self.lookup(page) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        let mut stack: Vec<PageId> = self.nodes[id.0].children.values().rev().copied().collect();
        while let Some(next) = stack.pop() {
            found.push(self.page_at(next));
            stack.extend(self.nodes[next.0].children.values().rev().copied());
        }
        found
    }

    /// Test pages at or below a page, the way a suite run collects them
    pub fn test_pages_under(&self, page: &Page) -> Vec<Page> {
        std::iter::once(page.clone())
            .chain(self.descendants(page))
            .filter(|p| self.page_type(p) == PageType::Test)
            .collect()
    }

    fn page_at(&self, id: PageId) -> Page {
        Page::new(id, self.nodes[id.0].path.clone())
    }

    /// Node of a handle; handles from other trees are matched by path
    fn lookup(&self, page: &Page) -> Option<PageId> {
        match self.nodes.get(page.id().0) {
            Some(node) if node.path == *page.path() => Some(page.id()),
            _ => self.index.get(page.path()).copied(),
        }
    }
}

impl PageTree for WikiTree {
    fn root(&self) -> Page {
        self.page_at(PageId(0))
    }

    fn resolve(&self, path: &PagePath) -> Option<Page> {
        self.index.get(path).map(|&id| self.page_at(id))
    }

    fn parent(&self, page: &Page) -> Option<Page> {
        let id = self.lookup(page)?;
        self.nodes[id.0].parent.map(|p| self.page_at(p))
    }

    fn has_attribute(&self, page: &Page, name: &str) -> bool {
        self.lookup(page)
            .map(|id| self.nodes[id.0].attributes.contains(name))
            .unwrap_or(false)
    }

    fn child(&self, page: &Page, name: &str) -> Option<Page> {
        let id = self.lookup(page)?;
        self.nodes[id.0]
            .children
            .get(name)
            .map(|&c| self.page_at(c))
    }
}
