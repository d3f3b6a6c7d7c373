//! Page handles and page types

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::PagePath;

/// Index of a node inside one tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(pub usize);

/// Handle to a single node of a page tree.
///
/// Two handles are the same page iff they point at the same node. Handles
/// order by path, which is unique within a tree.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Page {
    path: PagePath,
    id: PageId,
}

impl Page {
    pub fn new(id: PageId, path: PagePath) -> Self {
        Self { path, id }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn path(&self) -> &PagePath {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.path.name()
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.path)
        }
    }
}

impl Serialize for Page {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.path.serialize(serializer)
    }
}

/// Page type, stored on a page as an attribute of the same name
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Suite,
    Test,
    #[default]
    Static,
}

impl PageType {
    /// Attribute name marking a page of this type
    pub fn attribute(&self) -> &'static str {
        match self {
            PageType::Suite => "Suite",
            PageType::Test => "Test",
            PageType::Static => "Static",
        }
    }

    pub fn all() -> Vec<PageType> {
        vec![PageType::Suite, PageType::Test, PageType::Static]
    }

    pub fn from_str(s: &str) -> Option<PageType> {
        match s.to_lowercase().as_str() {
            "suite" => Some(PageType::Suite),
            "test" => Some(PageType::Test),
            "static" | "normal" => Some(PageType::Static),
            _ => None,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attribute())
    }
}
