//! Hierarchical page paths
//!
//! A path is a dot-delimited sequence of page names, e.g. `SuitePage.TestPageOne`.
//! The absolute root of a tree has the empty path.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Dot-delimited page path, stored as segments.
///
/// Ordering is lexicographic by segment, so a parent always sorts before its
/// children and siblings sort by name. This is the canonical page order used
/// for deduplication and iteration.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PagePath {
    segments: Vec<String>,
}

impl PagePath {
    pub const SEPARATOR: char = '.';

    /// Path of the absolute tree root
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dot-delimited path. Empty segments are ignored, so `""` and
    /// `"."` both denote the root.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split(Self::SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<PagePath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn child(&self, name: &str) -> PagePath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Longest shared leading run of segments, stopping at the first mismatch
    pub fn common_prefix(&self, other: &PagePath) -> PagePath {
        let segments = self
            .segments
            .iter()
            .zip(&other.segments)
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.clone())
            .collect();
        Self { segments }
    }

    /// True if `prefix` is this path or one of its ancestors
    pub fn starts_with(&self, prefix: &PagePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl FromStr for PagePath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for PagePath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for PagePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PagePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
