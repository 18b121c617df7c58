//! Domain entities: records, edges and the policies steering construction

use std::str::FromStr;

use generational_arena::Index;
use serde::{Deserialize, Serialize};

/// Flat input unit: one dotted name and the dotted names it imports.
///
/// Matches the flare-imports JSON layout; extra fields (e.g. `size`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    #[serde(default)]
    pub imports: Vec<String>,
}

impl Record {
    pub fn new<I, S>(name: impl Into<String>, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            imports: imports.into_iter().map(Into::into).collect(),
        }
    }
}

/// Position of an edge in the graph's edge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Resolved reference from one leaf to another.
///
/// Stored once in the edge table; both endpoints refer to it by [`EdgeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: Index,
    pub target: Index,
}

/// Origin of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Created from an input record
    Record,
    /// Inferred from a path prefix no record owns
    Synthetic,
    /// Unnamed root adopting several top-level names
    Umbrella,
}

/// What to do when the batch has more than one top-level name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootPolicy {
    /// Adopt all top-level names under an unnamed umbrella root
    #[default]
    Umbrella,
    /// Refuse the batch
    Reject,
}

/// Treatment of repeated entries in a record's import list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Keep every entry, in input order
    #[default]
    Preserve,
    /// Keep the first occurrence of each entry
    Dedup,
}

/// Treatment of imports that resolve to no leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingPolicy {
    /// Create no edge and report the reference
    #[default]
    Drop,
    /// Fail the link step
    Reject,
}

impl FromStr for RootPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "umbrella" => Ok(Self::Umbrella),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown root policy '{}' (umbrella, reject)", other)),
        }
    }
}

impl FromStr for ImportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "dedup" => Ok(Self::Dedup),
            other => Err(format!("unknown import policy '{}' (preserve, dedup)", other)),
        }
    }
}

impl FromStr for DanglingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown dangling policy '{}' (drop, reject)", other)),
        }
    }
}

pub const DEFAULT_DELIMITER: &str = ".";

/// Options for [`crate::domain::HierarchyBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub delimiter: String,
    pub root_policy: RootPolicy,
    pub import_policy: ImportPolicy,
    /// Order siblings by subtree height, then segment
    pub sort_children: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            root_policy: RootPolicy::default(),
            import_policy: ImportPolicy::default(),
            sort_children: true,
        }
    }
}
