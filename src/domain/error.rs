//! Domain-level errors (no external dependencies)

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Why a single record was refused by the hierarchy builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordIssue {
    /// The name is the empty string.
    EmptyName,
    /// The name has an empty component, e.g. `a..b` or `a.`.
    EmptySegment,
    /// The same name occurs several times with different imports.
    ConflictingDuplicate,
    /// The name is an ancestor path of another record but carries imports.
    InteriorWithImports,
    /// More than one top-level name while umbrella roots are disabled.
    MultipleRoots,
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RecordIssue::EmptyName => "empty name",
            RecordIssue::EmptySegment => "empty path segment",
            RecordIssue::ConflictingDuplicate => "duplicate name with conflicting imports",
            RecordIssue::InteriorWithImports => "interior path must not carry imports",
            RecordIssue::MultipleRoots => "additional top-level root",
        };
        f.write_str(msg)
    }
}

/// A record rejected during hierarchy construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRecord {
    pub name: String,
    pub issue: RecordIssue,
}

impl InvalidRecord {
    pub fn new(name: impl Into<String>, issue: RecordIssue) -> Self {
        Self {
            name: name.into(),
            issue,
        }
    }
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.name, self.issue)
    }
}

/// An import that names no leaf of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DanglingReference {
    /// Qualified path of the importing leaf
    pub source: String,
    /// The unresolved import path
    pub target: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Domain errors represent violations of the hierarchy and linking rules.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("delimiter must not be empty")]
    InvalidDelimiter,

    #[error("record batch is empty")]
    EmptyBatch,

    #[error("{} invalid record(s): {}", .0.len(), join(.0))]
    InvalidRecords(Vec<InvalidRecord>),

    #[error("{} dangling reference(s): {}", .0.len(), join(.0))]
    DanglingReferences(Vec<DanglingReference>),

    #[error("name resolution revisited an unfinished path: {0}")]
    CyclicName(String),

    #[error("qualified path shared by several leaves: {0}")]
    PathCollision(String),
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    itertools::join(items, ", ")
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
