//! Domain layer: hierarchy construction and reference linking
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod linker;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use builder::{BuiltHierarchy, HierarchyBuilder};
pub use entities::*;
pub use error::{DanglingReference, DomainError, DomainResult, InvalidRecord, RecordIssue};
pub use linker::{DependencyGraph, ReferenceLinker};
