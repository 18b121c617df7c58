//! Rebuild dotted-name hierarchies and link their imports into dependency graphs.
//!
//! A flat batch of [`domain::Record`]s (`{name, imports}`) is turned into a
//! rooted tree by [`domain::HierarchyBuilder`]; [`domain::ReferenceLinker`]
//! then resolves every leaf's imports into shared edges, ready for a
//! hierarchical edge bundling or collapsible tree renderer.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

pub use domain::{
    DependencyGraph, DomainError, Edge, HierarchyBuilder, Record, ReferenceLinker, TreeArena,
};
