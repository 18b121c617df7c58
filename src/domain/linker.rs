//! Reference linker: resolves leaf imports into bidirectional edge lists.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{TreeArena, TreeNode};
use crate::domain::entities::{DanglingPolicy, Edge, EdgeId};
use crate::domain::error::{DanglingReference, DomainError, DomainResult};

/// A linked hierarchy: the tree, its ordered leaves and the edge table.
///
/// Read-only by construction; rebuilding from a new batch is the only way
/// to change it.
#[derive(Debug)]
pub struct DependencyGraph {
    tree: TreeArena,
    leaves: Vec<Index>,
    leaf_index: HashMap<String, Index>,
    edges: Vec<Edge>,
    dangling: Vec<DanglingReference>,
}

impl DependencyGraph {
    pub fn tree(&self) -> &TreeArena {
        &self.tree
    }

    pub fn root(&self) -> Option<Index> {
        self.tree.root()
    }

    pub fn node(&self, idx: Index) -> Option<&TreeNode> {
        self.tree.get_node(idx)
    }

    /// Leaves in pre-order.
    pub fn leaves(&self) -> &[Index] {
        &self.leaves
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    pub fn outgoing(&self, idx: Index) -> impl Iterator<Item = &Edge> + '_ {
        self.edge_list(idx, TreeNode::outgoing)
    }

    pub fn incoming(&self, idx: Index) -> impl Iterator<Item = &Edge> + '_ {
        self.edge_list(idx, TreeNode::incoming)
    }

    fn edge_list(
        &self,
        idx: Index,
        select: fn(&TreeNode) -> &[EdgeId],
    ) -> impl Iterator<Item = &Edge> + '_ {
        self.tree
            .get_node(idx)
            .map(select)
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&id| self.edge(id))
    }

    pub fn qualified_path(&self, idx: Index) -> Option<String> {
        self.tree.qualified_path(idx)
    }

    pub fn segment(&self, idx: Index) -> Option<&str> {
        self.tree.get_node(idx).map(|node| node.data.segment.as_str())
    }

    pub fn find_leaf(&self, path: &str) -> Option<Index> {
        self.leaf_index.get(path).copied()
    }

    /// Imports that matched no leaf, in leaf order.
    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// Edge table as `(source, target)` qualified paths.
    pub fn edge_paths(&self) -> Vec<(String, String)> {
        self.edges
            .iter()
            .filter_map(|edge| {
                Some((
                    self.qualified_path(edge.source)?,
                    self.qualified_path(edge.target)?,
                ))
            })
            .collect()
    }
}

/// Links the leaves of a built tree through their imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceLinker {
    dangling: DanglingPolicy,
}

impl ReferenceLinker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(dangling: DanglingPolicy) -> Self {
        Self { dangling }
    }

    /// Resolve every leaf import and populate `outgoing`/`incoming`.
    ///
    /// Consumes the unlinked tree so edge lists are filled exactly once.
    #[instrument(level = "debug", skip(self, tree), fields(nodes = tree.len()))]
    pub fn link(&self, mut tree: TreeArena) -> DomainResult<DependencyGraph> {
        let leaves = tree.leaves();

        let mut leaf_index: HashMap<String, Index> = HashMap::with_capacity(leaves.len());
        let mut leaf_paths: Vec<(Index, String)> = Vec::with_capacity(leaves.len());
        for &leaf in &leaves {
            let Some(path) = tree.qualified_path(leaf) else {
                continue;
            };
            if leaf_index.insert(path.clone(), leaf).is_some() {
                return Err(DomainError::PathCollision(path));
            }
            leaf_paths.push((leaf, path));
        }

        let mut edges = Vec::new();
        let mut dangling = Vec::new();
        for (source, source_path) in leaf_paths {
            let imports = match tree.get_node(source) {
                Some(node) => node.data.imports.clone(),
                None => continue,
            };
            for import in imports {
                match leaf_index.get(&import).copied() {
                    Some(target) => {
                        let id = EdgeId(edges.len());
                        edges.push(Edge { source, target });
                        if let Some(node) = tree.get_node_mut(source) {
                            node.outgoing.push(id);
                        }
                        if let Some(node) = tree.get_node_mut(target) {
                            node.incoming.push(id);
                        }
                    }
                    None => {
                        debug!("link: dangling {} -> {}", source_path, import);
                        dangling.push(DanglingReference {
                            source: source_path.clone(),
                            target: import,
                        });
                    }
                }
            }
        }

        if !dangling.is_empty() {
            match self.dangling {
                DanglingPolicy::Reject => return Err(DomainError::DanglingReferences(dangling)),
                DanglingPolicy::Drop => {
                    warn!("link: dropped {} dangling reference(s)", dangling.len())
                }
            }
        }
        debug!("link: {} leaves, {} edges", leaves.len(), edges.len());

        Ok(DependencyGraph {
            tree,
            leaves,
            leaf_index,
            edges,
            dangling,
        })
    }
}
