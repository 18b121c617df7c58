use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{EdgeId, NodeKind};

/// Data payload for tree nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Last path component (local name)
    pub segment: String,
    pub kind: NodeKind,
    /// Import paths copied from the record, empty for inferred nodes
    pub imports: Vec<String>,
}

impl NodeData {
    pub fn record(segment: impl Into<String>, imports: Vec<String>) -> Self {
        Self {
            segment: segment.into(),
            kind: NodeKind::Record,
            imports,
        }
    }

    pub fn synthetic(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            kind: NodeKind::Synthetic,
            imports: Vec::new(),
        }
    }

    pub fn umbrella() -> Self {
        Self {
            segment: String::new(),
            kind: NodeKind::Umbrella,
            imports: Vec::new(),
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena
    pub children: Vec<Index>,
    pub(crate) incoming: Vec<EdgeId>,
    pub(crate) outgoing: Vec<EdgeId>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Edges pointing at this node. Empty until the tree is linked.
    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
    }

    /// Edges leaving this node. Empty until the tree is linked.
    pub fn outgoing(&self) -> &[EdgeId] {
        &self.outgoing
    }
}

/// Arena-based tree of dotted-name segments.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// The delimiter the tree was built with is kept so qualified paths can be
/// recomputed from the parent chain at any time.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
    delimiter: String,
}

impl TreeArena {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            delimiter: delimiter.into(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent: None,
            children: Vec::new(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            self.attach(parent_idx, node_idx);
        }

        node_idx
    }

    /// Make `child` the last child of `parent`, detaching it from any previous parent.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn attach(&mut self, parent: Index, child: Index) {
        let previous = match self.arena.get_mut(child) {
            Some(node) => node.parent.replace(parent),
            None => return,
        };
        if let Some(node) = previous.and_then(|idx| self.arena.get_mut(idx)) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(child);
        }
    }

    pub(crate) fn set_root(&mut self, idx: Index) {
        self.root = Some(idx);
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub(crate) fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal, children left to right.
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Distance from a node to its deepest descendant leaf (0 for leaves).
    pub fn height(&self, node_idx: Index) -> usize {
        self.calculate_depth(node_idx).saturating_sub(1)
    }

    /// Collects all leaf nodes (nodes with no children) in pre-order.
    ///
    /// A single-node tree yields its root. Empty trees return an empty vector.
    #[instrument(level = "debug", skip(self))]
    pub fn leaves(&self) -> Vec<Index> {
        let mut leaves = Vec::new();
        if let Some(root) = self.root {
            self.collect_leaves(root, &mut leaves);
        }
        leaves
    }

    fn collect_leaves(&self, node_idx: Index, leaves: &mut Vec<Index>) {
        if let Some(node) = self.get_node(node_idx) {
            if node.children.is_empty() {
                leaves.push(node_idx);
            } else {
                for &child in &node.children {
                    self.collect_leaves(child, leaves);
                }
            }
        }
    }

    /// Full delimiter-joined path from the root down to `node_idx`.
    ///
    /// Walks the parent chain; an umbrella root contributes nothing.
    pub fn qualified_path(&self, node_idx: Index) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(node_idx);
        while let Some(idx) = current {
            let node = self.get_node(idx)?;
            if node.data.kind != NodeKind::Umbrella {
                segments.push(node.data.segment.as_str());
            }
            current = node.parent;
        }
        segments.reverse();
        Some(segments.join(&self.delimiter))
    }

    /// Sort every sibling list by ascending subtree height, then segment.
    #[instrument(level = "debug", skip(self))]
    pub(crate) fn sort_children(&mut self) {
        let mut heights: HashMap<Index, usize> = HashMap::with_capacity(self.len());
        for (idx, node) in self.iter_postorder() {
            let height = node
                .children
                .iter()
                .filter_map(|child| heights.get(child))
                .map(|h| h + 1)
                .max()
                .unwrap_or(0);
            heights.insert(idx, height);
        }

        let sorted: Vec<(Index, Vec<Index>)> = self
            .iter()
            .filter(|(_, node)| node.children.len() > 1)
            .map(|(idx, node)| {
                let mut children = node.children.clone();
                children.sort_by(|&a, &b| {
                    heights
                        .get(&a)
                        .cmp(&heights.get(&b))
                        .then_with(|| self.segment(a).cmp(&self.segment(b)))
                });
                (idx, children)
            })
            .collect();

        for (idx, children) in sorted {
            if let Some(node) = self.get_node_mut(idx) {
                node.children = children;
            }
        }
    }

    fn segment(&self, idx: Index) -> Option<&str> {
        self.get_node(idx).map(|node| node.data.segment.as_str())
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
