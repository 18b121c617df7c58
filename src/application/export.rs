//! Serializable views of a linked dependency graph
//!
//! Two JSON layouts are produced for renderers:
//! - the nested hierarchy document (`{name, imports, children}`) read by the
//!   collapsible tree view,
//! - the flat graph document (leaves with edge lists, plus the edge table)
//!   read by the radial edge-bundling view.

use std::fmt;
use std::str::FromStr;

use generational_arena::Index;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DanglingReference, DependencyGraph, TreeArena};

/// Output layout for `export`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Graph,
    Hierarchy,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "graph" => Ok(Self::Graph),
            "hierarchy" => Ok(Self::Hierarchy),
            other => Err(format!("unknown export format '{}' (graph, hierarchy)", other)),
        }
    }
}

/// Nested `{name, children}` view of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyDocument>,
}

impl HierarchyDocument {
    /// Returns None for a tree without root.
    pub fn from_tree(tree: &TreeArena) -> Option<Self> {
        tree.root().and_then(|root| Self::from_node(tree, root))
    }

    fn from_node(tree: &TreeArena, idx: Index) -> Option<Self> {
        let node = tree.get_node(idx)?;
        Some(Self {
            name: node.data.segment.clone(),
            imports: node.data.imports.clone(),
            children: node
                .children
                .iter()
                .filter_map(|&child| Self::from_node(tree, child))
                .collect(),
        })
    }
}

/// Per-leaf edge counts, the hover text of the radial view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSummary {
    pub id: String,
    pub outgoing: usize,
    pub incoming: usize,
}

impl LeafSummary {
    pub fn new(graph: &DependencyGraph, leaf: Index) -> Option<Self> {
        Some(Self {
            id: graph.qualified_path(leaf)?,
            outgoing: graph.outgoing(leaf).count(),
            incoming: graph.incoming(leaf).count(),
        })
    }

    /// Multi-line tooltip: path, outgoing count, incoming count.
    pub fn title(&self) -> String {
        format!(
            "{}\n{} outgoing\n{} incoming",
            self.id, self.outgoing, self.incoming
        )
    }
}

impl fmt::Display for LeafSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} outgoing, {} incoming)",
            self.id, self.outgoing, self.incoming
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafEntry {
    pub id: String,
    pub name: String,
    pub title: String,
    pub outgoing: Vec<String>,
    pub incoming: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeEntry {
    pub source: String,
    pub target: String,
}

/// Flat view: leaves in layout order, edges, and the dropped references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphDocument {
    pub leaves: Vec<LeafEntry>,
    pub edges: Vec<EdgeEntry>,
    pub dangling: Vec<DanglingReference>,
}

impl GraphDocument {
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let path = |idx| graph.qualified_path(idx).unwrap_or_default();

        let leaves = graph
            .leaves()
            .iter()
            .filter_map(|&leaf| {
                let summary = LeafSummary::new(graph, leaf)?;
                Some(LeafEntry {
                    name: graph.segment(leaf).unwrap_or_default().to_string(),
                    title: summary.title(),
                    outgoing: graph.outgoing(leaf).map(|e| path(e.target)).collect(),
                    incoming: graph.incoming(leaf).map(|e| path(e.source)).collect(),
                    id: summary.id,
                })
            })
            .collect();

        let edges = graph
            .edge_paths()
            .into_iter()
            .map(|(source, target)| EdgeEntry { source, target })
            .collect();

        Self {
            leaves,
            edges,
            dangling: graph.dangling().to_vec(),
        }
    }
}

/// Serialize the graph in the requested layout as pretty JSON.
pub fn render(graph: &DependencyGraph, format: ExportFormat) -> ApplicationResult<String> {
    let json = match format {
        ExportFormat::Graph => serde_json::to_string_pretty(&GraphDocument::from_graph(graph)),
        ExportFormat::Hierarchy => {
            serde_json::to_string_pretty(&HierarchyDocument::from_tree(graph.tree()))
        }
    };
    json.map_err(|e| ApplicationError::OperationFailed {
        context: "serialize export".to_string(),
        source: Box::new(e),
    })
}
