//! Text rendering of hierarchies via termtree

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{DependencyGraph, NodeKind, TreeArena, TreeNode};

pub const UMBRELLA_LABEL: &str = "(root)";

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn label(node: &TreeNode) -> String {
    match node.data.kind {
        NodeKind::Umbrella => UMBRELLA_LABEL.to_string(),
        _ => node.data.segment.clone(),
    }
}

fn build_tree<F>(arena: &TreeArena, node_idx: Index, parent_tree: &mut Tree<String>, label: &F)
where
    F: Fn(&TreeNode) -> String,
{
    if let Some(node) = arena.get_node(node_idx) {
        for &child_idx in &node.children {
            if let Some(child) = arena.get_node(child_idx) {
                let mut child_tree = Tree::new(label(child));
                build_tree(arena, child_idx, &mut child_tree, label);
                parent_tree.push(child_tree);
            }
        }
    }
}

fn render<F>(arena: &TreeArena, label: F) -> Tree<String>
where
    F: Fn(&TreeNode) -> String,
{
    match arena.root().and_then(|idx| arena.get_node(idx).map(|node| (idx, node))) {
        Some((root_idx, root)) => {
            let mut tree = Tree::new(label(root));
            build_tree(arena, root_idx, &mut tree, &label);
            tree
        }
        None => Tree::new("Empty tree".to_string()),
    }
}

impl TreeNodeConvert for TreeArena {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        render(self, label)
    }
}

/// Leaves carry their edge counts.
impl TreeNodeConvert for DependencyGraph {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        render(self.tree(), |node| {
            if node.is_leaf() && node.data.kind != NodeKind::Umbrella {
                format!(
                    "{} [{} out, {} in]",
                    label(node),
                    node.outgoing().len(),
                    node.incoming().len()
                )
            } else {
                label(node)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HierarchyBuilder, Record, ReferenceLinker};

    #[test]
    fn given_linked_graph_when_rendering_then_annotates_leaves() {
        let records = vec![
            Record::new("a.b", ["a.c"]),
            Record::new("a.c", Vec::<String>::new()),
        ];
        let built = HierarchyBuilder::new().build(&records).unwrap();
        let plain = built.tree.to_tree_string().to_string();
        let graph = ReferenceLinker::new().link(built.tree).unwrap();

        let rendered = graph.to_tree_string().to_string();

        assert!(plain.starts_with("a\n"));
        assert!(rendered.contains("b [1 out, 0 in]"));
        assert!(rendered.contains("c [0 out, 1 in]"));
    }

    #[test]
    fn given_umbrella_root_when_rendering_then_uses_placeholder_label() {
        let records = vec![
            Record::new("x.a", Vec::<String>::new()),
            Record::new("y.b", Vec::<String>::new()),
        ];
        let built = HierarchyBuilder::new().build(&records).unwrap();

        let rendered = built.tree.to_tree_string().to_string();

        assert!(rendered.starts_with(UMBRELLA_LABEL));
    }
}
