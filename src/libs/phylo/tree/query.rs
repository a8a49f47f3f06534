use super::Tree;
use crate::libs::phylo::error::TreeError;
use crate::libs::phylo::node::NodeId;

/// Root-first path to `id`.
pub fn get_path_from_root(tree: &Tree, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
    if tree.get_node(id).is_none() {
        return Err(TreeError::LogicError(format!("Node {} not found", id)));
    }

    let mut path = Vec::new();
    let mut current = Some(id);
    while let Some(cur) = current {
        path.push(cur);
        current = tree.nodes[cur].parent;
    }
    path.reverse();

    if tree.root != Some(path[0]) {
        return Err(TreeError::LogicError(format!(
            "Node {} is detached from root",
            id
        )));
    }

    Ok(path)
}

/// Sum of branch lengths from `id` up to the root. Missing lengths count as 0.
pub fn get_distance_to_root(tree: &Tree, id: NodeId) -> Result<f64, TreeError> {
    let path = get_path_from_root(tree, id)?;
    Ok(path
        .iter()
        .skip(1)
        .map(|&n| tree.nodes[n].length.unwrap_or(0.0))
        .sum())
}

/// Leaves below `start`, in preorder.
pub fn get_leaves(tree: &Tree, start: NodeId) -> Vec<NodeId> {
    super::traversal::preorder(tree, start)
        .into_iter()
        .filter(|&id| tree.nodes[id].is_leaf())
        .collect()
}

/// Get node ID by name. Returns first match in arena order.
pub fn get_node_by_name(tree: &Tree, name: &str) -> Option<NodeId> {
    tree.nodes
        .iter()
        .find(|n| n.name.as_deref() == Some(name))
        .map(|n| n.id)
}
