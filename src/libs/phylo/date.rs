//! Random ultrametric dating of a fixed topology.

use super::error::TreeError;
use super::tree::Tree;
use rand::Rng;

/// Smallest branch length drawn for an internal node.
pub const MIN_BRANCH: f64 = 0.0001;

/// Returns a copy of `tree` with random internal branch lengths. Every leaf
/// branch completes its path so that all root-to-tip distances equal
/// `root_tip_len`.
///
/// Nodes are visited in preorder, so a node's draw is bounded by what its
/// ancestors left over.
pub fn randomize_node_times<R: Rng + ?Sized>(
    tree: &Tree,
    root_tip_len: f64,
    rng: &mut R,
) -> Result<Tree, TreeError> {
    let root = tree
        .get_root()
        .ok_or_else(|| TreeError::LogicError("Tree has no root".to_string()))?;
    if root_tip_len.is_nan() || root_tip_len <= MIN_BRANCH {
        return Err(TreeError::LogicError(format!(
            "Root-to-tip length {} is too short",
            root_tip_len
        )));
    }

    let mut dated = tree.clone();
    for id in tree.preorder(root) {
        let parent = match tree.get_node(id).and_then(|n| n.parent) {
            Some(p) => p,
            None => continue,
        };
        let remaining = root_tip_len - dated.get_distance_to_root(parent)?;

        let length = if tree.nodes[id].is_leaf() {
            remaining
        } else if remaining > MIN_BRANCH {
            rng.gen_range(MIN_BRANCH..remaining)
        } else {
            remaining / 2.0
        };
        dated.nodes[id].length = Some(length);
    }

    Ok(dated)
}
