//! The dead lineage: a synthetic chain standing for extinct or unsampled
//! species, hung next to S′ below a pseudo-root.

use super::error::ReconError;
use super::slicer::Subdivision;
use super::species::{NodeKind, SpeciesTree};
use crate::libs::phylo::NodeId;
use log::info;
use std::collections::HashMap;

/// Display name of every dead-lineage node, as used by the solver.
pub const DEAD_NAME: &str = "-1";
pub const PSEUDO_ROOT_NAME: &str = "pseudo_root";

#[derive(Debug, Clone)]
pub struct DeadLineage {
    pub tree: SpeciesTree,
    pub pseudo_root: NodeId,
    pub sprime_root: NodeId,
    /// Chain nodes by depth: `chain[i].c_time == slices[i]`.
    pub chain: Vec<NodeId>,
    pub slices: Vec<f64>,
}

/// Hangs S′ and a dead chain of `slices.len()` nodes below a new pseudo-root.
pub fn attach_dead_lineage(sub: Subdivision) -> Result<DeadLineage, ReconError> {
    let Subdivision {
        mut tree,
        root: sprime_root,
        slices,
    } = sub;

    let pseudo_root = tree.add_node(
        PSEUDO_ROOT_NAME,
        PSEUDO_ROOT_NAME,
        NodeKind::PseudoRoot,
        f64::INFINITY,
        0.0,
    );
    tree.add_child(pseudo_root, sprime_root)?;

    let mut chain = Vec::with_capacity(slices.len());
    let mut tip = pseudo_root;
    let mut prev_time = None;
    for (i, &t) in slices.iter().enumerate() {
        let length = prev_time.map_or(0.0, |p: f64| p - t);
        let dead = tree.add_node(DEAD_NAME, format!("DEAD{}", i), NodeKind::Dead, t, length);
        tree.add_child(tip, dead)?;
        chain.push(dead);
        tip = dead;
        prev_time = Some(t);
    }

    ladderize(&mut tree, pseudo_root);
    if let Some(&top) = chain.first() {
        let children = &mut tree.node_mut(pseudo_root).children;
        if children.first() == Some(&top) {
            children.swap(0, 1);
        }
    }

    info!(
        "Attached dead lineage of {} nodes next to S′ ({} nodes)",
        chain.len(),
        tree.subtree_size(sprime_root)
    );

    Ok(DeadLineage {
        tree,
        pseudo_root,
        sprime_root,
        chain,
        slices,
    })
}

/// Sorts every child list by leaf count, smaller subtrees first. Ties keep
/// their order.
fn ladderize(tree: &mut SpeciesTree, root: NodeId) {
    let mut leaf_count: HashMap<NodeId, usize> = HashMap::new();
    for id in tree.postorder(root) {
        let node = tree.node(id);
        let count = if node.is_leaf() {
            1
        } else {
            node.children
                .iter()
                .map(|c| leaf_count.get(c).copied().unwrap_or(0))
                .sum()
        };
        leaf_count.insert(id, count);
    }

    for id in tree.levelorder(root) {
        let children = &mut tree.node_mut(id).children;
        children.sort_by_key(|c| leaf_count.get(c).copied().unwrap_or(0));
    }
}
