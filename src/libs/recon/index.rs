//! Species id lookup for reconciliation streams.

use super::error::ReconError;
use super::species::{NodeKind, SpeciesTree};
use crate::libs::phylo::NodeId;
use std::collections::HashMap;

/// Name lookups over the composite species arena, built once.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    by_name: HashMap<String, NodeId>,
    leaves: HashMap<String, NodeId>,
}

impl NameIndex {
    /// Scans the arena in level order from `pseudo_root`; the shallowest node
    /// wins when names repeat, so `-1` names the top of the dead chain.
    pub fn build(tree: &SpeciesTree, pseudo_root: NodeId) -> Self {
        let mut index = Self::default();
        for id in tree.levelorder(pseudo_root) {
            let node = tree.node(id);
            index.by_name.entry(node.name.clone()).or_insert(id);
            if node.kind == NodeKind::Real && node.is_leaf() {
                index.leaves.entry(node.name.clone()).or_insert(id);
            }
        }
        index
    }

    /// Resolves a solver species id. `'X'` names the species leaf `X`.
    pub fn resolve(&self, id: &str, line: usize) -> Result<NodeId, ReconError> {
        let found = match id.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            Some(leaf) => self.leaves.get(leaf),
            None => self.by_name.get(id),
        };
        found.copied().ok_or_else(|| ReconError::UnknownSpecies {
            id: id.to_string(),
            line,
        })
    }

    /// Species leaf by display name.
    pub fn lookup_leaf(&self, name: &str) -> Option<NodeId> {
        self.leaves.get(name).copied()
    }
}
