//! The composite: S′, the dead lineage and every reconciled gene tree.

use super::dead::{attach_dead_lineage, DeadLineage};
use super::error::ReconError;
use super::gene::{GeneNode, GeneTree};
use super::index::NameIndex;
use super::layout::Frame;
use super::slicer::subdivide;
use super::species::{GeneRef, SpeciesTree};
use crate::libs::phylo::{NodeId, Tree};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Composite {
    pub species: SpeciesTree,
    /// Distinct divergence times, strictly decreasing
    pub slices: Vec<f64>,
    pub pseudo_root: NodeId,
    pub sprime_root: NodeId,
    /// Dead-lineage nodes by depth
    pub dead_chain: Vec<NodeId>,
    #[serde(skip)]
    pub index: NameIndex,
    pub gene_trees: Vec<GeneTree>,
    /// Set by the layout engine
    pub frame: Option<Frame>,
}

impl Composite {
    /// Subdivides `tree`, attaches the dead lineage and indexes species names.
    pub fn build(tree: &Tree) -> Result<Self, ReconError> {
        let DeadLineage {
            tree: species,
            pseudo_root,
            sprime_root,
            chain,
            slices,
        } = attach_dead_lineage(subdivide(tree)?)?;
        let index = NameIndex::build(&species, pseudo_root);

        Ok(Self {
            species,
            slices,
            pseudo_root,
            sprime_root,
            dead_chain: chain,
            index,
            gene_trees: Vec::new(),
            frame: None,
        })
    }

    pub fn from_newick(newick: &str) -> Result<Self, ReconError> {
        Self::build(&Tree::from_newick(newick)?)
    }

    /// Dead-lineage node at `depth` (0 is the top).
    pub fn dead_node(&self, depth: usize) -> Option<NodeId> {
        self.dead_chain.get(depth).copied()
    }

    pub fn dead_top(&self) -> NodeId {
        self.dead_chain[0]
    }

    pub fn dead_leaf(&self) -> NodeId {
        self.dead_chain[self.dead_chain.len() - 1]
    }

    /// Index of `c_time` in the slice list (0 is the oldest).
    pub fn slice_rank(&self, c_time: f64) -> Option<usize> {
        self.slices.iter().position(|&t| t == c_time)
    }

    pub fn gene(&self, gene: GeneRef) -> &GeneNode {
        self.gene_trees[gene.tree].node(gene.node)
    }

    /// S′ in Newick, nodes named by their unique names.
    pub fn to_newick(&self) -> Result<String, ReconError> {
        Ok(self.species.to_phylo(self.sprime_root)?.to_newick())
    }

    /// The whole composite as a JSON document.
    pub fn to_json(&self) -> Result<String, ReconError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let c = Composite::from_newick("((A:1,B:1)X:1,C:2)R;").unwrap();
        assert_eq!(c.slices, vec![2.0, 1.0, 0.0]);
        assert_eq!(c.dead_chain.len(), 3);
        assert_eq!(c.dead_node(0), Some(c.dead_top()));
        assert_eq!(c.dead_node(2), Some(c.dead_leaf()));
        assert_eq!(c.dead_node(3), None);
        // S′ (6) + pseudo-root + chain
        assert_eq!(c.species.len(), 10);

        assert_eq!(c.slice_rank(1.0), Some(1));
        assert_eq!(c.slice_rank(0.5), None);

        assert_eq!(c.to_newick().unwrap(), "((SC:1)I0:1,(SA:1,SB:1)X:1)R;");
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            Composite::from_newick("((A:1,B:1)X:1,C:2)R"),
            Err(ReconError::Tree(_))
        ));
        assert!(matches!(
            Composite::from_newick("((A:1,B:3)X:1,C:2)R;"),
            Err(ReconError::NotUltrametric { .. })
        ));
    }

    #[test]
    fn test_to_json() {
        let c = Composite::from_newick("((A:1,B:1)X:1,C:2)R;").unwrap();
        let json: serde_json::Value = serde_json::from_str(&c.to_json().unwrap()).unwrap();

        assert_eq!(json["slices"].as_array().unwrap().len(), 3);
        let nodes = json["species"]["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 10);
        let pseudo = &nodes[c.pseudo_root];
        assert_eq!(pseudo["kind"], "PseudoRoot");
        assert!(pseudo["c_time"].is_null());
        assert!(json.get("index").is_none());
    }
}
