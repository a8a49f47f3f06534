//! Gene trees rebuilt from reconciliation streams.

use super::event::EventTag;
use crate::libs::phylo::NodeId;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeneKind {
    Lineage,
    /// Placeholder for a lost copy
    Loss,
}

/// Where a gene node sits on the species arena, and why.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Mapping {
    pub host: NodeId,
    pub event: EventTag,
    pub support: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneNode {
    pub id: NodeId,
    pub name: String,
    pub kind: GeneKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// The first entry is the primary mapping.
    pub mapped_to: Vec<Mapping>,
    /// Species node resolved by aggregation.
    pub host: Option<NodeId>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl GeneNode {
    pub fn primary(&self) -> Option<&Mapping> {
        self.mapped_to.first()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneTree {
    /// Label of the stream the tree was parsed from
    pub source: String,
    pub nodes: Vec<GeneNode>,
    pub root: Option<NodeId>,
    pub event_counts: BTreeMap<EventTag, usize>,
}

impl GeneTree {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            nodes: Vec::new(),
            root: None,
            event_counts: BTreeMap::new(),
        }
    }

    pub fn add_node(&mut self, name: impl Into<String>, kind: GeneKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(GeneNode {
            id,
            name: name.into(),
            kind,
            parent: None,
            children: Vec::new(),
            mapped_to: Vec::new(),
            host: None,
            x: None,
            y: None,
        });
        id
    }

    /// Links a fresh node below `parent`. Gene trees only ever grow downward.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child].parent.is_none());
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn node(&self, id: NodeId) -> &GeneNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut GeneNode {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn postorder(&self) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.nodes[id].children.iter().copied());
        }
        result.reverse();
        result
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves: Vec<NodeId> = self
            .postorder()
            .into_iter()
            .filter(|&id| self.nodes[id].is_leaf())
            .collect();
        leaves.sort_unstable();
        leaves
    }

    /// Is `ancestor` on the path from `id` to the root (`id` excluded)?
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.nodes[id].parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }
}
