//! The species arena shared by S′, the dead lineage and the pseudo-root.

use super::event::EventTag;
use crate::libs::phylo::{NodeId, Tree, TreeError};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// A node of the input species tree
    Real,
    /// Inserted so that a branch crosses a shared divergence time
    TimeMarker,
    /// A node of the dead-lineage chain
    Dead,
    /// Parent of S′ and the dead lineage
    PseudoRoot,
}

/// Names a gene node across all gene trees of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GeneRef {
    pub tree: usize,
    pub node: NodeId,
}

/// A gene node riding on a species node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Parasite {
    pub gene: GeneRef,
    pub event: EventTag,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesNode {
    pub id: NodeId,
    pub name: String,
    pub unique_name: String,
    pub kind: NodeKind,
    /// Divergence time, 0 at the leaves. Infinite for the pseudo-root.
    #[serde(serialize_with = "finite_or_null")]
    pub c_time: f64,
    pub length: f64,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub parasites: Vec<Parasite>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

fn finite_or_null<S: serde::Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    if v.is_finite() {
        s.serialize_f64(*v)
    } else {
        s.serialize_none()
    }
}

impl SpeciesNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SpeciesTree {
    nodes: Vec<SpeciesNode>,
}

impl SpeciesTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        unique_name: impl Into<String>,
        kind: NodeKind,
        c_time: f64,
        length: f64,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SpeciesNode {
            id,
            name: name.into(),
            unique_name: unique_name.into(),
            kind,
            c_time,
            length,
            parent: None,
            children: Vec::new(),
            parasites: Vec::new(),
            x: None,
            y: None,
        });
        id
    }

    pub fn add_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<(), TreeError> {
        if parent_id == child_id || parent_id >= self.len() || child_id >= self.len() {
            return Err(TreeError::LogicError(format!(
                "Cannot link species node {} below {}",
                child_id, parent_id
            )));
        }
        if let Some(old) = self.nodes[child_id].parent {
            return Err(TreeError::LogicError(format!(
                "Species node {} already has parent {}",
                child_id, old
            )));
        }
        self.nodes[child_id].parent = Some(parent_id);
        self.nodes[parent_id].children.push(child_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SpeciesNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SpeciesNode {
        &mut self.nodes[id]
    }

    pub fn nodes(&self) -> &[SpeciesNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [SpeciesNode] {
        &mut self.nodes
    }

    pub fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        result
    }

    pub fn postorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.nodes[id].children.iter().copied());
        }
        result.reverse();
        result
    }

    pub fn levelorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            result.push(id);
            queue.extend(self.nodes[id].children.iter().copied());
        }
        result
    }

    pub fn leaves(&self, start: NodeId) -> Vec<NodeId> {
        self.preorder(start)
            .into_iter()
            .filter(|&id| self.nodes[id].is_leaf())
            .collect()
    }

    /// Number of nodes in the subtree, `start` included.
    pub fn subtree_size(&self, start: NodeId) -> usize {
        self.preorder(start).len()
    }

    /// Copies the subtree below `start` into a plain phylo tree, naming nodes
    /// by their unique names.
    pub fn to_phylo(&self, start: NodeId) -> Result<Tree, TreeError> {
        let mut tree = Tree::new();
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(start, None)];

        while let Some((id, parent)) = stack.pop() {
            let node = &self.nodes[id];
            let new_id = tree.add_node();
            if let Some(new_node) = tree.get_node_mut(new_id) {
                new_node.set_name(node.unique_name.as_str());
                if parent.is_some() {
                    new_node.length = Some(node.length);
                }
            }
            match parent {
                Some(p) => tree.add_child(p, new_id)?,
                None => tree.set_root(new_id),
            }
            for &child in node.children.iter().rev() {
                stack.push((child, Some(new_id)));
            }
        }

        Ok(tree)
    }
}
