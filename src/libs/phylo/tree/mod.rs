pub mod io;
pub mod query;
pub mod traversal;

use super::error::TreeError;
use super::node::{Node, NodeId};

#[derive(Debug, Default, Clone)]
pub struct Tree {
    /// Arena storage for all nodes
    pub(super) nodes: Vec<Node>,

    /// Optional root ID (a tree might be empty or in construction)
    pub(super) root: Option<NodeId>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new node to the tree. Returns the new node's ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Get number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    /// Set a node as the root of the tree. Unknown ids are ignored.
    pub fn set_root(&mut self, id: NodeId) {
        if self.get_node(id).is_some() {
            self.root = Some(id);
        }
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Link `child_id` below `parent_id`.
    /// Updates both parent's `children` list and child's `parent` field.
    pub fn add_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<(), TreeError> {
        if parent_id == child_id {
            return Err(TreeError::LogicError(
                "Cannot add node as child of itself".to_string(),
            ));
        }
        if self.get_node(parent_id).is_none() {
            return Err(TreeError::LogicError(format!(
                "Parent node {} not found",
                parent_id
            )));
        }
        match self.get_node(child_id) {
            None => {
                return Err(TreeError::LogicError(format!(
                    "Child node {} not found",
                    child_id
                )))
            }
            Some(child) => {
                if let Some(old_parent) = child.parent {
                    return Err(TreeError::LogicError(format!(
                        "Node {} already has parent {}",
                        child_id, old_parent
                    )));
                }
            }
        }

        self.nodes[child_id].parent = Some(parent_id);
        self.nodes[parent_id].children.push(child_id);
        Ok(())
    }

    // --- Delegation to traversal ---

    pub fn preorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::preorder(self, start_node)
    }

    pub fn postorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::postorder(self, start_node)
    }

    pub fn levelorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::levelorder(self, start_node)
    }

    // --- Delegation to query ---

    pub fn get_leaves(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => query::get_leaves(self, root),
            None => Vec::new(),
        }
    }

    pub fn get_leaf_names(&self) -> Vec<Option<String>> {
        self.get_leaves()
            .into_iter()
            .map(|id| self.nodes[id].name.clone())
            .collect()
    }

    pub fn get_path_from_root(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        query::get_path_from_root(self, id)
    }

    pub fn get_distance_to_root(&self, id: NodeId) -> Result<f64, TreeError> {
        query::get_distance_to_root(self, id)
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        query::get_node_by_name(self, name)
    }

    // --- Delegation to io ---

    pub fn from_file(infile: &str) -> anyhow::Result<Vec<Tree>> {
        io::from_file(infile)
    }

    pub fn to_newick(&self) -> String {
        io::to_newick(self)
    }
}
