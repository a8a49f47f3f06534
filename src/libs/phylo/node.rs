/// NodeId is an index into a tree arena.
/// It is lightweight (Copy) and stays valid for the lifetime of the arena.
pub type NodeId = usize;

/// A node of a parsed Newick tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Index in the arena
    pub id: NodeId,

    /// Parent node ID (None for root)
    pub parent: Option<NodeId>,

    /// Child node IDs, in input order
    pub children: Vec<NodeId>,

    /// Node label (species name, solver label, ...)
    pub name: Option<String>,

    /// Branch length to parent
    pub length: Option<f64>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            name: None,
            length: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
