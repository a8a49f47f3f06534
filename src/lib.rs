//! Reconcile gene-family histories against a dated species tree.
//!
//! The species tree is subdivided at every divergence time, extended with a
//! dead lineage, and every gene tree parsed from the solver output is
//! collected onto it before the composite is laid out for drawing.

pub mod libs;

pub use libs::phylo::{Node, NodeId, Tree, TreeError};
pub use libs::recon::{
    aggregate, layout, parse_all, parse_stream, reconcile, Composite, EventTag, GeneRef,
    GeneTree, LayoutConfig, ReconError, ReconStream,
};
