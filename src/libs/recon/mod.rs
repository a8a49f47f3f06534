//! Reconciliation of gene trees against a time-subdivided species tree.

pub mod aggregate;
pub mod batch;
pub mod composite;
pub mod dead;
pub mod error;
pub mod event;
pub mod gene;
pub mod grid;
pub mod index;
pub mod layout;
pub mod slicer;
pub mod species;
pub mod stream;

pub use aggregate::aggregate;
pub use batch::{parse_all, reconcile, ReconStream};
pub use composite::Composite;
pub use error::ReconError;
pub use event::EventTag;
pub use gene::GeneTree;
pub use layout::{layout, LayoutConfig};
pub use species::GeneRef;
pub use stream::parse_stream;
