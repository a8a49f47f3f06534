//! Error type for reconciliation parsing, aggregation and layout.
//!
//! Every variant aborts the whole batch.

use crate::libs::phylo::TreeError;

/// Errors raised while building, parsing, aggregating or laying out a composite.
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    /// The species tree could not be parsed or linked.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A reconciliation line does not follow the line grammar.
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A species id does not name any node of the composite.
    #[error("unknown species id {id:?} on line {line}")]
    UnknownSpecies { id: String, line: usize },

    /// An event tag outside the ten solver tags.
    #[error("unknown event tag {tag:?} on line {line}")]
    UnknownTag { tag: String, line: usize },

    /// The event's arity or auxiliary ids contradict its tag.
    #[error("invalid {tag} event on line {line}: {reason}")]
    InvalidEvent {
        tag: String,
        line: usize,
        reason: String,
    },

    /// A non-root line names a gene that is not on the parse frontier.
    #[error("gene {id:?} on line {line} was never declared")]
    UndeclaredGene { id: String, line: usize },

    /// A stream without any gene line.
    #[error("reconciliation stream {stream:?} is empty")]
    EmptyStream { stream: String },

    /// A gene leaf whose species prefix does not name a species leaf.
    #[error("gene leaf {gene:?} maps to unknown species leaf {species:?}")]
    UnmappedLeaf { gene: String, species: String },

    /// A gene node reached aggregation without any mapping.
    #[error("gene node {gene:?} has no species mapping")]
    Unmapped { gene: String },

    /// Donor and recipient lineages share no time interval.
    #[error(
        "no shared interval for {tag} at gene {gene:?}; donor [{donor}] recipient [{recipient}]"
    )]
    EmptyIntersection {
        gene: String,
        tag: String,
        donor: String,
        recipient: String,
    },

    /// The gene tree shape does not match its event tags.
    #[error("gene node {gene:?} is inconsistent: {reason}")]
    Inconsistent { gene: String, reason: String },

    /// Layout could not place every rider of a host edge.
    #[error("could not place {pending} gene nodes on host {host:?}")]
    TrackAssignment { host: String, pending: usize },

    /// Leaf depths differ by more than the tolerance.
    #[error("species tree is not ultrametric: leaf depths range from {min} to {max}")]
    NotUltrametric { min: f64, max: f64 },

    /// The species tree has no root or no leaves.
    #[error("species tree is empty")]
    EmptyTree,

    /// The species tree has zero or negative height.
    #[error("species tree has no positive height")]
    ZeroHeight,

    /// A branch whose child is not younger than its parent.
    #[error("branch above {name:?} has no positive duration")]
    DegenerateBranch { name: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A parsing worker thread died.
    #[error("worker failed: {0}")]
    Worker(String),
}
