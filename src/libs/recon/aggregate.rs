//! Places every gene node on a host node of the composite species arena.
//!
//! Most events sit on the species node the solver mapped them to. Transfers
//! between lineages that are not directly comparable, and everything
//! touching the dead lineage, are resolved by intersecting the time
//! intervals of donor and recipient lineages.

use super::composite::Composite;
use super::error::ReconError;
use super::event::EventTag;
use super::gene::{GeneKind, GeneTree};
use super::species::{GeneRef, NodeKind, Parasite, SpeciesTree};
use crate::libs::phylo::NodeId;
use itertools::{iproduct, Itertools};
use log::{debug, info};

/// A species edge, `parent` older than `child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub parent: NodeId,
    pub child: NodeId,
}

/// Edges from `node` up through its contiguous time-marker ancestors, oldest first.
pub fn edge_intervals(species: &SpeciesTree, node: NodeId) -> Vec<Interval> {
    let mut edges = Vec::new();
    let mut child = node;
    while let Some(parent) = species.node(child).parent {
        edges.push(Interval { parent, child });
        if species.node(parent).kind != NodeKind::TimeMarker {
            break;
        }
        child = parent;
    }
    edges.reverse();
    edges
}

/// Every dead-lineage edge below the chain top, oldest first.
pub fn dead_intervals(chain: &[NodeId]) -> Vec<Interval> {
    chain
        .windows(2)
        .map(|w| Interval {
            parent: w[0],
            child: w[1],
        })
        .collect()
}

/// Pairs of intervals spanning exactly the same times, `a` in the outer loop.
pub fn intersect(
    species: &SpeciesTree,
    a: &[Interval],
    b: &[Interval],
) -> Vec<(Interval, Interval)> {
    let time = |id: NodeId| species.node(id).c_time;
    iproduct!(a.iter(), b.iter())
        .filter(|(x, y)| time(x.parent) == time(y.parent) && time(x.child) == time(y.child))
        .map(|(x, y)| (*x, *y))
        .collect()
}

fn format_intervals(species: &SpeciesTree, intervals: &[Interval]) -> String {
    intervals
        .iter()
        .map(|i| {
            let p = species.node(i.parent);
            let c = species.node(i.child);
            format!("{}({})-{}({})", p.unique_name, p.c_time, c.unique_name, c.c_time)
        })
        .join(", ")
}

/// Resolves hosts for all gene trees, in input order. Previous results are
/// discarded first, so running it twice gives the same composite.
pub fn aggregate(composite: &mut Composite) -> Result<(), ReconError> {
    let Composite {
        species,
        gene_trees,
        dead_chain,
        pseudo_root,
        ..
    } = composite;

    for node in species.nodes_mut() {
        node.parasites.clear();
    }
    for tree in gene_trees.iter_mut() {
        for node in tree.nodes.iter_mut() {
            node.host = None;
        }
    }

    let mut resolver = Resolver {
        species,
        pseudo_root: *pseudo_root,
        dead: dead_intervals(dead_chain),
    };
    for (t, tree) in gene_trees.iter_mut().enumerate() {
        resolver.collect(t, tree)?;
        info!("Collected {} onto S′", tree.source);
    }

    Ok(())
}

struct Resolver<'a> {
    species: &'a mut SpeciesTree,
    pseudo_root: NodeId,
    dead: Vec<Interval>,
}

impl Resolver<'_> {
    fn collect(&mut self, t: usize, tree: &mut GeneTree) -> Result<(), ReconError> {
        for g in tree.postorder() {
            let primary = *tree
                .node(g)
                .primary()
                .ok_or_else(|| ReconError::Unmapped {
                    gene: tree.node(g).name.clone(),
                })?;
            let base = primary.host;

            let host = match primary.event {
                EventTag::C
                | EventTag::S
                | EventTag::SL
                | EventTag::D
                | EventTag::DD
                | EventTag::T0 => base,
                EventTag::Loss => edge_intervals(self.species, base)
                    .first()
                    .map_or(base, |i| i.child),
                EventTag::T | EventTag::TL => {
                    self.resolve_transfer(t, tree, g, base, primary.event)?
                }
                EventTag::TFD | EventTag::TLFD => {
                    let transfer = received_child(tree, g)?;
                    let recipient = tree
                        .node(transfer)
                        .primary()
                        .map(|m| m.host)
                        .ok_or_else(|| ReconError::Unmapped {
                            gene: tree.node(transfer).name.clone(),
                        })?;
                    let recipient_edges = edge_intervals(self.species, recipient);
                    let shared = intersect(self.species, &self.dead, &recipient_edges);
                    match shared.last() {
                        Some((donor, _)) => donor.child,
                        None => {
                            return Err(self.empty(
                                tree,
                                g,
                                primary.event,
                                &self.dead,
                                &recipient_edges,
                            ))
                        }
                    }
                }
                EventTag::TTD | EventTag::TLTD => {
                    let donor_edges = edge_intervals(self.species, base);
                    let shared = intersect(self.species, &donor_edges, &self.dead);
                    match shared.first() {
                        Some((donor, _)) => donor.child,
                        None if self.starts_at_pseudo_root(&donor_edges) => base,
                        None => {
                            return Err(self.empty(
                                tree,
                                g,
                                primary.event,
                                &donor_edges,
                                &self.dead,
                            ))
                        }
                    }
                }
                EventTag::Dead0 => {
                    let parent = tree.node(g).parent.ok_or_else(|| ReconError::Inconsistent {
                        gene: tree.node(g).name.clone(),
                        reason: "dead-lineage entry without a parent".to_string(),
                    })?;
                    let from = tree
                        .node(parent)
                        .primary()
                        .map(|m| m.host)
                        .ok_or_else(|| ReconError::Unmapped {
                            gene: tree.node(parent).name.clone(),
                        })?;
                    let donor_edges = edge_intervals(self.species, from);
                    let shared = intersect(self.species, &donor_edges, &self.dead);
                    match shared.first() {
                        Some((_, dead)) => dead.child,
                        None if self.starts_at_pseudo_root(&donor_edges) => base,
                        None => {
                            return Err(self.empty(
                                tree,
                                g,
                                primary.event,
                                &donor_edges,
                                &self.dead,
                            ))
                        }
                    }
                }
            };

            debug!(
                "{}: {} ({}) hosted by {}",
                tree.source,
                tree.node(g).name,
                primary.event,
                self.species.node(host).unique_name
            );
            self.attach(t, tree, g, host, primary.event);
        }
        Ok(())
    }

    /// T and TL: the origin sits on the latest interval shared by donor and
    /// recipient; the received node moves to the recipient side of it.
    fn resolve_transfer(
        &mut self,
        t: usize,
        tree: &mut GeneTree,
        g: NodeId,
        base: NodeId,
        event: EventTag,
    ) -> Result<NodeId, ReconError> {
        let transfer = received_child(tree, g)?;
        let recipient = tree
            .node(transfer)
            .children
            .first()
            .and_then(|&c| tree.node(c).host)
            .ok_or_else(|| ReconError::Inconsistent {
                gene: tree.node(transfer).name.clone(),
                reason: "received transfer without a placed continuation".to_string(),
            })?;

        let donor_edges = edge_intervals(self.species, base);
        let recipient_edges = edge_intervals(self.species, recipient);
        let shared = intersect(self.species, &donor_edges, &recipient_edges);
        let (donor, received) = match shared.last() {
            Some(pair) => *pair,
            None => return Err(self.empty(tree, g, event, &donor_edges, &recipient_edges)),
        };
        let host = donor.child;

        self.relocate(t, tree, transfer, received.child);

        if event == EventTag::TL {
            let loss = tree
                .node(g)
                .children
                .iter()
                .copied()
                .find(|&c| tree.node(c).kind == GeneKind::Loss)
                .ok_or_else(|| ReconError::Inconsistent {
                    gene: tree.node(g).name.clone(),
                    reason: "TL without a loss child".to_string(),
                })?;
            let mapped_to = tree.node(g).mapped_to.clone();
            tree.node_mut(loss).mapped_to = mapped_to;
            self.relocate(t, tree, loss, host);
        }

        Ok(host)
    }

    fn starts_at_pseudo_root(&self, edges: &[Interval]) -> bool {
        edges
            .first()
            .is_some_and(|i| i.parent == self.pseudo_root)
    }

    fn attach(&mut self, t: usize, tree: &mut GeneTree, g: NodeId, host: NodeId, event: EventTag) {
        tree.node_mut(g).host = Some(host);
        self.species.node_mut(host).parasites.push(Parasite {
            gene: GeneRef { tree: t, node: g },
            event,
        });
    }

    // Moves an already placed gene node, keeping its parasite tag.
    fn relocate(&mut self, t: usize, tree: &mut GeneTree, g: NodeId, host: NodeId) {
        let gene = GeneRef { tree: t, node: g };
        let mut event = tree
            .node(g)
            .primary()
            .map_or(EventTag::T0, |m| m.event);

        if let Some(old) = tree.node(g).host {
            let parasites = &mut self.species.node_mut(old).parasites;
            if let Some(pos) = parasites.iter().position(|p| p.gene == gene) {
                event = parasites.remove(pos).event;
            }
        }
        self.attach(t, tree, g, host, event);
    }

    fn empty(
        &self,
        tree: &GeneTree,
        g: NodeId,
        event: EventTag,
        donor: &[Interval],
        recipient: &[Interval],
    ) -> ReconError {
        ReconError::EmptyIntersection {
            gene: tree.node(g).name.clone(),
            tag: event.to_string(),
            donor: format_intervals(self.species, donor),
            recipient: format_intervals(self.species, recipient),
        }
    }
}

/// The child of `g` that received a transfer.
fn received_child(tree: &GeneTree, g: NodeId) -> Result<NodeId, ReconError> {
    tree.node(g)
        .children
        .iter()
        .copied()
        .find(|&c| tree.node(c).primary().map(|m| m.event) == Some(EventTag::T0))
        .ok_or_else(|| ReconError::Inconsistent {
            gene: tree.node(g).name.clone(),
            reason: "transfer without a receiving child".to_string(),
        })
}
