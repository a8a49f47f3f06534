//! Time subdivision of an ultrametric species tree.
//!
//! Every branch is cut at every divergence time it spans, so that each
//! root-to-leaf path of the result (S′) crosses the same ordered list of
//! time slices.

use super::error::ReconError;
use super::species::{NodeKind, SpeciesTree};
use crate::libs::phylo::{NodeId, Tree};
use log::{debug, info};

/// Relative tolerance, scaled by the tree height.
pub const REL_TOLERANCE: f64 = 1e-6;
/// Absolute tolerance added to the relative one.
pub const ABS_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Subdivision {
    pub tree: SpeciesTree,
    pub root: NodeId,
    /// Distinct divergence times, strictly decreasing. First is the height, last is 0.
    pub slices: Vec<f64>,
}

pub fn tolerance(height: f64) -> f64 {
    REL_TOLERANCE * height.abs() + ABS_TOLERANCE
}

/// Builds S′ from an ultrametric tree.
pub fn subdivide(tree: &Tree) -> Result<Subdivision, ReconError> {
    let root = tree.get_root().ok_or(ReconError::EmptyTree)?;
    if tree.get_node(root).map_or(true, |n| n.is_leaf()) {
        return Err(ReconError::EmptyTree);
    }

    // Distance of every node to the root, in preorder
    let order = tree.preorder(root);
    let mut dist = vec![0.0; tree.len()];
    for &id in order.iter().skip(1) {
        let node = tree.get_node(id).ok_or(ReconError::EmptyTree)?;
        let parent = node.parent.ok_or(ReconError::EmptyTree)?;
        dist[id] = dist[parent] + node.length.unwrap_or(0.0);
    }

    let leaves = tree.get_leaves();
    let depths: Vec<f64> = leaves.iter().map(|&id| dist[id]).collect();
    let height = depths.iter().sum::<f64>() / depths.len() as f64;
    if height.is_nan() || height <= 0.0 {
        return Err(ReconError::ZeroHeight);
    }

    let tol = tolerance(height);
    let min = depths.iter().copied().fold(f64::INFINITY, f64::min);
    let max = depths.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if height - min > tol || max - height > tol {
        return Err(ReconError::NotUltrametric { min, max });
    }

    let mut c_time = vec![0.0; tree.len()];
    for &id in &order {
        c_time[id] = match tree.get_node(id) {
            Some(n) if n.is_leaf() => 0.0,
            _ if id == root => height,
            _ => height - dist[id],
        };
    }

    let slices = merge_slices(order.iter().map(|&id| c_time[id]).collect(), tol);
    // Snap every node to its slice so that later comparisons are exact
    let rank: Vec<usize> = (0..tree.len())
        .map(|id| nearest_slice(&slices, c_time[id]))
        .collect();

    let mut sprime = SpeciesTree::new();
    let mut new_ids = vec![0; tree.len()];
    let mut markers = 0usize;

    for &id in &order {
        let node = tree.get_node(id).ok_or(ReconError::EmptyTree)?;
        let name = node.name.clone().unwrap_or_default();
        let unique_name = if node.is_leaf() {
            format!("S{}", name)
        } else if name.is_empty() {
            format!("N{}", id)
        } else {
            name.clone()
        };
        let time = slices[rank[id]];

        let parent = match node.parent {
            None => {
                new_ids[id] =
                    sprime.add_node(name, unique_name, NodeKind::Real, time, 0.0);
                continue;
            }
            Some(p) => p,
        };

        if rank[id] <= rank[parent] {
            return Err(ReconError::DegenerateBranch { name: unique_name });
        }

        // Markers for every slice strictly between parent and child, oldest first
        let mut upper = new_ids[parent];
        for k in (rank[parent] + 1)..rank[id] {
            let marker_name = format!("I{}", markers);
            markers += 1;
            let length = sprime.node(upper).c_time - slices[k];
            let marker = sprime.add_node(
                marker_name.clone(),
                marker_name,
                NodeKind::TimeMarker,
                slices[k],
                length,
            );
            sprime.add_child(upper, marker)?;
            upper = marker;
        }

        let length = sprime.node(upper).c_time - time;
        let new_id = sprime.add_node(name, unique_name, NodeKind::Real, time, length);
        sprime.add_child(upper, new_id)?;
        new_ids[id] = new_id;
        debug!(
            "branch {} spans {} slices",
            sprime.node(new_id).unique_name,
            rank[id] - rank[parent]
        );
    }

    info!(
        "Subdivided species tree: {} nodes, {} time slices, {} markers",
        sprime.len(),
        slices.len(),
        markers
    );

    Ok(Subdivision {
        root: new_ids[root],
        tree: sprime,
        slices,
    })
}

/// Sorts times strictly descending, merging values closer than `tol`.
fn merge_slices(mut times: Vec<f64>, tol: f64) -> Vec<f64> {
    times.sort_by(|a, b| b.total_cmp(a));
    let mut slices: Vec<f64> = Vec::with_capacity(times.len());
    for t in times {
        match slices.last() {
            Some(&last) if last - t <= tol => {}
            _ => slices.push(t),
        }
    }
    // Leaves define 0 exactly
    if let Some(last) = slices.last_mut() {
        if last.abs() <= tol {
            *last = 0.0;
        }
    }
    slices
}

fn nearest_slice(slices: &[f64], t: f64) -> usize {
    slices
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - t).abs().total_cmp(&(*b - t).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
