//! Drawing coordinates for the composite.
//!
//! Host nodes are spread across the main band by post-order leaf rank and
//! stacked vertically by time slice. Gene nodes are then placed edge by edge:
//! every host edge (a binary or leaf node plus its chain of single-child
//! ancestors) gets one vertical track per riding gene lineage.

use super::composite::Composite;
use super::error::ReconError;
use super::event::EventTag;
use super::gene::GeneTree;
use super::species::{GeneRef, SpeciesTree};
use crate::libs::phylo::NodeId;
use log::{info, trace};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Canvas dimensions and band fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub pad_top: f64,
    pub pad_bottom: f64,
    pub pad_left: f64,
    pub pad_right: f64,
    /// Fractions of the inner width
    pub scale: f64,
    pub main: f64,
    pub dead: f64,
    /// Fraction of a slice reserved for branching events
    pub binary: f64,
    /// Fraction of a leaf column used by gene tracks
    pub inner_leaf: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 4800.0,
            height: 2700.0,
            pad_top: 50.0,
            pad_bottom: 50.0,
            pad_left: 50.0,
            pad_right: 50.0,
            scale: 0.05,
            main: 0.85,
            dead: 0.10,
            binary: 0.40,
            inner_leaf: 0.5,
        }
    }
}

impl LayoutConfig {
    /// Reads a config; missing keys keep their defaults.
    ///
    /// ```
    /// use evorecon::LayoutConfig;
    ///
    /// let config = LayoutConfig::from_json(r#"{"width": 1000}"#).unwrap();
    /// assert_eq!(config.width, 1000.0);
    /// assert_eq!(config.height, 2700.0);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ReconError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn inner_width(&self) -> f64 {
        self.width - self.pad_left - self.pad_right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.pad_top - self.pad_bottom
    }

    pub fn scale_width(&self) -> f64 {
        self.scale * self.inner_width()
    }

    pub fn main_width(&self) -> f64 {
        self.main * self.inner_width()
    }

    pub fn dead_width(&self) -> f64 {
        self.dead * self.inner_width()
    }

    pub fn unary(&self) -> f64 {
        1.0 - self.binary
    }
}

/// Derived dimensions of the last layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub max_leaf_width: f64,
    pub inner_leaf_width: f64,
    pub slice_height: f64,
}

/// Assigns coordinates to every host node and every hosted gene node.
///
/// Runs after aggregation; earlier coordinates are discarded.
pub fn layout(composite: &mut Composite, config: &LayoutConfig) -> Result<(), ReconError> {
    for node in composite.species.nodes_mut() {
        node.x = None;
        node.y = None;
    }
    for tree in composite.gene_trees.iter_mut() {
        for node in tree.nodes.iter_mut() {
            node.x = None;
            node.y = None;
        }
    }

    let frame = place_hosts(composite, config);
    info!(
        "Host layout: leaf width {:.2}, slice height {:.2}",
        frame.max_leaf_width, frame.slice_height
    );

    let Composite {
        species,
        gene_trees,
        pseudo_root,
        ..
    } = composite;
    let mut placer = GenePlacer {
        species: &*species,
        genes: gene_trees,
        pseudo_root: *pseudo_root,
        binary_height: frame.slice_height * config.binary,
        unary_height: frame.slice_height * config.unary(),
        inner_leaf_width: frame.inner_leaf_width,
    };

    let mut queue: VecDeque<NodeId> = species
        .node(*pseudo_root)
        .children
        .iter()
        .copied()
        .collect();
    while let Some(top) = queue.pop_front() {
        queue.extend(placer.place_edge(top)?);
    }

    // every gene node rides some host edge
    let unplaced = composite
        .gene_trees
        .iter()
        .flat_map(|t| t.nodes.iter())
        .find(|n| n.x.is_none() || n.y.is_none());
    if let Some(node) = unplaced {
        let host = node
            .host
            .map_or("none".to_string(), |h| composite.species.node(h).unique_name.clone());
        return Err(ReconError::Inconsistent {
            gene: node.name.clone(),
            reason: format!("no coordinates (host {})", host),
        });
    }

    composite.frame = Some(frame);
    Ok(())
}

fn place_hosts(composite: &mut Composite, config: &LayoutConfig) -> Frame {
    let n_leaves = composite.species.leaves(composite.sprime_root).len().max(1);
    let max_leaf_width = config.main_width() / n_leaves as f64;
    let inner_leaf_width = config.inner_leaf * max_leaf_width;
    let n_slices = composite.slices.len().max(1);
    let slice_height = config.inner_height() / n_slices as f64;
    let bottom = config.pad_top + config.inner_height();

    let y_of = |c: &Composite, id: NodeId| {
        c.slice_rank(c.species.node(id).c_time)
            .map(|rank| bottom - (n_slices - 1 - rank) as f64 * slice_height)
    };

    let mut x = config.pad_left + config.scale_width() + max_leaf_width / 2.0;
    for id in composite.species.postorder(composite.sprime_root) {
        let y = y_of(composite, id);
        let node = composite.species.node(id);
        let node_x = match node.children.as_slice() {
            [] => {
                let leaf_x = x;
                x += max_leaf_width;
                Some(leaf_x)
            }
            [only] => composite.species.node(*only).x,
            [left, right, ..] => {
                let (l, r) = (composite.species.node(*left).x, composite.species.node(*right).x);
                l.zip(r).map(|(l, r)| (l + r) / 2.0)
            }
        };
        let node = composite.species.node_mut(id);
        node.x = node_x;
        node.y = y;
    }

    let dead_x =
        config.pad_left + config.scale_width() + config.main_width() + config.dead_width() / 2.0;
    for id in composite.dead_chain.clone() {
        let y = y_of(composite, id);
        let node = composite.species.node_mut(id);
        node.x = Some(dead_x);
        node.y = y;
    }

    Frame {
        max_leaf_width,
        inner_leaf_width,
        slice_height,
    }
}

struct GenePlacer<'a> {
    species: &'a SpeciesTree,
    genes: &'a mut [GeneTree],
    pseudo_root: NodeId,
    binary_height: f64,
    unary_height: f64,
    inner_leaf_width: f64,
}

impl GenePlacer<'_> {
    fn x(&self, g: GeneRef) -> Option<f64> {
        self.genes[g.tree].node(g.node).x
    }

    fn event(&self, g: GeneRef) -> Option<EventTag> {
        self.genes[g.tree].node(g.node).primary().map(|m| m.event)
    }

    fn parent(&self, g: GeneRef) -> Option<GeneRef> {
        self.genes[g.tree]
            .node(g.node)
            .parent
            .map(|node| GeneRef { tree: g.tree, node })
    }

    fn children(&self, g: GeneRef) -> Vec<GeneRef> {
        self.genes[g.tree]
            .node(g.node)
            .children
            .iter()
            .map(|&node| GeneRef { tree: g.tree, node })
            .collect()
    }

    fn is_ancestor(&self, ancestor: GeneRef, g: GeneRef) -> bool {
        ancestor.tree == g.tree && self.genes[g.tree].is_ancestor(ancestor.node, g.node)
    }

    /// Places the riders of the edge starting at `top`; returns the edges below.
    fn place_edge(&mut self, top: NodeId) -> Result<Vec<NodeId>, ReconError> {
        // Interval nodes, top first
        let mut chain = vec![top];
        let mut bottom = top;
        while let [only] = self.species.node(bottom).children.as_slice() {
            bottom = *only;
            chain.push(bottom);
        }

        let riders: Vec<GeneRef> = chain
            .iter()
            .flat_map(|&s| self.species.node(s).parasites.iter().map(|p| p.gene))
            .collect();
        let riding: HashSet<GeneRef> = riders.iter().copied().collect();
        trace!(
            "edge {} -> {}: {} riders",
            self.species.node(top).unique_name,
            self.species.node(bottom).unique_name,
            riders.len()
        );

        let tracks = self.order_tracks(top, &riders, &riding);
        if !tracks.is_empty() {
            self.place_x(top, &tracks, &riders, &riding)?;
            self.place_y(&chain, bottom, &tracks, &riding);
        }

        Ok(self.species.node(bottom).children.clone())
    }

    /// Riders without riding descendants, ordered per gene tree.
    fn order_tracks(
        &self,
        top: NodeId,
        riders: &[GeneRef],
        riding: &HashSet<GeneRef>,
    ) -> Vec<GeneRef> {
        let mut inner = HashSet::new();
        for &r in riders {
            let mut cur = self.parent(r);
            while let Some(p) = cur {
                if riding.contains(&p) {
                    inner.insert(p);
                }
                cur = self.parent(p);
            }
        }
        let tracks: Vec<GeneRef> = riders.iter().copied().filter(|r| !inner.contains(r)).collect();

        let mut parent_riders: Vec<GeneRef> = match self.species.node(top).parent {
            Some(p) if p != self.pseudo_root => {
                self.species.node(p).parasites.iter().map(|p| p.gene).collect()
            }
            _ => Vec::new(),
        };
        parent_riders.sort_by(|a, b| {
            let (xa, xb) = (
                self.x(*a).unwrap_or(f64::INFINITY),
                self.x(*b).unwrap_or(f64::INFINITY),
            );
            xa.total_cmp(&xb)
        });

        let mut ordered = Vec::with_capacity(tracks.len());
        for t in 0..self.genes.len() {
            let g_nodes: Vec<GeneRef> = tracks.iter().copied().filter(|g| g.tree == t).collect();
            if g_nodes.is_empty() {
                continue;
            }

            let roots: Vec<GeneRef> = g_nodes
                .iter()
                .copied()
                .filter(|&g| self.parent(g).is_none())
                .collect();

            // Vertically inherited tips, in the order of their parent-edge ancestors
            let mut tips: Vec<GeneRef> = Vec::new();
            for &p in parent_riders.iter().filter(|p| p.tree == t) {
                let desc: HashSet<GeneRef> = riders
                    .iter()
                    .copied()
                    .filter(|&r| self.is_ancestor(p, r))
                    .collect();
                let desc_tips: Vec<GeneRef> =
                    g_nodes.iter().copied().filter(|g| desc.contains(g)).collect();

                let found = match desc_tips.as_slice() {
                    [] => Vec::new(),
                    [tip] => vec![*tip],
                    _ => {
                        let mut found = VecDeque::new();
                        let mut queue = VecDeque::from([p]);
                        while let Some(d) = queue.pop_front() {
                            for c in self.children(d) {
                                if desc_tips.contains(&c) {
                                    found.push_front(c);
                                } else if desc.contains(&c) {
                                    queue.push_back(c);
                                }
                            }
                        }
                        found.into_iter().collect()
                    }
                };
                for tip in found {
                    if !tips.contains(&tip) {
                        tips.push(tip);
                    }
                }
            }

            // Everything else came in horizontally; oldest source last
            let mut incoming: Vec<(GeneRef, f64)> = g_nodes
                .iter()
                .copied()
                .filter(|g| !roots.contains(g) && !tips.contains(g))
                .map(|g| {
                    let mut top_most = g;
                    while let Some(p) = self.parent(top_most).filter(|p| riding.contains(p)) {
                        top_most = p;
                    }
                    let time = self.genes[t]
                        .node(top_most.node)
                        .primary()
                        .map_or(f64::INFINITY, |m| self.species.node(m.host).c_time);
                    (g, time)
                })
                .collect();
            incoming.sort_by(|a, b| a.1.total_cmp(&b.1));

            trace!(
                "  tree {}: {} roots, {} inherited, {} incoming",
                self.genes[t].source,
                roots.len(),
                tips.len(),
                incoming.len()
            );
            ordered.extend(roots);
            ordered.extend(tips);
            ordered.extend(incoming.into_iter().map(|(g, _)| g));
        }

        ordered
    }

    fn place_x(
        &mut self,
        top: NodeId,
        tracks: &[GeneRef],
        riders: &[GeneRef],
        riding: &HashSet<GeneRef>,
    ) -> Result<(), ReconError> {
        let host_x = self.species.node(top).x.unwrap_or_default();
        let track_width = self.inner_leaf_width / tracks.len() as f64;

        let mut x = host_x - 0.5 * self.inner_leaf_width + 0.5 * track_width;
        for &tip in tracks {
            trace!("  track {} x = {:.2}", self.genes[tip.tree].node(tip.node).name, x);
            self.genes[tip.tree].node_mut(tip.node).x = Some(x);
            x += track_width;
        }

        let mut pending: VecDeque<GeneRef> =
            riders.iter().copied().filter(|r| !tracks.contains(r)).collect();
        let mut stall = 0;
        while let Some(g) = pending.pop_front() {
            let placed: Vec<Option<f64>> = self
                .children(g)
                .into_iter()
                .filter(|c| riding.contains(c))
                .map(|c| self.x(c))
                .collect();
            let x = match placed.as_slice() {
                [Some(x)] => Some(*x),
                [Some(l), Some(r)] => Some((l + r) / 2.0),
                _ => None,
            };

            match x {
                Some(x) => {
                    self.genes[g.tree].node_mut(g.node).x = Some(x);
                    stall = 0;
                }
                None => {
                    pending.push_back(g);
                    stall += 1;
                    if stall >= 2 * pending.len() {
                        return Err(ReconError::TrackAssignment {
                            host: self.species.node(top).unique_name.clone(),
                            pending: pending.len(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    fn place_y(
        &mut self,
        chain: &[NodeId],
        bottom: NodeId,
        tracks: &[GeneRef],
        riding: &HashSet<GeneRef>,
    ) {
        for &tip in tracks {
            // The track's lineage inside this edge, tip first
            let mut lineage = vec![tip];
            let mut g = tip;
            while let Some(p) = self.parent(g).filter(|p| riding.contains(p)) {
                lineage.push(p);
                g = p;
            }

            for &s in chain {
                let mut y = self.species.node(s).y.unwrap_or_default();
                let mut local: VecDeque<GeneRef> = lineage
                    .iter()
                    .copied()
                    .filter(|g| self.genes[g.tree].node(g.node).host == Some(s))
                    .collect();
                let Some(&first) = local.front() else {
                    continue;
                };

                if matches!(
                    self.event(first),
                    Some(EventTag::C | EventTag::S | EventTag::SL)
                ) {
                    self.genes[first.tree].node_mut(first.node).y = Some(y);
                    local.pop_front();
                }
                y -= self.binary_height;
                if local.is_empty() {
                    continue;
                }

                let layer = self.unary_height / local.len() as f64;
                for g in local {
                    self.genes[g.tree].node_mut(g.node).y = Some(y);
                    y -= layer;
                }
            }
        }

        // Branching tracks are staggered through the binary part above the bottom
        let stagger: Vec<GeneRef> = tracks
            .iter()
            .copied()
            .filter(|&g| matches!(self.event(g), Some(EventTag::S | EventTag::SL)))
            .collect();
        if !stagger.is_empty() {
            let step = self.binary_height / stagger.len() as f64;
            let mut y = self.species.node(bottom).y.unwrap_or_default() - self.binary_height;
            for g in stagger {
                self.genes[g.tree].node_mut(g.node).y = Some(y);
                y += step;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::recon::aggregate::aggregate;
    use crate::libs::recon::gene::GeneNode;
    use crate::libs::recon::species::Parasite;
    use crate::libs::recon::stream::parse_stream;
    use approx::assert_relative_eq;

    const TREE: &str = "((A:1,B:1)X:1,C:2)R;";

    // 600 x 300 inside the paddings; leaf columns of 170, slices of 100
    fn small() -> LayoutConfig {
        LayoutConfig {
            width: 700.0,
            height: 400.0,
            ..LayoutConfig::default()
        }
    }

    fn collect(streams: &[&str]) -> Composite {
        let mut c = Composite::from_newick(TREE).unwrap();
        for (i, text) in streams.iter().enumerate() {
            let tree = parse_stream(&c, &format!("fam{}", i), text).unwrap();
            c.gene_trees.push(tree);
        }
        aggregate(&mut c).unwrap();
        c
    }

    fn run(streams: &[&str]) -> Composite {
        let mut c = collect(streams);
        layout(&mut c, &small()).unwrap();
        c
    }

    fn species_id(c: &Composite, unique_name: &str) -> NodeId {
        c.species
            .nodes()
            .iter()
            .find(|n| n.unique_name == unique_name)
            .unwrap()
            .id
    }

    fn gene_ref(c: &Composite, name: &str) -> GeneRef {
        let node = c.gene_trees[0]
            .nodes
            .iter()
            .find(|n| n.name == name)
            .unwrap();
        GeneRef {
            tree: 0,
            node: node.id,
        }
    }

    fn host_xy(c: &Composite, unique_name: &str) -> (f64, f64) {
        let node = c
            .species
            .nodes()
            .iter()
            .find(|n| n.unique_name == unique_name)
            .unwrap();
        (node.x.unwrap(), node.y.unwrap())
    }

    fn gene_xy(c: &Composite, name: &str) -> Vec<(f64, f64)> {
        c.gene_trees[0]
            .nodes
            .iter()
            .filter(|n| n.name == name)
            .map(|n: &GeneNode| (n.x.unwrap(), n.y.unwrap()))
            .collect()
    }

    #[test]
    fn test_config() {
        let config = LayoutConfig::default();
        assert_relative_eq!(config.inner_width(), 4700.0);
        assert_relative_eq!(config.inner_height(), 2600.0);
        assert_relative_eq!(config.unary(), 0.6);

        let config = LayoutConfig::from_json(r#"{"binary": 0.5, "pad_left": 0}"#).unwrap();
        assert_relative_eq!(config.binary, 0.5);
        assert_relative_eq!(config.inner_width(), 4750.0);
        assert_relative_eq!(config.main, 0.85);

        assert!(matches!(
            LayoutConfig::from_json("{\"width\": \"wide\"}"),
            Err(ReconError::Json(_))
        ));
    }

    #[test]
    fn test_hosts() {
        let c = run(&[]);
        let frame = c.frame.clone().unwrap();
        assert_relative_eq!(frame.max_leaf_width, 170.0);
        assert_relative_eq!(frame.inner_leaf_width, 85.0);
        assert_relative_eq!(frame.slice_height, 100.0);

        let (x, y) = host_xy(&c, "SC");
        assert_relative_eq!(x, 165.0);
        assert_relative_eq!(y, 350.0);
        assert_relative_eq!(host_xy(&c, "SA").0, 335.0);
        assert_relative_eq!(host_xy(&c, "SB").0, 505.0);

        let (x, y) = host_xy(&c, "I0");
        assert_relative_eq!(x, 165.0);
        assert_relative_eq!(y, 250.0);
        let (x, y) = host_xy(&c, "X");
        assert_relative_eq!(x, 420.0);
        assert_relative_eq!(y, 250.0);
        let (x, y) = host_xy(&c, "R");
        assert_relative_eq!(x, 292.5);
        assert_relative_eq!(y, 150.0);

        for (depth, &id) in c.dead_chain.iter().enumerate() {
            let node = c.species.node(id);
            assert_relative_eq!(node.x.unwrap(), 620.0);
            assert_relative_eq!(node.y.unwrap(), 150.0 + 100.0 * depth as f64);
        }
        assert!(c.species.node(c.pseudo_root).x.is_none());
    }

    #[test]
    fn test_duplication_tracks() {
        let c = run(&["g0:X,D,X,X:A_1,A_2"]);

        // one track on X, through the unary part
        let g0 = gene_xy(&c, "g0")[0];
        assert_relative_eq!(g0.0, 420.0);
        assert_relative_eq!(g0.1, 210.0);

        // two tracks on SA, inherited order from the duplication
        let a1 = gene_xy(&c, "A_1")[0];
        let a2 = gene_xy(&c, "A_2")[0];
        assert_relative_eq!(a2.0, 313.75);
        assert_relative_eq!(a1.0, 356.25);
        assert_relative_eq!(a1.1, 350.0);
        assert_relative_eq!(a2.1, 350.0);
    }

    #[test]
    fn test_speciation_stagger_and_loss() {
        let c = run(&["X_1:R,SL,C,X;X,S,X,X:A_1,B_1"]);

        let x1 = gene_xy(&c, "X_1");
        // SL at the root, staggered above the edge bottom
        assert_relative_eq!(x1[0].0, 292.5);
        assert_relative_eq!(x1[0].1, 110.0);
        // S at X
        assert_relative_eq!(x1[1].0, 420.0);
        assert_relative_eq!(x1[1].1, 210.0);

        // the loss rides the lineage of C at I0
        let loss = gene_xy(&c, "loss0")[0];
        assert_relative_eq!(loss.0, 165.0);
        assert_relative_eq!(loss.1, 210.0);

        let a1 = gene_xy(&c, "A_1")[0];
        assert_relative_eq!(a1.0, 335.0);
        assert_relative_eq!(a1.1, 350.0);
        let b1 = gene_xy(&c, "B_1")[0];
        assert_relative_eq!(b1.0, 505.0);
        assert_relative_eq!(b1.1, 350.0);
    }

    #[test]
    fn test_every_hosted_gene_placed() {
        let c = run(&[
            "g0:X,T,X,C:A_1,C_1",
            "g0:X,TTD,X,-1:A_1,B_1\nB_1:X,TTD,X,-1;-1,TLFD,-1,B",
        ]);
        for tree in &c.gene_trees {
            for node in &tree.nodes {
                assert!(node.host.is_some(), "{}", node.name);
                assert!(node.x.is_some(), "{} has no x", node.name);
                assert!(node.y.is_some(), "{} has no y", node.name);
            }
        }

        // the transferred copy sits on the C lineage column
        let received = c.gene_trees[0]
            .nodes
            .iter()
            .find(|n| n.name == "C_1" && n.primary().unwrap().event == EventTag::T0)
            .unwrap();
        assert_relative_eq!(received.x.unwrap(), 165.0);
    }

    #[test]
    fn test_layout_repeatable() {
        let mut c = run(&["g0:X,D,X,X:A_1,A_2", "X_1:R,SL,C,X;X,S,X,X:A_1,B_1"]);
        let before = c.to_json().unwrap();
        aggregate(&mut c).unwrap();
        layout(&mut c, &small()).unwrap();
        assert_eq!(before, c.to_json().unwrap());
    }

    #[test]
    fn test_track_assignment_stalls() {
        let mut c = collect(&["g0:X,D,X,X:g1,A_2\ng1:X,D,X,X;X,D,X,X:A_1,A_3"]);
        let x = species_id(&c, "X");
        let (g1, a1) = (gene_ref(&c, "g1"), gene_ref(&c, "A_1"));

        // g0 rides X with neither of its children
        let parasites = &mut c.species.node_mut(x).parasites;
        parasites.retain(|p| p.gene != g1);
        parasites.push(Parasite {
            gene: a1,
            event: EventTag::C,
        });

        match layout(&mut c, &small()) {
            Err(ReconError::TrackAssignment { host, pending }) => {
                assert_eq!(host, "X");
                assert_eq!(pending, 1);
            }
            other => panic!("Expected TrackAssignment, got {:?}", other),
        }
    }

    #[test]
    fn test_unplaced_gene() {
        let mut c = collect(&["g0:X,D,X,X:A_1,A_2"]);
        let sa = species_id(&c, "SA");
        let a2 = gene_ref(&c, "A_2");
        c.species.node_mut(sa).parasites.retain(|p| p.gene != a2);

        match layout(&mut c, &small()) {
            Err(ReconError::Inconsistent { gene, reason }) => {
                assert_eq!(gene, "A_2");
                assert_eq!(reason, "no coordinates (host SA)");
            }
            other => panic!("Expected Inconsistent, got {:?}", other),
        }
        assert!(c.frame.is_none());
    }
}
