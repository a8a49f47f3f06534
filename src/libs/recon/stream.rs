//! Parser for reconciliation streams.
//!
//! Each line names a gene and the events it went through, e.g.
//!
//! ```text
//! g0
//! g0: 4,T,4,3@0.9 : A_1,C_1
//! A_1: 4,T,4,3; 4,SL,B,A
//! ```
//!
//! The first event of a line whose gene already hangs below a parent repeats
//! the parent's event and is skipped.

use super::composite::Composite;
use super::error::ReconError;
use super::event::{Event, EventTag, DEAD_ID};
use super::gene::{GeneKind, GeneTree, Mapping};
use crate::libs::phylo::parser::{make_tree_error, ws, DetailedError};
use crate::libs::phylo::{NodeId, TreeError};
use itertools::Itertools;
use log::{debug, info};
use nom::{
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{all_consuming, map, opt},
    error::context,
    multi::separated_list1,
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};
use std::collections::HashMap;

// ================================================================================================
// Line grammar
// ================================================================================================

#[derive(Debug, PartialEq)]
struct RawEvent<'a> {
    species: &'a str,
    tag: &'a str,
    aux_left: &'a str,
    aux_right: &'a str,
    support: f64,
}

#[derive(Debug, PartialEq)]
struct RawLine<'a> {
    gene: &'a str,
    events: Vec<RawEvent<'a>>,
    children: Option<(&'a str, &'a str)>,
}

// Ids and tags: anything up to a separator or whitespace
fn token(input: &str) -> IResult<&str, &str, DetailedError<'_>> {
    context(
        "token",
        ws(take_while1(|c: char| !",:;@".contains(c) && !c.is_whitespace())),
    )
    .parse(input)
}

// '@' followed by an optional number; a bare '@' means full support
fn parse_support(input: &str) -> IResult<&str, f64, DetailedError<'_>> {
    context(
        "support",
        map(preceded(ws(char('@')), opt(ws(double))), |s| s.unwrap_or(1.0)),
    )
    .parse(input)
}

fn parse_event(input: &str) -> IResult<&str, RawEvent<'_>, DetailedError<'_>> {
    context(
        "event",
        map(
            (
                token,
                char(','),
                token,
                char(','),
                token,
                char(','),
                token,
                opt(parse_support),
            ),
            |(species, _, tag, _, aux_left, _, aux_right, support)| RawEvent {
                species,
                tag,
                aux_left,
                aux_right,
                support: support.unwrap_or(1.0),
            },
        ),
    )
    .parse(input)
}

fn parse_children(input: &str) -> IResult<&str, (&str, &str), DetailedError<'_>> {
    context(
        "children",
        map(
            preceded(char(':'), (token, char(','), token)),
            |(l, _, r)| (l, r),
        ),
    )
    .parse(input)
}

fn parse_line(input: &str) -> IResult<&str, RawLine<'_>, DetailedError<'_>> {
    let events = preceded(char(':'), separated_list1(char(';'), parse_event));

    map(
        all_consuming((token, opt((events, opt(parse_children))))),
        |(gene, rest)| match rest {
            Some((events, children)) => RawLine {
                gene,
                events,
                children,
            },
            None => RawLine {
                gene,
                events: Vec::new(),
                children: None,
            },
        },
    )
    .parse(input)
}

// ================================================================================================
// Gene tree construction
// ================================================================================================

/// Rebuilds one gene tree line by line against a composite species arena.
pub struct EventParser<'a> {
    composite: &'a Composite,
    tree: GeneTree,
    /// Gene id -> node that the next line with this id continues from
    frontier: HashMap<String, NodeId>,
    losses: usize,
    line: usize,
}

impl<'a> EventParser<'a> {
    pub fn new(composite: &'a Composite, source: impl Into<String>) -> Self {
        Self {
            composite,
            tree: GeneTree::new(source),
            frontier: HashMap::new(),
            losses: 0,
            line: 0,
        }
    }

    /// Feeds the next line of the stream.
    pub fn feed(&mut self, text: &str) -> Result<(), ReconError> {
        self.line += 1;
        if text.trim().is_empty() {
            return Ok(());
        }

        let raw = match parse_line(text) {
            Ok((_, raw)) => raw,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(self.syntax_error(make_tree_error(text, e)))
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(ReconError::Syntax {
                    line: self.line,
                    message: "incomplete line".to_string(),
                })
            }
        };

        let mut events = raw
            .events
            .iter()
            .map(|e| self.to_event(e))
            .collect::<Result<Vec<_>, _>>()?;

        let current = match self.tree.root {
            None => {
                let id = self.tree.add_node(raw.gene, GeneKind::Lineage);
                self.tree.root = Some(id);
                self.frontier.insert(raw.gene.to_string(), id);
                id
            }
            Some(_) => *self
                .frontier
                .get(raw.gene)
                .ok_or_else(|| ReconError::UndeclaredGene {
                    id: raw.gene.to_string(),
                    line: self.line,
                })?,
        };

        if self.tree.node(current).parent.is_some() && !events.is_empty() {
            events.remove(0);
        }

        self.check_shape(&events, raw.children)?;

        let mut current = current;
        for event in &events {
            *self.tree.event_counts.entry(event.tag).or_insert(0) += 1;
            debug!(
                "{} line {}: {} at {} ({}, {}) on {}",
                self.tree.source,
                self.line,
                event.tag,
                event.species,
                event.aux_left,
                event.aux_right,
                self.tree.node(current).name
            );
            current = self.apply(current, event, raw.children)?;
        }

        if raw.children.is_none() {
            self.frontier.insert(raw.gene.to_string(), current);
        }

        Ok(())
    }

    /// Completes contemporary mappings and hands over the gene tree.
    pub fn finish(mut self) -> Result<GeneTree, ReconError> {
        if self.tree.root.is_none() {
            return Err(ReconError::EmptyStream {
                stream: self.tree.source.clone(),
            });
        }

        for id in self.tree.leaves() {
            let node = self.tree.node(id);
            if node.kind == GeneKind::Loss || !node.mapped_to.is_empty() {
                continue;
            }
            let species = node.name.split('_').next().unwrap_or_default();
            let host = self.composite.index.lookup_leaf(species).ok_or_else(|| {
                ReconError::UnmappedLeaf {
                    gene: node.name.clone(),
                    species: species.to_string(),
                }
            })?;
            self.tree.node_mut(id).mapped_to.push(Mapping {
                host,
                event: EventTag::C,
                support: 1.0,
            });
        }

        info!(
            "{}: {} gene nodes; events {}",
            self.tree.source,
            self.tree.len(),
            self.tree
                .event_counts
                .iter()
                .map(|(tag, n)| format!("{}={}", tag, n))
                .join(" ")
        );

        Ok(self.tree)
    }

    fn syntax_error(&self, e: TreeError) -> ReconError {
        let message = match e {
            TreeError::ParseError {
                message,
                column,
                snippet,
                ..
            } => format!(
                "column {}: {} near \"{}\"",
                column,
                message.lines().map(str::trim).join(" "),
                snippet
            ),
            TreeError::LogicError(msg) => msg,
        };
        ReconError::Syntax {
            line: self.line,
            message,
        }
    }

    fn to_event(&self, raw: &RawEvent) -> Result<Event, ReconError> {
        let tag = EventTag::from_solver(raw.tag).ok_or_else(|| ReconError::UnknownTag {
            tag: raw.tag.to_string(),
            line: self.line,
        })?;
        let event = Event {
            species: raw.species.to_string(),
            tag,
            aux_left: raw.aux_left.to_string(),
            aux_right: raw.aux_right.to_string(),
            support: raw.support,
        };
        event.validate().map_err(|reason| self.invalid(tag, reason))?;
        for id in [&event.species, &event.aux_left, &event.aux_right] {
            if id != DEAD_ID {
                self.resolve(id)?;
            }
        }
        Ok(event)
    }

    fn invalid(&self, tag: EventTag, reason: impl Into<String>) -> ReconError {
        ReconError::InvalidEvent {
            tag: tag.to_string(),
            line: self.line,
            reason: reason.into(),
        }
    }

    // A binary event closes the line and needs the two child ids; nothing else may
    // carry children.
    fn check_shape(
        &self,
        events: &[Event],
        children: Option<(&str, &str)>,
    ) -> Result<(), ReconError> {
        for (i, event) in events.iter().enumerate() {
            if event.tag.is_binary() && i + 1 != events.len() {
                return Err(self.invalid(event.tag, "binary event must end the line"));
            }
        }
        match (events.last(), children) {
            (Some(last), None) if last.tag.is_binary() => {
                Err(self.invalid(last.tag, "binary event without child ids"))
            }
            (Some(last), Some(_)) if !last.tag.is_binary() => {
                Err(self.invalid(last.tag, "child ids after a unary event"))
            }
            (None, Some((l, r))) => Err(ReconError::Syntax {
                line: self.line,
                message: format!("children {},{} without a binary event", l, r),
            }),
            _ => Ok(()),
        }
    }

    fn resolve(&self, id: &str) -> Result<NodeId, ReconError> {
        self.composite.index.resolve(id, self.line)
    }

    fn map(&mut self, gene: NodeId, host: NodeId, event: EventTag, support: f64) {
        self.tree.node_mut(gene).mapped_to.push(Mapping {
            host,
            event,
            support,
        });
    }

    fn add_lineage(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.tree.add_node(name, GeneKind::Lineage);
        self.tree.add_child(parent, id);
        id
    }

    // Same gene id, one level further down
    fn continuation(&mut self, parent: NodeId) -> NodeId {
        let name = self.tree.node(parent).name.clone();
        self.add_lineage(parent, &name)
    }

    fn add_loss(&mut self, parent: NodeId, host: NodeId, support: f64) {
        let id = self
            .tree
            .add_node(format!("loss{}", self.losses), GeneKind::Loss);
        self.losses += 1;
        self.tree.add_child(parent, id);
        self.map(id, host, EventTag::Loss, support);
    }

    /// Applies one event to `current`; returns the node the line continues from.
    fn apply(
        &mut self,
        current: NodeId,
        event: &Event,
        children: Option<(&str, &str)>,
    ) -> Result<NodeId, ReconError> {
        let s = self.resolve(&event.species)?;
        let support = event.support;
        self.map(current, s, event.tag, support);

        match event.tag {
            EventTag::S | EventTag::D | EventTag::DD => {
                self.split(current, children, |_, _| Ok(None))?;
            }
            EventTag::T | EventTag::TFD => {
                // The child whose aux is not the donor receives the transfer
                let left_receives = if event.tag == EventTag::T {
                    event.aux_left != event.species
                } else {
                    event.aux_left != DEAD_ID
                };
                let recipient = if left_receives {
                    self.resolve(&event.aux_left)?
                } else {
                    self.resolve(&event.aux_right)?
                };
                self.split(current, children, |l, r| {
                    Ok(Some((
                        if left_receives { l } else { r },
                        recipient,
                        EventTag::T0,
                    )))
                })?;
            }
            EventTag::TTD => {
                let left_dies = event.aux_left == DEAD_ID;
                let dead_top = self.composite.dead_top();
                self.split(current, children, |l, r| {
                    Ok(Some((if left_dies { l } else { r }, dead_top, EventTag::Dead0)))
                })?;
            }
            EventTag::SL => {
                let lost = self.resolve(&event.aux_left)?;
                self.add_loss(current, lost, support);
                return Ok(self.continuation(current));
            }
            EventTag::TL => {
                let lost = self.resolve(&event.aux_left)?;
                let recipient = self.resolve(&event.aux_right)?;
                self.add_loss(current, lost, support);
                let received = self.continuation(current);
                self.map(received, recipient, EventTag::T0, support);
                return Ok(self.continuation(received));
            }
            EventTag::TLTD => {
                let lost = self.resolve(&event.aux_left)?;
                let dead_top = self.composite.dead_top();
                self.add_loss(current, lost, support);
                let entry = self.continuation(current);
                self.map(entry, dead_top, EventTag::Dead0, support);
                let inside = self.continuation(entry);
                self.map(inside, dead_top, EventTag::Dead0, support);
                return Ok(inside);
            }
            EventTag::TLFD => {
                let recipient = self.resolve(&event.aux_right)?;
                let received = self.continuation(current);
                self.map(received, recipient, EventTag::T0, support);
                return Ok(self.continuation(received));
            }
            EventTag::C | EventTag::T0 | EventTag::Loss | EventTag::Dead0 => {
                return Err(self.invalid(event.tag, "not a solver event"));
            }
        }

        Ok(current)
    }

    /// Adds both children of a binary event. `special` may pick one child that
    /// gets an extra mapping and continues one level further down.
    fn split<F>(
        &mut self,
        current: NodeId,
        children: Option<(&str, &str)>,
        special: F,
    ) -> Result<(), ReconError>
    where
        F: FnOnce(NodeId, NodeId) -> Result<Option<(NodeId, NodeId, EventTag)>, ReconError>,
    {
        let (left_name, right_name) = match children {
            Some(c) => c,
            None => {
                return Err(ReconError::Syntax {
                    line: self.line,
                    message: "binary event without child ids".to_string(),
                })
            }
        };
        if left_name == right_name {
            return Err(ReconError::Syntax {
                line: self.line,
                message: format!("both children are named {}", left_name),
            });
        }

        let gene = self.tree.node(current).name.clone();
        self.frontier.remove(&gene);

        let left = self.add_lineage(current, left_name);
        let right = self.add_lineage(current, right_name);
        let mut frontier = [(left_name, left), (right_name, right)];

        if let Some((tip, host, tag)) = special(left, right)? {
            let support = self
                .tree
                .node(current)
                .mapped_to
                .last()
                .map_or(1.0, |m| m.support);
            self.map(tip, host, tag, support);
            let next = self.continuation(tip);
            for slot in frontier.iter_mut() {
                if slot.1 == tip {
                    slot.1 = next;
                }
            }
        }

        for (name, id) in frontier {
            if self.frontier.insert(name.to_string(), id).is_some() {
                return Err(ReconError::Syntax {
                    line: self.line,
                    message: format!("gene {} is declared twice", name),
                });
            }
        }
        Ok(())
    }
}

/// Parses a whole stream into a gene tree.
pub fn parse_stream(
    composite: &Composite,
    source: &str,
    text: &str,
) -> Result<GeneTree, ReconError> {
    let mut parser = EventParser::new(composite, source);
    for line in text.lines() {
        parser.feed(line)?;
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::recon::gene::GeneNode;

    fn composite(newick: &str) -> Composite {
        Composite::from_newick(newick).unwrap()
    }

    fn name_of(c: &Composite, id: NodeId) -> &str {
        c.species.node(id).unique_name.as_str()
    }

    fn find<'t>(tree: &'t GeneTree, name: &str) -> Vec<&'t GeneNode> {
        tree.nodes.iter().filter(|n| n.name == name).collect()
    }

    #[test]
    fn test_line_grammar() {
        let (_, raw) = parse_line(" g0 : 4 , S , 1 , 2 @ 0.5 ; 4,SL,1,2@ : a , b ").unwrap();
        assert_eq!(raw.gene, "g0");
        assert_eq!(raw.events.len(), 2);
        assert_eq!(raw.events[0].species, "4");
        assert_eq!(raw.events[0].support, 0.5);
        assert_eq!(raw.events[1].tag, "SL");
        assert_eq!(raw.events[1].support, 1.0);
        assert_eq!(raw.children, Some(("a", "b")));

        let (_, raw) = parse_line("g0").unwrap();
        assert!(raw.events.is_empty());
        assert!(raw.children.is_none());

        let (_, raw) = parse_line("g0:'A',T,'A',-1").unwrap();
        assert_eq!(raw.events[0].species, "'A'");
        assert_eq!(raw.events[0].aux_right, "-1");

        assert!(parse_line("g0:4,S,1").is_err());
        assert!(parse_line("g0:4,S,1,2:a").is_err());
        assert!(parse_line("g0:4,S,1,2:a,b:c").is_err());
    }

    #[test]
    fn test_root_declaration_then_speciation() {
        let c = composite("((g1:1,g2:1)s1:1,C:2)R;");
        let tree = parse_stream(&c, "fam", "g0\ng0: s1,S,s1,s1 : g1,g2\n").unwrap();

        assert_eq!(tree.len(), 3);
        let root = tree.node(tree.root.unwrap());
        assert_eq!(root.name, "g0");
        let m = root.primary().unwrap();
        assert_eq!(name_of(&c, m.host), "s1");
        assert_eq!(m.event, EventTag::S);
        assert_eq!(m.support, 1.0);

        let kids: Vec<&str> = root
            .children
            .iter()
            .map(|&id| tree.node(id).name.as_str())
            .collect();
        assert_eq!(kids, vec!["g1", "g2"]);

        let g1 = find(&tree, "g1")[0];
        assert_eq!(g1.primary().unwrap().event, EventTag::C);
        assert_eq!(name_of(&c, g1.primary().unwrap().host), "Sg1");
        assert_eq!(tree.event_counts.get(&EventTag::S), Some(&1));
    }

    #[test]
    fn test_transfer_and_speciation_loss() {
        let c = composite("((A:1,B:1)X:1,C:2)R;");
        let text = "g0:X,T,X,C:A_1,C_1\nA_1:X,T,X,C;X,SL,B,A\n";
        let tree = parse_stream(&c, "fam", text).unwrap();

        // g0, A_1, C_1 (T0), C_1, loss0, A_1
        assert_eq!(tree.len(), 6);

        let c1 = find(&tree, "C_1");
        assert_eq!(c1.len(), 2);
        let tip = c1[0];
        assert_eq!(tip.primary().unwrap().event, EventTag::T0);
        assert_eq!(name_of(&c, tip.primary().unwrap().host), "SC");
        assert_eq!(tip.children, vec![c1[1].id]);
        assert_eq!(c1[1].primary().unwrap().event, EventTag::C);

        let a1 = find(&tree, "A_1");
        assert_eq!(a1[0].primary().unwrap().event, EventTag::SL);
        assert_eq!(a1[0].mapped_to.len(), 1);
        let loss = find(&tree, "loss0")[0];
        assert_eq!(loss.kind, GeneKind::Loss);
        assert_eq!(name_of(&c, loss.primary().unwrap().host), "SB");
        assert_eq!(name_of(&c, a1[1].primary().unwrap().host), "SA");

        assert_eq!(tree.event_counts.get(&EventTag::T), Some(&1));
        assert_eq!(tree.event_counts.get(&EventTag::SL), Some(&1));
    }

    #[test]
    fn test_dead_lineage_events() {
        let c = composite("((A:1,B:1)X:1,C:2)R;");
        let text = "\
g0:X,TTD,X,-1:A_1,D_1
D_1:X,TTD,X,-1;-1,DD,-1,-1:D_2,B_3
D_2:-1,DD,-1,-1;-1,TFD,-1,C:A_4,C_1
B_3:-1,DD,-1,-1;-1,TLFD,-1,B
A_4:-1,TFD,-1,C;-1,TLFD,-1,A
A_1:X,TTD,X,-1;X,TLTD,X,-1
";
        let tree = parse_stream(&c, "dead", text).unwrap();
        let top = c.dead_top();

        // D_1 receives the dead-lineage entry
        let d1 = find(&tree, "D_1");
        assert_eq!(d1[0].primary().unwrap().event, EventTag::Dead0);
        assert_eq!(d1[0].primary().unwrap().host, top);
        assert_eq!(d1[1].primary().unwrap().event, EventTag::DD);

        // TFD: C_1 receives from the dead lineage, A_4 stays inside
        let c1 = find(&tree, "C_1");
        assert_eq!(c1[0].primary().unwrap().event, EventTag::T0);
        assert_eq!(name_of(&c, c1[0].primary().unwrap().host), "SC");
        let a4 = find(&tree, "A_4");
        assert_eq!(a4.len(), 3);
        assert_eq!(a4[0].primary().unwrap().event, EventTag::TLFD);
        assert_eq!(a4[0].primary().unwrap().host, top);

        // TLFD: B_3 continues below a T0 node on B
        let b3 = find(&tree, "B_3");
        assert_eq!(b3.len(), 3);
        assert_eq!(b3[0].primary().unwrap().event, EventTag::TLFD);
        assert_eq!(b3[1].primary().unwrap().event, EventTag::T0);
        assert_eq!(b3[2].primary().unwrap().event, EventTag::C);
        assert_eq!(name_of(&c, b3[2].primary().unwrap().host), "SB");

        // TLTD: loss on X, then two dead entries
        let a1 = find(&tree, "A_1");
        assert_eq!(a1.len(), 3);
        assert_eq!(a1[0].primary().unwrap().event, EventTag::TLTD);
        assert_eq!(a1[0].children.len(), 2);
        assert_eq!(a1[1].primary().unwrap().event, EventTag::Dead0);
        assert_eq!(a1[2].primary().unwrap().event, EventTag::Dead0);
        assert_eq!(a1[2].parent, Some(a1[1].id));
        assert!(a1[2].is_leaf());

        assert_eq!(tree.event_counts.get(&EventTag::DD), Some(&1));
        assert_eq!(tree.event_counts.get(&EventTag::TLFD), Some(&2));
    }

    #[test]
    fn test_undeclared_gene() {
        let c = composite("((A:1,B:1)X:1,C:2)R;");
        match parse_stream(&c, "fam", "g0:R,S,X,C:A_1,C_1\nzz:X,S,A,B:A_2,B_2\n") {
            Err(ReconError::UndeclaredGene { id, line }) => {
                assert_eq!(id, "zz");
                assert_eq!(line, 2);
            }
            res => panic!("Expected UndeclaredGene, got {:?}", res),
        }

        // a retired id is no longer on the frontier
        assert!(matches!(
            parse_stream(&c, "fam", "g0:R,S,X,C:A_1,C_1\ng0:R,S,X,C:A_1,C_1\n"),
            Err(ReconError::UndeclaredGene { .. })
        ));
    }

    #[test]
    fn test_event_errors() {
        let c = composite("((A:1,B:1)X:1,C:2)R;");

        assert!(matches!(
            parse_stream(&c, "fam", "g0:X,Q,X,X:A_1,B_1"),
            Err(ReconError::UnknownTag { .. })
        ));
        assert!(matches!(
            parse_stream(&c, "fam", "g0:X,C,X,X:A_1,B_1"),
            Err(ReconError::UnknownTag { .. })
        ));
        assert!(matches!(
            parse_stream(&c, "fam", "g0:X,D,X,C:A_1,A_2"),
            Err(ReconError::InvalidEvent { .. })
        ));
        assert!(matches!(
            parse_stream(&c, "fam", "g0:ZZ,S,A,B:A_1,B_1"),
            Err(ReconError::UnknownSpecies { .. })
        ));
        // auxiliary ids are looked up too, even when no node is mapped on them
        match parse_stream(&c, "fam", "g0:X,S,ZZ,QQ:A_1,B_1") {
            Err(ReconError::UnknownSpecies { id, line }) => {
                assert_eq!(id, "ZZ");
                assert_eq!(line, 1);
            }
            res => panic!("Expected UnknownSpecies, got {:?}", res),
        }
        match parse_stream(&c, "fam", "X_1:R,SL,C,NOPE;X,S,A,B:A_1,B_1") {
            Err(ReconError::UnknownSpecies { id, .. }) => assert_eq!(id, "NOPE"),
            res => panic!("Expected UnknownSpecies, got {:?}", res),
        }
        // living-lineage tags never name the dead lineage
        assert!(matches!(
            parse_stream(&c, "fam", "g0:X,T,X,-1:A_1,B_1"),
            Err(ReconError::InvalidEvent { line: 1, .. })
        ));
        assert!(matches!(
            parse_stream(&c, "fam", "g0:-1,D,-1,-1:A_1,B_1"),
            Err(ReconError::InvalidEvent { .. })
        ));
        assert!(matches!(
            parse_stream(&c, "fam", "g0:X,T,X,C:A_1,C_1\nA_1:X,T,X,C;X,TL,X,-1"),
            Err(ReconError::InvalidEvent { line: 2, .. })
        ));
        assert!(matches!(
            parse_stream(&c, "fam", "g0:X,S,A"),
            Err(ReconError::Syntax { line: 1, .. })
        ));
        // binary event not last, missing children, children after unary
        assert!(matches!(
            parse_stream(&c, "fam", "g0:X,S,A,B;X,SL,B,A:A_1,B_1"),
            Err(ReconError::InvalidEvent { .. })
        ));
        assert!(matches!(
            parse_stream(&c, "fam", "g0:X,S,A,B"),
            Err(ReconError::InvalidEvent { .. })
        ));
        assert!(matches!(
            parse_stream(&c, "fam", "g0:X,SL,B,A:A_1,B_1"),
            Err(ReconError::InvalidEvent { .. })
        ));
    }

    #[test]
    fn test_finish_errors() {
        let c = composite("((A:1,B:1)X:1,C:2)R;");
        assert!(matches!(
            parse_stream(&c, "empty", "\n  \n"),
            Err(ReconError::EmptyStream { .. })
        ));
        match parse_stream(&c, "fam", "g0:X,S,A,B:A_1,Q_1") {
            Err(ReconError::UnmappedLeaf { gene, species }) => {
                assert_eq!(gene, "Q_1");
                assert_eq!(species, "Q");
            }
            res => panic!("Expected UnmappedLeaf, got {:?}", res),
        }
    }

    #[test]
    fn test_support_and_whitespace() {
        let c = composite("((A:1,B:1)X:1,C:2)R;");
        let text = "\n  g0 : X , S , A , B @ 0.75 : A_1 , B_1  \n\n";
        let tree = parse_stream(&c, "fam", text).unwrap();
        let root = tree.node(tree.root.unwrap());
        assert_eq!(root.primary().unwrap().support, 0.75);
        assert_eq!(tree.leaves().len(), 2);
    }
}
