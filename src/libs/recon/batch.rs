//! The whole pipeline: species tree in, laid-out composite out.

use super::aggregate::aggregate;
use super::composite::Composite;
use super::error::ReconError;
use super::gene::GeneTree;
use super::layout::{layout, LayoutConfig};
use super::stream::parse_stream;
use log::info;
use std::io::Read;

/// One solver output, labelled by where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconStream {
    pub source: String,
    pub text: String,
}

impl ReconStream {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }

    /// Reads a stream from a file ("stdin" reads standard input).
    pub fn from_file(infile: &str) -> anyhow::Result<Self> {
        let mut reader = intspan::reader(infile);
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| anyhow::anyhow!("Read error on {}: {}", infile, e))?;
        Ok(Self::new(infile, text))
    }
}

fn parse_one(composite: &Composite, stream: &ReconStream) -> Result<GeneTree, ReconError> {
    let tree = parse_stream(composite, &stream.source, &stream.text)?;
    info!(
        "Parsed {}: {} gene nodes, events {}",
        tree.source,
        tree.len(),
        itertools::join(
            tree.event_counts.iter().map(|(tag, n)| format!("{}={}", tag, n)),
            ","
        )
    );
    Ok(tree)
}

/// Parses every stream against `composite`, in input order.
///
/// With more than one thread the streams are spread over a worker pool; the
/// result is the same as a sequential run. The first failing stream, in
/// input order, decides the error.
pub fn parse_all(
    composite: &Composite,
    streams: &[ReconStream],
    threads: usize,
) -> Result<Vec<GeneTree>, ReconError> {
    if threads <= 1 || streams.len() <= 1 {
        return streams.iter().map(|s| parse_one(composite, s)).collect();
    }

    // Channel 1 - Jobs
    let (snd1, rcv1) = crossbeam::channel::bounded::<(usize, &ReconStream)>(10);
    // Channel 2 - Results
    let (snd2, rcv2) = crossbeam::channel::bounded(10);

    let mut results: Vec<Option<Result<GeneTree, ReconError>>> =
        (0..streams.len()).map(|_| None).collect();

    crossbeam::scope(|s| {
        s.spawn(|_| {
            for job in streams.iter().enumerate() {
                if snd1.send(job).is_err() {
                    break;
                }
            }
            drop(snd1);
        });

        for _ in 0..threads.min(streams.len()) {
            let (sendr, recvr) = (snd2.clone(), rcv1.clone());
            s.spawn(move |_| {
                for (i, stream) in recvr.iter() {
                    if sendr.send((i, parse_one(composite, stream))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(snd2);

        for (i, result) in rcv2.iter() {
            results[i] = Some(result);
        }
    })
    .map_err(|e| {
        let message = e
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| e.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ReconError::Worker(message)
    })?;

    results
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            r.unwrap_or_else(|| Err(ReconError::Worker(format!("stream {} was not parsed", i))))
        })
        .collect()
}

/// Builds the composite for `species_newick`, parses every stream onto it,
/// aggregates and lays out.
pub fn reconcile(
    species_newick: &str,
    streams: &[ReconStream],
    config: &LayoutConfig,
    threads: usize,
) -> Result<Composite, ReconError> {
    let mut composite = Composite::from_newick(species_newick)?;
    info!(
        "Composite: {} species nodes, {} slices",
        composite.species.len(),
        composite.slices.len()
    );

    composite.gene_trees = parse_all(&composite, streams, threads)?;
    info!("Parsed {} gene trees", composite.gene_trees.len());

    aggregate(&mut composite)?;
    layout(&mut composite, config)?;
    info!("Layout done");

    Ok(composite)
}
