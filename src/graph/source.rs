//! Graph acquisition: read a file or generate one, then build.

use std::path::PathBuf;

use crate::error::Result;
use crate::graph::builder::Builder;
use crate::graph::compressed::CompactGraph;
use crate::graph::generator::{insert_weights, Generator};
use crate::graph::io::{read_graph, Loaded};
use crate::graph::node::Destination;

/// Where the input graph comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphSource {
    /// A graph file; the suffix selects the reader.
    File(PathBuf),
    /// A synthetic graph of `2^scale` nodes and `degree * 2^scale` edges.
    Synthetic {
        /// Log2 of the node count.
        scale: u32,
        /// Average degree before deduplication.
        degree: usize,
        /// Uniform endpoints instead of Kronecker.
        uniform: bool,
    },
}

/// Produces a finished graph from `source`.
///
/// Edge lists without weights get random weights when `D` is weighted. Serialized
/// graphs are returned as stored; `symmetrize` applies only to edge lists.
///
/// # Errors
/// Any reader error for file sources.
pub fn make_graph<D: Destination>(source: &GraphSource, symmetrize: bool) -> Result<CompactGraph<D>> {
    let builder = Builder::new().symmetrize(symmetrize);
    let graph = match source {
        GraphSource::File(path) => match read_graph::<D>(path)? {
            Loaded::Graph(g) => g,
            Loaded::Edges {
                mut edges,
                has_weights,
            } => {
                if !has_weights {
                    insert_weights(&mut edges);
                }
                builder.build(&edges)
            }
        },
        GraphSource::Synthetic {
            scale,
            degree,
            uniform,
        } => {
            let mut edges = Generator::new(*scale, *degree).generate::<D>(*uniform);
            insert_weights(&mut edges);
            builder.num_nodes(1usize << *scale).build(&edges)
        }
    };
    Ok(graph)
}
