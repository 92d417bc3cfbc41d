//! Graph file readers and writers, dispatched on file suffix.

/// Serialized binary graphs.
pub mod serialized;
/// Text edge lists and adjacency files.
pub mod text;

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::error::{GraphError, Result};
use crate::graph::compressed::CompactGraph;
use crate::graph::node::{Destination, EdgeList};

pub use serialized::{read_serialized, write_serialized};
pub use text::{read_text, write_text, TextFormat};

/// File format inferred from a path's suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphFormat {
    /// Parsed into an edge list and then built.
    Text(TextFormat),
    /// Already compact; `true` for `.wsg`.
    Serialized {
        /// Whether entries carry weights.
        weighted: bool,
    },
}

impl GraphFormat {
    /// Maps `.el`, `.wel`, `.gr`, `.graph`, `.sg`, and `.wsg` to a format.
    ///
    /// # Errors
    /// [`GraphError::MissingSuffix`] or [`GraphError::UnknownSuffix`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let suffix = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| GraphError::MissingSuffix(path.to_path_buf()))?;
        Ok(match suffix {
            "el" => GraphFormat::Text(TextFormat::EdgeList),
            "wel" => GraphFormat::Text(TextFormat::WeightedEdgeList),
            "gr" => GraphFormat::Text(TextFormat::Dimacs),
            "graph" => GraphFormat::Text(TextFormat::Metis),
            "sg" => GraphFormat::Serialized { weighted: false },
            "wsg" => GraphFormat::Serialized { weighted: true },
            other => return Err(GraphError::UnknownSuffix(format!(".{other}"))),
        })
    }
}

/// What a graph file yields before construction.
#[derive(Debug)]
pub enum Loaded<D: Destination> {
    /// Raw edges; `has_weights` is false when weights still need to be generated.
    Edges {
        /// Unsorted edges as read.
        edges: EdgeList<D>,
        /// Whether the file supplied weights.
        has_weights: bool,
    },
    /// A finished graph (serialized input).
    Graph(CompactGraph<D>),
}

/// Reads any supported graph file.
///
/// # Errors
/// Suffix, I/O, parse, and type-width errors from the selected reader.
pub fn read_graph<D: Destination>(path: &Path) -> Result<Loaded<D>> {
    match GraphFormat::from_path(path)? {
        GraphFormat::Serialized { weighted } => read_serialized(path, weighted).map(Loaded::Graph),
        GraphFormat::Text(format) => {
            let start = Instant::now();
            let edges = read_text(path, format)?;
            info!(elapsed = ?start.elapsed(), edges = edges.len(), "read time");
            Ok(Loaded::Edges {
                edges,
                has_weights: format.has_weights(),
            })
        }
    }
}

/// Writes `g` in the format implied by `path`'s suffix.
///
/// # Errors
/// Suffix errors, [`GraphError::TypeWidth`] when the suffix's weightedness disagrees
/// with `D`, and I/O failures.
pub fn write_graph<D: Destination>(g: &CompactGraph<D>, path: &Path) -> Result<()> {
    let format = GraphFormat::from_path(path)?;
    let weighted = match format {
        GraphFormat::Serialized { weighted } => weighted,
        GraphFormat::Text(TextFormat::EdgeList) => false,
        GraphFormat::Text(TextFormat::WeightedEdgeList) => true,
        GraphFormat::Text(other) => {
            return Err(GraphError::UnknownSuffix(format!("{other:?} is read-only")))
        }
    };
    if weighted != D::WEIGHTED {
        return Err(GraphError::TypeWidth {
            expected: if weighted { "weighted graph" } else { "unweighted graph" }.into(),
            found: if D::WEIGHTED { "weighted graph" } else { "unweighted graph" }.into(),
        });
    }
    match format {
        GraphFormat::Serialized { .. } => write_serialized(g, path),
        GraphFormat::Text(_) => write_text(g, path),
    }
}
