//! Error types for graph loading and kernel setup.
//!
//! Kernels themselves have no runtime error path; everything here is raised while
//! reading input, building a graph, or validating user-supplied parameters.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for failures that are not a [`GraphError`].
pub const EXIT_FAILURE: u8 = 1;

/// Exit code clap uses for command-line usage errors.
pub const EXIT_USAGE: u8 = 2;

/// Exit code when a kernel result fails verification.
pub const EXIT_VERIFY_FAILED: u8 = 3;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Failures surfaced to the caller (and mapped to exit codes by the CLI).
#[derive(Debug, Error)]
pub enum GraphError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The input path has no `.suffix` to select a reader.
    #[error("couldn't find suffix of {0}")]
    MissingSuffix(PathBuf),

    /// The input suffix is not a known graph format.
    #[error("unrecognized suffix: {0}")]
    UnknownSuffix(String),

    /// A text input line could not be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// A serialized graph does not match the requested node/weight width or kind.
    #[error("serialized graph type mismatch: expected {expected}, found {found}")]
    TypeWidth {
        /// What the caller asked for.
        expected: String,
        /// What the file contains.
        found: String,
    },

    /// A serialized graph has inconsistent offsets or neighbor IDs.
    #[error("{}: corrupt serialized graph: {message}", path.display())]
    Corrupt {
        /// File being read.
        path: PathBuf,
        /// Which check failed.
        message: String,
    },

    /// A requested source vertex is outside `0..num_nodes`.
    #[error("source {source_id} out of range for graph with {num_nodes} nodes")]
    SourceOutOfRange {
        /// Requested source.
        source_id: i64,
        /// Node count of the graph.
        num_nodes: usize,
    },

    /// The graph has no node (or no edge) to start a kernel from.
    #[error("graph has no vertex with outgoing edges")]
    EmptyGraph,

    /// Delta-stepping needs a strictly positive bucket width.
    #[error("delta must be positive, got {0}")]
    InvalidDelta(i64),

    /// The kernel needs an undirected graph.
    #[error("{0} requires an undirected graph")]
    DirectedInput(&'static str),

    /// Degree relabeling is defined only for undirected graphs.
    #[error("cannot relabel directed graph")]
    DirectedRelabel,

    /// A configuration file could not be decoded.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl GraphError {
    /// Process exit code for this failure.
    ///
    /// Each variant gets its own code in `10..=21`, clear of [`EXIT_FAILURE`],
    /// [`EXIT_USAGE`] and [`EXIT_VERIFY_FAILED`].
    pub fn exit_code(&self) -> u8 {
        match self {
            GraphError::MissingSuffix(_) => 10,
            GraphError::Io(_) => 11,
            GraphError::UnknownSuffix(_) => 12,
            GraphError::Parse { .. } => 13,
            GraphError::TypeWidth { .. } => 14,
            GraphError::SourceOutOfRange { .. } => 15,
            GraphError::EmptyGraph => 16,
            GraphError::InvalidDelta(_) => 17,
            GraphError::Corrupt { .. } => 18,
            GraphError::DirectedInput(_) => 19,
            GraphError::DirectedRelabel => 20,
            GraphError::Config(_) => 21,
        }
    }
}
