//! Graph kernels.
//!
//! Every kernel takes a finished [`CompactGraph`](crate::graph::CompactGraph) plus an
//! explicit parameter struct, runs on the current rayon pool, and returns a
//! per-vertex result array (or a scalar for triangle counting).
//!
//! Important:
//! - Kernels have no error path; invalid arguments are caller bugs and panic.
//!   Validate user input with [`SourcePicker`](crate::benchmark::SourcePicker) first.
//! - Per-vertex state is claimed with a CAS on its sentinel value, so each slot has
//!   exactly one winning writer per round.

/// Approximate betweenness centrality.
pub mod bc;
/// Direction-optimizing breadth-first search.
pub mod bfs;
/// Connected components.
pub mod cc;
/// PageRank.
pub mod pagerank;
/// Delta-stepping shortest paths.
pub mod sssp;
/// Triangle counting.
pub mod tc;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use bc::{brandes, BcConfig};
pub use bfs::{direction_optimizing_bfs, BfsConfig};
pub use cc::{afforest, shiloach_vishkin, AfforestConfig};
pub use pagerank::{pagerank_pull, PageRankConfig};
pub use sssp::{delta_step, SsspConfig};
pub use tc::{ordered_count, triangle_count, Relabel, TriangleConfig};

/// Parameters of every kernel, loadable from one JSON file.
///
/// Missing sections and fields keep their defaults:
///
/// ```
/// use gapkern::algo::KernelConfig;
///
/// let config = KernelConfig::from_json(r#"{ "bfs": { "alpha": 15 }, "sssp": { "delta": 2 } }"#).unwrap();
/// assert_eq!(config.bfs.alpha, 15);
/// assert_eq!(config.bfs.beta, 72);
/// assert_eq!(config.pagerank.max_iters, 20);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    /// BFS direction switching.
    pub bfs: BfsConfig,
    /// SSSP bucket width.
    pub sssp: SsspConfig,
    /// Afforest sampling.
    pub afforest: AfforestConfig,
    /// BC source count.
    pub bc: BcConfig,
    /// PageRank iteration.
    pub pagerank: PageRankConfig,
    /// Triangle counting relabel policy.
    pub tc: TriangleConfig,
}

impl KernelConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    /// [`GraphError::Config`](crate::error::GraphError::Config) on malformed JSON or unknown keys.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    /// I/O errors and the errors of [`KernelConfig::from_json`].
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(KernelConfig::from_json("{}").unwrap(), KernelConfig::default());
    }

    #[test]
    fn relabel_policy_is_lowercase() {
        let config = KernelConfig::from_json(r#"{ "tc": { "relabel": "never" } }"#).unwrap();
        assert_eq!(config.tc.relabel, Relabel::Never);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            KernelConfig::from_json(r#"{ "bfs": { "gamma": 1 } }"#),
            Err(GraphError::Config(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kernels.json");
        std::fs::write(&path, r#"{ "afforest": { "neighbor_rounds": 3 } }"#).unwrap();
        assert_eq!(KernelConfig::load(&path).unwrap().afforest.neighbor_rounds, 3);
    }
}
