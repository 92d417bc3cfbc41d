//! Immutable CSR graph consumed by every kernel.
//!
//! Memory layout:
//! - `out.offsets`: `Vec<usize>` of length `n + 1`
//! - `out.neighbors`: contiguous neighbor entries, row `u` at `offsets[u]..offsets[u + 1]`
//! - `inv`: the transposed structure, present only for directed graphs
//!
//! Each row is sorted ascending, duplicate-free, and free of self-loops when produced by
//! [`Builder`](crate::graph::builder::Builder). An undirected graph stores every edge in
//! both rows and answers `in_*` queries from the out structure.

use core::ops::Range;

use tracing::info;

use crate::graph::node::{Destination, NodeId};

/// One direction of a compact graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Csr<D> {
    pub(crate) offsets: Vec<usize>,
    pub(crate) neighbors: Vec<D>,
}

impl<D> Csr<D> {
    fn validated(offsets: Vec<usize>, neighbors: Vec<D>) -> Self {
        assert!(!offsets.is_empty(), "offsets must have length n+1");
        assert_eq!(offsets[0], 0, "offsets must start at 0");
        for w in offsets.windows(2) {
            assert!(w[0] <= w[1], "offsets must be monotone");
        }
        assert_eq!(
            offsets[offsets.len() - 1],
            neighbors.len(),
            "offsets last must equal neighbor count"
        );
        Self { offsets, neighbors }
    }

    #[inline(always)]
    fn row(&self, u: usize) -> Range<usize> {
        self.offsets[u]..self.offsets[u + 1]
    }
}

/// A static graph in compressed sparse row form.
///
/// `D` is the neighbor entry: a bare node ID (`i32`, `i64`) or a
/// [`WeightedNode`](crate::graph::node::WeightedNode).
///
/// ### Performance Characteristics
/// | Operation | Complexity | Notes |
/// |-----------|------------|-------|
/// | `out_degree` / `in_degree` | \(O(1)\) | Offset difference |
/// | `out_neigh` / `in_neigh` | \(O(1)\) | Borrowed slice of the row |
/// | `has_edge` | \(O(\log d)\) | Binary search over a sorted row |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactGraph<D: Destination = i32> {
    directed: bool,
    out: Csr<D>,
    inv: Option<Csr<D>>,
}

impl<D: Destination> CompactGraph<D> {
    /// Builds an undirected graph from CSR parts. Every edge must appear in both rows.
    ///
    /// # Panics
    /// - if `offsets` is empty or does not start at zero
    /// - if offsets are not monotone
    /// - if `offsets.last() != neighbors.len()`
    pub fn from_undirected_parts(offsets: Vec<usize>, neighbors: Vec<D>) -> Self {
        Self {
            directed: false,
            out: Csr::validated(offsets, neighbors),
            inv: None,
        }
    }

    /// Builds a directed graph from its out and in CSR parts.
    ///
    /// # Panics
    /// Panics on malformed offsets (see [`Self::from_undirected_parts`]) or if the two
    /// directions disagree on node or edge count.
    pub fn from_directed_parts(
        out_offsets: Vec<usize>,
        out_neighbors: Vec<D>,
        in_offsets: Vec<usize>,
        in_neighbors: Vec<D>,
    ) -> Self {
        let out = Csr::validated(out_offsets, out_neighbors);
        let inv = Csr::validated(in_offsets, in_neighbors);
        assert_eq!(out.offsets.len(), inv.offsets.len(), "node count mismatch");
        assert_eq!(out.neighbors.len(), inv.neighbors.len(), "edge count mismatch");
        Self {
            directed: true,
            out,
            inv: Some(inv),
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.out.offsets.len() - 1
    }

    /// Number of edges: directed edges for directed graphs, node pairs otherwise.
    #[inline]
    pub fn num_edges(&self) -> usize {
        if self.directed {
            self.out.neighbors.len()
        } else {
            self.out.neighbors.len() / 2
        }
    }

    /// Number of stored neighbor entries in the out direction.
    #[inline]
    pub fn num_edges_directed(&self) -> usize {
        self.out.neighbors.len()
    }

    /// Returns `true` for directed graphs.
    #[inline]
    pub fn directed(&self) -> bool {
        self.directed
    }

    #[inline(always)]
    fn inv(&self) -> &Csr<D> {
        self.inv.as_ref().unwrap_or(&self.out)
    }

    /// Out-degree of `n`.
    #[inline(always)]
    pub fn out_degree(&self, n: D::Node) -> usize {
        let u = n.index();
        self.out.offsets[u + 1] - self.out.offsets[u]
    }

    /// In-degree of `n`.
    #[inline(always)]
    pub fn in_degree(&self, n: D::Node) -> usize {
        let inv = self.inv();
        let u = n.index();
        inv.offsets[u + 1] - inv.offsets[u]
    }

    /// Out-neighbors of `n`, sorted by node.
    #[inline(always)]
    pub fn out_neigh(&self, n: D::Node) -> &[D] {
        &self.out.neighbors[self.out.row(n.index())]
    }

    /// Out-neighbors of `n` after the first `skip` entries (empty if `skip >= degree`).
    #[inline(always)]
    pub fn out_neigh_from(&self, n: D::Node, skip: usize) -> &[D] {
        let row = self.out_neigh(n);
        &row[skip.min(row.len())..]
    }

    /// In-neighbors of `n`, sorted by node.
    #[inline(always)]
    pub fn in_neigh(&self, n: D::Node) -> &[D] {
        let inv = self.inv();
        &inv.neighbors[inv.row(n.index())]
    }

    /// In-neighbors of `n` after the first `skip` entries.
    #[inline(always)]
    pub fn in_neigh_from(&self, n: D::Node, skip: usize) -> &[D] {
        let row = self.in_neigh(n);
        &row[skip.min(row.len())..]
    }

    /// Global positions of `n`'s out-entries; used to index per-edge bitmaps.
    #[inline(always)]
    pub fn out_edge_range(&self, n: D::Node) -> Range<usize> {
        self.out.row(n.index())
    }

    /// Returns `true` if `u -> v` is stored.
    pub fn has_edge(&self, u: D::Node, v: D::Node) -> bool {
        self.out_neigh(u)
            .binary_search_by(|d| d.node().cmp(&v))
            .is_ok()
    }

    /// Node IDs `0..num_nodes`.
    pub fn vertices(&self) -> impl DoubleEndedIterator<Item = D::Node> + ExactSizeIterator {
        (0..self.num_nodes()).map(<D::Node as NodeId>::from_index)
    }

    /// Out-direction row offsets (`n + 1` entries).
    pub fn out_offsets(&self) -> &[usize] {
        &self.out.offsets
    }

    /// Out-direction neighbor entries.
    pub fn out_neighbors(&self) -> &[D] {
        &self.out.neighbors
    }

    /// In-direction row offsets; `None` for undirected graphs.
    pub fn in_offsets(&self) -> Option<&[usize]> {
        self.inv.as_ref().map(|c| c.offsets.as_slice())
    }

    /// In-direction neighbor entries; `None` for undirected graphs.
    pub fn in_neighbors(&self) -> Option<&[D]> {
        self.inv.as_ref().map(|c| c.neighbors.as_slice())
    }

    /// Average out-degree.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_degree(&self) -> f64 {
        if self.num_nodes() == 0 {
            0.0
        } else {
            self.num_edges() as f64 / self.num_nodes() as f64
        }
    }

    /// Logs node/edge counts and average degree.
    pub fn log_stats(&self) {
        info!(
            nodes = self.num_nodes(),
            edges = self.num_edges(),
            directed = self.directed,
            degree = self.average_degree(),
            "graph statistics"
        );
    }
}

#[cfg(test)]
mod tests;
