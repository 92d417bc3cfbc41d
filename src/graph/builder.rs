//! Edge list to `CompactGraph` construction.
//!
//! Steps, per direction:
//! 1. count degrees with atomic increments
//! 2. turn them into row offsets with a blocked parallel prefix sum
//! 3. scatter every edge into its row through an atomic per-row cursor
//! 4. squish: sort each row, drop duplicates and self-loops, and compact
//!
//! The edge list is never reused as neighbor storage; construction allocates the
//! neighbor arrays separately.

use core::sync::atomic::Ordering;
use std::time::Instant;

use num_traits::Zero;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::collections::ParallelVector;
use crate::error::{GraphError, Result};
use crate::graph::compressed::CompactGraph;
use crate::graph::node::{Destination, Edge, NodeId};

/// Block width of [`parallel_prefix_sum`].
const PREFIX_BLOCK: usize = 1 << 20;

/// Exclusive prefix sum of `degrees`, with the total appended (`len + 1` entries).
pub fn parallel_prefix_sum(degrees: &[usize]) -> Vec<usize> {
    let block_sums: Vec<usize> = degrees
        .par_chunks(PREFIX_BLOCK)
        .map(|block| block.iter().sum())
        .collect();

    let mut bulk_prefix = Vec::with_capacity(block_sums.len() + 1);
    let mut total = 0usize;
    for s in &block_sums {
        bulk_prefix.push(total);
        total += s;
    }

    let mut prefix = vec![0usize; degrees.len() + 1];
    prefix[..degrees.len()]
        .par_chunks_mut(PREFIX_BLOCK)
        .zip(degrees.par_chunks(PREFIX_BLOCK))
        .zip(bulk_prefix.par_iter())
        .for_each(|((out, block), &start)| {
            let mut running = start;
            for (slot, &d) in out.iter_mut().zip(block) {
                *slot = running;
                running += d;
            }
        });
    prefix[degrees.len()] = total;
    prefix
}

/// Raw pointer shared by scatter workers.
#[derive(Clone, Copy)]
struct ScatterPtr<T>(*mut T);

// SAFETY: workers write through the pointer only at positions claimed by a unique
// fetch-and-add, so no two threads touch the same slot.
unsafe impl<T: Send> Send for ScatterPtr<T> {}
unsafe impl<T: Send> Sync for ScatterPtr<T> {}

impl<T> ScatterPtr<T> {
    /// # Safety
    /// `index` must be in bounds and written by no other thread.
    #[inline(always)]
    unsafe fn write(self, index: usize, value: T) {
        // SAFETY: upheld by caller.
        unsafe { self.0.add(index).write(value) }
    }
}

/// Which orientation of each input edge lands in the CSR being built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Orientation {
    /// `u -> v` stored in row `u`.
    Forward,
    /// `u -> v` stored in row `v`.
    Transpose,
    /// Both of the above.
    Both,
}

/// Constructs compact graphs from edge lists.
///
/// ```
/// use gapkern::graph::builder::Builder;
///
/// let g = Builder::new().symmetrize(true).build::<i32>(&[(0, 1), (1, 2)]);
/// assert_eq!(g.num_edges(), 2);
/// assert_eq!(g.out_neigh(1), &[0, 2]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Builder {
    symmetrize: bool,
    num_nodes: Option<usize>,
}

impl Builder {
    /// A builder producing directed graphs with node count inferred from the edges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store each edge in both directions and produce an undirected graph.
    #[must_use]
    pub fn symmetrize(mut self, symmetrize: bool) -> Self {
        self.symmetrize = symmetrize;
        self
    }

    /// Fix the node count instead of using `max id + 1`.
    #[must_use]
    pub fn num_nodes(mut self, num_nodes: usize) -> Self {
        self.num_nodes = Some(num_nodes);
        self
    }

    /// Builds a graph whose rows are sorted, duplicate-free, and self-loop-free.
    ///
    /// Weighted duplicates keep their lightest copy.
    ///
    /// # Panics
    /// Panics if an edge endpoint is negative or not below a fixed node count.
    pub fn build<D: Destination>(&self, edges: &[Edge<D>]) -> CompactGraph<D> {
        let start = Instant::now();
        let num_nodes = self.num_nodes.unwrap_or_else(|| count_nodes(edges));
        if let Some(bad) = edges
            .par_iter()
            .find_any(|&&(u, d)| !in_range(u, num_nodes) || !in_range(d.node(), num_nodes))
        {
            panic!("edge {bad:?} out of bounds for n={num_nodes}");
        }

        let graph = if self.symmetrize {
            let (offsets, neighbors) = make_csr(edges, num_nodes, Orientation::Both);
            CompactGraph::from_undirected_parts(offsets, neighbors)
        } else {
            let (out_offsets, out_neighbors) = make_csr(edges, num_nodes, Orientation::Forward);
            let (in_offsets, in_neighbors) = make_csr(edges, num_nodes, Orientation::Transpose);
            CompactGraph::from_directed_parts(out_offsets, out_neighbors, in_offsets, in_neighbors)
        };
        info!(elapsed = ?start.elapsed(), "build time");
        graph
    }
}

/// `max id + 1` over all endpoints, or zero for an empty (or all-negative) list.
fn count_nodes<D: Destination>(edges: &[Edge<D>]) -> usize {
    edges
        .par_iter()
        .map(|&(u, d)| u.max(d.node()))
        .max()
        .filter(|&m| m >= <D::Node as Zero>::zero())
        .map_or(0, |m| m.index() + 1)
}

#[inline]
fn in_range<N: NodeId>(n: N, num_nodes: usize) -> bool {
    n >= <N as Zero>::zero() && n.index() < num_nodes
}

fn count_degrees<D: Destination>(
    edges: &[Edge<D>],
    num_nodes: usize,
    orientation: Orientation,
) -> ParallelVector<usize> {
    let mut degrees = ParallelVector::filled(num_nodes, 0usize);
    let cells = degrees.as_atomic();
    edges.par_iter().for_each(|&(u, d)| {
        if orientation != Orientation::Transpose {
            cells[u.index()].fetch_add(1, Ordering::Relaxed);
        }
        if orientation != Orientation::Forward {
            cells[d.node().index()].fetch_add(1, Ordering::Relaxed);
        }
    });
    degrees
}

fn make_csr<D: Destination>(
    edges: &[Edge<D>],
    num_nodes: usize,
    orientation: Orientation,
) -> (Vec<usize>, Vec<D>) {
    let degrees = count_degrees(edges, num_nodes, orientation);
    let offsets = parallel_prefix_sum(&degrees);
    let total = offsets[num_nodes];

    let mut cursor_slots = ParallelVector::from_slice(&offsets[..num_nodes]);
    let cursors = cursor_slots.as_atomic();
    let mut neighbors: Vec<D> = Vec::with_capacity(total);
    let slots = ScatterPtr(neighbors.as_mut_ptr());

    edges.par_iter().for_each(|&(u, d)| {
        if orientation != Orientation::Transpose {
            let pos = cursors[u.index()].fetch_add(1, Ordering::Relaxed);
            // SAFETY: `pos` lies in row `u` and was handed out exactly once.
            unsafe { slots.write(pos, d) };
        }
        if orientation != Orientation::Forward {
            let v = d.node();
            let pos = cursors[v.index()].fetch_add(1, Ordering::Relaxed);
            // SAFETY: as above, for row `v`.
            unsafe { slots.write(pos, d.retarget(u)) };
        }
    });
    // SAFETY: the degree count reserved exactly `total` slots and every one was written.
    unsafe { neighbors.set_len(total) };

    squish(&offsets, neighbors)
}

/// Sorts each row, keeps the first entry per neighbor, drops `u -> u`, and compacts.
fn squish<D: Destination>(offsets: &[usize], mut neighbors: Vec<D>) -> (Vec<usize>, Vec<D>) {
    let num_nodes = offsets.len() - 1;
    let mut rows: Vec<&mut [D]> = Vec::with_capacity(num_nodes);
    let mut rest = neighbors.as_mut_slice();
    for w in offsets.windows(2) {
        let (row, tail) = rest.split_at_mut(w[1] - w[0]);
        rows.push(row);
        rest = tail;
    }

    let kept: Vec<usize> = rows
        .par_iter_mut()
        .enumerate()
        .map(|(u, row)| squish_row(D::Node::from_index(u), row))
        .collect();

    let sq_offsets = parallel_prefix_sum(&kept);
    let sq_neighbors: Vec<D> = rows
        .par_iter()
        .zip(kept.par_iter())
        .flat_map_iter(|(row, &k)| row[..k].iter().copied())
        .collect();
    debug!(
        before = offsets[num_nodes],
        after = sq_neighbors.len(),
        "squished rows"
    );
    (sq_offsets, sq_neighbors)
}

fn squish_row<D: Destination>(u: D::Node, row: &mut [D]) -> usize {
    row.sort_unstable();
    let mut len = 0;
    for i in 0..row.len() {
        let d = row[i];
        if d.node() == u || (len > 0 && row[len - 1].node() == d.node()) {
            continue;
        }
        row[len] = d;
        len += 1;
    }
    len
}

/// Rebuilds an undirected graph with IDs assigned by descending degree (ties by
/// descending ID), re-sorting every row.
///
/// # Errors
/// [`GraphError::DirectedRelabel`] for directed input.
pub fn relabel_by_degree<D: Destination>(g: &CompactGraph<D>) -> Result<CompactGraph<D>> {
    if g.directed() {
        return Err(GraphError::DirectedRelabel);
    }
    let start = Instant::now();
    let n = g.num_nodes();

    let mut degree_id: Vec<(usize, D::Node)> = g.vertices().map(|u| (g.out_degree(u), u)).collect();
    degree_id.par_sort_unstable_by(|a, b| b.cmp(a));

    let degrees: Vec<usize> = degree_id.par_iter().map(|&(d, _)| d).collect();
    let mut new_ids = vec![<D::Node as Zero>::zero(); n];
    for (new, &(_, old)) in degree_id.iter().enumerate() {
        new_ids[old.index()] = D::Node::from_index(new);
    }

    let offsets = parallel_prefix_sum(&degrees);
    let mut neighbors: Vec<D> = g.out_neighbors().to_vec();
    let mut rows: Vec<&mut [D]> = Vec::with_capacity(n);
    let mut rest = neighbors.as_mut_slice();
    for w in offsets.windows(2) {
        let (row, tail) = rest.split_at_mut(w[1] - w[0]);
        rows.push(row);
        rest = tail;
    }
    rows.par_iter_mut().enumerate().for_each(|(new_u, row)| {
        let (_, old_u) = degree_id[new_u];
        for (slot, &d) in row.iter_mut().zip(g.out_neigh(old_u)) {
            *slot = d.retarget(new_ids[d.node().index()]);
        }
        row.sort_unstable();
    });

    info!(elapsed = ?start.elapsed(), "relabel");
    Ok(CompactGraph::from_undirected_parts(offsets, neighbors))
}

#[cfg(test)]
mod tests;
