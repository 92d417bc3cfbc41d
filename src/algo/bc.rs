//! Approximate betweenness centrality (Brandes) from a handful of sources.
//!
//! Per source:
//! 1. a level-synchronous BFS counts shortest paths and marks every tight out-edge
//!    (`depth[v] == depth[u] + 1`) in an edge-indexed successor bitmap, recording
//!    where each depth starts in the queue history
//! 2. depths are replayed deepest first, each vertex summing
//!    `paths[u] / paths[v] * (1 + delta[v])` over its marked successors
//!
//! Scores are finally divided by the maximum so they lie in `[0, 1]`.

use core::sync::atomic::Ordering;
use std::time::Instant;

use num_traits::{One, Zero};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collections::ParallelVector;
use crate::concurrency::atomic::{AtomicBitmap, AtomicValue};
use crate::concurrency::worklist::SlidingQueue;
use crate::graph::{CompactGraph, NodeId};

/// Number of sources to sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BcConfig {
    /// Sources per trial.
    pub num_iters: usize,
}

impl Default for BcConfig {
    fn default() -> Self {
        Self { num_iters: 1 }
    }
}

/// Forward-pass output reused by the backward pass.
struct ShortestPaths<N: NodeId> {
    path_counts: ParallelVector<u64>,
    succ: AtomicBitmap,
    /// Queue positions at which each depth starts, plus the end.
    depth_index: Vec<usize>,
    queue: SlidingQueue<N>,
}

fn path_counting_bfs<N: NodeId>(
    g: &CompactGraph<N>,
    source: N,
    depths: &mut ParallelVector<N>,
    succ: AtomicBitmap,
    mut queue: SlidingQueue<N>,
) -> ShortestPaths<N> {
    depths.fill(-N::one());
    depths[source.index()] = <N as Zero>::zero();
    let mut path_counts = ParallelVector::filled(g.num_nodes(), 0u64);
    path_counts[source.index()] = 1;
    succ.reset();
    queue.reset();
    queue.push(source);
    let mut depth_index = vec![queue.window_start()];
    queue.slide_window();

    let depth_cells = depths.as_atomic();
    let path_cells = path_counts.as_atomic();
    let mut depth = <N as Zero>::zero();
    while !queue.is_empty() {
        depth = depth + N::one();
        queue.window().par_iter().with_max_len(64).for_each_init(
            || queue.buffer(),
            |lqueue, &u| {
                let paths_u = u64::load(&path_cells[u.index()], Ordering::Relaxed);
                for (edge, &v) in g.out_edge_range(u).zip(g.out_neigh(u)) {
                    let slot = &depth_cells[v.index()];
                    if N::load(slot, Ordering::Relaxed) == -N::one()
                        && N::compare_exchange_relaxed(slot, -N::one(), depth).is_ok()
                    {
                        lqueue.push(v);
                    }
                    if N::load(slot, Ordering::Relaxed) == depth {
                        succ.set_bit_atomic(edge);
                        u64::fetch_add(&path_cells[v.index()], paths_u, Ordering::Relaxed);
                    }
                }
            },
        );
        depth_index.push(queue.window_end());
        queue.slide_window();
    }
    ShortestPaths {
        path_counts,
        succ,
        depth_index,
        queue,
    }
}

/// Centrality scores from `sources`, normalized so the best vertex scores 1.
///
/// An all-zero result (no vertex lies inside any shortest path) is returned as is.
///
/// # Panics
/// Panics if a source is not a vertex of `g`.
pub fn brandes<N: NodeId>(g: &CompactGraph<N>, sources: &[N]) -> ParallelVector<f32> {
    let n = g.num_nodes();
    let mut scores = ParallelVector::filled(n, 0f32);
    let mut depths = ParallelVector::filled(n, -N::one());
    let mut deltas = ParallelVector::filled(n, 0f32);
    let mut succ = AtomicBitmap::new(g.num_edges_directed());
    let mut queue = SlidingQueue::with_capacity(n);

    for &source in sources {
        assert!(
            source >= <N as Zero>::zero() && source.index() < n,
            "source {source} out of range for {n} nodes"
        );
        debug!(%source, "bc");
        let start = Instant::now();
        let paths = path_counting_bfs(g, source, &mut depths, succ, queue);
        debug!(step = "b", elapsed = ?start.elapsed(), depths = paths.depth_index.len() - 1);

        let start = Instant::now();
        deltas.fill(0.0);
        let delta_cells = deltas.as_atomic();
        let score_cells = scores.as_atomic();
        let history = paths.queue.history();
        for level in paths.depth_index.windows(2).rev() {
            history[level[0]..level[1]].par_iter().for_each(|&u| {
                #[allow(clippy::cast_precision_loss)]
                let paths_u = paths.path_counts[u.index()] as f32;
                let delta_u: f32 = g
                    .out_edge_range(u)
                    .zip(g.out_neigh(u))
                    .filter(|(edge, _)| paths.succ.get_bit(*edge))
                    .map(|(_, &v)| {
                        #[allow(clippy::cast_precision_loss)]
                        let paths_v = paths.path_counts[v.index()] as f32;
                        paths_u / paths_v * (1.0 + f32::load(&delta_cells[v.index()], Ordering::Relaxed))
                    })
                    .sum();
                f32::store(&delta_cells[u.index()], delta_u, Ordering::Relaxed);
                f32::fetch_add(&score_cells[u.index()], delta_u, Ordering::Relaxed);
            });
        }
        debug!(step = "p", elapsed = ?start.elapsed());
        succ = paths.succ;
        queue = paths.queue;
    }

    let biggest = scores.par_iter().copied().reduce(|| 0.0, f32::max);
    if biggest > 0.0 {
        scores.par_iter_mut().for_each(|s| *s /= biggest);
    }
    info!(sources = sources.len(), "bc finished");
    scores
}
