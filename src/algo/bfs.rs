//! Direction-optimizing breadth-first search.
//!
//! Each round either expands the frontier queue top-down (claiming children with a
//! CAS on their parent slot) or, when the frontier is large relative to the edges
//! left unexplored, scans every unvisited vertex bottom-up for a parent in the
//! frontier bitmap. Unvisited parent slots hold `-out_degree` (or `-1` for sinks) so
//! a top-down claim learns how much work the new vertex will add.

use core::sync::atomic::Ordering;
use std::time::Instant;

use num_traits::{One, Zero};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collections::ParallelVector;
use crate::concurrency::atomic::{AtomicBitmap, AtomicValue};
use crate::concurrency::worklist::SlidingQueue;
use crate::graph::{CompactGraph, NodeId};

/// Vertices per bottom-up task; a multiple of 64 so tasks own whole bitmap words.
const BU_CHUNK: usize = 1024;

/// Direction-switching thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BfsConfig {
    /// Go bottom-up once the frontier's out-edges exceed `edges_to_check / alpha`.
    pub alpha: usize,
    /// Return top-down once a bottom-up round wakes at most `num_nodes / beta` vertices.
    pub beta: usize,
}

impl Default for BfsConfig {
    fn default() -> Self {
        Self { alpha: 26, beta: 72 }
    }
}

fn init_parent<N: NodeId>(g: &CompactGraph<N>) -> ParallelVector<N> {
    (0..g.num_nodes())
        .into_par_iter()
        .map(|n| match g.out_degree(N::from_index(n)) {
            0 => -N::one(),
            d => -N::from_index(d),
        })
        .collect()
}

fn td_step<N: NodeId>(
    g: &CompactGraph<N>,
    parent: &mut ParallelVector<N>,
    queue: &SlidingQueue<N>,
) -> usize {
    let cells = parent.as_atomic();
    queue
        .window()
        .par_iter()
        .map_init(
            || queue.buffer(),
            |lqueue, &u| {
                let mut scout_count = 0;
                for &v in g.out_neigh(u) {
                    let slot = &cells[v.index()];
                    let curr = N::load(slot, Ordering::Relaxed);
                    if curr < <N as Zero>::zero() && N::compare_exchange_relaxed(slot, curr, u).is_ok() {
                        lqueue.push(v);
                        scout_count += (-curr).index();
                    }
                }
                scout_count
            },
        )
        .sum()
}

fn bu_step<N: NodeId>(
    g: &CompactGraph<N>,
    parent: &mut [N],
    front: &AtomicBitmap,
    next: &AtomicBitmap,
) -> usize {
    next.reset();
    parent
        .par_chunks_mut(BU_CHUNK)
        .enumerate()
        .map(|(chunk, slots)| {
            let base = chunk * BU_CHUNK;
            let mut awake_count = 0;
            for (i, slot) in slots.iter_mut().enumerate() {
                if *slot >= <N as Zero>::zero() {
                    continue;
                }
                let u = base + i;
                if let Some(&v) = g.in_neigh(N::from_index(u)).iter().find(|v| front.get_bit(v.index())) {
                    *slot = v;
                    awake_count += 1;
                    // The chunk owns every word it touches.
                    next.set_bit(u);
                }
            }
            awake_count
        })
        .sum()
}

fn queue_to_bitmap<N: NodeId>(queue: &SlidingQueue<N>, bm: &AtomicBitmap) {
    queue
        .window()
        .par_iter()
        .for_each(|&u| bm.set_bit_atomic(u.index()));
}

fn bitmap_to_queue<N: NodeId>(bm: &AtomicBitmap, queue: &mut SlidingQueue<N>) {
    let shared: &SlidingQueue<N> = queue;
    (0..bm.len()).into_par_iter().for_each_init(
        || shared.buffer(),
        |lqueue, n| {
            if bm.get_bit(n) {
                lqueue.push(N::from_index(n));
            }
        },
    );
    queue.slide_window();
}

/// Breadth-first search from `source`, returning the parent array.
///
/// `parent[source] == source`, reached vertices hold a predecessor on some shortest
/// path, and unreachable vertices hold `-1`.
///
/// # Panics
/// Panics if `source` is not a vertex of `g` or a threshold in `config` is zero.
pub fn direction_optimizing_bfs<N: NodeId>(
    g: &CompactGraph<N>,
    source: N,
    config: &BfsConfig,
) -> ParallelVector<N> {
    let n = g.num_nodes();
    assert!(
        source >= <N as Zero>::zero() && source.index() < n,
        "source {source} out of range for {n} nodes"
    );
    assert!(config.alpha > 0 && config.beta > 0, "alpha and beta must be > 0");
    debug!(%source, "bfs");

    let mut parent = init_parent(g);
    parent[source.index()] = source;

    let mut queue = SlidingQueue::with_capacity(n);
    queue.push(source);
    queue.slide_window();
    let mut curr = AtomicBitmap::new(n);
    let mut front = AtomicBitmap::new(n);

    let mut edges_to_check = g.num_edges_directed();
    let mut scout_count = g.out_degree(source);
    while !queue.is_empty() {
        if scout_count > edges_to_check / config.alpha {
            let start = Instant::now();
            front.reset();
            queue_to_bitmap(&queue, &front);
            debug!(step = "e", elapsed = ?start.elapsed());
            queue.slide_window();
            loop {
                let start = Instant::now();
                let awake_count = bu_step(g, &mut parent, &front, &curr);
                front.swap(&mut curr);
                debug!(step = "bu", elapsed = ?start.elapsed(), awake_count);
                if awake_count <= n / config.beta {
                    break;
                }
            }
            let start = Instant::now();
            bitmap_to_queue(&front, &mut queue);
            debug!(step = "c", elapsed = ?start.elapsed());
            scout_count = 1;
        } else {
            let start = Instant::now();
            edges_to_check = edges_to_check.saturating_sub(scout_count);
            scout_count = td_step(g, &mut parent, &queue);
            queue.slide_window();
            debug!(step = "td", elapsed = ?start.elapsed(), frontier = queue.len());
        }
    }

    parent.par_iter_mut().for_each(|p| {
        if *p < <N as Zero>::zero() {
            *p = -N::one();
        }
    });
    parent
}

/// Number of vertices reached and the sum of their out-degrees.
pub fn tree_stats<N: NodeId>(g: &CompactGraph<N>, parent: &[N]) -> (usize, usize) {
    parent
        .par_iter()
        .enumerate()
        .filter(|(_, p)| **p >= <N as Zero>::zero())
        .map(|(n, _)| (1, g.out_degree(N::from_index(n))))
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Builder;

    #[test]
    fn parent_of_cycle() {
        let g = Builder::new().build::<i32>(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
        let parent = direction_optimizing_bfs(&g, 0, &BfsConfig::default());
        assert_eq!(parent.as_slice(), &[0, 0, 1, 2, 3]);
    }

    #[test]
    fn unreachable_vertices_are_minus_one() {
        let g = Builder::new().num_nodes(5).build::<i32>(&[(0, 1), (2, 3)]);
        let parent = direction_optimizing_bfs(&g, 0, &BfsConfig::default());
        assert_eq!(parent.as_slice(), &[0, 0, -1, -1, -1]);
        assert_eq!(tree_stats(&g, &parent), (2, 1));
    }

    #[test]
    fn bottom_up_rounds_match_top_down() {
        // A star forces the switch: the hub's scout count dwarfs edges_to_check / 1.
        let edges: Vec<(i32, i32)> = (1..3000).map(|v| (0, v)).chain((1..2999).map(|v| (v, v + 1))).collect();
        let g = Builder::new().symmetrize(true).build(&edges);

        let eager = BfsConfig { alpha: 1_000_000, beta: 1 };
        let lazy = BfsConfig { alpha: 1, beta: 1_000_000 };
        let a = direction_optimizing_bfs(&g, 5, &eager);
        let b = direction_optimizing_bfs(&g, 5, &lazy);

        let depth = |parent: &[i32]| -> Vec<usize> {
            (0..parent.len())
                .map(|mut v| {
                    let mut d = 0;
                    while parent[v] as usize != v {
                        v = parent[v] as usize;
                        d += 1;
                    }
                    d
                })
                .collect()
        };
        assert_eq!(depth(&a), depth(&b));
        assert!(a.iter().all(|&p| p >= 0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn rejects_bad_source() {
        let g = Builder::new().build::<i32>(&[(0, 1)]);
        let _ = direction_optimizing_bfs(&g, 7, &BfsConfig::default());
    }
}
