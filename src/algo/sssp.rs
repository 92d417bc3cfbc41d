//! Delta-stepping single-source shortest paths.
//!
//! Tentative distances are grouped into buckets of width `delta`. A round relaxes
//! every vertex of the current bucket in parallel; each rayon split folds the
//! vertices it improves into its own bucket lists, with no locking. Those lists are
//! kept across rounds until drained. Stale entries are never removed: a vertex is
//! skipped when its live distance has already dropped below the current bucket.
//!
//! Round protocol:
//! 1. relax the frontier (the current bucket's contents) into fresh local lists
//! 2. every kept list set votes its lowest non-empty bucket `>= current` via `fetch_min`
//! 3. every list set hands its entries for the winning bucket to the next frontier
//!
//! The run ends when no list set has anything left to vote for.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use num_traits::{One, ToPrimitive, Zero};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collections::ParallelVector;
use crate::concurrency::atomic::AtomicValue;
use crate::graph::{CompactGraph, Destination, NodeId, Weight, WeightedNode};

/// Bucket index meaning "no bucket".
const NO_BUCKET: usize = usize::MAX;

/// Bucket width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SsspConfig {
    /// Width of each distance bucket; must be positive.
    pub delta: i64,
}

impl Default for SsspConfig {
    fn default() -> Self {
        Self { delta: 1 }
    }
}

/// Distance assigned to unreachable vertices (`W::MAX / 2`, leaving room for one more edge).
#[inline]
pub fn dist_infinity<W: Weight>() -> W {
    W::max_value() / (W::one() + W::one())
}

/// One split's bucket lists, indexed by bucket.
type LocalBins<N> = Vec<Vec<N>>;

#[inline(always)]
fn bucket_of<W: Weight>(dist: W, delta: W) -> usize {
    (dist / delta).to_usize().unwrap_or(NO_BUCKET)
}

fn relax_frontier<N: NodeId, W: Weight>(
    g: &CompactGraph<WeightedNode<N, W>>,
    dist: &[W::Atomic],
    frontier: &[N],
    curr_index: usize,
    delta: W,
) -> Vec<LocalBins<N>> {
    frontier
        .par_iter()
        .with_max_len(64)
        .fold(Vec::new, |mut local: LocalBins<N>, &u| {
            let dist_u = W::load(&dist[u.index()], Ordering::Relaxed);
            if bucket_of(dist_u, delta) < curr_index {
                return local;
            }
            for wn in g.out_neigh(u) {
                let slot = &dist[wn.v.index()];
                let new_dist = dist_u.saturating_add(wn.w);
                let mut old_dist = W::load(slot, Ordering::Relaxed);
                while new_dist < old_dist {
                    match W::compare_exchange_relaxed(slot, old_dist, new_dist) {
                        Ok(_) => {
                            let dest_bin = bucket_of(new_dist, delta);
                            if dest_bin >= local.len() {
                                local.resize_with(dest_bin + 1, Vec::new);
                            }
                            local[dest_bin].push(wn.v);
                            break;
                        }
                        Err(actual) => old_dist = actual,
                    }
                }
            }
            local
        })
        .filter(|local| !local.is_empty())
        .collect()
}

/// Shortest-path distances from `source`; unreachable vertices get [`dist_infinity`].
///
/// Edge weights must be non-negative.
///
/// # Panics
/// Panics if `source` is not a vertex of `g` or `delta <= 0`.
pub fn delta_step<N: NodeId, W: Weight>(
    g: &CompactGraph<WeightedNode<N, W>>,
    source: N,
    delta: W,
) -> ParallelVector<W> {
    let n = g.num_nodes();
    assert!(
        source >= <N as Zero>::zero() && source.index() < n,
        "source {source} out of range for {n} nodes"
    );
    assert!(delta > <W as Zero>::zero(), "delta must be positive");
    debug!(%source, %delta, "sssp");

    let mut dist = ParallelVector::filled(n, dist_infinity::<W>());
    dist[source.index()] = <W as Zero>::zero();

    let mut bins: Vec<LocalBins<N>> = Vec::new();
    let mut frontier = vec![source];
    let mut curr_index = 0usize;
    let mut rounds = 0usize;
    let cells = dist.as_atomic();

    loop {
        let start = Instant::now();
        bins.extend(relax_frontier(g, cells, &frontier, curr_index, delta));

        let next_index = AtomicUsize::new(NO_BUCKET);
        bins.par_iter().for_each(|local| {
            if let Some(i) = (curr_index..local.len()).find(|&i| !local[i].is_empty()) {
                next_index.fetch_min(i, Ordering::Relaxed);
            }
        });
        debug!(bucket = curr_index, size = frontier.len(), lists = bins.len(), elapsed = ?start.elapsed());
        rounds += 1;

        let next_index = next_index.into_inner();
        if next_index == NO_BUCKET {
            break;
        }
        frontier = bins
            .par_iter_mut()
            .flat_map_iter(|local| local.get_mut(next_index).map(core::mem::take).unwrap_or_default())
            .collect();
        // Buckets below `next_index` are already drained.
        bins.retain(|local| local.iter().any(|b| !b.is_empty()));
        curr_index = next_index;
    }
    info!(rounds, "sssp finished");
    dist
}

/// Number of vertices with a finite distance.
pub fn reached_count<W: Weight>(dist: &[W]) -> usize {
    let inf = dist_infinity::<W>();
    dist.par_iter().filter(|&&d| d != inf).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::SourcePicker;
    use crate::graph::{make_graph, Builder, GraphSource};
    use crate::verify::dijkstra;

    type WNode = WeightedNode<i32, i32>;

    fn weighted(edges: &[(i32, i32, i32)]) -> CompactGraph<WNode> {
        let list: Vec<(i32, WNode)> = edges
            .iter()
            .map(|&(u, v, w)| (u, WeightedNode::new(v, w)))
            .collect();
        Builder::new().build(&list)
    }

    #[test]
    fn unit_cycle() {
        let g = weighted(&[(0, 1, 1), (1, 2, 1), (2, 3, 1), (3, 4, 1), (4, 0, 1)]);
        let dist = delta_step(&g, 0, 1);
        assert_eq!(dist.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn heavy_direct_edge_loses_to_light_path() {
        let g = weighted(&[(0, 3, 100), (0, 1, 2), (1, 2, 2), (2, 3, 2)]);
        for delta in [1, 3, 50, 1000] {
            let dist = delta_step(&g, 0, delta);
            assert_eq!(dist.as_slice(), &[0, 2, 4, 6], "delta {delta}");
        }
    }

    #[test]
    fn unreachable_stays_infinite() {
        let list: Vec<(i32, WNode)> = vec![(0, WeightedNode::new(1, 3))];
        let g = Builder::new().num_nodes(3).build(&list);
        let dist = delta_step(&g, 0, 2);
        assert_eq!(dist[2], dist_infinity::<i32>());
        assert_eq!(reached_count(&dist), 2);
    }

    #[test]
    fn lock_free_bins_match_dijkstra_on_many_threads() {
        let source = GraphSource::Synthetic {
            scale: 10,
            degree: 8,
            uniform: false,
        };
        let g: CompactGraph<WNode> = make_graph(&source, true).unwrap();
        let s = SourcePicker::new(&g, None).unwrap().pick_next();
        let expected = dijkstra(&g, s);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(8).build().unwrap();
        for delta in [1, 7, 64, 10_000] {
            let dist = pool.install(|| delta_step(&g, s, delta));
            assert_eq!(dist.as_slice(), expected.as_slice(), "delta {delta}");
        }
    }

    #[test]
    #[should_panic(expected = "delta must be positive")]
    fn rejects_zero_delta() {
        let g = weighted(&[(0, 1, 1)]);
        let _ = delta_step(&g, 0, 0);
    }
}
