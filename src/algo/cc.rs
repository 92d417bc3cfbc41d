//! Connected components: Shiloach-Vishkin and Afforest.
//!
//! Both kernels maintain a `comp` forest over vertex IDs in which every link points
//! from a higher ID to a lower one, so the forest stays acyclic under concurrent
//! hooking. A compress pass then flattens every tree so `comp[v]` is its root.
//!
//! Important:
//! - Labels are arbitrary representatives; only the induced partition is meaningful.
//! - For directed graphs the result is the weakly connected components.

use core::sync::atomic::Ordering;
use std::collections::HashMap;
use std::time::Instant;

use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collections::ParallelVector;
use crate::concurrency::atomic::AtomicValue;
use crate::graph::{CompactGraph, NodeId};

/// Vertices per compress task.
const COMPRESS_CHUNK: usize = 2048;

/// Afforest sampling parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AfforestConfig {
    /// Number of leading neighbors of each vertex linked before sampling.
    pub neighbor_rounds: usize,
    /// Number of labels drawn to guess the largest component.
    pub num_samples: usize,
    /// Seed of the sampling generator.
    pub seed: u64,
}

impl Default for AfforestConfig {
    fn default() -> Self {
        Self {
            neighbor_rounds: 2,
            num_samples: 1024,
            seed: 27_491_095,
        }
    }
}

fn identity_labels<N: NodeId>(n: usize) -> ParallelVector<N> {
    (0..n).into_par_iter().map(N::from_index).collect()
}

/// Points every vertex directly at its root.
fn compress<N: NodeId>(comp: &[N::Atomic]) {
    comp.par_chunks(COMPRESS_CHUNK).enumerate().for_each(|(chunk, cells)| {
        for (i, cell) in cells.iter().enumerate() {
            let n = chunk * COMPRESS_CHUNK + i;
            loop {
                let c = N::load(cell, Ordering::Relaxed);
                let cc = N::load(&comp[c.index()], Ordering::Relaxed);
                if c == cc {
                    break;
                }
                debug_assert!(cc <= c, "link {n} -> {c} -> {cc} points upward");
                N::store(cell, cc, Ordering::Relaxed);
            }
        }
    });
}

fn sv_directed<N: NodeId>(g: &CompactGraph<N>, comp: &[N::Atomic]) -> bool {
    (0..g.num_nodes())
        .into_par_iter()
        .map(|u| {
            let mut changed = false;
            for &v in g.out_neigh(N::from_index(u)) {
                let comp_u = N::load(&comp[u], Ordering::Relaxed);
                let comp_v = N::load(&comp[v.index()], Ordering::Relaxed);
                if comp_u == comp_v {
                    continue;
                }
                let (high, low) = if comp_u > comp_v { (comp_u, comp_v) } else { (comp_v, comp_u) };
                let slot = &comp[high.index()];
                if N::load(slot, Ordering::Relaxed) == high {
                    N::store(slot, low, Ordering::Relaxed);
                    changed = true;
                }
            }
            changed
        })
        .reduce(|| false, |a, b| a | b)
}

fn sv_undirected<N: NodeId>(g: &CompactGraph<N>, comp: &[N::Atomic]) -> bool {
    (0..g.num_nodes())
        .into_par_iter()
        .map(|u| {
            let mut changed = false;
            let comp_u = N::load(&comp[u], Ordering::Relaxed);
            for &v in g.out_neigh(N::from_index(u)) {
                let comp_v = N::load(&comp[v.index()], Ordering::Relaxed);
                // The reverse edge hooks the other way round.
                if comp_u < comp_v && N::load(&comp[comp_v.index()], Ordering::Relaxed) == comp_v {
                    N::store(&comp[comp_v.index()], comp_u, Ordering::Relaxed);
                    changed = true;
                }
            }
            changed
        })
        .reduce(|| false, |a, b| a | b)
}

/// Shiloach-Vishkin hooking and compressing until no hook succeeds.
pub fn shiloach_vishkin<N: NodeId>(g: &CompactGraph<N>) -> ParallelVector<N> {
    let mut comp = identity_labels::<N>(g.num_nodes());
    let cells = comp.as_atomic();
    let mut iterations = 0usize;
    loop {
        iterations += 1;
        let start = Instant::now();
        let changed = if g.directed() { sv_directed(g, cells) } else { sv_undirected(g, cells) };
        compress::<N>(cells);
        debug!(iteration = iterations, elapsed = ?start.elapsed(), changed);
        if !changed {
            break;
        }
    }
    info!(iterations, "Shiloach-Vishkin finished");
    comp
}

/// Joins the trees of `u` and `v`, always hanging the higher root under the lower.
fn link<N: NodeId>(u: N, v: N, comp: &[N::Atomic]) {
    let mut p1 = N::load(&comp[u.index()], Ordering::Relaxed);
    let mut p2 = N::load(&comp[v.index()], Ordering::Relaxed);
    while p1 != p2 {
        let (high, low) = if p1 > p2 { (p1, p2) } else { (p2, p1) };
        let slot = &comp[high.index()];
        let p_high = N::load(slot, Ordering::Relaxed);
        if p_high == low {
            break;
        }
        if p_high == high && N::compare_exchange_relaxed(slot, high, low).is_ok() {
            break;
        }
        p1 = N::load(&comp[p_high.index()], Ordering::Relaxed);
        p2 = N::load(&comp[low.index()], Ordering::Relaxed);
    }
}

/// Most frequent label among `num_samples` uniformly drawn vertices.
fn sample_frequent<N: NodeId>(comp: &[N], num_samples: usize, seed: u64) -> N {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let dist = Uniform::new(0, comp.len());
    let mut counts: HashMap<N, usize> = HashMap::with_capacity(32);
    for _ in 0..num_samples {
        *counts.entry(comp[dist.sample(&mut rng)]).or_insert(0) += 1;
    }
    let (label, hits) = counts
        .into_iter()
        .max_by_key(|&(label, hits)| (hits, core::cmp::Reverse(label)))
        .unwrap_or((comp[0], 0));
    #[allow(clippy::cast_precision_loss)]
    let share = hits as f64 / num_samples.max(1) as f64;
    debug!(%label, share, "most frequent sampled component");
    label
}

/// Afforest: link a few neighbors per vertex, guess the giant component from a
/// sample, then finish linking only the vertices outside it.
///
/// # Panics
/// Panics if `config.num_samples` is zero on a non-empty graph.
pub fn afforest<N: NodeId>(g: &CompactGraph<N>, config: &AfforestConfig) -> ParallelVector<N> {
    let n = g.num_nodes();
    let mut comp = identity_labels::<N>(n);
    if n == 0 {
        return comp;
    }
    assert!(config.num_samples > 0, "num_samples must be > 0");

    for r in 0..config.neighbor_rounds {
        let start = Instant::now();
        let cells = comp.as_atomic();
        (0..n).into_par_iter().with_min_len(COMPRESS_CHUNK).for_each(|u| {
            let u = N::from_index(u);
            if let Some(&v) = g.out_neigh_from(u, r).first() {
                link(u, v, cells);
            }
        });
        compress::<N>(cells);
        debug!(round = r, elapsed = ?start.elapsed(), "neighbor round");
    }

    let c = sample_frequent(&comp, config.num_samples, config.seed);

    let start = Instant::now();
    let cells = comp.as_atomic();
    (0..n).into_par_iter().with_min_len(16).for_each(|u| {
        if N::load(&cells[u], Ordering::Relaxed) == c {
            return;
        }
        let u = N::from_index(u);
        for &v in g.out_neigh_from(u, config.neighbor_rounds) {
            link(u, v, cells);
        }
        // Out-edges alone miss links into u's component for directed graphs.
        if g.directed() {
            for &v in g.in_neigh(u) {
                link(u, v, cells);
            }
        }
    });
    compress::<N>(cells);
    debug!(elapsed = ?start.elapsed(), "final linking");
    comp
}

/// Component count and the sizes of the `k` largest components, largest first.
pub fn component_stats<N: NodeId>(comp: &[N], k: usize) -> (usize, Vec<(N, usize)>) {
    let counts = comp
        .par_iter()
        .fold(HashMap::<N, usize>::new, |mut acc, &c| {
            *acc.entry(c).or_insert(0) += 1;
            acc
        })
        .reduce(HashMap::new, |mut a, b| {
            for (c, k) in b {
                *a.entry(c).or_insert(0) += k;
            }
            a
        });
    let mut sizes: Vec<(N, usize)> = counts.into_iter().collect();
    sizes.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let total = sizes.len();
    sizes.truncate(k);
    (total, sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Builder;

    /// Canonical form of a labelling: each vertex mapped to the first vertex sharing its label.
    fn canonical(comp: &[i32]) -> Vec<usize> {
        let mut first = HashMap::new();
        comp.iter()
            .enumerate()
            .map(|(v, &c)| *first.entry(c).or_insert(v))
            .collect()
    }

    #[test]
    fn cycle_is_one_component() {
        let g = Builder::new().symmetrize(true).build::<i32>(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
        assert_eq!(shiloach_vishkin(&g).as_slice(), &[0; 5]);
        assert_eq!(afforest(&g, &AfforestConfig::default()).as_slice(), &[0; 5]);
    }

    #[test]
    fn directed_graphs_give_weak_components() {
        let g = Builder::new().num_nodes(6).build::<i32>(&[(1, 0), (2, 1), (4, 3)]);
        let sv = shiloach_vishkin(&g);
        let af = afforest(&g, &AfforestConfig::default());
        assert_eq!(canonical(&sv), vec![0, 0, 0, 3, 3, 5]);
        assert_eq!(canonical(&af), canonical(&sv));
    }

    #[test]
    fn afforest_agrees_with_sv_on_many_pieces() {
        let edges: Vec<(i32, i32)> = (0..400).filter(|v| v % 7 != 6).map(|v| (v, v + 1)).collect();
        let g = Builder::new().symmetrize(true).build(&edges);
        let sv = shiloach_vishkin(&g);
        for rounds in [0, 1, 2, 5] {
            let config = AfforestConfig { neighbor_rounds: rounds, ..AfforestConfig::default() };
            assert_eq!(canonical(&afforest(&g, &config)), canonical(&sv), "rounds {rounds}");
        }
        let (count, top) = component_stats(&sv, 3);
        assert_eq!(count, 58);
        assert_eq!(top.len(), 3);
        assert!(top.iter().all(|&(_, size)| size == 7));
    }

    #[test]
    fn isolated_vertices_keep_own_labels() {
        let g = Builder::new().num_nodes(4).symmetrize(true).build::<i32>(&[(2, 3)]);
        assert_eq!(shiloach_vishkin(&g).as_slice(), &[0, 1, 2, 2]);
        assert_eq!(afforest(&g, &AfforestConfig::default()).as_slice(), &[0, 1, 2, 2]);
    }
}
