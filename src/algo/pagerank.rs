//! Pull-direction PageRank by synchronous power iteration.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collections::ParallelVector;
use crate::graph::{CompactGraph, NodeId};

/// Iteration limits and damping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageRankConfig {
    /// Upper bound on iterations.
    pub max_iters: usize,
    /// Stop once the summed absolute score change drops below this.
    pub epsilon: f64,
    /// Probability of following an edge rather than teleporting.
    pub damping: f32,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            max_iters: 20,
            epsilon: 1e-4,
            damping: 0.85,
        }
    }
}

/// Score each vertex passes along every out-edge; zero for sinks.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn outgoing_contributions<N: NodeId>(g: &CompactGraph<N>, scores: &[f32], out: &mut [f32]) {
    out.par_iter_mut().enumerate().for_each(|(n, c)| {
        *c = match g.out_degree(N::from_index(n)) {
            0 => 0.0,
            d => scores[n] / d as f32,
        };
    });
}

/// Teleport share `(1 - damping) / n`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn base_score(num_nodes: usize, damping: f32) -> f32 {
    (1.0 - damping) / num_nodes.max(1) as f32
}

/// PageRank scores; stops after `max_iters` rounds or once converged.
#[allow(clippy::cast_precision_loss)]
pub fn pagerank_pull<N: NodeId>(g: &CompactGraph<N>, config: &PageRankConfig) -> ParallelVector<f32> {
    let n = g.num_nodes();
    let init_score = 1.0 / n.max(1) as f32;
    let base = base_score(n, config.damping);
    let mut scores = ParallelVector::filled(n, init_score);
    let mut contrib = ParallelVector::filled(n, 0f32);

    let mut iterations = 0;
    for iter in 0..config.max_iters {
        let start = Instant::now();
        outgoing_contributions(g, &scores, &mut contrib);
        let error: f64 = scores
            .par_iter_mut()
            .enumerate()
            .map(|(u, score)| {
                let incoming: f32 = g.in_neigh(N::from_index(u)).iter().map(|v| contrib[v.index()]).sum();
                let old = *score;
                *score = base + config.damping * incoming;
                f64::from((*score - old).abs())
            })
            .sum();
        iterations = iter + 1;
        debug!(iteration = iter, error, elapsed = ?start.elapsed());
        if error < config.epsilon {
            break;
        }
    }
    info!(iterations, "pagerank finished");
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Builder;

    #[test]
    fn cycle_is_uniform() {
        let g = Builder::new().build::<i32>(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
        let scores = pagerank_pull(&g, &PageRankConfig::default());
        assert!(scores.iter().all(|&s| (s - 0.2).abs() < 1e-6));
    }

    #[test]
    fn hub_outranks_leaves() {
        let edges: Vec<(i32, i32)> = (1..10).map(|v| (v, 0)).collect();
        let g = Builder::new().build(&edges);
        let scores = pagerank_pull(&g, &PageRankConfig::default());
        assert!(scores[1..].iter().all(|&s| s < scores[0]));
        assert!(scores[1..].windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn zero_iterations_returns_initial_scores() {
        let g = Builder::new().build::<i32>(&[(0, 1)]);
        let config = PageRankConfig { max_iters: 0, ..PageRankConfig::default() };
        assert_eq!(pagerank_pull(&g, &config).as_slice(), &[0.5, 0.5]);
    }
}
