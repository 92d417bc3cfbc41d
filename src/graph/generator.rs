//! Synthetic edge lists: uniform random and Kronecker (R-MAT).
//!
//! Edges are produced in blocks of `BLOCK_SIZE`, each block with its own RNG seeded
//! from `BASE_SEED + block`, so output is identical for any thread count.

use std::time::Instant;

use num_traits::{One, Zero};
use rand::distributions::{Distribution, Uniform};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::info;

use crate::graph::node::{Destination, Edge, EdgeList, NodeId, Weight};

/// Edges generated per independently seeded block.
pub const BLOCK_SIZE: usize = 1 << 18;

/// Seed of block zero and of the ID permutation.
pub const BASE_SEED: u64 = 8;

/// Kronecker initiator probabilities; `D = 1 - A - B - C`.
const KRON_A: f32 = 0.57;
const KRON_B: f32 = 0.19;
const KRON_C: f32 = 0.19;

/// Generates `2^scale` nodes with `degree * 2^scale` edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Generator {
    scale: u32,
    num_nodes: usize,
    num_edges: usize,
}

impl Generator {
    /// # Panics
    /// Panics if `scale` leaves no room for the edge count in `usize`.
    pub fn new(scale: u32, degree: usize) -> Self {
        assert!(scale < usize::BITS - 1, "scale {scale} too large");
        let num_nodes = 1usize << scale;
        let num_edges = num_nodes
            .checked_mul(degree)
            .unwrap_or_else(|| panic!("2^{scale} * {degree} edges overflow"));
        Self {
            scale,
            num_nodes,
            num_edges,
        }
    }

    /// Number of nodes the generated IDs range over.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of edges generated (before deduplication).
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Generates a uniform or Kronecker edge list, with unit weights.
    ///
    /// # Panics
    /// Panics if node IDs of type `D::Node` cannot hold `2^scale - 1`.
    pub fn generate<D: Destination>(&self, uniform: bool) -> EdgeList<D> {
        assert!(
            (self.scale as usize) < D::Node::WIDTH * 8 - 1,
            "scale {} does not fit a {}-byte node id",
            self.scale,
            D::Node::WIDTH
        );
        let start = Instant::now();
        let edges = if uniform {
            self.uniform_edges()
        } else {
            self.kronecker_edges()
        };
        info!(elapsed = ?start.elapsed(), edges = edges.len(), uniform, "generate time");
        edges
    }

    fn blank<D: Destination>(&self) -> EdgeList<D> {
        let zero = <D::Node as Zero>::zero();
        vec![(zero, D::new(zero, D::Weight::one())); self.num_edges]
    }

    /// Endpoints drawn uniformly from `0..2^scale`.
    pub fn uniform_edges<D: Destination>(&self) -> EdgeList<D> {
        let mut edges = self.blank::<D>();
        let dist = Uniform::new(0, self.num_nodes);
        edges
            .par_chunks_mut(BLOCK_SIZE)
            .enumerate()
            .for_each(|(block, chunk)| {
                let mut rng = ChaCha8Rng::seed_from_u64(BASE_SEED + block as u64);
                for e in chunk {
                    let u = D::Node::from_index(dist.sample(&mut rng));
                    let v = D::Node::from_index(dist.sample(&mut rng));
                    *e = (u, e.1.retarget(v));
                }
            });
        edges
    }

    /// R-MAT edges with skewed degree distribution, IDs randomly permuted.
    pub fn kronecker_edges<D: Destination>(&self) -> EdgeList<D> {
        let mut edges = self.blank::<D>();
        let scale = self.scale;
        edges
            .par_chunks_mut(BLOCK_SIZE)
            .enumerate()
            .for_each(|(block, chunk)| {
                let mut rng = ChaCha8Rng::seed_from_u64(BASE_SEED + block as u64);
                for e in chunk {
                    let (mut src, mut dst) = (0usize, 0usize);
                    for _ in 0..scale {
                        let point: f32 = rng.gen();
                        src <<= 1;
                        dst <<= 1;
                        if point < KRON_A + KRON_B {
                            if point > KRON_A {
                                dst += 1;
                            }
                        } else {
                            src += 1;
                            if point > KRON_A + KRON_B + KRON_C {
                                dst += 1;
                            }
                        }
                    }
                    *e = (D::Node::from_index(src), e.1.retarget(D::Node::from_index(dst)));
                }
            });
        self.permute_ids(&mut edges);
        edges
    }

    /// Applies one random permutation of `0..num_nodes` to every endpoint.
    fn permute_ids<D: Destination>(&self, edges: &mut [Edge<D>]) {
        let mut permutation: Vec<D::Node> = (0..self.num_nodes)
            .into_par_iter()
            .map(D::Node::from_index)
            .collect();
        permutation.shuffle(&mut ChaCha8Rng::seed_from_u64(BASE_SEED));
        edges.par_iter_mut().for_each(|(u, d)| {
            *u = permutation[u.index()];
            *d = d.retarget(permutation[d.node().index()]);
        });
    }
}

/// Overwrites each edge's weight with a uniform draw from `1..=255`.
///
/// Unweighted edge lists are left untouched.
pub fn insert_weights<D: Destination>(edges: &mut [Edge<D>]) {
    if !D::WEIGHTED {
        return;
    }
    let dist = Uniform::new_inclusive(1u8, 255u8);
    edges
        .par_chunks_mut(BLOCK_SIZE)
        .enumerate()
        .for_each(|(block, chunk)| {
            let mut rng = ChaCha8Rng::seed_from_u64(BASE_SEED + block as u64);
            for (_, d) in chunk {
                *d = D::new(d.node(), D::Weight::from_u8(dist.sample(&mut rng)));
            }
        });
}
