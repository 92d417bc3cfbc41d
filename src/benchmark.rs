//! Trial harness shared by the CLI and the benches: source selection, repeated
//! timed runs, and top-k reporting.

use std::time::{Duration, Instant};

use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::error::{GraphError, Result};
use crate::graph::{CompactGraph, Destination, NodeId};

/// Seed of the source-selection generator, so runs are reproducible.
pub const SOURCE_SEED: u64 = 8;

/// Yields kernel start vertices.
///
/// A configured source is returned every time. Otherwise vertices are drawn
/// uniformly, skipping any with no out-edges.
#[derive(Debug)]
pub struct SourcePicker<'g, D: Destination> {
    g: &'g CompactGraph<D>,
    given: Option<D::Node>,
    rng: ChaCha8Rng,
    dist: Uniform<usize>,
}

impl<'g, D: Destination> SourcePicker<'g, D> {
    /// Creates a picker for `g`.
    ///
    /// # Errors
    /// - [`GraphError::SourceOutOfRange`] if `given` is not a vertex of `g`
    /// - [`GraphError::EmptyGraph`] if no source is given and `g` has no edges
    pub fn new(g: &'g CompactGraph<D>, given: Option<i64>) -> Result<Self> {
        let n = g.num_nodes();
        let given = match given {
            Some(id) => {
                let in_range = usize::try_from(id).is_ok_and(|i| i < n);
                if !in_range {
                    return Err(GraphError::SourceOutOfRange {
                        source_id: id,
                        num_nodes: n,
                    });
                }
                usize::try_from(id).ok().map(<D::Node as NodeId>::from_index)
            }
            None if g.num_edges_directed() == 0 => return Err(GraphError::EmptyGraph),
            None => None,
        };
        Ok(Self {
            g,
            given,
            rng: ChaCha8Rng::seed_from_u64(SOURCE_SEED),
            dist: Uniform::new(0, n.max(1)),
        })
    }

    /// Next start vertex.
    pub fn pick_next(&mut self) -> D::Node {
        if let Some(source) = self.given {
            return source;
        }
        loop {
            let v = <D::Node as NodeId>::from_index(self.dist.sample(&mut self.rng));
            if self.g.out_degree(v) != 0 {
                return v;
            }
        }
    }
}

/// The `k` highest-scoring `(id, score)` pairs, best first; ties keep the lower id.
pub fn top_k<K: Ord + Copy, V: PartialOrd + Copy>(
    items: impl IntoIterator<Item = (K, V)>,
    k: usize,
) -> Vec<(K, V)> {
    let mut all: Vec<(K, V)> = items.into_iter().collect();
    all.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(core::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    all.truncate(k);
    all
}

/// How many times to run a kernel and what to do with the results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialConfig {
    /// Number of timed runs.
    pub num_trials: usize,
    /// Log kernel statistics for the final result.
    pub analysis: bool,
    /// Check every result against a serial oracle.
    pub verify: bool,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            num_trials: 16,
            analysis: false,
            verify: false,
        }
    }
}

/// Timings and verification outcome of a trial run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrialReport {
    /// Wall time of each trial.
    pub times: Vec<Duration>,
    /// `None` when verification was off, else whether every trial passed.
    pub verified: Option<bool>,
}

impl TrialReport {
    /// Mean trial time (zero if nothing ran).
    pub fn average(&self) -> Duration {
        match u32::try_from(self.times.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(count) => self.times.iter().sum::<Duration>() / count,
        }
    }
}

/// Runs `kernel` `config.num_trials` times on `g`.
///
/// `stats` sees the last result when analysis is on; `verify` sees every result
/// when verification is on.
pub fn run_trials<D, T, K, S, V>(
    g: &CompactGraph<D>,
    config: &TrialConfig,
    mut kernel: K,
    stats: S,
    verify: V,
) -> TrialReport
where
    D: Destination,
    K: FnMut(&CompactGraph<D>) -> T,
    S: Fn(&CompactGraph<D>, &T),
    V: Fn(&CompactGraph<D>, &T) -> bool,
{
    let mut report = TrialReport {
        times: Vec::with_capacity(config.num_trials),
        verified: config.verify.then_some(true),
    };
    let mut last = None;
    for trial in 0..config.num_trials {
        let start = Instant::now();
        let result = kernel(g);
        let elapsed = start.elapsed();
        report.times.push(elapsed);
        info!(trial, elapsed = ?elapsed, "trial time");

        if config.verify {
            let start = Instant::now();
            let ok = verify(g, &result);
            if ok {
                info!(trial, elapsed = ?start.elapsed(), "verification: PASS");
            } else {
                warn!(trial, elapsed = ?start.elapsed(), "verification: FAIL");
                report.verified = Some(false);
            }
        }
        last = Some(result);
    }
    if config.analysis {
        if let Some(result) = &last {
            stats(g, result);
        }
    }
    info!(average = ?report.average(), trials = config.num_trials, "average time");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Builder;

    #[test]
    fn given_source_is_validated_and_repeated() {
        let g = Builder::new().build::<i32>(&[(0, 1), (1, 2)]);
        let mut picker = SourcePicker::new(&g, Some(2)).unwrap();
        assert_eq!(picker.pick_next(), 2);
        assert_eq!(picker.pick_next(), 2);
        assert!(matches!(
            SourcePicker::new(&g, Some(3)),
            Err(GraphError::SourceOutOfRange { source_id: 3, num_nodes: 3 })
        ));
        assert!(matches!(
            SourcePicker::new(&g, Some(-1)),
            Err(GraphError::SourceOutOfRange { .. })
        ));
    }

    #[test]
    fn random_sources_have_out_edges_and_repeat_across_pickers() {
        let g = Builder::new().num_nodes(64).build::<i32>(&[(5, 6), (40, 2)]);
        let mut a = SourcePicker::new(&g, None).unwrap();
        let mut b = SourcePicker::new(&g, None).unwrap();
        for _ in 0..20 {
            let s = a.pick_next();
            assert!(s == 5 || s == 40);
            assert_eq!(s, b.pick_next());
        }
    }

    #[test]
    fn edgeless_graph_has_no_source() {
        let g = Builder::new().num_nodes(4).build::<i32>(&[]);
        assert!(matches!(SourcePicker::new(&g, None), Err(GraphError::EmptyGraph)));
    }

    #[test]
    fn top_k_orders_by_score_then_id() {
        let top = top_k([(0, 0.5), (1, 0.9), (2, 0.5), (3, 0.1)], 3);
        assert_eq!(top, vec![(1, 0.9), (0, 0.5), (2, 0.5)]);
    }

    #[test]
    fn trials_record_times_and_failures() {
        let g = Builder::new().build::<i32>(&[(0, 1)]);
        let config = TrialConfig { num_trials: 3, analysis: true, verify: true };
        let mut runs = 0;
        let report = run_trials(&g, &config, |_| { runs += 1; runs }, |_, _| {}, |_, &r| r != 2);
        assert_eq!(report.times.len(), 3);
        assert_eq!(report.verified, Some(false));
        assert_eq!(runs, 3);
    }
}
