//! Serial oracles for checking kernel output.
//!
//! Each checker recomputes the answer the slow, obviously-correct way and compares.
//! Mismatches are logged at `warn` with the first offending vertex.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, VecDeque};

use num_traits::{One, Zero};
use tracing::warn;

use crate::algo::pagerank::{base_score, PageRankConfig};
use crate::algo::sssp::dist_infinity;
use crate::graph::{CompactGraph, Destination, NodeId, Weight, WeightedNode};

/// Hop distance from `source` over out-edges; `None` where unreachable.
pub fn serial_bfs_depths<D: Destination>(g: &CompactGraph<D>, source: D::Node) -> Vec<Option<usize>> {
    let mut depth = vec![None; g.num_nodes()];
    depth[source.index()] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(u) = queue.pop_front() {
        let next = depth[u.index()].map(|d| d + 1);
        for d in g.out_neigh(u) {
            let v = d.node().index();
            if depth[v].is_none() {
                depth[v] = next;
                queue.push_back(d.node());
            }
        }
    }
    depth
}

/// Checks a BFS parent array: same reachability as a serial BFS, the source is its
/// own parent, and every other parent is an in-neighbor one level closer.
pub fn verify_bfs<N: NodeId>(g: &CompactGraph<N>, source: N, parent: &[N]) -> bool {
    let depth = serial_bfs_depths(g, source);
    for (u, (&p, &d)) in parent.iter().zip(&depth).enumerate() {
        let ok = match (d, p >= <N as Zero>::zero()) {
            (None, false) => true,
            (Some(0), true) => p == source,
            (Some(d), true) => {
                g.in_neigh(N::from_index(u)).binary_search(&p).is_ok()
                    && depth[p.index()] == Some(d - 1)
            }
            _ => false,
        };
        if !ok {
            warn!(vertex = u, parent = %p, depth = ?d, "bad bfs parent");
            return false;
        }
    }
    true
}

/// Shortest-path distances by binary-heap Dijkstra.
pub fn dijkstra<N: NodeId, W: Weight>(g: &CompactGraph<WeightedNode<N, W>>, source: N) -> Vec<W> {
    let mut dist = vec![dist_infinity::<W>(); g.num_nodes()];
    dist[source.index()] = <W as Zero>::zero();
    let mut heap = BinaryHeap::from([Reverse((<W as Zero>::zero(), source))]);
    while let Some(Reverse((d, u))) = heap.pop() {
        if d > dist[u.index()] {
            continue;
        }
        for wn in g.out_neigh(u) {
            let candidate = d.saturating_add(wn.w);
            if candidate < dist[wn.v.index()] {
                dist[wn.v.index()] = candidate;
                heap.push(Reverse((candidate, wn.v)));
            }
        }
    }
    dist
}

/// Compares delta-stepping distances against [`dijkstra`].
pub fn verify_sssp<N: NodeId, W: Weight>(g: &CompactGraph<WeightedNode<N, W>>, source: N, dist: &[W]) -> bool {
    let oracle = dijkstra(g, source);
    match oracle.iter().zip(dist).position(|(a, b)| a != b) {
        None => oracle.len() == dist.len(),
        Some(v) => {
            warn!(vertex = v, expected = %oracle[v], found = %dist[v], "bad sssp distance");
            false
        }
    }
}

/// Checks a component labelling: a traversal over both edge directions from each
/// unvisited vertex must see one label, and no label may span two traversals.
pub fn verify_cc<N: NodeId>(g: &CompactGraph<N>, comp: &[N]) -> bool {
    let n = g.num_nodes();
    if comp.len() != n {
        return false;
    }
    let mut visited = vec![false; n];
    let mut labels_seen = BTreeSet::new();
    for root in 0..n {
        if visited[root] {
            continue;
        }
        let label = comp[root];
        if !labels_seen.insert(label) {
            warn!(vertex = root, %label, "label shared by two components");
            return false;
        }
        visited[root] = true;
        let mut stack = vec![N::from_index(root)];
        while let Some(u) = stack.pop() {
            for &v in g.out_neigh(u).iter().chain(g.in_neigh(u)) {
                if comp[v.index()] != label {
                    warn!(vertex = %v, expected = %label, found = %comp[v.index()], "component split");
                    return false;
                }
                if !visited[v.index()] {
                    visited[v.index()] = true;
                    stack.push(v);
                }
            }
        }
    }
    true
}

/// Serial Brandes over `sources`, normalized by the maximum score.
#[allow(clippy::cast_possible_truncation)]
pub fn serial_brandes<N: NodeId>(g: &CompactGraph<N>, sources: &[N]) -> Vec<f32> {
    let n = g.num_nodes();
    let mut scores = vec![0f32; n];
    for &source in sources {
        let depth = serial_bfs_depths(g, source);
        let mut order: Vec<usize> = (0..n).filter(|&v| depth[v].is_some()).collect();
        order.sort_by_key(|&v| depth[v]);

        let mut paths = vec![0f64; n];
        paths[source.index()] = 1.0;
        for &u in &order {
            for &v in g.out_neigh(N::from_index(u)) {
                if depth[v.index()] == depth[u].map(|d| d + 1) {
                    paths[v.index()] += paths[u];
                }
            }
        }
        let mut deltas = vec![0f64; n];
        for &u in order.iter().rev() {
            for &v in g.out_neigh(N::from_index(u)) {
                if depth[v.index()] == depth[u].map(|d| d + 1) {
                    deltas[u] += paths[u] / paths[v.index()] * (1.0 + deltas[v.index()]);
                }
            }
            scores[u] += deltas[u] as f32;
        }
    }
    let biggest = scores.iter().copied().fold(0.0, f32::max);
    if biggest > 0.0 {
        scores.iter_mut().for_each(|s| *s /= biggest);
    }
    scores
}

/// Compares BC scores against [`serial_brandes`] within `1e-4`.
pub fn verify_bc<N: NodeId>(g: &CompactGraph<N>, sources: &[N], scores: &[f32]) -> bool {
    let oracle = serial_brandes(g, sources);
    match oracle.iter().zip(scores).position(|(a, b)| (a - b).abs() > 1e-4) {
        None => oracle.len() == scores.len(),
        Some(v) => {
            warn!(vertex = v, expected = oracle[v], found = scores[v], "bad bc score");
            false
        }
    }
}

/// Triangle count by set intersection of every adjacent pair's neighborhoods.
pub fn serial_triangle_count<N: NodeId>(g: &CompactGraph<N>) -> usize {
    let sets: Vec<BTreeSet<N>> = g.vertices().map(|u| g.out_neigh(u).iter().copied().collect()).collect();
    let mut total = 0;
    for u in g.vertices() {
        for v in g.out_neigh(u) {
            total += sets[u.index()].intersection(&sets[v.index()]).count();
        }
    }
    // Every triangle is seen from each of its 6 ordered edges.
    total / 6
}

/// Compares a triangle count against [`serial_triangle_count`].
pub fn verify_tc<N: NodeId>(g: &CompactGraph<N>, count: usize) -> bool {
    let expected = serial_triangle_count(g);
    if expected != count {
        warn!(expected, found = count, "bad triangle count");
    }
    expected == count
}

/// Applies one more push-style iteration to `scores` and checks that the summed
/// absolute change stays below `config.epsilon`.
#[allow(clippy::cast_precision_loss)]
pub fn verify_pagerank<N: NodeId>(g: &CompactGraph<N>, scores: &[f32], config: &PageRankConfig) -> bool {
    let n = g.num_nodes();
    let base = f64::from(base_score(n, config.damping));
    let damping = f64::from(config.damping);
    let mut incoming = vec![0f64; n];
    for u in g.vertices() {
        let degree = g.out_degree(u);
        if degree == 0 {
            continue;
        }
        let outgoing = f64::from(scores[u.index()]) / degree as f64;
        for &v in g.out_neigh(u) {
            incoming[v.index()] += outgoing;
        }
    }
    let error: f64 = incoming
        .iter()
        .zip(scores)
        .map(|(&sum, &s)| (base + damping * sum - f64::from(s)).abs())
        .sum();
    if error >= config.epsilon {
        warn!(error, epsilon = config.epsilon, "pagerank residual too large");
    }
    error < config.epsilon
}

/// Weight of the lightest `u -> v` edge, if present.
pub fn edge_weight<N: NodeId, W: Weight>(g: &CompactGraph<WeightedNode<N, W>>, u: N, v: N) -> Option<W> {
    g.out_neigh(u)
        .binary_search_by(|d| d.v.cmp(&v))
        .ok()
        .map(|i| g.out_neigh(u)[i].w)
}

/// Builds the unit-weight twin of an unweighted graph, for feeding SSSP.
pub fn with_unit_weights<N: NodeId>(g: &CompactGraph<N>) -> CompactGraph<WeightedNode<N, N>>
where
    N: Weight,
{
    let weigh = |ns: &[N]| ns.iter().map(|&v| WeightedNode::new(v, N::one())).collect::<Vec<_>>();
    match (g.in_offsets(), g.in_neighbors()) {
        (Some(offsets), Some(neighbors)) => CompactGraph::from_directed_parts(
            g.out_offsets().to_vec(),
            weigh(g.out_neighbors()),
            offsets.to_vec(),
            weigh(neighbors),
        ),
        _ => CompactGraph::from_undirected_parts(g.out_offsets().to_vec(), weigh(g.out_neighbors())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Builder;

    fn cycle() -> CompactGraph<i32> {
        Builder::new().build(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)])
    }

    #[test]
    fn bfs_checker_rejects_bad_parents() {
        let g = cycle();
        assert!(verify_bfs(&g, 0, &[0, 0, 1, 2, 3]));
        assert!(!verify_bfs(&g, 0, &[0, 0, 0, 2, 3]));
        assert!(!verify_bfs(&g, 0, &[0, 0, 1, 2, -1]));
    }

    #[test]
    fn dijkstra_on_unit_cycle() {
        let g = with_unit_weights(&cycle());
        assert_eq!(dijkstra(&g, 0), vec![0, 1, 2, 3, 4]);
        assert!(verify_sssp(&g, 2, &[3, 4, 0, 1, 2]));
        assert_eq!(edge_weight(&g, 3, 4), Some(1));
        assert_eq!(edge_weight(&g, 4, 3), None);
    }

    #[test]
    fn cc_checker_detects_merged_and_split_labels() {
        let g = Builder::new().num_nodes(4).symmetrize(true).build::<i32>(&[(0, 1), (2, 3)]);
        assert!(verify_cc(&g, &[0, 0, 2, 2]));
        assert!(!verify_cc(&g, &[0, 0, 0, 0]));
        assert!(!verify_cc(&g, &[0, 1, 2, 2]));
    }

    #[test]
    fn serial_counts() {
        let g = Builder::new().symmetrize(true).build::<i32>(&[(0, 1), (1, 2), (2, 0), (2, 3)]);
        assert_eq!(serial_triangle_count(&g), 1);
        assert!(verify_tc(&g, 1));
        let path = Builder::new().symmetrize(true).build::<i32>(&[(0, 1), (1, 2)]);
        assert_eq!(serial_brandes(&path, &[0]), vec![1.0, 0.5, 0.0]);
    }

    #[test]
    fn pagerank_fixed_point_passes() {
        let g = cycle();
        assert!(verify_pagerank(&g, &[0.2; 5], &PageRankConfig::default()));
        assert!(!verify_pagerank(&g, &[0.6, 0.1, 0.1, 0.1, 0.1], &PageRankConfig::default()));
    }
}
