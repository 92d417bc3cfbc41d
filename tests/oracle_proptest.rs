use std::collections::HashSet;

use gapkern::algo::{
    afforest, brandes, delta_step, direction_optimizing_bfs, ordered_count, shiloach_vishkin, AfforestConfig,
    BfsConfig,
};
use gapkern::algo::sssp::dist_infinity;
use gapkern::graph::relabel_by_degree;
use gapkern::verify::{dijkstra, serial_brandes, serial_triangle_count, verify_bfs, verify_cc};
use gapkern::{Builder, CompactGraph, WeightedNode};
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use proptest::prelude::*;

type WNode = WeightedNode<i32, i32>;

fn arb_graph() -> impl Strategy<Value = (usize, Vec<(i32, i32, i32)>)> {
    (1usize..48).prop_flat_map(|n| {
        let id = 0..n as i32;
        (Just(n), proptest::collection::vec((id.clone(), id, 1..30i32), 0..160))
    })
}

fn unweighted(n: usize, edges: &[(i32, i32, i32)], symmetrize: bool) -> CompactGraph<i32> {
    let list: Vec<(i32, i32)> = edges.iter().map(|&(u, v, _)| (u, v)).collect();
    Builder::new().num_nodes(n).symmetrize(symmetrize).build(&list)
}

fn weighted(n: usize, edges: &[(i32, i32, i32)]) -> CompactGraph<WNode> {
    let list: Vec<(i32, WNode)> = edges.iter().map(|&(u, v, w)| (u, WeightedNode::new(v, w))).collect();
    Builder::new().num_nodes(n).build(&list)
}

proptest! {
    #[test]
    fn bfs_trees_are_valid((n, edges) in arb_graph(), source in 0usize..48, symmetrize: bool) {
        let g = unweighted(n, &edges, symmetrize);
        let source = (source % n) as i32;
        for config in [BfsConfig::default(), BfsConfig { alpha: 1, beta: 1_000_000 }] {
            let parent = direction_optimizing_bfs(&g, source, &config);
            prop_assert!(verify_bfs(&g, source, &parent));
        }
    }

    #[test]
    fn sssp_matches_petgraph_dijkstra((n, edges) in arb_graph(), source in 0usize..48, delta in 1i32..40) {
        let g = weighted(n, &edges);
        let source = (source % n) as i32;
        let dist = delta_step(&g, source, delta);
        let serial = dijkstra(&g, source);
        prop_assert_eq!(dist.as_slice(), serial.as_slice());

        let mut pg = DiGraph::<(), i32>::with_capacity(n, edges.len());
        for _ in 0..n {
            pg.add_node(());
        }
        for &(u, v, w) in &edges {
            if u != v {
                pg.add_edge(NodeIndex::new(u as usize), NodeIndex::new(v as usize), w);
            }
        }
        let oracle = petgraph::algo::dijkstra(&pg, NodeIndex::new(source as usize), None, |e| *e.weight());
        for (v, &d) in dist.iter().enumerate() {
            match oracle.get(&NodeIndex::new(v)) {
                Some(&expected) => prop_assert_eq!(d, expected),
                None => prop_assert_eq!(d, dist_infinity::<i32>()),
            }
        }
    }

    #[test]
    fn components_match_petgraph((n, edges) in arb_graph(), symmetrize: bool, rounds in 0usize..4) {
        let g = unweighted(n, &edges, symmetrize);
        let sv = shiloach_vishkin(&g);
        let config = AfforestConfig { neighbor_rounds: rounds, num_samples: 64, ..AfforestConfig::default() };
        let af = afforest(&g, &config);
        prop_assert!(verify_cc(&g, &sv));
        prop_assert!(verify_cc(&g, &af));

        let mut pg = UnGraph::<(), ()>::with_capacity(n, edges.len());
        for _ in 0..n {
            pg.add_node(());
        }
        for &(u, v, _) in &edges {
            pg.add_edge(NodeIndex::new(u as usize), NodeIndex::new(v as usize), ());
        }
        let expected = petgraph::algo::connected_components(&pg);
        prop_assert_eq!(sv.iter().collect::<HashSet<_>>().len(), expected);
        prop_assert_eq!(af.iter().collect::<HashSet<_>>().len(), expected);
    }

    #[test]
    fn bc_matches_serial_brandes((n, edges) in arb_graph(), picks in proptest::collection::vec(0usize..48, 1..4)) {
        let g = unweighted(n, &edges, false);
        let sources: Vec<i32> = picks.iter().map(|&s| (s % n) as i32).collect();
        let scores = brandes(&g, &sources);
        let oracle = serial_brandes(&g, &sources);
        for (a, b) in scores.iter().zip(&oracle) {
            prop_assert!((a - b).abs() <= 1e-4, "{} vs {}", a, b);
        }
    }

    #[test]
    fn triangle_counts_agree((n, edges) in arb_graph()) {
        let g = unweighted(n, &edges, true);
        let expected = serial_triangle_count(&g);
        prop_assert_eq!(ordered_count(&g), expected);
        prop_assert_eq!(ordered_count(&relabel_by_degree(&g).unwrap()), expected);
    }
}
