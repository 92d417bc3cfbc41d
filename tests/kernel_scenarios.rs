use std::collections::HashMap;

use gapkern::algo::cc::component_stats;
use gapkern::algo::{
    afforest, brandes, delta_step, direction_optimizing_bfs, ordered_count, pagerank_pull, shiloach_vishkin,
    triangle_count, AfforestConfig, BfsConfig, PageRankConfig, Relabel, TriangleConfig,
};
use gapkern::benchmark::SourcePicker;
use gapkern::graph::{make_graph, relabel_by_degree, GraphSource};
use gapkern::verify::{verify_bc, verify_bfs, verify_cc, verify_pagerank, verify_sssp, verify_tc};
use gapkern::{Builder, CompactGraph, WeightedNode};

type WNode = WeightedNode<i32, i32>;

const CYCLE: [(i32, i32); 5] = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)];

fn kronecker(scale: u32, symmetrize: bool) -> CompactGraph<i32> {
    let source = GraphSource::Synthetic {
        scale,
        degree: 8,
        uniform: false,
    };
    make_graph(&source, symmetrize).unwrap()
}

fn partition(comp: &[i32]) -> Vec<usize> {
    let mut first = HashMap::new();
    comp.iter().enumerate().map(|(v, &c)| *first.entry(c).or_insert(v)).collect()
}

#[test]
fn directed_five_cycle() {
    let g = Builder::new().build::<i32>(&CYCLE);
    assert_eq!(direction_optimizing_bfs(&g, 0, &BfsConfig::default()).as_slice(), &[0, 0, 1, 2, 3]);

    let weighted: Vec<(i32, WNode)> = CYCLE.iter().map(|&(u, v)| (u, WeightedNode::new(v, 1))).collect();
    let wg = Builder::new().build(&weighted);
    assert_eq!(delta_step(&wg, 0, 1).as_slice(), &[0, 1, 2, 3, 4]);

    assert_eq!(shiloach_vishkin(&g).as_slice(), &[0; 5]);
    assert_eq!(afforest(&g, &AfforestConfig::default()).as_slice(), &[0; 5]);

    let undirected = Builder::new().symmetrize(true).build::<i32>(&CYCLE);
    assert_eq!(ordered_count(&undirected), 0);
}

#[test]
fn triangle_has_one_triangle() {
    let g = Builder::new().symmetrize(true).build::<i32>(&[(0, 1), (1, 2), (0, 2)]);
    assert_eq!(ordered_count(&g), 1);
    assert_eq!(ordered_count(&relabel_by_degree(&g).unwrap()), 1);
}

#[test]
fn bfs_on_kronecker_passes_verifier() {
    let g = kronecker(10, false);
    let mut picker = SourcePicker::new(&g, None).unwrap();
    for _ in 0..4 {
        let source = picker.pick_next();
        let parent = direction_optimizing_bfs(&g, source, &BfsConfig::default());
        assert!(verify_bfs(&g, source, &parent));
    }
}

#[test]
fn sssp_on_kronecker_matches_dijkstra() {
    let source = GraphSource::Synthetic {
        scale: 9,
        degree: 8,
        uniform: false,
    };
    let g: CompactGraph<WNode> = make_graph(&source, true).unwrap();
    let s = SourcePicker::new(&g, None).unwrap().pick_next();
    for delta in [1, 16, 300] {
        assert!(verify_sssp(&g, s, &delta_step(&g, s, delta)));
    }
}

#[test]
fn components_agree_and_verify() {
    for symmetrize in [false, true] {
        let g = kronecker(11, symmetrize);
        let sv = shiloach_vishkin(&g);
        let af = afforest(&g, &AfforestConfig::default());
        assert!(verify_cc(&g, &sv));
        assert!(verify_cc(&g, &af));
        assert_eq!(partition(&sv), partition(&af));

        let (count, largest) = component_stats(&af, 5);
        assert!(count >= 1);
        assert!(largest.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}

#[test]
fn bc_is_normalized_and_verified() {
    let g = kronecker(9, true);
    let mut picker = SourcePicker::new(&g, None).unwrap();
    let sources: Vec<i32> = (0..3).map(|_| picker.pick_next()).collect();
    let scores = brandes(&g, &sources);
    assert!(scores.iter().all(|&s| (0.0..=1.0).contains(&s)));
    assert_eq!(scores.iter().copied().fold(0.0, f32::max), 1.0);
    assert!(verify_bc(&g, &sources, &scores));
}

#[test]
fn pagerank_converges_on_kronecker() {
    let g = kronecker(10, false);
    let config = PageRankConfig {
        max_iters: 200,
        ..PageRankConfig::default()
    };
    let scores = pagerank_pull(&g, &config);
    assert!(verify_pagerank(&g, &scores, &config));
}

#[test]
fn triangle_count_is_relabel_invariant() {
    let g = kronecker(10, true);
    let counts: Vec<usize> = [Relabel::Never, Relabel::Always, Relabel::Auto]
        .into_iter()
        .map(|relabel| {
            let config = TriangleConfig {
                relabel,
                ..TriangleConfig::default()
            };
            triangle_count(&g, &config).unwrap()
        })
        .collect();
    assert!(counts.iter().all(|&c| c == counts[0]));
    assert!(verify_tc(&g, counts[0]));
}

#[test]
fn triangle_count_ignores_edge_order() {
    let mut edges: Vec<(i32, i32)> = (0..30).flat_map(|u| (1..4).map(move |k| (u, (u + k * 7) % 30))).collect();
    let forward = ordered_count(&Builder::new().symmetrize(true).build(&edges));
    edges.reverse();
    let backward = ordered_count(&Builder::new().symmetrize(true).build(&edges));
    assert_eq!(forward, backward);
}
