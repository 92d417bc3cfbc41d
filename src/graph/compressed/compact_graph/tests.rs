//! Tests for the compact graph query surface.

use super::*;
use crate::graph::node::WeightedNode;

fn cycle() -> CompactGraph<i32> {
    // 0 -> 1 -> 2 -> 0, plus 0 -> 2
    CompactGraph::from_directed_parts(
        vec![0, 2, 3, 4],
        vec![1, 2, 2, 0],
        vec![0, 1, 2, 4],
        vec![2, 0, 0, 1],
    )
}

#[test]
fn directed_degrees_and_rows() {
    let g = cycle();
    assert!(g.directed());
    assert_eq!(g.num_nodes(), 3);
    assert_eq!(g.num_edges(), 4);
    assert_eq!(g.num_edges_directed(), 4);

    assert_eq!(g.out_degree(0), 2);
    assert_eq!(g.in_degree(2), 2);
    assert_eq!(g.out_neigh(0), &[1, 2]);
    assert_eq!(g.in_neigh(2), &[0, 1]);
    assert_eq!(g.out_edge_range(1), 2..3);
}

#[test]
fn skip_resumes_mid_row() {
    let g = cycle();
    assert_eq!(g.out_neigh_from(0, 1), &[2]);
    assert!(g.out_neigh_from(0, 2).is_empty());
    assert!(g.out_neigh_from(0, 10).is_empty());
    assert_eq!(g.in_neigh_from(2, 1), &[1]);
}

#[test]
fn undirected_answers_in_queries_from_out_rows() {
    // path 0 - 1 - 2
    let g = CompactGraph::<i32>::from_undirected_parts(vec![0, 1, 3, 4], vec![1, 0, 2, 1]);
    assert!(!g.directed());
    assert_eq!(g.num_edges(), 2);
    assert_eq!(g.num_edges_directed(), 4);
    assert_eq!(g.in_neigh(1), g.out_neigh(1));
    assert_eq!(g.in_degree(1), 2);
    assert!(g.in_offsets().is_none());
    assert!(g.has_edge(1, 2));
    assert!(!g.has_edge(0, 2));
    assert_eq!(g.vertices().collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn weighted_rows_expose_weights() {
    let g = CompactGraph::from_undirected_parts(
        vec![0, 1, 2],
        vec![WeightedNode::new(1i32, 7i32), WeightedNode::new(0, 7)],
    );
    assert_eq!(g.out_neigh(0)[0].weight(), 7);
    assert!(g.has_edge(1, 0));
}

#[test]
fn empty_graph() {
    let g = CompactGraph::<i32>::from_undirected_parts(vec![0], Vec::new());
    assert_eq!(g.num_nodes(), 0);
    assert_eq!(g.average_degree(), 0.0);
    assert_eq!(g.vertices().count(), 0);
}

#[test]
#[should_panic(expected = "offsets must be monotone")]
fn rejects_non_monotone_offsets() {
    let _ = CompactGraph::<i32>::from_undirected_parts(vec![0, 2, 1], vec![1, 0]);
}
