//! Tests for graph construction.

use super::*;
use crate::graph::node::WeightedNode;

#[test]
fn prefix_sum_is_exclusive_with_total() {
    assert_eq!(parallel_prefix_sum(&[3, 0, 2, 5]), vec![0, 3, 3, 5, 10]);
    assert_eq!(parallel_prefix_sum(&[]), vec![0]);

    let big = vec![1usize; (1 << 20) + 7];
    let sums = parallel_prefix_sum(&big);
    assert_eq!(sums[1 << 20], 1 << 20);
    assert_eq!(*sums.last().unwrap(), (1 << 20) + 7);
}

#[test]
fn directed_build_squishes_and_inverts() {
    let edges: Vec<(i32, i32)> = vec![(0, 2), (0, 1), (0, 1), (1, 1), (2, 0), (3, 0)];
    let g = Builder::new().build(&edges);

    assert!(g.directed());
    assert_eq!(g.num_nodes(), 4);
    assert_eq!(g.out_neigh(0), &[1, 2]);
    assert!(g.out_neigh(1).is_empty());
    assert_eq!(g.in_neigh(0), &[2, 3]);
    assert_eq!(g.in_neigh(1), &[0]);
    assert_eq!(g.num_edges(), 4);
}

#[test]
fn symmetrized_build_stores_both_directions() {
    let edges: Vec<(i32, i32)> = vec![(0, 1), (1, 0), (1, 2)];
    let g = Builder::new().symmetrize(true).build(&edges);

    assert!(!g.directed());
    assert_eq!(g.out_neigh(1), &[0, 2]);
    assert_eq!(g.out_neigh(2), &[1]);
    assert_eq!(g.num_edges(), 2);
}

#[test]
fn fixed_node_count_keeps_isolated_tail() {
    let g = Builder::new().num_nodes(5).symmetrize(true).build::<i32>(&[(0, 1)]);
    assert_eq!(g.num_nodes(), 5);
    assert_eq!(g.out_degree(4), 0);
}

#[test]
fn empty_edge_list_builds_empty_graph() {
    let g = Builder::new().build::<i32>(&[]);
    assert_eq!(g.num_nodes(), 0);
    assert_eq!(g.num_edges(), 0);
}

#[test]
fn weighted_duplicates_keep_lightest() {
    let edges = vec![
        (0i32, WeightedNode::new(1i32, 9i32)),
        (0, WeightedNode::new(1, 4)),
        (1, WeightedNode::new(2, 3)),
    ];
    let g = Builder::new().build(&edges);
    assert_eq!(g.out_neigh(0), &[WeightedNode::new(1, 4)]);
    assert_eq!(g.in_neigh(2), &[WeightedNode::new(1, 3)]);
    assert_eq!(g.in_neigh(1), &[WeightedNode::new(0, 4)]);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn rejects_edges_past_fixed_count() {
    let _ = Builder::new().num_nodes(2).build::<i32>(&[(0, 3)]);
}

#[test]
fn relabel_orders_by_descending_degree() {
    // star centered at 3 plus edge 0-1
    let edges: Vec<(i32, i32)> = vec![(3, 0), (3, 1), (3, 2), (0, 1)];
    let g = Builder::new().symmetrize(true).build(&edges);
    let r = relabel_by_degree(&g).unwrap();

    assert_eq!(r.num_nodes(), 4);
    assert_eq!(r.num_edges(), g.num_edges());
    // old 3 (degree 3) becomes 0; old 1 and 0 (degree 2) become 1 and 2; old 2 becomes 3
    assert_eq!(r.out_degree(0), 3);
    assert_eq!(r.out_neigh(0), &[1, 2, 3]);
    assert_eq!(r.out_neigh(1), &[0, 2]);
    assert_eq!(r.out_neigh(3), &[0]);
}

#[test]
fn relabel_rejects_directed() {
    let g = Builder::new().build::<i32>(&[(0, 1)]);
    assert!(matches!(relabel_by_degree(&g), Err(GraphError::DirectedRelabel)));
}
