//! Structural assertions over graphs and partitions.
//!
//! These compare graphs by content — payload sets and labeled edge
//! multisets — rather than by internal layout, so any kernel is free to
//! renumber the arena without breaking a test.

use crate::contract::Payload;
use crate::graph::Graph;
use crate::partition::Partition;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

fn edge_census<V, E>(g: &Graph<V, E>) -> HashMap<(&V, &E, &V), usize>
where
    V: Payload + Hash + Eq,
    E: Payload + Hash + Eq,
{
    let mut census = HashMap::new();
    for v in g.vertices() {
        for (label, target) in g.edges_from(v).unwrap() {
            *census.entry((v, label, target)).or_insert(0) += 1;
        }
    }
    census
}

/// Assert that two graphs have the same vertices and the same labeled
/// edge multiset.
pub fn assert_same_shape<V, E>(a: &Graph<V, E>, b: &Graph<V, E>)
where
    V: Payload + Hash + Eq + Debug,
    E: Payload + Hash + Eq + Debug,
{
    let va: std::collections::HashSet<&V> = a.vertices().collect();
    let vb: std::collections::HashSet<&V> = b.vertices().collect();
    let only_a: Vec<_> = va.difference(&vb).collect();
    let only_b: Vec<_> = vb.difference(&va).collect();
    assert!(
        only_a.is_empty() && only_b.is_empty(),
        "vertex sets differ: {only_a:?} vs {only_b:?}"
    );
    let ea = edge_census(a);
    let eb = edge_census(b);
    for (edge, &count) in &ea {
        assert_eq!(
            eb.get(edge).copied().unwrap_or(0),
            count,
            "edge multiplicity differs for {edge:?}"
        );
    }
    for (edge, &count) in &eb {
        assert_eq!(
            ea.get(edge).copied().unwrap_or(0),
            count,
            "edge multiplicity differs for {edge:?}"
        );
    }
}

/// Assert that every vertex has exactly the given out- and in-degrees.
pub fn assert_regular<V, E>(g: &Graph<V, E>, out_degree: usize, in_degree: usize)
where
    V: Payload + Debug,
    E: Payload,
{
    for v in g.vertices() {
        assert_eq!(
            g.out_degree(v),
            Some(out_degree),
            "out-degree of {v:?} is off"
        );
        assert_eq!(g.in_degree(v), Some(in_degree), "in-degree of {v:?} is off");
    }
}

/// Assert that the partition's class sizes, sorted, match `expected`, and
/// that they sum to the number of partitioned elements.
pub fn assert_class_sizes(p: &Partition, expected: &[usize]) {
    let mut sizes: Vec<usize> = p.classes().iter().map(|&c| p.class_size(c)).collect();
    sizes.sort_unstable();
    let mut expected: Vec<usize> = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(sizes, expected, "class sizes differ");
    assert_eq!(
        sizes.iter().sum::<usize>(),
        p.len(),
        "class sizes do not cover the partition"
    );
}
