use trestle::testing::*;
use trestle::{Builder, Graph, Order, Runner};

#[test]
fn hypercube_counts_and_degrees() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let g = hypercube(6, &runner)?;

    assert_eq!(g.vertex_count(&runner)?, 64);
    assert_eq!(g.edge_count(&runner)?, 384);
    assert_regular(&g, 6, 6);
    g.free_now(&runner)?;
    Ok(())
}

#[test]
fn every_edge_flips_exactly_its_axis() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(5, &runner)?;

    for v in g.vertices() {
        for (label, target) in g.edges_from(v).unwrap() {
            assert_eq!(v ^ target, 1 << label);
        }
    }
    Ok(())
}

#[test]
fn lookup_answers_for_built_vertices_only() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(4, &runner)?;

    assert_eq!(g.lookup(&0), Some(&0));
    assert_eq!(g.lookup(&15), Some(&15));
    assert_eq!(g.lookup(&16), None);
    assert!(g.contains(&7));
    assert!(!g.contains(&99));
    assert_eq!(g.root(), &0);
    Ok(())
}

#[test]
fn duplicate_connections_are_deduplicated_under_an_edge_order() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let doubled = Builder::new(|v: &u64, edges| {
        edges.connect(7u64, v ^ 1);
        edges.connect(7u64, v ^ 1);
        Ok(())
    })
    .natural_edge_order();

    let g = Graph::build(&doubled, 0u64, &runner)?;
    assert_eq!(g.vertex_count(&runner)?, 2);
    assert_eq!(g.edge_count(&runner)?, 2);
    Ok(())
}

#[test]
fn duplicate_connections_stay_without_an_edge_order() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let doubled = Builder::new(|v: &u64, edges| {
        edges.connect(7u64, v ^ 1);
        edges.connect(7u64, v ^ 1);
        Ok(())
    });

    let g = Graph::build(&doubled, 0u64, &runner)?;
    assert_eq!(g.vertex_count(&runner)?, 2);
    assert_eq!(g.edge_count(&runner)?, 4);
    Ok(())
}

#[test]
fn subconnector_sees_the_discovering_label() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    // a chain: the root starts with label 0, every later vertex continues
    // with the successor of the label it was discovered through
    let chain = Builder::subconnected(
        Order::natural(),
        |seen: Option<&u64>, v: &u64, edges| {
            let next = seen.map_or(0, |l| l + 1);
            if next < 6 {
                edges.connect(next, v + 1);
            }
            Ok(())
        },
    );

    let g = Graph::build(&chain, 0u64, &runner)?;
    assert_eq!(g.vertex_count(&runner)?, 7);
    assert_eq!(g.edge_count(&runner)?, 6);
    for v in 0..6u64 {
        assert_eq!(g.edges_from(&v).unwrap(), vec![(&v, &(v + 1))]);
    }
    assert_eq!(g.out_degree(&6), Some(0));
    Ok(())
}

#[test]
fn back_references_account_for_every_edge() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let g = hypercube(6, &runner)?;

    let ins: usize = g.vertices().map(|v| g.in_degree(v).unwrap()).sum();
    let outs: usize = g.vertices().map(|v| g.out_degree(v).unwrap()).sum();
    assert_eq!(ins, outs);
    assert_eq!(ins, g.edge_count(&runner)?);
    Ok(())
}

#[test]
fn one_lane_per_core_builds_the_same_graph() -> anyhow::Result<()> {
    let per_core = Runner::with_lanes(0);
    let three = Runner::with_lanes(3);
    let a = hypercube(5, &per_core)?;
    let b = hypercube(5, &three)?;
    assert_same_shape(&a, &b);
    Ok(())
}
