use trestle::Runner;
use trestle::testing::*;

#[test]
fn spreading_a_half_built_cube_completes_it() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);

    // the ascending connector builds only the upward half of each
    // vertex's edges; spreading with the full connector adds the rest
    let half = acyclic_hypercube(6, &runner)?;
    assert_eq!(half.vertex_count(&runner)?, 64);
    assert_eq!(half.edge_count(&runner)?, 192);

    let full = half.spread(&hypercube_builder(6), &runner)?;
    assert_eq!(full.vertex_count(&runner)?, 64);
    assert_eq!(full.edge_count(&runner)?, 384);
    assert_regular(&full, 6, 6);

    let reference = hypercube(6, &runner)?;
    assert_same_shape(&full, &reference);
    Ok(())
}

#[test]
fn spreading_a_complete_graph_changes_nothing() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let builder = hypercube_builder(5);
    let reference = hypercube(5, &runner)?;

    let spread = hypercube(5, &runner)?.spread(&builder, &runner)?;
    assert_same_shape(&spread, &reference);
    Ok(())
}

#[test]
fn spread_discovers_vertices_the_first_build_never_reached() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);

    // first pass: nobody connects anywhere; the graph is just the root
    let mute = trestle::Builder::new(|_: &u64, _edges: &mut trestle::Connections<u64, u64>| Ok(()))
        .natural_edge_order();
    let g = trestle::Graph::build(&mute, 0u64, &runner)?;
    assert_eq!(g.vertex_count(&runner)?, 1);

    let g = g.spread(&hypercube_builder(4), &runner)?;
    assert_eq!(g.vertex_count(&runner)?, 16);
    assert_eq!(g.edge_count(&runner)?, 64);
    Ok(())
}
