use trestle::testing::*;
use trestle::{EdgeTest, Filter, Order, Runner, Zone};

#[test]
fn a_tautological_filter_changes_nothing() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let reference = hypercube(5, &runner)?;
    let mut g = hypercube(5, &runner)?;

    let f = Filter::new(EdgeTest::predicate(|_: &u64, _: &u64, _: &u64| Ok(true)));
    g.filter(&f, &runner)?;
    assert_same_shape(&g, &reference);
    Ok(())
}

#[test]
fn a_contradictory_filter_leaves_only_the_root() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(6, &runner)?;

    let f = Filter::new(EdgeTest::predicate(|_: &u64, _: &u64, _: &u64| Ok(false)));
    g.filter(&f, &runner)?;
    assert_eq!(g.vertex_count(&runner)?, 1);
    assert_eq!(g.edge_count(&runner)?, 0);
    assert_eq!(g.root(), &0);
    Ok(())
}

#[test]
fn cutting_the_diagonal_hyperplane_forward() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let mut g = hypercube(6, &runner)?;

    // drop every edge whose target sits on the middle hyperplane
    let f = Filter::new(EdgeTest::predicate(|_: &u64, _: &u64, target: &u64| {
        Ok(popcount(*target) != 3)
    }));
    g.filter(&f, &runner)?;

    assert_eq!(g.vertex_count(&runner)?, 22);
    assert_eq!(g.edge_count(&runner)?, 72);
    assert!(g.vertices().all(|v| popcount(*v) <= 2));
    Ok(())
}

#[test]
fn cutting_below_the_hyperplane_backward_reroots_at_the_top() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let mut g = hypercube(6, &runner)?;

    // traverse backward from the maximum vertex; an incident edge's local
    // vertex is its target, so this removes every edge into the plane
    let f = Filter::new(EdgeTest::predicate(|local: &u64, _: &u64, _: &u64| {
        Ok(popcount(*local) != 3)
    }))
    .zoned(Zone::backward(63).offset(1));
    g.filter(&f, &runner)?;

    assert_eq!(g.vertex_count(&runner)?, 42);
    assert_eq!(g.edge_count(&runner)?, 132);
    assert_eq!(g.root(), &63);
    assert!(g.vertices().all(|v| popcount(*v) >= 3));
    Ok(())
}

#[test]
fn class_folds_condemn_whole_classes() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let mut g = hypercube(6, &runner)?;

    // the hard way: fold singleton classes of edges, nulling out any
    // class whose local vertex sits on the middle hyperplane
    let test = EdgeTest::new(|local: &u64, _: &u64, _: &u64| Ok(Some(popcount(*local))))
        .reducing(|bits, acc| Ok(if bits == 3 { None } else { Some(acc) }))
        .vacuously(|| Ok(0));
    let f = Filter::new(test)
        .order(Order::natural())
        .zoned(Zone::backward(63).offset(1));
    g.filter(&f, &runner)?;

    assert_eq!(g.vertex_count(&runner)?, 42);
    assert_eq!(g.edge_count(&runner)?, 132);
    Ok(())
}

#[test]
fn a_reducing_test_without_an_order_is_misuse() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(4, &runner)?;

    let test = EdgeTest::new(|_: &u64, _: &u64, _: &u64| Ok(Some(0u64)))
        .reducing(|_, acc| Ok(Some(acc)))
        .vacuously(|| Ok(0));
    let f = Filter::new(test);
    assert!(matches!(
        g.filter(&f, &runner),
        Err(trestle::Error::Misuse(_))
    ));
    Ok(())
}

#[test]
fn a_zone_offset_shields_the_leading_levels() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(6, &runner)?;

    // condemn everything except the root's own edges, which the offset
    // keeps out of the working set
    let f = Filter::new(EdgeTest::predicate(|_: &u64, _: &u64, _: &u64| Ok(false)))
        .zoned(Zone::forward(0).offset(1));
    g.filter(&f, &runner)?;

    assert_eq!(g.vertex_count(&runner)?, 7);
    assert_eq!(g.edge_count(&runner)?, 6);
    assert_eq!(g.out_degree(&0), Some(6));
    Ok(())
}

#[test]
fn a_vertex_test_removes_vertices_wholesale() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(6, &runner)?;

    // keep edges, drop middle-hyperplane vertices directly
    let f = Filter::new(EdgeTest::predicate(|_: &u64, _: &u64, _: &u64| Ok(true)))
        .vertex_test(trestle::Prop::vertex_only(|v: &u64| Ok(popcount(*v) != 3)));
    g.filter(&f, &runner)?;

    assert_eq!(g.vertex_count(&runner)?, 22);
    assert_eq!(g.edge_count(&runner)?, 72);
    Ok(())
}

#[test]
fn a_missing_zone_initial_vertex_is_reported() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let mut g = hypercube(4, &runner)?;

    let f = Filter::new(EdgeTest::predicate(|_: &u64, _: &u64, _: &u64| Ok(true)))
        .zoned(Zone::forward(999));
    assert!(matches!(
        g.filter(&f, &runner),
        Err(trestle::Error::VertexNotFound)
    ));
    Ok(())
}
