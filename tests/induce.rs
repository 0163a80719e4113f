use trestle::testing::*;
use trestle::{Error, Inducer, Runner, Zone};

fn path_counter() -> Inducer<u64, u64, u64> {
    Inducer::new(
        |_v: &u64, _e: &u64, remote: &u64| Ok(*remote),
        |a, b| Ok(a + b),
        || Ok(1u64),
    )
}

#[test]
fn forward_induction_counts_arrangements() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let g = acyclic_hypercube(6, &runner)?;

    let i = path_counter().zoned(Zone::forward(2).offset(1));
    assert_eq!(g.induced(&i, &runner)?, 1 + variations(5));
    Ok(())
}

#[test]
fn backward_induction_agrees_with_forward() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let g = acyclic_hypercube(6, &runner)?;

    let i = path_counter().zoned(Zone::backward(62).offset(1));
    assert_eq!(g.induced(&i, &runner)?, 1 + variations(5));
    Ok(())
}

#[test]
fn a_whole_graph_induction_runs_from_the_root() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let g = acyclic_hypercube(6, &runner)?;

    assert_eq!(g.induced(&path_counter(), &runner)?, 1 + variations(6));
    Ok(())
}

#[test]
fn induction_is_deterministic_across_lane_counts() -> anyhow::Result<()> {
    for lanes in [1, 4, 0] {
        let runner = Runner::with_lanes(lanes);
        let g = acyclic_hypercube(5, &runner)?;
        assert_eq!(g.induced(&path_counter(), &runner)?, 1 + variations(5));
    }
    Ok(())
}

#[test]
fn a_constant_zero_fold_returns_zero() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = acyclic_hypercube(5, &runner)?;

    let i = Inducer::new(
        |_: &u64, _: &u64, _: &u64| Ok(0u64),
        |a, b| Ok(a + b),
        || Ok(0u64),
    );
    assert_eq!(g.induced(&i, &runner)?, 0);
    Ok(())
}

#[test]
fn a_cyclic_zone_is_reported() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(4, &runner)?; // both directions: every edge closes a cycle

    assert!(matches!(
        g.induced(&path_counter(), &runner),
        Err(Error::Cyclic)
    ));
    Ok(())
}

#[test]
fn a_missing_initial_vertex_is_reported() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = acyclic_hypercube(4, &runner)?;

    let i = path_counter().zoned(Zone::forward(999));
    assert!(matches!(
        g.induced(&i, &runner),
        Err(Error::VertexNotFound)
    ));
    Ok(())
}
