use trestle::testing::*;
use trestle::{Classifier, Merger, Order, Prop, Runner};

fn bitcount_classifier() -> Classifier<u64, u64, (), (), u64> {
    Classifier::new(
        Prop::vertex_only(|v: &u64| Ok(popcount(*v))),
        Order::natural(),
    )
}

#[test]
fn fused_merge_collapses_the_cube_to_a_path() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(3);
    let g = hypercube(6, &runner)?;

    // classes by bit count; class payload = the count, edges labeled by
    // the (from, to) level pair and fused per pair
    let m = Merger::new(
        bitcount_classifier(),
        Order::natural(),
        |v: &u64| Ok(popcount(*v)),
        |a: u64, b: u64| Ok(a.min(b)),
        |u: &u64, _e: &u64, w: &u64| Ok((popcount(*u), popcount(*w))),
    )
    .fusing(Order::natural(), |a: (u64, u64), _| Ok(a));
    let h = g.merged(&m, &runner)?;

    assert_eq!(h.vertex_count(&runner)?, 7);
    // one fused edge per adjacent level pair, both directions
    assert_eq!(h.edge_count(&runner)?, 12);
    assert_eq!(h.root(), &0);
    for k in 0..=6u64 {
        assert!(h.contains(&k));
        let targets: Vec<u64> = h
            .edges_from(&k)
            .unwrap()
            .into_iter()
            .map(|(_, t)| *t)
            .collect();
        let expected: Vec<u64> = [k.checked_sub(1), (k < 6).then(|| k + 1)]
            .into_iter()
            .flatten()
            .collect();
        let mut sorted = targets.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, expected, "level {k} connects to the wrong levels");
    }
    Ok(())
}

#[test]
fn an_unfused_merge_keeps_the_multigraph() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(6, &runner)?;

    let m = Merger::new(
        bitcount_classifier(),
        Order::natural(),
        |v: &u64| Ok(popcount(*v)),
        |a: u64, b: u64| Ok(a.min(b)),
        |u: &u64, _e: &u64, w: &u64| Ok((popcount(*u), popcount(*w))),
    );
    let h = g.merged(&m, &runner)?;

    assert_eq!(h.vertex_count(&runner)?, 7);
    assert_eq!(h.edge_count(&runner)?, 384);
    Ok(())
}

#[test]
fn a_pruner_culls_and_strands_are_swept() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(6, &runner)?;

    // keep only ascending fused edges; the path from the root class
    // still covers every class
    let m = Merger::new(
        bitcount_classifier(),
        Order::natural(),
        |v: &u64| Ok(popcount(*v)),
        |a: u64, b: u64| Ok(a.min(b)),
        |u: &u64, _e: &u64, w: &u64| Ok((popcount(*u), popcount(*w))),
    )
    .fusing(Order::natural(), |a: (u64, u64), _| Ok(a))
    .pruning(|from: &u64, _f: &(u64, u64), to: &u64| Ok(to < from));
    let h = g.merged(&m, &runner)?;

    assert_eq!(h.vertex_count(&runner)?, 7);
    assert_eq!(h.edge_count(&runner)?, 6);
    Ok(())
}

#[test]
fn pruning_everything_leaves_the_root_class() -> anyhow::Result<()> {
    let runner = Runner::with_lanes(2);
    let g = hypercube(4, &runner)?;

    let m = Merger::new(
        bitcount_classifier(),
        Order::natural(),
        |v: &u64| Ok(popcount(*v)),
        |a: u64, b: u64| Ok(a.min(b)),
        |u: &u64, _e: &u64, w: &u64| Ok((popcount(*u), popcount(*w))),
    )
    .fusing(Order::natural(), |a: (u64, u64), _| Ok(a))
    .pruning(|_: &u64, _: &(u64, u64), _: &u64| Ok(true));
    let h = g.merged(&m, &runner)?;

    assert_eq!(h.vertex_count(&runner)?, 1);
    assert_eq!(h.edge_count(&runner)?, 0);
    assert_eq!(h.root(), &0);
    Ok(())
}
